//! Inbound and outbound events.
//!
//! Every frame is one event, adjacently tagged:
//!
//! ```text
//! { "event": "join_room", "data": { "roomId": "K7Q2ZD", "playerName": "Mei" } }
//! ```
//!
//! The event names match the browser client's socket handlers one to one.

use serde::{Deserialize, Serialize};

use crate::types::{
    FinalScoreEntry, GameSettings, ParticipantId, PlayerView, QuestionView,
    RoomCode, RoundResult,
};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Events a client can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Open a new room; the sender becomes its host.
    CreateRoom(CreateRoomRequest),
    /// Enter an existing room by code.
    JoinRoom(JoinRoomRequest),
    /// Leave a room.
    LeaveRoom(LeaveRoomRequest),
    /// Host only: start a game in the room.
    StartGame(StartGameRequest),
    /// Answer the question currently on screen.
    SubmitAnswer(SubmitAnswerRequest),
    /// Keep-alive for clients that cannot send WebSocket pings (browsers).
    Heartbeat(HeartbeatRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_id: RoomCode,
    pub player_name: String,
}

/// `playerId` is accepted for client compatibility; the server always acts
/// on the identity of the connection that sent the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomRequest {
    pub room_id: RoomCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    pub room_id: RoomCode,
    pub settings: GameSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub room_id: RoomCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<ParticipantId>,
    pub question_id: String,
    pub answer_index: u8,
    /// Client clock, unix milliseconds, taken when the option was tapped.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    /// Client clock, echoed back so the client can measure round trip.
    #[serde(default)]
    pub client_time: u64,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// To the creator only.
    #[serde(rename_all = "camelCase")]
    RoomCreated {
        room_id: RoomCode,
        player_id: ParticipantId,
        player_name: String,
    },

    /// To the joiner only.
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: RoomCode,
        player_id: ParticipantId,
        players: Vec<PlayerView>,
    },

    /// Membership grew; full list attached.
    PlayerJoined { players: Vec<PlayerView> },

    /// Membership shrank; full list attached (host flag may have moved).
    PlayerLeft { players: Vec<PlayerView> },

    GameStarted { settings: GameSettings },

    /// Pre-game countdown, one per tick down to 0.
    Countdown { count: u32 },

    #[serde(rename_all = "camelCase")]
    Question {
        question: QuestionView,
        question_index: usize,
        total_questions: usize,
        /// Unix milliseconds after which answers are rejected.
        answer_deadline: u64,
    },

    #[serde(rename_all = "camelCase")]
    TimeUpdate { time_remaining: u32 },

    QuestionResult { result: RoundResult },

    /// Pause between a result and the next question.
    NextQuestionCountdown { count: u32 },

    #[serde(rename_all = "camelCase")]
    GameEnded { final_scoreboard: Vec<FinalScoreEntry> },

    /// Reply to a heartbeat, to the sender only.
    #[serde(rename_all = "camelCase")]
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// A request from this connection was rejected.
    Error { message: String },
}

impl ServerEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "room_created",
            Self::RoomJoined { .. } => "room_joined",
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::GameStarted { .. } => "game_started",
            Self::Countdown { .. } => "countdown",
            Self::Question { .. } => "question",
            Self::TimeUpdate { .. } => "time_update",
            Self::QuestionResult { .. } => "question_result",
            Self::NextQuestionCountdown { .. } => "next_question_countdown",
            Self::GameEnded { .. } => "game_ended",
            Self::HeartbeatAck { .. } => "heartbeat_ack",
            Self::Error { .. } => "error",
        }
    }
}
