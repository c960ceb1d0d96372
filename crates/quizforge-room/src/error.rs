//! Error types for the room layer.

use quizforge_protocol::{ParticipantId, RoomCode};
use quizforge_session::SessionError;

/// Errors that can occur during room operations.
///
/// Every variant is request-scoped: the request is refused, nothing in the
/// room changes, and the `Display` text is sent back to the requester.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room is at capacity.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    #[error("player {0} already in room {1}")]
    AlreadyMember(ParticipantId, RoomCode),

    #[error("player {0} not in room {1}")]
    NotMember(ParticipantId, RoomCode),

    #[error("only the host can start the game")]
    NotHost,

    /// Fewer members than the configured minimum.
    #[error("need at least {required} players to start, have {present}")]
    InsufficientPlayers { required: usize, present: usize },

    /// An answer arrived while no game is running.
    #[error("no game is running in room {0}")]
    NoActiveSession(RoomCode),

    /// The bank has nothing matching the requested category / age group.
    #[error("no questions match the selected settings")]
    NoQuestions,

    #[error("invalid game settings: {0}")]
    InvalidSettings(String),

    /// The answer was refused by the session's admission gate.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The room's actor has stopped or its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
