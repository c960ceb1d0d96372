//! Wire protocol for Quizforge.
//!
//! This crate defines the "language" that trivia clients and the server
//! speak:
//!
//! - **Identity** ([`ParticipantId`], [`RoomCode`]): who is talking and
//!   which room they mean.
//! - **Game vocabulary** ([`Category`], [`AgeGroup`], [`GameSettings`]):
//!   what a host can ask for when starting a game.
//! - **Views** ([`PlayerView`], [`QuestionView`], [`ScoreEntry`], ...):
//!   the snapshots the server pushes to every participant.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): one JSON frame per
//!   event, shaped as `{ "event": "<name>", "data": { ... } }`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become text
//!   frames and back.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about rooms, timers, or sockets. It
//! only knows how trivia events look on the wire.
//!
//! ```text
//! Transport (text frames) → Protocol (ClientEvent / ServerEvent) → Room actors
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{
    ClientEvent, CreateRoomRequest, HeartbeatRequest, JoinRoomRequest,
    LeaveRoomRequest, ServerEvent, StartGameRequest, SubmitAnswerRequest,
};
pub use types::{
    AgeGroup, Category, FinalScoreEntry, GameSettings, ParticipantId,
    PlayerView, QuestionView, RoomCode, RoundResult, ScoreEntry,
};
