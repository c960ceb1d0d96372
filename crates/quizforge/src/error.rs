//! Unified error type for the Quizforge server.

use quizforge_protocol::ProtocolError;
use quizforge_room::RoomError;
use quizforge_session::BankError;
use quizforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizforgeError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame that could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A rejected room request.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The question bank could not be loaded.
    #[error(transparent)]
    Bank(#[from] BankError),

    /// The HTTP status listener could not be bound or failed while serving.
    #[error("status endpoint: {0}")]
    Status(#[from] std::io::Error),
}
