//! Error types for the protocol layer.
//!
//! Each Quizforge crate defines its own error enum. A `ProtocolError`
//! always means "this frame could not be turned into an event (or back)",
//! never a room or networking problem.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into a text frame).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning a text frame into an event).
    ///
    /// Common causes: malformed JSON, an unknown `event` name, a missing
    /// required field such as `roomId`, or an answer index that does not
    /// fit in a byte.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but is not a valid event.
    ///
    /// For example, a binary frame that is not UTF-8.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
