//! Codec trait and implementations for turning events into text frames.
//!
//! Trivia clients are browsers, so every frame on the wire is a UTF-8
//! text frame. The rest of the server doesn't care which format is used:
//! it only needs something that implements [`Codec`].

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to text frames and decode them back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → one codec instance is shared by every connection
///   task, and Tokio may run those tasks on any worker thread.
/// - `'static` → the codec owns everything it needs, so it can live in
///   long-lived server state.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed or doesn't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use quizforge_protocol::{ClientEvent, Codec, CreateRoomRequest, JsonCodec};
///
/// let codec = JsonCodec;
/// let event = ClientEvent::CreateRoom(CreateRoomRequest {
///     player_name: "Mei".into(),
/// });
///
/// let frame = codec.encode(&event).unwrap();
/// assert_eq!(frame, r#"{"event":"create_room","data":{"playerName":"Mei"}}"#);
///
/// let decoded: ClientEvent = codec.decode(&frame).unwrap();
/// assert_eq!(decoded, event);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}
