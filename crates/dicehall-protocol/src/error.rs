//! Error types for the protocol layer.

/// Errors that can occur while parsing or (de)serializing messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or a value
    /// outside its alphabet (e.g. an unknown dice face).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code that isn't six alphanumeric characters.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),

    /// A message that decodes but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
