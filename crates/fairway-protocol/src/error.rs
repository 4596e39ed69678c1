//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding messages.
///
/// The `Display` text of [`Malformed`](Self::Malformed) and
/// [`UnknownType`](Self::UnknownType) is sent back to the client verbatim,
/// so keep them stable.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame is not a message object with a string `type`, or its
    /// fields do not fit that type.
    #[error("Invalid message format")]
    Malformed,

    /// The frame is well formed but names a `type` the server does not know.
    #[error("Unknown message type: {0}")]
    UnknownType(String),
}
