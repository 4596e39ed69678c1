//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The hub doesn't care HOW messages become bytes. It holds something that
//! implements [`Codec`] and calls `encode`/`decode`. The browser client
//! speaks JSON, so [`JsonCodec`] is the one the server uses.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Turns messages into frame payloads and back.
///
/// Shared by every connection task, hence `Send + Sync + 'static`.
/// `decode` wants `DeserializeOwned` since a decoded message outlives the
/// frame it came from.
pub trait Codec: Send + Sync + 'static {
    /// Fails with [`ProtocolError::Encode`].
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Fails with [`ProtocolError::Decode`] when the bytes don't parse as `T`.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
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
/// use fairway_protocol::{Codec, JsonCodec, ServerMessage};
///
/// let codec = JsonCodec;
/// let msg = ServerMessage::TurnChanged { player_name: "bouncy-coral-quokka-x7k2".into() };
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: ServerMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
