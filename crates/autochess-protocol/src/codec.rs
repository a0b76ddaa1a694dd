//! Codec trait and implementations for persisting records.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The session layer never calls `serde_json` directly: it goes through
//! a [`Codec`], so the storage format can be swapped without touching
//! the bootstrap logic.

use serde::{Serialize, de::DeserializeOwned};

use crate::{PlayerIdentity, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds
///
/// - `Send + Sync` → the codec is shared between the session manager and
///   its sign-out listener task.
/// - `'static` → it owns everything it needs, so it can live inside the
///   long-lived session.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes a stored identity record and applies the shape check.
    ///
    /// The only hard requirement is a non-empty string `id`. Optional
    /// fields of the wrong shape are dropped, not rejected.
    ///
    /// # Errors
    /// - `ProtocolError::Decode`: not an object, or `id` missing or not a
    ///   string
    /// - `ProtocolError::InvalidRecord`: parsed, but the ID is empty
    fn decode_identity(&self, data: &[u8]) -> Result<PlayerIdentity, ProtocolError> {
        let identity: PlayerIdentity = self.decode(data)?;
        if !identity.is_well_formed() {
            return Err(ProtocolError::InvalidRecord(
                "identity record has an empty id".into(),
            ));
        }
        Ok(identity)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON keeps the stored record human-readable, which matters because it
/// sits in a file (or browser storage) that players and developers poke
/// at by hand.
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use autochess_protocol::{Codec, JsonCodec, PlayerId, PlayerIdentity};
///
/// let codec = JsonCodec;
/// let identity = PlayerIdentity::anonymous(PlayerId::new("abc"));
///
/// let bytes = codec.encode(&identity).unwrap();
/// assert_eq!(bytes, br#"{"id":"abc","isAnonymous":true}"#);
///
/// let decoded = codec.decode_identity(&bytes).unwrap();
/// assert_eq!(decoded, identity);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
