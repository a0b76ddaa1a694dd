//! Error types for the protocol layer.
//!
//! Each crate in Autochess defines its own error enum. A `ProtocolError`
//! always means a record could not be turned into bytes or back, never
//! that storage or the auth service misbehaved.

/// Errors that can occur while encoding or decoding records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing required fields,
    /// or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The record decoded fine but violates a shape rule, e.g. an
    /// identity with an empty ID.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
