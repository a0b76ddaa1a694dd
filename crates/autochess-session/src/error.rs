//! Error types for the session layer.
//!
//! None of these escape [`SessionManager`](crate::SessionManager): the
//! manager absorbs every failure into a fallback identity. They are still
//! real errors inside the crate, so the bootstrap chain can record exactly
//! why each source was skipped.

use std::time::Duration;

use autochess_protocol::ProtocolError;

/// Errors produced while resolving or persisting the player identity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Nothing is stored under the identity key yet.
    #[error("no identity stored under key {0:?}")]
    NoStoredIdentity(String),

    /// Something is stored, but it doesn't parse as an identity or fails
    /// the shape check. The record is discarded, never merged.
    #[error("stored identity is malformed: {0}")]
    MalformedRecord(#[source] ProtocolError),

    /// The remote anonymous-auth service rejected or failed the request.
    #[error("anonymous sign-in failed: {0}")]
    AuthFailed(String),

    /// The remote anonymous-auth service didn't answer in time.
    #[error("anonymous sign-in timed out after {0:?}")]
    AuthTimedOut(Duration),

    /// Durable storage failed to read, write, or remove the record.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The identity could not be serialized for storage.
    #[error("could not encode identity: {0}")]
    Encode(#[source] ProtocolError),

    /// A bootstrap chain was built from an unusable list of sources.
    #[error("invalid bootstrap chain: {0}")]
    InvalidChain(String),
}

/// Errors from an [`IdentityStore`](crate::IdentityStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("storage I/O failed for key {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend can't be used at all (quota exceeded, disabled, ...).
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
}
