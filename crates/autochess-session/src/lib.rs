//! Player session management for Autochess.
//!
//! This crate owns the local player's identity for one run of the client:
//!
//! 1. **Bootstrap**: find or create the identity, trying durable storage,
//!    then the remote anonymous-auth service ([`AnonymousAuth`]), then an
//!    offline fallback ([`BootstrapChain`])
//! 2. **Persistence**: keep the full identity record in an
//!    [`IdentityStore`] under a single key
//! 3. **Reconciliation**: clear the identity when the auth service
//!    reports sign-out (offline identities are exempt)
//!
//! [`SessionManager`] ties these together and is what pages talk to.
//!
//! # How it fits in the stack
//!
//! ```text
//! Flows (above)  ← read the identity, call update_name / select_character
//!     ↕
//! Session Layer (this crate)  ← bootstrap, persistence, sign-out
//!     ↕
//! Protocol Layer (below)  ← PlayerIdentity, CharacterChoice, Codec
//! ```

mod auth;
mod bootstrap;
mod error;
mod listener;
mod manager;
mod session;
mod store;

pub use auth::{AnonymousAuth, AuthEvent, RemoteUser};
pub use bootstrap::{
    AUTH_WARNING, BootstrapChain, BootstrapContext, BootstrapOutcome,
    IdentitySource, Resolution, SourceFailure,
};
pub use error::{SessionError, StoreError};
pub use manager::SessionManager;
pub use session::{DEFAULT_STORAGE_KEY, SessionConfig, SessionState};
pub use store::{FileStore, IdentityStore, MemoryStore};
