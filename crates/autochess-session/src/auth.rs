//! The remote anonymous-identity service.
//!
//! Autochess doesn't talk to any particular auth provider. It defines the
//! [`AnonymousAuth`] trait instead: one async call that issues a fresh
//! anonymous user, and one subscription that reports auth-state changes
//! (most importantly, sign-out). Production code wraps a hosted provider,
//! development code can hand out random IDs, and tests script both halves.

use std::future::Future;

use autochess_protocol::PlayerId;
use tokio::sync::broadcast;

use crate::SessionError;

/// The user record returned by a successful anonymous sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    /// The provider-issued user ID. Becomes the player's ID.
    pub uid: PlayerId,
}

/// An auth-state change pushed by the remote service.
///
/// Events may arrive zero or more times, in any order relative to local
/// identity mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user is signed in with the given ID.
    SignedIn(PlayerId),
    /// The underlying account is gone; any identity tied to it is stale.
    SignedOut,
}

/// Issues anonymous identities and reports sign-out.
///
/// # Trait bounds
///
/// - `Send + Sync` → the service is called from the bootstrap task while
///   the sign-out listener runs on another.
/// - `'static` → it lives as long as the session that owns it.
///
/// # Example
///
/// ```rust
/// use autochess_protocol::PlayerId;
/// use autochess_session::{AnonymousAuth, AuthEvent, RemoteUser, SessionError};
/// use tokio::sync::broadcast;
///
/// /// Hands every caller the same fixed ID. Only for development.
/// struct FixedAuth {
///     events: broadcast::Sender<AuthEvent>,
/// }
///
/// impl AnonymousAuth for FixedAuth {
///     async fn sign_in_anonymously(&self) -> Result<RemoteUser, SessionError> {
///         Ok(RemoteUser { uid: PlayerId::new("dev-player") })
///     }
///
///     fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
///         self.events.subscribe()
///     }
/// }
/// ```
pub trait AnonymousAuth: Send + Sync + 'static {
    /// Requests a brand-new anonymous user from the service.
    ///
    /// # Returns
    /// - `Ok(RemoteUser)`: the service issued an ID
    /// - `Err(SessionError::AuthFailed)`: network or service error
    fn sign_in_anonymously(
        &self,
    ) -> impl Future<Output = Result<RemoteUser, SessionError>> + Send;

    /// Opens a new subscription to auth-state changes.
    ///
    /// Dropping the receiver deregisters it.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
