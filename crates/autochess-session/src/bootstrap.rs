//! The identity bootstrap chain.
//!
//! At startup the client needs exactly one player identity. It can come
//! from three places, tried in order:
//!
//! ```text
//! Stored ──(missing / malformed / unreadable)──→ Remote ──(error / timeout)──→ Offline
//!   │                                              │                             │
//!   ▼                                              ▼                             ▼
//! adopt as-is                          {id: uid, isAnonymous}          {id: "offline-<ms>",
//!                                         persist + adopt               isOffline} persist + adopt
//! ```
//!
//! Each step is an [`IdentitySource`]. A [`BootstrapChain`] is just the
//! ordered list of sources; [`BootstrapChain::run`] walks it and returns a
//! tagged [`BootstrapOutcome`] recording which source won and why every
//! earlier one was skipped.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use autochess_protocol::{Codec, PlayerIdentity};
use tracing::{debug, info, warn};

use crate::store::persist_identity;
use crate::{AnonymousAuth, IdentityStore, SessionError};

/// Soft warning surfaced to the UI when the remote auth step failed.
pub const AUTH_WARNING: &str =
    "Authentication failed. Please refresh the page and try again.";

// ---------------------------------------------------------------------------
// IdentitySource
// ---------------------------------------------------------------------------

/// One strategy for obtaining the player identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentitySource {
    /// Recover the record a previous run left in durable storage.
    Stored,
    /// Ask the remote anonymous-auth service for a new user.
    Remote,
    /// Synthesize an `offline-<ms>` identity locally. Never fails.
    Offline,
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored => write!(f, "Stored"),
            Self::Remote => write!(f, "Remote"),
            Self::Offline => write!(f, "Offline"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Why a source was skipped.
#[derive(Debug)]
pub struct SourceFailure {
    pub source: IdentitySource,
    pub error: SessionError,
}

/// A successful bootstrap: the identity, where it came from, and the
/// failures of the sources tried before it.
#[derive(Debug)]
pub struct Resolution {
    pub identity: PlayerIdentity,
    pub source: IdentitySource,
    /// [`AUTH_WARNING`] if the remote step failed along the way.
    pub warning: Option<String>,
    pub failures: Vec<SourceFailure>,
}

/// The tagged result of walking a chain.
#[derive(Debug)]
pub enum BootstrapOutcome {
    Resolved(Resolution),
    /// Every source failed. Only possible for chains without
    /// [`IdentitySource::Offline`].
    Exhausted { failures: Vec<SourceFailure> },
}

/// Returns [`AUTH_WARNING`] if any of `failures` came from the remote step.
pub(crate) fn auth_warning(failures: &[SourceFailure]) -> Option<String> {
    failures
        .iter()
        .any(|f| f.source == IdentitySource::Remote)
        .then(|| AUTH_WARNING.to_string())
}

/// Milliseconds since the Unix epoch, used to stamp offline IDs.
///
/// A clock set before 1970 yields 0 rather than an error: the identity
/// must be produced no matter what.
pub(crate) fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

// ---------------------------------------------------------------------------
// BootstrapContext
// ---------------------------------------------------------------------------

/// Everything the sources need to do their job, borrowed from the session.
pub struct BootstrapContext<'a, A, S, C> {
    pub auth: &'a A,
    pub store: &'a S,
    pub codec: &'a C,
    pub storage_key: &'a str,
    /// Upper bound on the remote sign-in call. Expiry counts as an auth
    /// failure.
    pub auth_timeout: Duration,
}

// ---------------------------------------------------------------------------
// BootstrapChain
// ---------------------------------------------------------------------------

/// An ordered, duplicate-free list of identity sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapChain {
    sources: Vec<IdentitySource>,
}

impl Default for BootstrapChain {
    /// `Stored → Remote → Offline`.
    fn default() -> Self {
        Self {
            sources: vec![
                IdentitySource::Stored,
                IdentitySource::Remote,
                IdentitySource::Offline,
            ],
        }
    }
}

impl BootstrapChain {
    /// Builds a chain from `sources`, tried in the given order.
    ///
    /// # Errors
    /// [`SessionError::InvalidChain`] if `sources` is empty or names a
    /// source twice.
    pub fn new(sources: Vec<IdentitySource>) -> Result<Self, SessionError> {
        if sources.is_empty() {
            return Err(SessionError::InvalidChain(
                "at least one identity source is required".into(),
            ));
        }
        for (i, source) in sources.iter().enumerate() {
            if sources[..i].contains(source) {
                return Err(SessionError::InvalidChain(format!(
                    "source {source} listed more than once"
                )));
            }
        }
        Ok(Self { sources })
    }

    pub fn sources(&self) -> &[IdentitySource] {
        &self.sources
    }

    /// `true` if the chain ends in a source that cannot fail.
    pub fn is_exhaustive(&self) -> bool {
        self.sources.contains(&IdentitySource::Offline)
    }

    /// Tries each source in order and stops at the first success.
    ///
    /// Identities created by `Remote` and `Offline` are persisted before
    /// being returned. A failed write is logged and does not reject the
    /// identity: the player still gets to play, they just won't be
    /// recognized after a restart.
    pub async fn run<A, S, C>(
        &self,
        ctx: &BootstrapContext<'_, A, S, C>,
    ) -> BootstrapOutcome
    where
        A: AnonymousAuth,
        S: IdentityStore,
        C: Codec,
    {
        let mut failures = Vec::new();

        for &source in &self.sources {
            match try_source(source, ctx).await {
                Ok(identity) => {
                    info!(
                        player_id = %identity.id(),
                        %source,
                        offline = identity.is_offline(),
                        "player identity resolved"
                    );
                    let warning = auth_warning(&failures);
                    return BootstrapOutcome::Resolved(Resolution {
                        identity,
                        source,
                        warning,
                        failures,
                    });
                }
                Err(error) => {
                    debug!(%source, error = %error, "identity source skipped");
                    failures.push(SourceFailure { source, error });
                }
            }
        }

        BootstrapOutcome::Exhausted { failures }
    }
}

async fn try_source<A, S, C>(
    source: IdentitySource,
    ctx: &BootstrapContext<'_, A, S, C>,
) -> Result<PlayerIdentity, SessionError>
where
    A: AnonymousAuth,
    S: IdentityStore,
    C: Codec,
{
    match source {
        IdentitySource::Stored => load_stored(ctx),
        IdentitySource::Remote => {
            let identity = sign_in_remote(ctx).await?;
            persist_or_warn(ctx, &identity);
            Ok(identity)
        }
        IdentitySource::Offline => {
            let identity = PlayerIdentity::offline_fallback(now_millis());
            persist_or_warn(ctx, &identity);
            Ok(identity)
        }
    }
}

fn load_stored<A, S, C>(
    ctx: &BootstrapContext<'_, A, S, C>,
) -> Result<PlayerIdentity, SessionError>
where
    S: IdentityStore,
    C: Codec,
{
    let bytes = ctx
        .store
        .load(ctx.storage_key)?
        .ok_or_else(|| SessionError::NoStoredIdentity(ctx.storage_key.to_string()))?;

    ctx.codec
        .decode_identity(&bytes)
        .map_err(SessionError::MalformedRecord)
}

async fn sign_in_remote<A, S, C>(
    ctx: &BootstrapContext<'_, A, S, C>,
) -> Result<PlayerIdentity, SessionError>
where
    A: AnonymousAuth,
{
    let user = tokio::time::timeout(ctx.auth_timeout, ctx.auth.sign_in_anonymously())
        .await
        .map_err(|_| SessionError::AuthTimedOut(ctx.auth_timeout))??;

    if user.uid.is_empty() {
        return Err(SessionError::AuthFailed(
            "service issued an empty user id".into(),
        ));
    }
    Ok(PlayerIdentity::anonymous(user.uid))
}

pub(crate) fn persist_or_warn<A, S, C>(
    ctx: &BootstrapContext<'_, A, S, C>,
    identity: &PlayerIdentity,
) where
    S: IdentityStore,
    C: Codec,
{
    if let Err(e) = persist_identity(ctx.store, ctx.codec, ctx.storage_key, identity) {
        warn!(
            player_id = %identity.id(),
            error = %e,
            "failed to persist new identity"
        );
    }
}
