//! Session types: configuration and the state the pages read.
//!
//! A "session" is the client's view of the local player for one run of
//! the application. It tracks:
//! - WHO the player is (the active [`PlayerIdentity`], if any)
//! - WHERE that identity came from (stored, remote, or offline)
//! - WHAT they are doing right now (pending character pick, current game)
//! - WHETHER anything went wrong along the way (the soft auth warning)

use std::time::Duration;

use autochess_protocol::{CharacterChoice, GameId, PlayerIdentity};

use crate::{BootstrapChain, IdentitySource};

/// Storage key the identity record lives under.
pub const DEFAULT_STORAGE_KEY: &str = "gameUser";

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
///
/// Start from `SessionConfig::default()` and override what you need:
///
/// ```rust
/// use std::time::Duration;
/// use autochess_session::SessionConfig;
///
/// let config = SessionConfig::default().with_auth_timeout(Duration::from_secs(3));
/// assert_eq!(config.storage_key, "gameUser");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Key the identity record is stored under. Default: `"gameUser"`.
    pub storage_key: String,

    /// How long the remote sign-in may take before it is treated as a
    /// failure and bootstrap moves on to the offline fallback.
    ///
    /// Default: 10 seconds.
    pub auth_timeout: Duration,

    /// Order in which identity sources are tried.
    /// Default: `Stored → Remote → Offline`.
    pub chain: BootstrapChain,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            auth_timeout: Duration::from_secs(10),
            chain: BootstrapChain::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    pub fn with_chain(mut self, chain: BootstrapChain) -> Self {
        self.chain = chain;
        self
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Everything the session holds in memory.
///
/// Only `identity` is ever persisted; the rest lives and dies with the
/// process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// The active identity. `None` before bootstrap and after a sign-out.
    pub identity: Option<PlayerIdentity>,

    /// Which bootstrap source produced the identity.
    pub source: Option<IdentitySource>,

    /// The character highlighted on the select screen, tracked even when
    /// there is no identity to merge it into.
    pub pending_character: Option<CharacterChoice>,

    /// The game the player is creating or joining.
    pub current_game: Option<GameId>,

    /// Non-blocking message for the UI; set when remote auth failed.
    pub warning: Option<String>,
}
