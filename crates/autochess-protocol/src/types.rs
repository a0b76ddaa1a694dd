//! Record types shared by every layer of Autochess.
//!
//! These are the structures that get persisted to durable storage and
//! read back on the next start. The serialized shape is the storage
//! contract: field names are camelCase and optional fields are omitted
//! when unset, so a freshly issued identity serializes as
//! `{"id":"abc","isAnonymous":true}`.
//!
//! Reading is forgiving. Only `id` has to be a string; an optional field
//! holding a value of the wrong shape is dropped rather than failing the
//! whole record, and keys this client doesn't know are carried along so a
//! re-persist writes them back.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use std::fmt;

/// Prefix of every locally synthesized (offline fallback) player ID.
pub const OFFLINE_ID_PREFIX: &str = "offline-";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Either issued by the remote anonymous-auth service or synthesized
/// locally as `offline-<unix millis>`. Serialized as a bare string thanks
/// to `#[serde(transparent)]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps a raw ID string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the ID carries no characters at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a game the player wants to join.
///
/// Game IDs are typed in by players, so nothing about their format is
/// enforced beyond being non-blank at the flow layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CharacterChoice
// ---------------------------------------------------------------------------

/// A playable character picked on the character-select screen.
///
/// The full choice (not just its ID) is stored inside the identity record,
/// so the board can show the icon without consulting the catalog again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterChoice {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// PlayerIdentity
// ---------------------------------------------------------------------------

/// The single persisted entity: who the local player is.
///
/// Fields are private so that the ID can't be changed after construction.
/// Updates go through the consuming `with_*` methods, each of which
/// returns a complete new value that the session layer re-persists in
/// full, unknown keys included.
///
/// ```rust
/// use autochess_protocol::{PlayerId, PlayerIdentity};
///
/// let identity = PlayerIdentity::anonymous(PlayerId::new("abc")).with_name("Ada");
/// assert_eq!(identity.id().as_str(), "abc");
/// assert_eq!(identity.name(), Some("Ada"));
/// assert!(!identity.is_offline());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdentity {
    id: PlayerId,

    #[serde(default = "default_anonymous", deserialize_with = "anonymous_flag")]
    is_anonymous: bool,

    #[serde(default, deserialize_with = "offline_flag", skip_serializing_if = "is_false")]
    is_offline: bool,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    character: Option<CharacterChoice>,

    /// Keys written by other clients, kept verbatim.
    #[cfg(feature = "json")]
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

fn default_anonymous() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Either a value of the expected shape or anything else.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

/// Deserializes `T`, mapping a value of the wrong shape (or `null`) to
/// `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Valid(value) => Some(value),
        Lenient::Invalid(_) => None,
    })
}

fn anonymous_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or(true))
}

fn offline_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or(false))
}

impl PlayerIdentity {
    /// An identity issued by the remote anonymous-auth service.
    pub fn anonymous(id: PlayerId) -> Self {
        Self {
            id,
            is_anonymous: true,
            is_offline: false,
            name: None,
            character: None,
            #[cfg(feature = "json")]
            extra: serde_json::Map::new(),
        }
    }

    /// A locally synthesized identity, used when no remote identity
    /// could be obtained. The ID is `offline-<timestamp_ms>`.
    pub fn offline_fallback(timestamp_ms: u128) -> Self {
        Self {
            id: PlayerId(format!("{OFFLINE_ID_PREFIX}{timestamp_ms}")),
            is_anonymous: true,
            is_offline: true,
            name: None,
            character: None,
            #[cfg(feature = "json")]
            extra: serde_json::Map::new(),
        }
    }

    /// Returns a copy of this identity with the display name set.
    #[must_use]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Returns a copy of this identity with the character set.
    #[must_use]
    pub fn with_character(self, character: CharacterChoice) -> Self {
        Self {
            character: Some(character),
            ..self
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    /// `true` only for the offline fallback identity.
    pub fn is_offline(&self) -> bool {
        self.is_offline
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn character(&self) -> Option<&CharacterChoice> {
        self.character.as_ref()
    }

    /// Minimal shape check applied to records read back from storage.
    ///
    /// A record passes if it carries a non-empty ID. Anything else about
    /// it is trusted as-is.
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
    }
}
