//! Error types for the Autochess umbrella crate.

use autochess_protocol::ProtocolError;
use autochess_session::{SessionError, StoreError};

/// Validation failures raised by the page flows.
///
/// The `Display` text is the message shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// The session hasn't finished bootstrapping yet.
    #[error("Still loading, please wait")]
    NotReady,

    #[error("Please enter a player name")]
    MissingName,

    #[error("Please enter a game ID")]
    MissingGameId,

    #[error("Please choose a character")]
    NoCharacterSelected,

    /// The selected ID isn't in the character catalog.
    #[error("Character does not exist")]
    UnknownCharacter(String),
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum AutochessError {
    /// A record encode/decode error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, storage, chain).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A storage backend error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A page-flow validation error.
    #[error(transparent)]
    Flow(#[from] FlowError),
}
