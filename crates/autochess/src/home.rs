//! Home page: name entry, create a game, or join one by ID.

use autochess_protocol::{Codec, GameId};
use autochess_session::{AnonymousAuth, IdentityStore, SessionManager};
use tracing::debug;

use crate::{FlowError, Route};

/// Whether server-dependent features are expected to work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Online,
    /// Playing on the offline fallback identity; some features may be
    /// unavailable.
    Offline,
}

/// The home page's actions over a session.
pub struct HomeFlow<'a, A, S, C>
where
    A: AnonymousAuth,
    S: IdentityStore,
    C: Codec,
{
    session: &'a SessionManager<A, S, C>,
}

impl<'a, A, S, C> HomeFlow<'a, A, S, C>
where
    A: AnonymousAuth,
    S: IdentityStore,
    C: Codec,
{
    pub fn new(session: &'a SessionManager<A, S, C>) -> Self {
        Self { session }
    }

    /// The name to prefill the input with: whatever the player entered
    /// last time, or empty.
    pub fn initial_name(&self) -> String {
        self.session
            .identity()
            .and_then(|identity| identity.name().map(str::to_string))
            .unwrap_or_default()
    }

    /// Inputs and buttons stay disabled until this is `true`.
    pub fn is_enabled(&self) -> bool {
        self.session.is_ready()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        if self.session.is_offline() {
            ConnectionStatus::Offline
        } else {
            ConnectionStatus::Online
        }
    }

    /// Saves the name and heads to character select for a new game.
    ///
    /// # Errors
    /// - [`FlowError::NotReady`]: bootstrap hasn't completed
    /// - [`FlowError::MissingName`]: `name` is blank
    pub fn create_game(&self, name: &str) -> Result<Route, FlowError> {
        self.check_name(name)?;
        self.save_name(name);
        Ok(Route::Select { game_id: None })
    }

    /// Saves the name, remembers the game, and heads to character select.
    ///
    /// # Errors
    /// - [`FlowError::NotReady`]: bootstrap hasn't completed
    /// - [`FlowError::MissingName`]: `name` is blank
    /// - [`FlowError::MissingGameId`]: `game_id` is blank
    pub fn join_game(&self, name: &str, game_id: &str) -> Result<Route, FlowError> {
        self.check_name(name)?;
        let game_id = game_id.trim();
        if game_id.is_empty() {
            return Err(FlowError::MissingGameId);
        }

        self.save_name(name);
        let game_id = GameId::new(game_id);
        self.session.set_current_game(game_id.clone());
        Ok(Route::Select {
            game_id: Some(game_id),
        })
    }

    /// Gate shared by both buttons: bootstrap done and a non-blank name.
    fn check_name(&self, name: &str) -> Result<(), FlowError> {
        if !self.session.is_ready() {
            return Err(FlowError::NotReady);
        }
        if name.trim().is_empty() {
            return Err(FlowError::MissingName);
        }
        Ok(())
    }

    fn save_name(&self, name: &str) {
        // With no identity (signed out) there is nothing to name; the
        // player still moves on.
        if self.session.update_name(name).is_none() {
            debug!("no active identity, player name not saved");
        }
    }
}
