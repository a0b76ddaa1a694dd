//! Character select page.

use autochess_protocol::{CharacterChoice, Codec, GameId, catalog, find_character};
use autochess_session::{AnonymousAuth, IdentityStore, SessionManager};

use crate::{FlowError, Route};

/// The character select page's state and actions.
///
/// Clicking a card only highlights it ([`choose`](Self::choose)); nothing
/// reaches the session until [`start_game`](Self::start_game).
pub struct CharacterSelect<'a, A, S, C>
where
    A: AnonymousAuth,
    S: IdentityStore,
    C: Codec,
{
    session: &'a SessionManager<A, S, C>,
    game_id: Option<GameId>,
    highlighted: Option<String>,
}

impl<'a, A, S, C> CharacterSelect<'a, A, S, C>
where
    A: AnonymousAuth,
    S: IdentityStore,
    C: Codec,
{
    /// Opens the page. A character the player picked on an earlier visit
    /// starts out highlighted.
    pub fn new(session: &'a SessionManager<A, S, C>, game_id: Option<GameId>) -> Self {
        let highlighted = session
            .identity()
            .and_then(|identity| identity.character().map(|c| c.id.clone()));
        Self {
            session,
            game_id,
            highlighted,
        }
    }

    pub fn characters(&self) -> Vec<CharacterChoice> {
        catalog()
    }

    pub fn title(&self) -> &'static str {
        if self.game_id.is_some() {
            "Join game"
        } else {
            "Choose your character"
        }
    }

    /// The name shown above the grid, if the player has set one.
    pub fn player_name(&self) -> Option<String> {
        self.session
            .identity()
            .and_then(|identity| identity.name().map(str::to_string))
    }

    pub fn choose(&mut self, character_id: &str) {
        self.highlighted = Some(character_id.to_string());
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    /// The start button is enabled only with a highlighted character.
    pub fn can_start(&self) -> bool {
        self.session.is_ready() && self.highlighted.is_some()
    }

    /// Commits the highlighted character to the session and heads to the
    /// board.
    ///
    /// # Errors
    /// - [`FlowError::NotReady`]: bootstrap hasn't completed
    /// - [`FlowError::NoCharacterSelected`]: nothing highlighted
    /// - [`FlowError::UnknownCharacter`]: highlighted ID isn't in the
    ///   catalog
    pub fn start_game(&self) -> Result<Route, FlowError> {
        if !self.session.is_ready() {
            return Err(FlowError::NotReady);
        }
        let id = self
            .highlighted
            .as_deref()
            .ok_or(FlowError::NoCharacterSelected)?;
        let character =
            find_character(id).ok_or_else(|| FlowError::UnknownCharacter(id.to_string()))?;

        self.session.select_character(character);
        Ok(Route::Game {
            game_id: self.game_id.clone(),
        })
    }
}
