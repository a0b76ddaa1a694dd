//! Where a flow sends the player next.

use std::fmt;

use autochess_protocol::GameId;

/// A page of the client, with the state carried into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    /// Character select. `game_id` is set when joining an existing game.
    Select { game_id: Option<GameId> },
    /// The board. `game_id` is `None` for a new game.
    Game { game_id: Option<GameId> },
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "/"),
            Self::Select { game_id: None } => write!(f, "/select"),
            Self::Select { game_id: Some(id) } => write!(f, "/select?game={id}"),
            Self::Game { game_id: None } => write!(f, "/game"),
            Self::Game { game_id: Some(id) } => write!(f, "/game?game={id}"),
        }
    }
}
