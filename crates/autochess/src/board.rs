//! Game page: the 8×8 board with the player's token.
//!
//! The board is a static layout. There is no movement, combat, or turn
//! handling; the view only reflects the session's identity.

use std::fmt;

use autochess_protocol::{CharacterChoice, Codec, GameId};
use autochess_session::{AnonymousAuth, IdentityStore, SessionManager};

use crate::Route;

/// Cells per side.
pub const BOARD_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Checkerboard coloring. `(x + y)` even is light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    Light,
    Dark,
}

impl Shade {
    fn at(x: usize, y: usize) -> Self {
        if (x + y) % 2 == 0 { Self::Light } else { Self::Dark }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub shade: Shade,
    /// Icon drawn in the cell, if a token stands on it.
    pub token: Option<String>,
}

/// The grid, stored row-major (`index = y * 8 + x`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Cell>,
}

impl Board {
    /// An empty board.
    pub fn empty() -> Self {
        let cells = (0..BOARD_SIZE * BOARD_SIZE)
            .map(|index| {
                let (x, y) = (index % BOARD_SIZE, index / BOARD_SIZE);
                Cell {
                    x,
                    y,
                    shade: Shade::at(x, y),
                    token: None,
                }
            })
            .collect();
        Self { cells }
    }

    /// A board with the player's token in the top-left corner.
    pub fn with_player_token(icon: &str) -> Self {
        let mut board = Self::empty();
        board.cells[0].token = Some(icon.to_string());
        board
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            return None;
        }
        self.cells.get(y * BOARD_SIZE + x)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(BOARD_SIZE)
    }
}

/// Plain-text rendering: `#`/`.` for dark/light cells, the icon where a
/// token stands.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for cell in row {
                match (&cell.token, cell.shade) {
                    (Some(icon), _) => write!(f, "{icon}")?,
                    (None, Shade::Light) => write!(f, ".")?,
                    (None, Shade::Dark) => write!(f, "#")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// The placeholder action cards shown under the player panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Card {
    Move,
    Attack,
    Defend,
}

impl Card {
    pub const HAND: [Card; 3] = [Card::Move, Card::Attack, Card::Defend];

    pub fn label(self) -> &'static str {
        match self {
            Self::Move => "Move",
            Self::Attack => "Attack",
            Self::Defend => "Defend",
        }
    }
}

// ---------------------------------------------------------------------------
// GameView
// ---------------------------------------------------------------------------

/// Everything the game page shows once it can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// The game ID, or "New game".
    pub game_label: String,
    pub turn: u32,
    pub player_name: Option<String>,
    pub character: CharacterChoice,
    pub cards: [Card; 3],
    pub board: Board,
}

/// What the game page should do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameView {
    /// Bootstrap is still running.
    Loading,
    /// The player can't be here yet; send them elsewhere.
    Redirect(Route),
    Ready(BoardView),
}

impl GameView {
    /// Decides what the game page shows for the current session.
    ///
    /// - bootstrap incomplete → `Loading`
    /// - no identity (signed out) → back home
    /// - identity without a character → character select
    pub fn open<A, S, C>(session: &SessionManager<A, S, C>, game_id: Option<GameId>) -> Self
    where
        A: AnonymousAuth,
        S: IdentityStore,
        C: Codec,
    {
        if !session.is_ready() {
            return Self::Loading;
        }
        let Some(identity) = session.identity() else {
            return Self::Redirect(Route::Home);
        };
        let Some(character) = identity.character().cloned() else {
            return Self::Redirect(Route::Select { game_id });
        };

        Self::Ready(BoardView {
            game_label: game_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "New game".to_string()),
            turn: 1,
            player_name: identity.name().map(str::to_string),
            board: Board::with_player_token(&character.icon),
            character,
            cards: Card::HAND,
        })
    }
}

/// Leaving the game returns to the home page. Progress is not saved.
pub fn leave_game() -> Route {
    Route::Home
}
