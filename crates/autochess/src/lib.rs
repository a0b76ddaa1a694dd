//! # Autochess
//!
//! Client-side session layer for the Autochess battle game.
//!
//! The client keeps one player identity per install. It is recovered
//! from durable storage, issued by a remote anonymous-auth service, or
//! synthesized offline, and every page reads and edits it through a
//! [`SessionManager`](autochess_session::SessionManager). This crate
//! re-exports the layers below and adds the page flows on top:
//!
//! - [`HomeFlow`]: enter a name, create or join a game
//! - [`CharacterSelect`]: pick a character from the catalog
//! - [`GameView`]: the board page, or where to go instead
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use autochess::prelude::*;
//!
//! let session = SessionManager::start(my_auth, FileStore::new(data_dir), SessionConfig::default()).await;
//! let route = HomeFlow::new(&session).create_game("Ada")?;
//! ```

mod board;
mod error;
mod home;
mod route;
mod select;

pub use board::{BOARD_SIZE, Board, BoardView, Card, Cell, GameView, Shade, leave_game};
pub use error::{AutochessError, FlowError};
pub use home::{ConnectionStatus, HomeFlow};
pub use route::Route;
pub use select::CharacterSelect;

pub use autochess_protocol as protocol;
pub use autochess_session as session;

pub mod prelude {
    pub use crate::{
        AutochessError, Board, BoardView, Card, Cell, CharacterSelect,
        ConnectionStatus, FlowError, GameView, HomeFlow, Route, Shade,
    };
    pub use autochess_protocol::{
        CharacterChoice, GameId, PlayerId, PlayerIdentity, catalog, find_character,
    };
    pub use autochess_session::{
        AnonymousAuth, AuthEvent, FileStore, IdentitySource, MemoryStore,
        RemoteUser, SessionConfig, SessionError, SessionManager,
    };
}
