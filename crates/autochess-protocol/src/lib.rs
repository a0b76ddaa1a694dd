//! Record types and codecs for Autochess.
//!
//! This crate defines the data that the client keeps about its player:
//!
//! - **Types** ([`PlayerIdentity`], [`PlayerId`], [`CharacterChoice`],
//!   [`GameId`]): the persisted identity record and its parts.
//! - **Catalog** ([`catalog`], [`find_character`]): the fixed set of
//!   playable characters.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how records are turned
//!   into bytes for durable storage and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! # Architecture
//!
//! ```text
//! Flows (pages) → Session (identity lifecycle) → Protocol (records, codec)
//! ```

mod catalog;
mod codec;
mod error;
mod types;

pub use catalog::{catalog, find_character};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    CharacterChoice, GameId, OFFLINE_ID_PREFIX, PlayerId, PlayerIdentity,
};
