//! Rooms and games for the fairway hub.
//!
//! Everything in this crate is plain, synchronous state. The hub task owns
//! every [`Room`] (and through it every [`Game`]) exclusively, so none of
//! these types carry a lock.
//!
//! # Key types
//!
//! - [`Game`]: one match of Golf and its phase machine
//! - [`Room`]: the persistent container players join; hosts any number
//!   of concurrent games and keeps the history of finished ones
//! - [`RoomConfig`]: seat limits and id retry budget
//! - [`GameStore`]: where finished games are kept once they leave a room

mod config;
mod error;
mod game;
mod ids;
mod room;
mod store;

pub use config::RoomConfig;
pub use error::{GameError, RoomError, StoreError};
pub use game::{Game, Seat, SeatRemoval};
pub use ids::{random_code, unique_code, CODE_LEN};
pub use room::{unix_millis, Departure, Room, RoomMember};
pub use store::{GameStore, InMemoryGameStore, StoredGame};
