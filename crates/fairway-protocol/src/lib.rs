//! Wire protocol for the fairway hub.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`], [`GameId`]): string newtypes
//!   that travel as plain JSON strings.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): tagged unions,
//!   one variant per `type` discriminator.
//! - **Views** ([`GameView`], [`RoomView`], ...): the personalized state
//!   projections the hub sends out.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those are turned
//!   into bytes.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Hub → Protocol (ServerMessage) → Transport
//! ```

mod codec;
mod error;
mod messages;
mod types;
mod views;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{decode_client_message, ClientMessage, ServerMessage};
pub use types::{GameId, PlayerId, RoomId};
pub use views::{
    FinalScore, GamePhase, GameResult, GameSummary, GameView, PlayerView,
    RoomPlayerView, RoomView,
};

// Cards are part of the wire contract, so re-export them for clients of
// this crate that only want the protocol.
pub use fairway_rules::{Card, Rank, Suit};
