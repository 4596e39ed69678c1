//! Pure rules for the Golf card game.
//!
//! Nothing in here knows about players, connections, or rooms. It is
//! the leaf of the workspace: cards, the deck, and how a hand scores.
//!
//! - [`Card`], [`Rank`], [`Suit`] are small `Copy` value types.
//! - [`create_deck`] / [`shuffle`] build the 52-card draw pile.
//! - [`score_hand`] and [`winners`] decide who won a finished game.

mod card;
mod error;
mod scoring;

pub use card::{card_value, create_deck, shuffle, Card, Rank, Suit};
pub use error::RulesError;
pub use scoring::{score_hand, validate_card_index, winners, HAND_SIZE, MAX_REVEALS};
