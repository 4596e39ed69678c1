//! Error types for rooms, games, and the game store.
//!
//! The `Display` text of [`GameError`] and [`RoomError`] is sent to the
//! client verbatim, so it is part of the wire contract.

use fairway_rules::RulesError;

/// A rejected game action. The game is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("game already started")]
    AlreadyStarted,

    #[error("game is full")]
    GameFull,

    #[error("player already in game")]
    PlayerAlreadyInGame,

    #[error("need at least {0} players to start")]
    NotEnoughPlayers(usize),

    #[error("can only peek during playing phase")]
    CannotPeek,

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error("already peeked at 2 cards")]
    PeekLimitReached,

    #[error("already peeked at this card")]
    AlreadyPeeked,

    #[error("player not found")]
    PlayerNotFound,

    #[error("game not in playing phase")]
    NotPlaying,

    #[error("not your turn")]
    NotYourTurn,

    #[error("already have a drawn card")]
    AlreadyDrawn,

    #[error("deck is empty")]
    DeckEmpty,

    #[error("discard pile is empty")]
    DiscardEmpty,

    #[error("no drawn card to swap")]
    NothingToSwap,

    #[error("no drawn card to discard")]
    NothingToDiscard,

    #[error("cannot knock after drawing")]
    KnockAfterDraw,

    #[error("someone already knocked")]
    AlreadyKnocked,

    #[error("game is not completed")]
    NotCompleted,
}

/// A rejected room operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("room not found")]
    NotFound,

    #[error("room is full")]
    RoomFull,

    #[error("player already in room")]
    AlreadyInRoom,

    #[error("Player not found in room")]
    NotInRoom,

    #[error("Game does not exist in room")]
    GameNotFound,

    #[error(transparent)]
    Game(#[from] GameError),
}

/// Errors from a [`GameStore`](crate::GameStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("stored game {0} not found")]
    NotFound(String),

    #[error("stored game {0} already exists")]
    AlreadyExists(String),

    /// Someone else updated the record since it was read.
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },
}
