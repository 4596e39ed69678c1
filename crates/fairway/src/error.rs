//! Error types for the fairway hub.

use fairway_protocol::ProtocolError;
use fairway_room::{GameError, RoomError, StoreError};
use fairway_session::SessionError;
use fairway_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `fairway` crate you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impl, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum FairwayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown message type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (token format, expiry, re-authentication).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, duplicate member).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A rejected game action.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The completed-game store refused a write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The hub task has stopped and no longer accepts commands.
    #[error("hub is unavailable")]
    HubUnavailable,
}

/// Why the hub refused a client request.
///
/// The `Display` text is what the client receives in `error{message}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum RequestError {
    #[error("Already in a room")]
    AlreadyInRoom,

    #[error("Room ID is required")]
    RoomIdRequired,

    #[error("Already in a different room")]
    InDifferentRoom,

    #[error("Not in the specified room")]
    NotInSpecifiedRoom,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Must be in the room to create a game")]
    MustBeInRoom,

    #[error("Game ID is required")]
    GameIdRequired,

    #[error("Not in a room")]
    NotInRoom,

    #[error("Not in a specific game")]
    NotInSpecificGame,

    #[error("Game not found")]
    GameNotFound,

    #[error("Not in a game")]
    NotInGame,

    #[error("Already in another game")]
    InAnotherGame,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Game(#[from] GameError),
}
