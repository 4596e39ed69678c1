//! # Fairway
//!
//! Real-time hub for the Golf card game.
//!
//! Fairway keeps every room, game, and session in one task (the hub) and
//! lets any number of WebSocket clients drive it concurrently. Clients
//! authenticate for a reconnectable identity, gather in rooms of up to
//! four, and play consecutive games; the hub enforces the rules and
//! sends each player their own view of the table.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fairway::prelude::*;
//!
//! # async fn run() -> Result<(), FairwayError> {
//! let server = FairwayServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .session_config(SessionConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod dispatch;
mod error;
mod handler;
mod hub;
mod outbox;
mod server;
mod validator;

pub use error::FairwayError;
pub use hub::{spawn_hub, ClientContext, HubConfig, HubHandle, HubSnapshot};
pub use server::{FairwayServer, FairwayServerBuilder};
pub use validator::{validate_game, validate_hub, validate_room, InvariantViolation};

/// Commonly used types, re-exported from every fairway crate.
pub mod prelude {
    pub use crate::{
        spawn_hub, ClientContext, FairwayError, FairwayServer,
        FairwayServerBuilder, HubConfig, HubHandle, HubSnapshot,
    };
    pub use fairway_protocol::{
        Card, ClientMessage, Codec, FinalScore, GameId, GamePhase,
        GameResult, GameView, JsonCodec, PlayerId, Rank, RoomId, RoomView,
        ServerMessage, Suit,
    };
    pub use fairway_room::{GameStore, InMemoryGameStore, RoomConfig, StoredGame};
    pub use fairway_session::{
        PlayerIdGenerator, SequentialIdGenerator, SessionConfig,
        WhimsicalIdGenerator,
    };
    pub use fairway_transport::ConnectionId;
}
