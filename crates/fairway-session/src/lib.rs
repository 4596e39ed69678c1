//! Session layer for the fairway hub.
//!
//! A session ties an opaque bearer token to a stable [`PlayerId`]. It
//! outlives the connection that created it: when the socket drops, the
//! session goes `Disconnected` and a reconnecting client can reclaim it
//! with the token until the grace period runs out.
//!
//! This crate only keeps the books. Timers, room membership, and
//! broadcasting live in the hub, which owns the [`SessionManager`].
//!
//! [`PlayerId`]: fairway_protocol::PlayerId

mod error;
mod ids;
mod manager;
mod session;
mod token;

pub use error::SessionError;
pub use ids::{PlayerIdGenerator, SequentialIdGenerator, WhimsicalIdGenerator};
pub use manager::{Reclaimed, SessionManager};
pub use session::{Session, SessionConfig, SessionState};
pub use token::{generate_token, validate_token_format, TOKEN_HEX_LEN};
