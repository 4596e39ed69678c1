//! Session types and configuration.

use std::time::Duration;

use fairway_protocol::PlayerId;
use fairway_transport::ConnectionId;
use tokio::time::Instant;

/// Timing knobs for sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a token stays valid after it is minted.
    pub token_lifetime: Duration,

    /// How long a disconnected player keeps their seat before being
    /// removed for good.
    pub reconnect_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_lifetime: Duration::from_secs(24 * 60 * 60),
            reconnect_grace: Duration::from_secs(30),
        }
    }
}

/// Whether a session currently has a live connection.
///
/// ```text
///  create() ──→ Connected(conn) ──disconnect()──→ Disconnected { epoch }
///                     ▲                                   │
///                     └──────────── reclaim() ────────────┘
/// ```
///
/// Every disconnect gets a fresh `epoch`. A grace timer remembers the
/// epoch it was started for, so a timer left over from an earlier
/// disconnect can tell it is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connected(ConnectionId),
    Disconnected { since: Instant, epoch: u64 },
}

/// One issued token and the identity it resolves to.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,
    pub token: String,
    pub issued_at: Instant,
    pub expires_at: Instant,
    pub state: SessionState,
}

impl Session {
    /// `true` once `now` has reached the token's expiry.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// The live connection, if any.
    pub fn connection(&self) -> Option<ConnectionId> {
        match self.state {
            SessionState::Connected(conn) => Some(conn),
            SessionState::Disconnected { .. } => None,
        }
    }
}
