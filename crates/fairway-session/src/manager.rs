//! The session manager: every issued token and what it resolves to.
//!
//! Responsibilities:
//! - Minting tokens when a client authenticates without one
//! - Resolving presented tokens (format, existence, expiry)
//! - Tracking which connection, if any, each session is bound to
//! - Stamping each disconnect with an epoch so stale grace timers can be
//!   told apart from live ones
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain struct over `HashMap`s. It is owned by the
//! hub task and only touched from there, so it needs no lock.

use std::collections::HashMap;

use fairway_protocol::PlayerId;
use fairway_transport::ConnectionId;
use tokio::time::Instant;

use crate::{
    generate_token, validate_token_format, Session, SessionConfig,
    SessionError, SessionState,
};

/// Outcome of a successful [`SessionManager::reclaim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reclaimed {
    pub player_id: PlayerId,
    pub token: String,
    pub expires_at: Instant,
    /// A different connection the session was still bound to. It loses
    /// its binding; the newest connection wins.
    pub displaced: Option<ConnectionId>,
}

/// Registry of all issued session tokens.
///
/// ## Lifecycle
///
/// ```text
/// create() ──→ [Connected] ──disconnect()──→ [Disconnected]
///                  ▲                                │
///                  └────────── reclaim() ───────────┤
///                                                   ▼ grace elapsed
///                                               discard()
/// ```
pub struct SessionManager {
    /// All live sessions, keyed by token.
    sessions: HashMap<String, Session>,

    /// Which token each live connection authenticated with. Kept in sync
    /// with the `Connected` states in `sessions`.
    by_connection: HashMap<ConnectionId, String>,

    /// Next disconnect epoch to hand out.
    next_epoch: u64,

    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            by_connection: HashMap::new(),
            next_epoch: 1,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mints a token for `player_id` and binds it to `conn`.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyAuthenticated`] if `conn` already has a
    ///   session.
    /// - [`SessionError::RandomSource`] if no token could be minted.
    pub fn create(
        &mut self,
        player_id: PlayerId,
        conn: ConnectionId,
    ) -> Result<&Session, SessionError> {
        if self.by_connection.contains_key(&conn) {
            return Err(SessionError::AlreadyAuthenticated);
        }

        let token = generate_token()?;
        let now = Instant::now();
        let session = Session {
            player_id: player_id.clone(),
            token: token.clone(),
            issued_at: now,
            expires_at: now + self.config.token_lifetime,
            state: SessionState::Connected(conn),
        };

        self.by_connection.insert(conn, token.clone());
        tracing::info!(%player_id, %conn, "session created");

        // `entry().or_insert()` hands back a reference to the stored value,
        // which saves a second lookup.
        Ok(self.sessions.entry(token).or_insert(session))
    }

    /// Resumes the session behind `token` on connection `conn`.
    ///
    /// Presenting the same valid token any number of times always resolves
    /// to the same player id and the same token.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyAuthenticated`] if `conn` already has a
    ///   session
    /// - [`SessionError::InvalidToken`] if the token is malformed
    /// - [`SessionError::SessionNotFound`] if it is unknown
    /// - [`SessionError::SessionExpired`] if it is past expiry; the token
    ///   is discarded
    pub fn reclaim(
        &mut self,
        token: &str,
        conn: ConnectionId,
    ) -> Result<Reclaimed, SessionError> {
        if self.by_connection.contains_key(&conn) {
            return Err(SessionError::AlreadyAuthenticated);
        }
        validate_token_format(token)?;

        let session = self
            .sessions
            .get_mut(token)
            .ok_or(SessionError::SessionNotFound)?;

        if session.is_expired(Instant::now()) {
            let player_id = session.player_id.clone();
            self.discard(token);
            tracing::info!(%player_id, "presented token has expired");
            return Err(SessionError::SessionExpired);
        }

        let displaced = match session.state {
            SessionState::Connected(old) if old != conn => Some(old),
            _ => None,
        };
        session.state = SessionState::Connected(conn);

        let reclaimed = Reclaimed {
            player_id: session.player_id.clone(),
            token: session.token.clone(),
            expires_at: session.expires_at,
            displaced,
        };

        if let Some(old) = displaced {
            self.by_connection.remove(&old);
        }
        self.by_connection.insert(conn, reclaimed.token.clone());

        tracing::info!(
            player_id = %reclaimed.player_id,
            %conn,
            "session reclaimed"
        );
        Ok(reclaimed)
    }

    /// Unbinds `conn` from its session and starts its disconnect epoch.
    ///
    /// Returns the token and the epoch to schedule a grace timer for, or
    /// `None` if the connection never authenticated.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Option<(String, u64)> {
        let token = self.by_connection.remove(&conn)?;
        let session = self.sessions.get_mut(&token)?;

        let epoch = self.next_epoch;
        self.next_epoch += 1;
        session.state = SessionState::Disconnected {
            since: Instant::now(),
            epoch,
        };

        tracing::info!(
            player_id = %session.player_id,
            %conn,
            epoch,
            "player disconnected, grace period started"
        );
        Some((token, epoch))
    }

    /// `true` if the session behind `token` is still disconnected in the
    /// same `epoch`, i.e. nobody reclaimed it since the timer was started.
    pub fn is_pending_expiry(&self, token: &str, epoch: u64) -> bool {
        matches!(
            self.sessions.get(token).map(|s| &s.state),
            Some(SessionState::Disconnected { epoch: e, .. }) if *e == epoch
        )
    }

    /// Forgets a token for good.
    pub fn discard(&mut self, token: &str) -> Option<Session> {
        let session = self.sessions.remove(token)?;
        if let SessionState::Connected(conn) = session.state {
            self.by_connection.remove(&conn);
        }
        Some(session)
    }

    /// Looks up a session by token.
    pub fn get(&self, token: &str) -> Option<&Session> {
        self.sessions.get(token)
    }

    /// The session bound to `conn`, if it authenticated.
    pub fn session_for(&self, conn: ConnectionId) -> Option<&Session> {
        self.by_connection
            .get(&conn)
            .and_then(|token| self.sessions.get(token))
    }

    /// Number of live sessions (connected or inside a grace period).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionManager`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! # Testing time-dependent behavior
    //!
    //! Expiry is measured with `tokio::time::Instant`, so tests run on a
    //! paused clock (`start_paused = true`) and jump forward with
    //! `tokio::time::advance` instead of sleeping for real.

    use std::time::Duration;

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn manager() -> SessionManager {
        SessionManager::new(SessionConfig::default())
    }

    fn pid(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    /// Creates a session for `name` on `conn(c)` and returns its token.
    fn issue(mgr: &mut SessionManager, name: &str, c: u64) -> String {
        mgr.create(pid(name), conn(c)).unwrap().token.clone()
    }

    // =====================================================================
    // create()
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_create_new_player_returns_connected_session() {
        let mut mgr = manager();

        let session = mgr.create(pid("alice"), conn(1)).unwrap();

        assert_eq!(session.player_id, pid("alice"));
        assert_eq!(session.state, SessionState::Connected(conn(1)));
        assert_eq!(session.token.len(), crate::TOKEN_HEX_LEN);
        assert_eq!(
            session.expires_at - session.issued_at,
            Duration::from_secs(24 * 60 * 60)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_each_player_gets_unique_token() {
        let mut mgr = manager();
        let a = issue(&mut mgr, "alice", 1);
        let b = issue(&mut mgr, "bob", 2);
        assert_ne!(a, b, "tokens must be unique per player");
        assert_eq!(mgr.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_same_connection_twice_returns_already_authenticated() {
        let mut mgr = manager();
        issue(&mut mgr, "alice", 1);

        let result = mgr.create(pid("bob"), conn(1));

        assert!(matches!(result, Err(SessionError::AlreadyAuthenticated)));
    }

    // =====================================================================
    // reclaim()
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_reclaim_after_disconnect_rebinds_same_identity() {
        let mut mgr = manager();
        let token = issue(&mut mgr, "alice", 1);
        mgr.disconnect(conn(1)).unwrap();

        let reclaimed = mgr.reclaim(&token, conn(2)).unwrap();

        assert_eq!(reclaimed.player_id, pid("alice"));
        assert_eq!(reclaimed.token, token);
        assert_eq!(reclaimed.displaced, None);
        assert_eq!(mgr.session_for(conn(2)).unwrap().player_id, pid("alice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaim_repeatedly_is_idempotent() {
        let mut mgr = manager();
        let token = issue(&mut mgr, "alice", 1);

        for c in 2..6 {
            mgr.disconnect(conn(c - 1));
            let r = mgr.reclaim(&token, conn(c)).unwrap();
            assert_eq!(r.player_id, pid("alice"));
            assert_eq!(r.token, token);
        }
        assert_eq!(mgr.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaim_while_still_connected_displaces_old_connection() {
        let mut mgr = manager();
        let token = issue(&mut mgr, "alice", 1);

        let reclaimed = mgr.reclaim(&token, conn(2)).unwrap();

        assert_eq!(reclaimed.displaced, Some(conn(1)));
        assert!(mgr.session_for(conn(1)).is_none());
        assert!(mgr.session_for(conn(2)).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaim_malformed_token_returns_invalid_token() {
        let mut mgr = manager();
        let result = mgr.reclaim("not-a-token", conn(1));
        assert_eq!(result, Err(SessionError::InvalidToken));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaim_unknown_token_returns_not_found() {
        let mut mgr = manager();
        let unknown = "0".repeat(crate::TOKEN_HEX_LEN);
        let result = mgr.reclaim(&unknown, conn(1));
        assert_eq!(result, Err(SessionError::SessionNotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaim_past_lifetime_returns_expired_and_discards() {
        let mut mgr = manager();
        let token = issue(&mut mgr, "alice", 1);
        mgr.disconnect(conn(1));

        tokio::time::advance(Duration::from_secs(24 * 60 * 60 + 1)).await;

        assert_eq!(
            mgr.reclaim(&token, conn(2)),
            Err(SessionError::SessionExpired)
        );
        // The token is gone, so a second attempt reports it as unknown.
        assert_eq!(
            mgr.reclaim(&token, conn(3)),
            Err(SessionError::SessionNotFound)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaim_on_authenticated_connection_returns_already_authenticated() {
        let mut mgr = manager();
        let token = issue(&mut mgr, "alice", 1);

        let result = mgr.reclaim(&token, conn(1));

        assert_eq!(result, Err(SessionError::AlreadyAuthenticated));
    }

    // =====================================================================
    // disconnect() / is_pending_expiry()
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_unknown_connection_returns_none() {
        let mut mgr = manager();
        assert!(mgr.disconnect(conn(9)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_pending_expiry_false_after_reclaim() {
        let mut mgr = manager();
        let token = issue(&mut mgr, "alice", 1);
        let (t, epoch) = mgr.disconnect(conn(1)).unwrap();
        assert_eq!(t, token);
        assert!(mgr.is_pending_expiry(&token, epoch));

        mgr.reclaim(&token, conn(2)).unwrap();

        assert!(!mgr.is_pending_expiry(&token, epoch));
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_pending_expiry_stale_epoch_is_false() {
        // Disconnect, reclaim, disconnect again: the first timer's epoch
        // no longer matches.
        let mut mgr = manager();
        let token = issue(&mut mgr, "alice", 1);
        let (_, first) = mgr.disconnect(conn(1)).unwrap();
        mgr.reclaim(&token, conn(2)).unwrap();
        let (_, second) = mgr.disconnect(conn(2)).unwrap();

        assert!(!mgr.is_pending_expiry(&token, first));
        assert!(mgr.is_pending_expiry(&token, second));
    }

    // =====================================================================
    // discard()
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_discard_removes_session_and_binding() {
        let mut mgr = manager();
        let token = issue(&mut mgr, "alice", 1);

        let removed = mgr.discard(&token).unwrap();

        assert_eq!(removed.player_id, pid("alice"));
        assert!(mgr.is_empty());
        assert!(mgr.session_for(conn(1)).is_none());
        assert!(mgr.get(&token).is_none());
    }
}
