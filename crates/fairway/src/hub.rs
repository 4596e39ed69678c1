//! The hub: a single task that owns every room, game, and session.
//!
//! Connection handlers never touch shared state. They hold a [`HubHandle`]
//! and send it commands; the hub task processes those commands one at a
//! time, in arrival order, so two players acting on the same game can
//! never race. Each command runs to completion without awaiting.
//!
//! ```text
//! handler ─┐                         ┌─→ outbound queue (conn 1)
//! handler ─┼─→ mpsc ─→ [hub task] ───┼─→ outbound queue (conn 2)
//! timer  ──┘                         └─→ outbound queue (conn 3)
//! ```
//!
//! Messages produced while handling a command are collected in an
//! [`Outbox`](crate::outbox::Outbox) and pushed to the per-connection
//! queues only after the state change is complete. A push never waits: a
//! queue that is full gets its connection evicted.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use fairway_protocol::{
    ClientMessage, GameId, GameResult, PlayerId, RoomId, ServerMessage,
};
use fairway_room::{GameStore, Room, RoomConfig};
use fairway_session::{PlayerIdGenerator, SessionConfig, SessionManager};
use fairway_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::outbox::Outbox;
use crate::FairwayError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Buffer sizes and timeouts for the hub and its connections.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of the hub's command channel.
    pub command_buffer: usize,

    /// Capacity of each connection's outbound queue. A connection whose
    /// queue fills up is evicted.
    pub outbound_buffer: usize,

    /// A connection that sends nothing for this long is dropped.
    pub idle_timeout: Duration,

    /// Limits applied to every room the hub creates.
    pub room: RoomConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            command_buffer: 256,
            outbound_buffer: 64,
            idle_timeout: Duration::from_secs(60),
            room: RoomConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

/// A player's binding to the hub. Outlives the connection: it survives a
/// disconnect for the grace period and is rebound on reconnect.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub player_id: PlayerId,
    pub token: String,
    pub token_expires_at: Instant,
    pub room_id: Option<RoomId>,
    /// The game the player is currently playing.
    pub game_id: Option<GameId>,
    /// The game the player last finished, for `newGameStarted`.
    pub last_game_id: Option<GameId>,
    /// `None` while inside a grace period.
    pub connection: Option<ConnectionId>,
    pub joined_at: SystemTime,
    pub last_action: SystemTime,
}

impl ClientContext {
    pub(crate) fn new(
        player_id: PlayerId,
        token: String,
        token_expires_at: Instant,
        connection: ConnectionId,
    ) -> Self {
        let now = SystemTime::now();
        Self {
            player_id,
            token,
            token_expires_at,
            room_id: None,
            game_id: None,
            last_game_id: None,
            connection: Some(connection),
            joined_at: now,
            last_action: now,
        }
    }
}

/// A live connection as the hub sees it.
pub(crate) struct ConnectionEntry {
    pub(crate) outbound: mpsc::Sender<ServerMessage>,
    /// Set once the connection has authenticated.
    pub(crate) player: Option<PlayerId>,
}

/// A copy of the hub's state, for inspection and invariant checks.
#[derive(Debug, Clone)]
pub struct HubSnapshot {
    pub rooms: HashMap<RoomId, Room>,
    pub contexts: HashMap<PlayerId, ClientContext>,
}

// ---------------------------------------------------------------------------
// Commands and handle
// ---------------------------------------------------------------------------

pub(crate) enum HubCommand {
    /// A transport connection opened.
    Register {
        conn: ConnectionId,
        outbound: mpsc::Sender<ServerMessage>,
    },

    /// A transport connection closed.
    Unregister { conn: ConnectionId },

    /// A decoded client message.
    Inbound {
        conn: ConnectionId,
        message: ClientMessage,
    },

    /// A frame that could not be decoded; `message` is the error text.
    Rejected { conn: ConnectionId, message: String },

    /// A reconnect grace period ran out.
    GraceExpired { token: String, epoch: u64 },

    Snapshot { reply: oneshot::Sender<HubSnapshot> },

    PlayerHistory {
        player_id: PlayerId,
        reply: oneshot::Sender<Vec<GameResult>>,
    },
}

/// Handle to the running hub task.
///
/// Cheap to clone; it's just an `mpsc::Sender` wrapper. The hub task
/// stops once every handle has been dropped.
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    async fn send(&self, cmd: HubCommand) -> Result<(), FairwayError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| FairwayError::HubUnavailable)
    }

    /// Registers a connection and the queue its messages go to.
    pub async fn register(
        &self,
        conn: ConnectionId,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Result<(), FairwayError> {
        self.send(HubCommand::Register { conn, outbound }).await
    }

    /// Reports a closed connection. Starts the grace period if it was
    /// authenticated.
    pub async fn unregister(&self, conn: ConnectionId) -> Result<(), FairwayError> {
        self.send(HubCommand::Unregister { conn }).await
    }

    /// Delivers a decoded client message.
    pub async fn inbound(
        &self,
        conn: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), FairwayError> {
        self.send(HubCommand::Inbound { conn, message }).await
    }

    /// Reports an undecodable frame; the client gets `message` back as an
    /// error.
    pub async fn reject(
        &self,
        conn: ConnectionId,
        message: impl Into<String>,
    ) -> Result<(), FairwayError> {
        self.send(HubCommand::Rejected {
            conn,
            message: message.into(),
        })
        .await
    }

    /// A copy of every room and client context.
    pub async fn snapshot(&self) -> Result<HubSnapshot, FairwayError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| FairwayError::HubUnavailable)
    }

    /// Every stored game result `player_id` took part in, oldest first.
    pub async fn player_history(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<GameResult>, FairwayError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::PlayerHistory { player_id, reply })
            .await?;
        rx.await.map_err(|_| FairwayError::HubUnavailable)
    }
}

/// Spawns the hub task and returns a handle to it.
pub fn spawn_hub(
    config: HubConfig,
    session_config: SessionConfig,
    ids: Box<dyn PlayerIdGenerator>,
    store: Box<dyn GameStore>,
) -> HubHandle {
    let (sender, receiver) = mpsc::channel(config.command_buffer);
    let hub = Hub {
        config,
        rooms: HashMap::new(),
        connections: HashMap::new(),
        contexts: HashMap::new(),
        sessions: SessionManager::new(session_config),
        cleanup: HashMap::new(),
        ids,
        store,
        commands: sender.downgrade(),
    };
    tokio::spawn(hub.run(receiver));
    HubHandle { sender }
}

// ---------------------------------------------------------------------------
// Hub task
// ---------------------------------------------------------------------------

pub(crate) struct Hub {
    pub(crate) config: HubConfig,
    pub(crate) rooms: HashMap<RoomId, Room>,
    pub(crate) connections: HashMap<ConnectionId, ConnectionEntry>,
    pub(crate) contexts: HashMap<PlayerId, ClientContext>,
    pub(crate) sessions: SessionManager,
    /// Pending grace timers, keyed by session token.
    pub(crate) cleanup: HashMap<String, AbortHandle>,
    pub(crate) ids: Box<dyn PlayerIdGenerator>,
    pub(crate) store: Box<dyn GameStore>,
    /// For grace timers to post back. Weak, so the hub does not keep its
    /// own channel open.
    commands: mpsc::WeakSender<HubCommand>,
}

impl Hub {
    async fn run(mut self, mut receiver: mpsc::Receiver<HubCommand>) {
        tracing::info!("hub started");

        while let Some(cmd) = receiver.recv().await {
            let mut out = Outbox::default();
            self.handle(cmd, &mut out);
            self.flush(out);
        }

        for (_, timer) in self.cleanup.drain() {
            timer.abort();
        }
        tracing::info!("hub stopped");
    }

    fn handle(&mut self, cmd: HubCommand, out: &mut Outbox) {
        match cmd {
            HubCommand::Register { conn, outbound } => {
                tracing::debug!(%conn, "connection registered");
                self.connections.insert(
                    conn,
                    ConnectionEntry {
                        outbound,
                        player: None,
                    },
                );
            }
            HubCommand::Unregister { conn } => self.on_disconnect(conn, out),
            HubCommand::Inbound { conn, message } => {
                self.dispatch(conn, message, out);
            }
            HubCommand::Rejected { conn, message } => {
                tracing::debug!(%conn, %message, "undecodable frame");
                out.push(conn, ServerMessage::error(message));
            }
            HubCommand::GraceExpired { token, epoch } => {
                self.on_grace_expired(&token, epoch, out);
            }
            HubCommand::Snapshot { reply } => {
                let _ = reply.send(HubSnapshot {
                    rooms: self.rooms.clone(),
                    contexts: self.contexts.clone(),
                });
            }
            HubCommand::PlayerHistory { player_id, reply } => {
                let tag = format!("player:{player_id}");
                let results = self
                    .store
                    .find_by_tag(&tag)
                    .into_iter()
                    .map(|record| record.result)
                    .collect();
                let _ = reply.send(results);
            }
        }
    }

    // -- Delivery ---------------------------------------------------------

    /// Pushes everything in `out`, then evicts every connection whose
    /// queue was full. Evicting can itself produce messages (the rest of
    /// the room hears about it), so this repeats until nothing is left.
    fn flush(&mut self, mut out: Outbox) {
        loop {
            let evicted = out.deliver(&self.connections);
            if evicted.is_empty() {
                return;
            }
            out = Outbox::default();
            for conn in evicted {
                self.evict(conn, &mut out);
            }
        }
    }

    /// Drops a connection whose queue overflowed, and its player with it.
    /// There is no grace period: the peer could not be kept in sync.
    fn evict(&mut self, conn: ConnectionId, out: &mut Outbox) {
        // Dropping the sender closes the queue, which stops the writer.
        let Some(entry) = self.connections.remove(&conn) else {
            return;
        };
        tracing::warn!(%conn, "outbound queue full, connection evicted");
        if let Some(player_id) = entry.player {
            self.purge_player(&player_id, out);
        }
    }

    // -- Disconnect and grace period --------------------------------------

    fn on_disconnect(&mut self, conn: ConnectionId, out: &mut Outbox) {
        let Some(entry) = self.connections.remove(&conn) else {
            return;
        };
        let Some(player_id) = entry.player else {
            tracing::debug!(%conn, "unauthenticated connection closed");
            return;
        };
        let Some((token, epoch)) = self.sessions.disconnect(conn) else {
            return;
        };

        let room_id = self.contexts.get_mut(&player_id).and_then(|ctx| {
            ctx.connection = None;
            ctx.room_id.clone()
        });
        if let Some(room_id) = room_id {
            if let Some(room) = self.rooms.get_mut(&room_id) {
                room.mark_disconnected(&player_id, SystemTime::now());
            }
            self.broadcast_room(&room_id, out);
            if let Some(game_id) = self.seated_game(&player_id) {
                self.broadcast_game(&room_id, &game_id, out);
            }
        }

        self.start_grace_timer(token, epoch);
    }

    fn start_grace_timer(&mut self, token: String, epoch: u64) {
        let Some(commands) = self.commands.upgrade() else {
            return;
        };
        let grace = self.sessions.config().reconnect_grace;
        let expired = HubCommand::GraceExpired {
            token: token.clone(),
            epoch,
        };
        let timer = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = commands.send(expired).await;
        });
        if let Some(previous) = self.cleanup.insert(token, timer.abort_handle()) {
            previous.abort();
        }
    }

    /// Cancels the grace timer for `token`, if one is pending.
    pub(crate) fn cancel_grace_timer(&mut self, token: &str) {
        if let Some(timer) = self.cleanup.remove(token) {
            timer.abort();
        }
    }

    fn on_grace_expired(&mut self, token: &str, epoch: u64, out: &mut Outbox) {
        // A reconnect in the meantime bumped the epoch or rebound the
        // session; the timer is stale.
        if !self.sessions.is_pending_expiry(token, epoch) {
            tracing::debug!(epoch, "stale grace timer ignored");
            return;
        }
        self.cleanup.remove(token);

        match self.sessions.get(token).map(|s| s.player_id.clone()) {
            Some(player_id) => {
                tracing::info!(%player_id, "grace period expired, removing player");
                self.purge_player(&player_id, out);
            }
            None => {
                self.sessions.discard(token);
            }
        }
    }

    /// Forgets a player entirely: session, context, seat, and membership.
    pub(crate) fn purge_player(&mut self, player_id: &PlayerId, out: &mut Outbox) {
        let Some(ctx) = self.contexts.remove(player_id) else {
            return;
        };
        self.sessions.discard(&ctx.token);
        self.cancel_grace_timer(&ctx.token);
        if let Some(entry) = ctx.connection.and_then(|c| self.connections.get_mut(&c)) {
            entry.player = None;
        }
        if let Some(room_id) = ctx.room_id {
            self.remove_from_room(player_id, &room_id, out);
        }
        tracing::info!(%player_id, "player removed");
    }

    // -- Lookups ----------------------------------------------------------

    /// The game `player_id` is seated in, according to their room.
    pub(crate) fn seated_game(&self, player_id: &PlayerId) -> Option<GameId> {
        let room_id = self.contexts.get(player_id)?.room_id.as_ref()?;
        self.rooms.get(room_id)?.seated_game_of(player_id).cloned()
    }

    /// The connection currently bound to `player_id`.
    pub(crate) fn connection_of(&self, player_id: &PlayerId) -> Option<ConnectionId> {
        self.contexts.get(player_id)?.connection
    }
}
