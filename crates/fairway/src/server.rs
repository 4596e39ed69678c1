//! `FairwayServer` builder and server loop.
//!
//! This is the entry point for running a fairway hub. It ties together
//! all the layers: transport → protocol → hub (sessions, rooms, games).

use std::sync::Arc;

use fairway_protocol::{Codec, JsonCodec};
use fairway_room::{GameStore, InMemoryGameStore};
use fairway_session::{PlayerIdGenerator, SessionConfig, WhimsicalIdGenerator};
use fairway_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::hub::{spawn_hub, HubConfig, HubHandle};
use crate::FairwayError;

/// Builder for configuring and starting a fairway server.
///
/// # Example
///
/// ```rust,no_run
/// use fairway::prelude::*;
///
/// # async fn run() -> Result<(), FairwayError> {
/// let server = FairwayServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct FairwayServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    hub_config: HubConfig,
    id_generator: Option<Box<dyn PlayerIdGenerator>>,
    store: Option<Box<dyn GameStore>>,
}

impl FairwayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
            hub_config: HubConfig::default(),
            id_generator: None,
            store: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets token lifetime and reconnect grace.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets queue sizes, idle timeout, and room limits.
    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.hub_config = config;
        self
    }

    /// Replaces the default whimsical player names.
    pub fn id_generator(mut self, ids: impl PlayerIdGenerator) -> Self {
        self.id_generator = Some(Box::new(ids));
        self
    }

    /// Replaces the default in-memory store for finished games.
    pub fn store(mut self, store: impl GameStore) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Binds the listener and starts the hub task.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<FairwayServer<JsonCodec>, FairwayError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let ids = self
            .id_generator
            .unwrap_or_else(|| Box::new(WhimsicalIdGenerator));
        let store = self
            .store
            .unwrap_or_else(|| Box::new(InMemoryGameStore::new()));
        let config = self.hub_config.clone();
        let hub = spawn_hub(self.hub_config, self.session_config, ids, store);

        Ok(FairwayServer {
            transport,
            hub,
            codec: Arc::new(JsonCodec),
            config,
        })
    }
}

impl Default for FairwayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound fairway server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct FairwayServer<C: Codec> {
    transport: WebSocketTransport,
    hub: HubHandle,
    codec: Arc<C>,
    config: HubConfig,
}

impl FairwayServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> FairwayServerBuilder {
        FairwayServerBuilder::new()
    }
}

impl<C: Codec> FairwayServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the hub, for snapshots and history lookups.
    pub fn hub(&self) -> HubHandle {
        self.hub.clone()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), FairwayError> {
        tracing::info!("fairway server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let hub = self.hub.clone();
                    let codec = Arc::clone(&self.codec);
                    let (buffer, idle) = (self.config.outbound_buffer, self.config.idle_timeout);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, hub, codec, buffer, idle).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
