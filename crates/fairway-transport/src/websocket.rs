//! WebSocket transport built on `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// How long a freshly accepted socket gets to finish the upgrade.
pub const DEFAULT_UPGRADE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<TcpStream>;

/// Listens for browser clients and upgrades them to WebSocket.
pub struct WebSocketTransport {
    listener: TcpListener,
    upgrade_timeout: Duration,
}

impl WebSocketTransport {
    /// Binds the listener. Pass port 0 to let the OS pick one.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "websocket transport listening");
        Ok(Self {
            listener,
            upgrade_timeout: DEFAULT_UPGRADE_TIMEOUT,
        })
    }

    /// Caps how long one client may stall the upgrade handshake.
    pub fn with_upgrade_timeout(mut self, timeout: Duration) -> Self {
        self.upgrade_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    /// Accepts the next socket and completes its upgrade.
    ///
    /// A socket that fails or stalls the upgrade is reported as
    /// `AcceptFailed`; the listener itself stays usable.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (socket, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let upgrade = tokio_tungstenite::accept_async(socket);
        let ws = match tokio::time::timeout(self.upgrade_timeout, upgrade).await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => {
                return Err(TransportError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    e,
                )));
            }
            Err(_) => {
                return Err(TransportError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("upgrade from {peer} timed out"),
                )));
            }
        };

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "websocket upgraded");

        // Separate locks: the writer task sends while the reader waits.
        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            peer,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// One upgraded client socket.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// The client's address, for logging.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

fn io_error(kind: std::io::ErrorKind, e: tokio_tungstenite::tungstenite::Error) -> std::io::Error {
    std::io::Error::new(kind, e)
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    /// Sends `data` as a text frame when it is valid UTF-8 (every JSON
    /// message is), otherwise as a binary frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::text(text.to_owned()),
            Err(_) => Message::binary(data.to_vec()),
        };
        let mut sink = self.sink.lock().await;
        sink.send(msg)
            .await
            .map_err(|e| TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e)))
    }

    /// Next text or binary frame as bytes. Control frames are skipped.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        while let Some(frame) = stream.next().await {
            let frame = frame.map_err(|e| {
                TransportError::ReceiveFailed(io_error(std::io::ErrorKind::ConnectionReset, e))
            })?;
            match frame {
                Message::Text(text) => return Ok(Some(text.as_bytes().to_vec())),
                Message::Binary(data) => return Ok(Some(data.to_vec())),
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        let mut sink = self.sink.lock().await;
        sink.close()
            .await
            .map_err(|e| TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e)))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
