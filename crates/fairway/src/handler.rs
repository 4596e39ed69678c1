//! Per-connection handler: decode frames in, encode messages out.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the hub along with a bounded outbound queue
//!   2. Spawn a writer that drains the queue onto the socket
//!   3. Loop: receive frames → decode → forward to the hub
//!   4. On close, error, or idle timeout → unregister (via drop guard)

use std::sync::Arc;
use std::time::Duration;

use fairway_protocol::{decode_client_message, Codec, ServerMessage};
use fairway_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::hub::HubHandle;
use crate::FairwayError;

/// Drop guard that tells the hub the connection is gone.
///
/// Fires even if the handler panics. `Drop` is synchronous, so the
/// unregister is sent from a fire-and-forget task.
struct ConnectionGuard {
    conn_id: ConnectionId,
    hub: HubHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let hub = self.hub.clone();
        tokio::spawn(async move {
            let _ = hub.unregister(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    hub: HubHandle,
    codec: Arc<C>,
    outbound_buffer: usize,
    idle_timeout: Duration,
) -> Result<(), FairwayError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (outbound, queue) = mpsc::channel(outbound_buffer);
    hub.register(conn_id, outbound).await?;
    let _guard = ConnectionGuard {
        conn_id,
        hub: hub.clone(),
    };

    let mut writer = spawn_writer(Arc::clone(&conn), Arc::clone(&codec), queue);

    loop {
        let received = tokio::select! {
            _ = &mut writer => {
                // Queue closed by the hub (eviction) or the socket failed.
                tracing::debug!(%conn_id, "writer finished");
                break;
            }
            received = tokio::time::timeout(idle_timeout, conn.recv()) => received,
        };

        let data = match received {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection timed out");
                break;
            }
        };

        match decode_client_message(codec.as_ref(), &data) {
            Ok(message) => hub.inbound(conn_id, message).await?,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode frame");
                hub.reject(conn_id, e.to_string()).await?;
            }
        }
    }

    writer.abort();
    let _ = conn.close().await;

    // _guard drops here → unregister fires.
    Ok(())
}

/// Drains the outbound queue onto the socket until either side closes.
fn spawn_writer<C: Codec>(
    conn: Arc<WebSocketConnection>,
    codec: Arc<C>,
    mut queue: mpsc::Receiver<ServerMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let conn_id = conn.id();
        while let Some(message) = queue.recv().await {
            let bytes = match codec.encode(&message) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(%conn_id, error = %e, "failed to encode message");
                    continue;
                }
            };
            if let Err(e) = conn.send(&bytes).await {
                tracing::debug!(%conn_id, error = %e, "send failed");
                return;
            }
        }
    })
}
