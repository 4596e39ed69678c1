//! Messages waiting to be pushed to connection queues.

use std::collections::HashMap;

use fairway_protocol::ServerMessage;
use fairway_transport::ConnectionId;
use tokio::sync::mpsc::error::TrySendError;

use crate::hub::ConnectionEntry;

/// Collects `(connection, message)` pairs while the hub mutates state.
///
/// Nothing is sent until [`deliver`](Self::deliver) runs, after the
/// command that produced the messages has finished.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    messages: Vec<(ConnectionId, ServerMessage)>,
}

impl Outbox {
    pub(crate) fn push(&mut self, conn: ConnectionId, message: ServerMessage) {
        self.messages.push((conn, message));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    /// Pushes every message without waiting and returns the connections
    /// whose queue was full. Once a connection overflows, the rest of its
    /// messages are dropped.
    pub(crate) fn deliver(
        self,
        connections: &HashMap<ConnectionId, ConnectionEntry>,
    ) -> Vec<ConnectionId> {
        let mut evicted: Vec<ConnectionId> = Vec::new();

        for (conn, message) in self.messages {
            if evicted.contains(&conn) {
                continue;
            }
            let Some(entry) = connections.get(&conn) else {
                continue;
            };
            match entry.outbound.try_send(message) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => evicted.push(conn),
                Err(TrySendError::Closed(_)) => {
                    // The writer is gone; the handler's unregister follows.
                    tracing::debug!(%conn, "outbound queue closed");
                }
            }
        }

        evicted
    }
}
