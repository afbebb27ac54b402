//! Outbound fan-out.
//!
//! Every live connection has a bounded outbox drained by its writer task.
//! Sends never block the game actor: a connection whose outbox is closed or
//! full is reported back as failed.

use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::network::protocol::ServerMessage;
use crate::network::session::ConnectionId;

/// Outboxes of all live connections.
#[derive(Debug, Default)]
pub struct Broadcaster {
    outboxes: BTreeMap<ConnectionId, mpsc::Sender<ServerMessage>>,
}

impl Broadcaster {
    /// Create an empty broadcaster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the outbox of `conn`.
    pub fn attach(&mut self, conn: ConnectionId, outbox: mpsc::Sender<ServerMessage>) {
        self.outboxes.insert(conn, outbox);
    }

    /// Drop the outbox of `conn`. The writer task ends once its queue drains.
    pub fn detach(&mut self, conn: ConnectionId) -> bool {
        self.outboxes.remove(&conn).is_some()
    }

    /// Whether `conn` has an outbox.
    pub fn is_attached(&self, conn: ConnectionId) -> bool {
        self.outboxes.contains_key(&conn)
    }

    /// Number of attached connections.
    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    /// Whether no connection is attached.
    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }

    /// Queue `msg` for one connection. Returns false if it could not be
    /// queued.
    pub fn send_to(&self, conn: ConnectionId, msg: ServerMessage) -> bool {
        match self.outboxes.get(&conn) {
            Some(outbox) => match outbox.try_send(msg) {
                Ok(()) => true,
                Err(e) => {
                    warn!(%conn, "Failed to queue message: {}", e);
                    false
                }
            },
            None => {
                debug!(%conn, "No outbox for connection");
                false
            }
        }
    }

    /// Queue the same message for every connection. Returns the connections
    /// that could not take it.
    pub fn broadcast(&self, msg: &ServerMessage) -> Vec<ConnectionId> {
        let mut failed = Vec::new();

        for (conn, outbox) in &self.outboxes {
            if let Err(e) = outbox.try_send(msg.clone()) {
                warn!(%conn, "Broadcast failed: {}", e);
                failed.push(*conn);
            }
        }

        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::PlayerSlot;

    fn assign(slot: PlayerSlot) -> ServerMessage {
        ServerMessage::AssignPlayer { player: slot }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let mut broadcaster = Broadcaster::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        broadcaster.attach(ConnectionId(1), tx1);
        broadcaster.attach(ConnectionId(2), tx2);

        let failed = broadcaster.broadcast(&assign(PlayerSlot::Zero));
        assert!(failed.is_empty());

        assert_eq!(rx1.recv().await, Some(assign(PlayerSlot::Zero)));
        assert_eq!(rx2.recv().await, Some(assign(PlayerSlot::Zero)));
    }

    #[tokio::test]
    async fn test_closed_outbox_reported() {
        let mut broadcaster = Broadcaster::new();
        let (tx1, rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        broadcaster.attach(ConnectionId(1), tx1);
        broadcaster.attach(ConnectionId(2), tx2);
        drop(rx1);

        let failed = broadcaster.broadcast(&assign(PlayerSlot::One));
        assert_eq!(failed, vec![ConnectionId(1)]);
        assert_eq!(rx2.recv().await, Some(assign(PlayerSlot::One)));
    }

    #[tokio::test]
    async fn test_full_outbox_reported() {
        let mut broadcaster = Broadcaster::new();
        let (tx, _rx) = mpsc::channel(1);
        broadcaster.attach(ConnectionId(7), tx);

        assert!(broadcaster.send_to(ConnectionId(7), assign(PlayerSlot::Zero)));
        assert!(!broadcaster.send_to(ConnectionId(7), assign(PlayerSlot::Zero)));
        assert_eq!(broadcaster.broadcast(&assign(PlayerSlot::Zero)), vec![ConnectionId(7)]);
    }

    #[tokio::test]
    async fn test_detach() {
        let mut broadcaster = Broadcaster::new();
        let (tx, mut rx) = mpsc::channel(4);
        broadcaster.attach(ConnectionId(3), tx);
        assert!(broadcaster.is_attached(ConnectionId(3)));
        assert_eq!(broadcaster.len(), 1);

        assert!(broadcaster.detach(ConnectionId(3)));
        assert!(!broadcaster.detach(ConnectionId(3)));
        assert!(broadcaster.is_empty());
        assert!(!broadcaster.send_to(ConnectionId(3), assign(PlayerSlot::Zero)));
        assert_eq!(rx.recv().await, None);
    }
}
