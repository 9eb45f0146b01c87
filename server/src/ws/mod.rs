pub mod actor;
pub mod handler;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Client identity, taken from the `/ws/{client_id}` path segment.
pub type ClientId = u64;

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push messages to a specific client.
/// Sending is synchronous; the per-connection writer task drains the queue,
/// so delivery to a single client is FIFO in send order.
pub type ConnectionSender = mpsc::UnboundedSender<Message>;

/// Errors from registry operations against a specific client id.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The id has no registered connection.
    #[error("client {0} is not registered")]
    NotFound(ClientId),
    /// The connection exists but its writer task has gone away.
    #[error("connection for client {0} is closed")]
    ChannelClosed(ClientId),
}

/// Connection registry: the authoritative set of active client channels.
///
/// One connection per client id. Constructed once by `main` and shared as
/// `Arc<ConnectionRegistry>` through `AppState`; DashMap serializes inserts
/// and removals against concurrent broadcast iteration.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ClientId, ConnectionSender>,
}

impl ConnectionRegistry {
    /// Create a new empty connection registry.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a connection sender under `id`.
    ///
    /// Last-write-wins: a second registration under the same id replaces the
    /// first, and the replaced session's eventual cleanup removes whatever
    /// entry is present at that time.
    pub fn register(&self, id: ClientId, sender: ConnectionSender) {
        if self.connections.insert(id, sender).is_some() {
            tracing::warn!(client_id = id, "Replaced existing connection entry");
        }
    }

    /// Remove the connection for `id`.
    /// Fails with `NotFound` if the entry was already removed.
    pub fn unregister(&self, id: ClientId) -> Result<(), RegistryError> {
        self.connections
            .remove(&id)
            .map(|_| ())
            .ok_or(RegistryError::NotFound(id))
    }

    /// Send `text` to the single client registered under `id`.
    pub fn unicast(&self, id: ClientId, text: &str) -> Result<(), RegistryError> {
        let sender = self
            .connections
            .get(&id)
            .ok_or(RegistryError::NotFound(id))?;
        sender
            .send(Message::Text(text.into()))
            .map_err(|_| RegistryError::ChannelClosed(id))
    }

    /// Send `text` to every registered client whose id is not in `excluded`.
    ///
    /// Iterates a point-in-time snapshot, so connects and disconnects racing
    /// with the fan-out never invalidate the iteration; entries added
    /// mid-broadcast may or may not receive the message. The first closed
    /// channel aborts the remaining sends and surfaces to the caller.
    pub fn broadcast(&self, text: &str, excluded: &[ClientId]) -> Result<(), RegistryError> {
        let snapshot: Vec<(ClientId, ConnectionSender)> = self
            .connections
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (id, sender) in snapshot {
            if excluded.contains(&id) {
                continue;
            }
            sender
                .send(Message::Text(text.into()))
                .map_err(|_| RegistryError::ChannelClosed(id))?;
        }
        Ok(())
    }

    /// Number of currently registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn channel() -> (ConnectionSender, UnboundedReceiver<Message>) {
        mpsc::unbounded_channel()
    }

    /// Pop the next queued message as text, if any.
    fn recv_text(rx: &mut UnboundedReceiver<Message>) -> Option<String> {
        match rx.try_recv() {
            Ok(Message::Text(text)) => Some(text.to_string()),
            _ => None,
        }
    }

    #[test]
    fn unicast_delivers_exactly_once() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = channel();
        registry.register(1, tx);

        registry.unicast(1, "hello").unwrap();

        assert_eq!(recv_text(&mut rx).as_deref(), Some("hello"));
        assert!(recv_text(&mut rx).is_none());
    }

    #[test]
    fn unicast_unknown_client_fails() {
        let registry = ConnectionRegistry::new();
        let err = registry.unicast(7, "hello").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(7)));
    }

    #[test]
    fn broadcast_respects_exclusions() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();
        let (tx3, mut rx3) = channel();
        registry.register(1, tx1);
        registry.register(2, tx2);
        registry.register(3, tx3);

        registry.broadcast("fan-out", &[2]).unwrap();

        assert_eq!(recv_text(&mut rx1).as_deref(), Some("fan-out"));
        assert!(recv_text(&mut rx2).is_none());
        assert_eq!(recv_text(&mut rx3).as_deref(), Some("fan-out"));
    }

    #[test]
    fn broadcast_without_exclusions_reaches_everyone() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();
        registry.register(1, tx1);
        registry.register(2, tx2);

        registry.broadcast("all", &[]).unwrap();

        assert_eq!(recv_text(&mut rx1).as_deref(), Some("all"));
        assert_eq!(recv_text(&mut rx2).as_deref(), Some("all"));
    }

    #[test]
    fn unregister_removes_reachability() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        registry.register(1, tx);

        registry.unregister(1).unwrap();

        let err = registry.unicast(1, "gone").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(1)));
    }

    #[test]
    fn double_unregister_leaves_others_intact() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = channel();
        let (tx2, mut rx2) = channel();
        registry.register(1, tx1);
        registry.register(2, tx2);

        registry.unregister(1).unwrap();
        let err = registry.unregister(1).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(1)));

        registry.unicast(2, "still here").unwrap();
        assert_eq!(recv_text(&mut rx2).as_deref(), Some("still here"));
    }

    #[test]
    fn register_overwrites_existing_entry() {
        let registry = ConnectionRegistry::new();
        let (old_tx, mut old_rx) = channel();
        let (new_tx, mut new_rx) = channel();
        registry.register(1, old_tx);
        registry.register(1, new_tx);

        assert_eq!(registry.len(), 1);
        registry.unicast(1, "who gets this").unwrap();

        assert!(recv_text(&mut old_rx).is_none());
        assert_eq!(recv_text(&mut new_rx).as_deref(), Some("who gets this"));
    }

    #[test]
    fn churn_does_not_affect_other_clients() {
        let registry = ConnectionRegistry::new();
        let (tx_b, mut rx_b) = channel();
        registry.register(2, tx_b);

        for _ in 0..3 {
            let (tx_a, _rx_a) = channel();
            registry.register(1, tx_a);
            registry.unregister(1).unwrap();
        }

        registry.unicast(2, "unaffected").unwrap();
        assert_eq!(recv_text(&mut rx_b).as_deref(), Some("unaffected"));
    }

    #[test]
    fn broadcast_surfaces_closed_channel() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = channel();
        registry.register(1, tx);
        drop(rx);

        let err = registry.broadcast("anyone there", &[]).unwrap_err();
        assert!(matches!(err, RegistryError::ChannelClosed(1)));
    }
}
