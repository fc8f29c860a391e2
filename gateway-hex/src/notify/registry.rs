//! Connection registry.
//!
//! Tracks live connections and the topics each has joined. Both tables are
//! sharded maps, so joins and leaves on unrelated topics never contend on a
//! common lock. No guard is ever held across an await point or while a
//! guard on the other table is held.

use std::collections::HashSet;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use super::NotifyError;
use super::topic::{ServerMessage, Topic};

/// Unique identifier for a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random ConnectionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages a connection may have queued before further sends are refused.
pub const OUTBOX_CAPACITY: usize = 1000;

/// Receiving half of a connection's outbound queue, drained by the transport.
pub type Outbox = mpsc::Receiver<ServerMessage>;

/// A live connection, owned by the transport.
///
/// Messages pushed through the connection are queued in order and written by
/// the transport's writer task. The queue holds at most its capacity; a send
/// to a full queue fails with `Backpressure` instead of waiting. Dropping the
/// last `Connection` closes the queue.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    sender: mpsc::Sender<ServerMessage>,
}

impl Connection {
    /// Opens a connection with the default outbound queue capacity.
    pub fn open() -> (Self, Outbox) {
        Self::with_capacity(OUTBOX_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, Outbox) {
        let (sender, outbox) = mpsc::channel(capacity);
        (
            Self {
                id: ConnectionId::new(),
                sender,
            },
            outbox,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a message for this connection only.
    pub fn send(&self, message: ServerMessage) -> Result<(), NotifyError> {
        enqueue(self.id, &self.sender, message)
    }

    pub fn downgrade(&self) -> ConnectionRef {
        ConnectionRef {
            id: self.id,
            sender: self.sender.downgrade(),
        }
    }
}

/// Non-owning membership record for a connection.
///
/// Holding a `ConnectionRef` never keeps a connection alive; delivery to a
/// connection the transport has dropped fails with `ConnectionClosed`.
#[derive(Debug, Clone)]
pub struct ConnectionRef {
    id: ConnectionId,
    sender: mpsc::WeakSender<ServerMessage>,
}

impl ConnectionRef {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn deliver(&self, message: ServerMessage) -> Result<(), NotifyError> {
        let sender = self
            .sender
            .upgrade()
            .ok_or(NotifyError::ConnectionClosed(self.id))?;
        enqueue(self.id, &sender, message)
    }
}

fn enqueue(
    id: ConnectionId,
    sender: &mpsc::Sender<ServerMessage>,
    message: ServerMessage,
) -> Result<(), NotifyError> {
    sender.try_send(message).map_err(|e| match e {
        TrySendError::Full(_) => NotifyError::Backpressure(id),
        TrySendError::Closed(_) => NotifyError::ConnectionClosed(id),
    })
}

#[derive(Debug)]
struct Membership {
    handle: ConnectionRef,
    topics: HashSet<Topic>,
}

/// Registry of live connections and topic memberships.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Membership>,
    topics: DashMap<Topic, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection with no subscriptions. Re-registering is a no-op.
    pub fn register(&self, connection: &Connection) {
        self.connections
            .entry(connection.id())
            .or_insert_with(|| Membership {
                handle: connection.downgrade(),
                topics: HashSet::new(),
            });
    }

    /// Removes a connection and every membership it holds.
    ///
    /// Returns the number of topics it was removed from; 0 when the
    /// connection was unknown, so repeated calls are harmless.
    pub fn unregister(&self, id: ConnectionId) -> usize {
        let Some((_, membership)) = self.connections.remove(&id) else {
            return 0;
        };

        for topic in &membership.topics {
            self.remove_member(topic, id);
        }
        membership.topics.len()
    }

    /// Adds `id` to `topic`, creating the topic on first join.
    ///
    /// Returns false when the connection is unknown or already a member.
    pub fn join(&self, id: ConnectionId, topic: &Topic) -> bool {
        let added = match self.connections.get_mut(&id) {
            Some(mut membership) => membership.topics.insert(topic.clone()),
            None => return false,
        };

        self.topics.entry(topic.clone()).or_default().insert(id);

        // A concurrent unregister may have run between the two updates.
        if !self.connections.contains_key(&id) {
            self.remove_member(topic, id);
            return false;
        }
        added
    }

    /// Removes `id` from `topic`; the topic is pruned once empty.
    ///
    /// Returns false when the connection was not a member.
    pub fn leave(&self, id: ConnectionId, topic: &Topic) -> bool {
        if let Some(mut membership) = self.connections.get_mut(&id) {
            membership.topics.remove(topic);
        }
        self.remove_member(topic, id)
    }

    /// Snapshot of the current subscribers of `topic`.
    pub fn members_of(&self, topic: &Topic) -> Vec<ConnectionRef> {
        let ids: Vec<ConnectionId> = match self.topics.get(topic) {
            Some(members) => members.iter().copied().collect(),
            None => return Vec::new(),
        };

        ids.into_iter()
            .filter_map(|id| self.connections.get(&id).map(|m| m.handle.clone()))
            .collect()
    }

    pub fn is_member(&self, id: ConnectionId, topic: &Topic) -> bool {
        self.topics
            .get(topic)
            .is_some_and(|members| members.contains(&id))
    }

    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of topics with at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    fn remove_member(&self, topic: &Topic, id: ConnectionId) -> bool {
        match self.topics.entry(topic.clone()) {
            Entry::Occupied(mut entry) => {
                let removed = entry.get_mut().remove(&id);
                if entry.get().is_empty() {
                    entry.remove();
                }
                removed
            }
            Entry::Vacant(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn topic(id: &str) -> Topic {
        Topic::payment(id).unwrap()
    }

    #[test]
    fn test_join_creates_topic_lazily() {
        let registry = ConnectionRegistry::new();
        let (conn, _outbox) = Connection::open();
        registry.register(&conn);

        assert_eq!(registry.topic_count(), 0);
        assert!(registry.join(conn.id(), &topic("pay-1")));
        assert_eq!(registry.topic_count(), 1);
        assert!(registry.is_member(conn.id(), &topic("pay-1")));
    }

    #[test]
    fn test_join_unknown_connection_is_ignored() {
        let registry = ConnectionRegistry::new();
        let (conn, _outbox) = Connection::open();

        assert!(!registry.join(conn.id(), &topic("pay-1")));
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn test_leave_prunes_empty_topic() {
        let registry = ConnectionRegistry::new();
        let (a, _a_outbox) = Connection::open();
        let (b, _b_outbox) = Connection::open();
        registry.register(&a);
        registry.register(&b);

        registry.join(a.id(), &topic("pay-1"));
        registry.join(b.id(), &topic("pay-1"));

        assert!(registry.leave(a.id(), &topic("pay-1")));
        assert_eq!(registry.topic_count(), 1);

        assert!(registry.leave(b.id(), &topic("pay-1")));
        assert_eq!(registry.topic_count(), 0);

        // Second leave is a no-op
        assert!(!registry.leave(b.id(), &topic("pay-1")));
    }

    #[test]
    fn test_unregister_removes_all_memberships() {
        let registry = ConnectionRegistry::new();
        let (conn, _outbox) = Connection::open();
        registry.register(&conn);
        registry.join(conn.id(), &topic("pay-1"));
        registry.join(conn.id(), &topic("pay-2"));

        assert_eq!(registry.unregister(conn.id()), 2);
        assert_eq!(registry.topic_count(), 0);
        assert_eq!(registry.connection_count(), 0);

        // Idempotent
        assert_eq!(registry.unregister(conn.id()), 0);
    }

    #[test]
    fn test_members_of_is_a_snapshot() {
        let registry = ConnectionRegistry::new();
        let (conn, _outbox) = Connection::open();
        registry.register(&conn);
        registry.join(conn.id(), &topic("pay-1"));

        let members = registry.members_of(&topic("pay-1"));
        registry.leave(conn.id(), &topic("pay-1"));

        assert_eq!(members.len(), 1);
        assert!(registry.members_of(&topic("pay-1")).is_empty());
    }

    #[test]
    fn test_ref_does_not_keep_connection_alive() {
        let (conn, mut outbox) = Connection::open();
        let handle = conn.downgrade();

        handle
            .deliver(ServerMessage::new("ping", serde_json::Value::Null))
            .unwrap();
        drop(conn);

        assert!(outbox.try_recv().is_ok());
        assert!(matches!(
            handle.deliver(ServerMessage::new("ping", serde_json::Value::Null)),
            Err(NotifyError::ConnectionClosed(_))
        ));
    }

    #[test]
    fn test_full_outbox_refuses_instead_of_growing() {
        let (conn, mut outbox) = Connection::with_capacity(2);
        let handle = conn.downgrade();

        handle.deliver(ServerMessage::new("a", serde_json::Value::Null)).unwrap();
        conn.send(ServerMessage::new("b", serde_json::Value::Null)).unwrap();

        assert!(matches!(
            handle.deliver(ServerMessage::new("c", serde_json::Value::Null)),
            Err(NotifyError::Backpressure(id)) if id == conn.id()
        ));
        assert!(matches!(
            conn.send(ServerMessage::new("d", serde_json::Value::Null)),
            Err(NotifyError::Backpressure(_))
        ));

        assert_eq!(outbox.try_recv().unwrap().event, "a");
        // Draining frees a slot
        handle.deliver(ServerMessage::new("e", serde_json::Value::Null)).unwrap();
        assert_eq!(outbox.try_recv().unwrap().event, "b");
        assert_eq!(outbox.try_recv().unwrap().event, "e");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_on_same_topic() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut connections = Vec::new();
        let mut outboxes = Vec::new();
        for _ in 0..64 {
            let (conn, outbox) = Connection::open();
            registry.register(&conn);
            connections.push(conn);
            outboxes.push(outbox);
        }

        let mut tasks = Vec::new();
        for conn in &connections {
            let registry = Arc::clone(&registry);
            let id = conn.id();
            tasks.push(tokio::spawn(async move {
                registry.join(id, &Topic::payment("shared").unwrap())
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap());
        }

        assert_eq!(registry.members_of(&topic("shared")).len(), 64);
    }
}
