//! In-process presence registry.
//!
//! Maps a user id to the outbound handle of its single live connection. A
//! second connection for the same user replaces the first; the evicted handle
//! is returned to the caller so the old socket can be closed. Every
//! registration is tagged with a monotonically increasing connection id so a
//! late close from a replaced connection cannot knock out its successor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Outbound handle for a live connection's writer task.
pub type ConnHandle = mpsc::UnboundedSender<WsMessage>;

struct Entry {
    conn_id: u64,
    handle: ConnHandle,
}

/// Registry of online users and their connection handles.
pub struct Presence {
    entries: RwLock<HashMap<String, Entry>>,
    next_conn_id: AtomicU64,
}

impl Presence {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Register a connection for `user_id`, replacing any existing one.
    ///
    /// Returns the id assigned to this connection and, if the user was
    /// already online, the evicted handle.
    pub fn register(&self, user_id: &str, handle: ConnHandle) -> (u64, Option<ConnHandle>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let prior = self
            .entries
            .write()
            .insert(user_id.to_string(), Entry { conn_id, handle });
        (conn_id, prior.map(|e| e.handle))
    }

    /// Remove the registration if it still belongs to `conn_id`.
    ///
    /// Returns false when the entry was already replaced by a newer
    /// connection, in which case the caller must not announce the user as
    /// offline.
    pub fn unregister(&self, user_id: &str, conn_id: u64) -> bool {
        let mut entries = self.entries.write();
        match entries.get(user_id) {
            Some(entry) if entry.conn_id == conn_id => {
                entries.remove(user_id);
                true
            }
            _ => false,
        }
    }

    /// Look up the live handle for a user, if online.
    pub fn lookup(&self, user_id: &str) -> Option<ConnHandle> {
        self.entries.read().get(user_id).map(|e| e.handle.clone())
    }

    /// Snapshot of all live handles.
    pub fn handles(&self) -> Vec<ConnHandle> {
        self.entries.read().values().map(|e| e.handle.clone()).collect()
    }

    pub fn online_count(&self) -> usize {
        self.entries.read().len()
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (ConnHandle, mpsc::UnboundedReceiver<WsMessage>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_register_and_lookup() {
        let presence = Presence::new();
        let (tx, _rx) = handle();
        let (conn_id, evicted) = presence.register("u1", tx);
        assert!(evicted.is_none());
        assert!(presence.lookup("u1").is_some());
        assert!(presence.lookup("u2").is_none());
        assert_eq!(presence.online_count(), 1);
        assert!(presence.unregister("u1", conn_id));
        assert_eq!(presence.online_count(), 0);
    }

    #[test]
    fn test_second_registration_evicts_first() {
        let presence = Presence::new();
        let (tx_a, _rx_a) = handle();
        let (tx_b, mut rx_b) = handle();
        let (_id_a, _) = presence.register("u1", tx_a);
        let (_id_b, evicted) = presence.register("u1", tx_b);
        assert!(evicted.is_some());
        assert_eq!(presence.online_count(), 1);

        // The registered handle is the second connection's.
        presence
            .lookup("u1")
            .unwrap()
            .send(WsMessage::text("hi"))
            .unwrap();
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_stale_unregister_is_ignored() {
        let presence = Presence::new();
        let (tx_a, _rx_a) = handle();
        let (tx_b, _rx_b) = handle();
        let (id_a, _) = presence.register("u1", tx_a);
        let (id_b, _) = presence.register("u1", tx_b);

        // Close of the replaced connection must not take the user offline.
        assert!(!presence.unregister("u1", id_a));
        assert!(presence.lookup("u1").is_some());

        assert!(presence.unregister("u1", id_b));
        assert!(presence.lookup("u1").is_none());
    }
}
