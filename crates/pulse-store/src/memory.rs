//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use pulse_core::PairKey;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::models::{Message, NewMessage, SeedUser, User};
use crate::traits::Store;

/// In-memory storage backend.
///
/// Suitable for a single-process deployment with a seeded user set. All
/// mutations go through one lock, which gives the per-key serialization
/// the core relies on (balance debits in particular).
pub struct MemoryStore {
    inner: RwLock<Inner>,
    next_message_seq: AtomicU64,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    messages: HashMap<PairKey, Vec<Message>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_message_seq: AtomicU64::new(1),
        }
    }

    /// Create a store pre-populated with the given user accounts.
    pub fn from_seed<I>(users: I) -> Self
    where
        I: IntoIterator<Item = SeedUser>,
    {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for seed in users {
                inner.users.insert(
                    seed.id.clone(),
                    User {
                        id: seed.id,
                        username: seed.username,
                        is_online: false,
                        diamonds: seed.diamonds,
                        vip_status: seed.vip_status,
                        last_active: OffsetDateTime::now_utc(),
                    },
                );
            }
        }
        store
    }

    /// Number of user accounts.
    pub fn user_count(&self) -> usize {
        self.inner.read().users.len()
    }

    /// Upsert the seeded account set, returning how many were added.
    ///
    /// New accounts start offline with the configured balance and tier.
    /// Accounts already present keep their runtime state (presence,
    /// balance) and only pick up username and tier changes.
    pub fn reload_seed<I>(&self, users: I) -> usize
    where
        I: IntoIterator<Item = SeedUser>,
    {
        let mut inner = self.inner.write();
        let mut added = 0;
        for seed in users {
            match inner.users.get_mut(&seed.id) {
                Some(user) => {
                    user.username = seed.username;
                    user.vip_status = seed.vip_status;
                }
                None => {
                    inner.users.insert(
                        seed.id.clone(),
                        User {
                            id: seed.id,
                            username: seed.username,
                            is_online: false,
                            diamonds: seed.diamonds,
                            vip_status: seed.vip_status,
                            last_active: OffsetDateTime::now_utc(),
                        },
                    );
                    added += 1;
                }
            }
        }
        added
    }

    fn next_message_id(&self) -> String {
        let seq = self.next_message_seq.fetch_add(1, Ordering::Relaxed);
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        format!("msg-{millis}-{seq}")
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().users.get(id).cloned())
    }

    async fn set_presence(
        &self,
        id: &str,
        online: bool,
        last_active: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if let Some(user) = inner.users.get_mut(id) {
            user.is_online = online;
            user.last_active = last_active;
        }
        Ok(())
    }

    async fn debit_diamonds(&self, id: &str, amount: u64) -> Result<u64, StoreError> {
        let mut inner = self.inner.write();
        let user = inner.users.get_mut(id).ok_or(StoreError::UserNotFound)?;
        if user.diamonds < amount {
            return Err(StoreError::InsufficientFunds {
                balance: user.diamonds,
            });
        }
        user.diamonds -= amount;
        Ok(user.diamonds)
    }

    async fn credit_diamonds(&self, id: &str, amount: u64) -> Result<u64, StoreError> {
        let mut inner = self.inner.write();
        let user = inner.users.get_mut(id).ok_or(StoreError::UserNotFound)?;
        user.diamonds = user.diamonds.saturating_add(amount);
        Ok(user.diamonds)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let record = Message {
            id: self.next_message_id(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            created_at: OffsetDateTime::now_utc(),
            is_read: false,
            is_paid: message.is_paid,
        };
        let pair = PairKey::new(record.sender_id.clone(), record.receiver_id.clone());
        self.inner
            .write()
            .messages
            .entry(pair)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn messages_for_pair(&self, pair: &PairKey) -> Result<Vec<Message>, StoreError> {
        Ok(self.inner.read().messages.get(pair).cloned().unwrap_or_default())
    }

    async fn delete_message(&self, pair: &PairKey, message_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let messages = inner
            .messages
            .get_mut(pair)
            .ok_or(StoreError::MessageNotFound)?;
        let before = messages.len();
        messages.retain(|m| m.id != message_id);
        if messages.len() == before {
            return Err(StoreError::MessageNotFound);
        }
        Ok(())
    }

    async fn delete_conversation(&self, pair: &PairKey) -> Result<(), StoreError> {
        self.inner.write().messages.remove(pair);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::VipTier;

    fn seeded() -> MemoryStore {
        MemoryStore::from_seed([
            SeedUser::new("u1", "Ada").with_diamonds(5),
            SeedUser::new("u2", "Ben").with_vip(VipTier::Gold),
        ])
    }

    #[tokio::test]
    async fn test_get_user() {
        let store = seeded();
        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.username, "Ada");
        assert_eq!(user.diamonds, 5);
        assert!(store.get_user("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_presence() {
        let store = seeded();
        let now = OffsetDateTime::now_utc();
        store.set_presence("u1", true, now).await.unwrap();
        assert!(store.get_user("u1").await.unwrap().unwrap().is_online);

        // Unknown user is a no-op, not an error.
        store.set_presence("ghost", true, now).await.unwrap();
    }

    #[tokio::test]
    async fn test_debit_rechecks_balance() {
        let store = seeded();
        assert_eq!(store.debit_diamonds("u1", 1).await.unwrap(), 4);
        assert_eq!(store.debit_diamonds("u1", 4).await.unwrap(), 0);

        let err = store.debit_diamonds("u1", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientFunds { balance: 0 }));

        assert_eq!(store.credit_diamonds("u1", 2).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reload_seed_upserts() {
        let store = seeded();
        store.debit_diamonds("u1", 3).await.unwrap();
        store
            .set_presence("u1", true, OffsetDateTime::now_utc())
            .await
            .unwrap();

        let added = store.reload_seed([
            SeedUser::new("u1", "Ada Jr")
                .with_diamonds(99)
                .with_vip(VipTier::Bronze),
            SeedUser::new("u3", "Cy"),
        ]);
        assert_eq!(added, 1);
        assert_eq!(store.user_count(), 3);

        // Existing account keeps its runtime balance and presence.
        let u1 = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(u1.username, "Ada Jr");
        assert_eq!(u1.vip_status, VipTier::Bronze);
        assert_eq!(u1.diamonds, 2);
        assert!(u1.is_online);

        let u3 = store.get_user("u3").await.unwrap().unwrap();
        assert!(!u3.is_online);
    }

    #[tokio::test]
    async fn test_create_and_list_messages() {
        let store = seeded();
        let m1 = store
            .create_message(NewMessage::new("u1", "u2", "hi", false))
            .await
            .unwrap();
        let m2 = store
            .create_message(NewMessage::new("u2", "u1", "hey", true))
            .await
            .unwrap();
        assert_ne!(m1.id, m2.id);
        assert!(!m1.is_read);

        // Both directions share one history.
        let pair = PairKey::new("u1", "u2");
        let messages = store.messages_for_pair(&pair).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[1].content, "hey");
    }

    #[tokio::test]
    async fn test_delete_message() {
        let store = seeded();
        let pair = PairKey::new("u1", "u2");
        let m = store
            .create_message(NewMessage::new("u1", "u2", "oops", false))
            .await
            .unwrap();
        store.delete_message(&pair, &m.id).await.unwrap();
        assert!(store.messages_for_pair(&pair).await.unwrap().is_empty());

        let err = store.delete_message(&pair, &m.id).await.unwrap_err();
        assert!(matches!(err, StoreError::MessageNotFound));
    }

    #[tokio::test]
    async fn test_delete_conversation() {
        let store = seeded();
        let pair = PairKey::new("u1", "u2");
        for _ in 0..3 {
            store
                .create_message(NewMessage::new("u1", "u2", "x", false))
                .await
                .unwrap();
        }
        store.delete_conversation(&pair).await.unwrap();
        assert!(store.messages_for_pair(&pair).await.unwrap().is_empty());
    }
}
