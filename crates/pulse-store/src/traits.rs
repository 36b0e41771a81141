//! Storage backend trait.

use std::sync::Arc;

use async_trait::async_trait;
use pulse_core::PairKey;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::models::{Message, NewMessage, User};

/// Trait for storage backends.
///
/// Implementations must be thread-safe (`Send + Sync`) as they are called
/// concurrently from every connection and send request. These are the only
/// suspension points in the core: all other state is in-process.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a user account by id. `Ok(None)` means the id is unknown.
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Update the durable presence fields of a user.
    ///
    /// Unknown users are a no-op: a connection may outlive account removal
    /// and its close must not surface an error.
    async fn set_presence(
        &self,
        id: &str,
        online: bool,
        last_active: OffsetDateTime,
    ) -> Result<(), StoreError>;

    /// Debit diamonds from a user, re-checking the balance at debit time.
    ///
    /// Returns the new balance. Fails with [`StoreError::InsufficientFunds`]
    /// when the balance observed under the backend's own serialization is
    /// below `amount` — this is the guard against concurrent spends.
    async fn debit_diamonds(&self, id: &str, amount: u64) -> Result<u64, StoreError>;

    /// Credit diamonds back to a user (compensating action for a failed
    /// send after a successful debit). Returns the new balance.
    async fn credit_diamonds(&self, id: &str, amount: u64) -> Result<u64, StoreError>;

    /// Persist a message record and return the durable row.
    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// All stored messages for a conversation pair, in creation order.
    async fn messages_for_pair(&self, pair: &PairKey) -> Result<Vec<Message>, StoreError>;

    /// Delete a single message from a conversation.
    async fn delete_message(&self, pair: &PairKey, message_id: &str) -> Result<(), StoreError>;

    /// Delete the entire message history for a conversation pair.
    async fn delete_conversation(&self, pair: &PairKey) -> Result<(), StoreError>;
}

/// Blanket implementation for `Arc<S>` where `S: Store`.
///
/// This allows passing `Arc<dyn Store>` directly to functions expecting
/// `impl Store`.
#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    #[inline]
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        (**self).get_user(id).await
    }

    #[inline]
    async fn set_presence(
        &self,
        id: &str,
        online: bool,
        last_active: OffsetDateTime,
    ) -> Result<(), StoreError> {
        (**self).set_presence(id, online, last_active).await
    }

    #[inline]
    async fn debit_diamonds(&self, id: &str, amount: u64) -> Result<u64, StoreError> {
        (**self).debit_diamonds(id, amount).await
    }

    #[inline]
    async fn credit_diamonds(&self, id: &str, amount: u64) -> Result<u64, StoreError> {
        (**self).credit_diamonds(id, amount).await
    }

    #[inline]
    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        (**self).create_message(message).await
    }

    #[inline]
    async fn messages_for_pair(&self, pair: &PairKey) -> Result<Vec<Message>, StoreError> {
        (**self).messages_for_pair(pair).await
    }

    #[inline]
    async fn delete_message(&self, pair: &PairKey, message_id: &str) -> Result<(), StoreError> {
        (**self).delete_message(pair, message_id).await
    }

    #[inline]
    async fn delete_conversation(&self, pair: &PairKey) -> Result<(), StoreError> {
        (**self).delete_conversation(pair).await
    }
}
