//! Domain model types owned by the storage contract.

use pulse_core::{DEFAULT_SEED_DIAMONDS, VipTier};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A user account as seen by the core.
///
/// The account is created by the identity collaborator; the core only
/// mutates presence fields and the diamond balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub is_online: bool,
    /// Currency balance spent on paid messages.
    pub diamonds: u64,
    pub vip_status: VipTier,
    #[serde(with = "time::serde::rfc3339")]
    pub last_active: OffsetDateTime,
}

/// A durable message record. Never mutated after creation except deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_read: bool,
    /// True when the quota ledger charged the sender for this message.
    pub is_paid: bool,
}

/// Input for creating a message record. The id and timestamp are assigned
/// by the backend.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub is_paid: bool,
}

impl NewMessage {
    pub fn new(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        content: impl Into<String>,
        is_paid: bool,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            content: content.into(),
            is_paid,
        }
    }
}

/// A user account seeded into the in-memory backend at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub id: String,
    pub username: String,
    #[serde(default = "default_seed_diamonds")]
    pub diamonds: u64,
    #[serde(default)]
    pub vip_status: VipTier,
}

impl SeedUser {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            diamonds: DEFAULT_SEED_DIAMONDS,
            vip_status: VipTier::None,
        }
    }

    pub fn with_diamonds(mut self, diamonds: u64) -> Self {
        self.diamonds = diamonds;
        self
    }

    pub fn with_vip(mut self, tier: VipTier) -> Self {
        self.vip_status = tier;
        self
    }
}

fn default_seed_diamonds() -> u64 {
    DEFAULT_SEED_DIAMONDS
}
