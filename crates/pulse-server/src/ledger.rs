//! Per-pair message quota accounting.
//!
//! Every unordered user pair gets a small counter record. The first few
//! messages between a pair are free; after that a VIP tier grants a larger
//! total allowance, and beyond the allowance each message costs diamonds.
//! Counters live in process memory next to the presence registry; they are
//! not persisted.

use std::collections::HashMap;

use parking_lot::Mutex;

use pulse_config::QuotaConfig;
use pulse_core::{PairKey, VipTier};

/// Quota decision for a single outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Within the free allowance for this pair.
    Free,
    /// Allowance exhausted, sender pays the diamond cost.
    Paid,
    /// Allowance exhausted and the sender cannot or will not pay.
    Blocked,
}

/// Snapshot of a pair's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairCounters {
    pub free_sent: u32,
    pub paid_sent: u32,
}

impl PairCounters {
    pub fn total(&self) -> u32 {
        self.free_sent + self.paid_sent
    }
}

/// Quota limits derived from configuration.
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    pub free_limit: u32,
    pub bronze_limit: u32,
    pub silver_limit: u32,
    pub gold_limit: u32,
    pub message_cost: u64,
}

impl QuotaPolicy {
    pub fn from_config(config: &QuotaConfig) -> Self {
        Self {
            free_limit: config.free_message_limit,
            bronze_limit: config.bronze_message_limit,
            silver_limit: config.silver_message_limit,
            gold_limit: config.gold_message_limit,
            message_cost: config.message_cost_diamonds,
        }
    }

    /// Total message allowance granted by a VIP tier. Non-VIP users get no
    /// allowance beyond the free limit.
    fn tier_limit(&self, tier: VipTier) -> u32 {
        match tier {
            VipTier::None => 0,
            VipTier::Bronze => self.bronze_limit,
            VipTier::Silver => self.silver_limit,
            VipTier::Gold => self.gold_limit,
        }
    }
}

/// In-memory quota ledger keyed by unordered user pair.
pub struct QuotaLedger {
    policy: QuotaPolicy,
    counters: Mutex<HashMap<PairKey, PairCounters>>,
}

impl QuotaLedger {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self {
            policy,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Decide how an outgoing message is charged, updating the pair counter
    /// when it is admitted. A `Blocked` decision leaves the counter untouched.
    ///
    /// The decision reserves the slot; callers that fail to persist the
    /// message afterwards must call [`rollback`](Self::rollback).
    pub fn decide(
        &self,
        sender_id: &str,
        receiver_id: &str,
        wants_to_spend: bool,
        balance: u64,
        tier: VipTier,
    ) -> Decision {
        let pair = PairKey::new(sender_id, receiver_id);
        let mut counters = self.counters.lock();
        let entry = counters.entry(pair).or_default();

        if entry.free_sent < self.policy.free_limit {
            entry.free_sent += 1;
            return Decision::Free;
        }

        // VIP tiers extend the total allowance for the pair, still free of
        // charge to the sender.
        if entry.total() < self.policy.tier_limit(tier) {
            entry.free_sent += 1;
            return Decision::Free;
        }

        if wants_to_spend && balance >= self.policy.message_cost {
            entry.paid_sent += 1;
            return Decision::Paid;
        }

        Decision::Blocked
    }

    /// Undo the counter update of a previously admitted decision.
    pub fn rollback(&self, pair: &PairKey, decision: Decision) {
        let mut counters = self.counters.lock();
        if let Some(entry) = counters.get_mut(pair) {
            match decision {
                Decision::Free => entry.free_sent = entry.free_sent.saturating_sub(1),
                Decision::Paid => entry.paid_sent = entry.paid_sent.saturating_sub(1),
                Decision::Blocked => {}
            }
        }
    }

    /// Current counters for a pair (zero if the pair never exchanged messages).
    pub fn counts(&self, pair: &PairKey) -> PairCounters {
        self.counters.lock().get(pair).copied().unwrap_or_default()
    }

    /// Forget a pair's counters, restoring the free allowance.
    pub fn reset(&self, pair: &PairKey) {
        self.counters.lock().remove(pair);
    }
}
