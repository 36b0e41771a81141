//! Message intake orchestration.
//!
//! A send runs as: validate, load both accounts, take a quota decision,
//! debit when paid, persist, then fan out delivery (sender echo before
//! receiver push). Failures after the quota decision roll the reserved slot
//! back, and a failed persist after a successful debit refunds the diamonds.

use std::sync::Arc;

use tracing::{debug, error, warn};

use pulse_core::PairKey;
use pulse_metrics::{record_message_blocked, record_message_sent};
use pulse_proto::ServerFrame;
use pulse_store::{Message, NewMessage, Store, StoreError};

use crate::broadcast::Broadcaster;
use crate::ledger::{Decision, QuotaLedger};

/// Why a send was refused.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("validation: {0}")]
    Validation(&'static str),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("diamonds required")]
    QuotaBlocked {
        current_diamonds: u64,
        diamonds_needed: u64,
    },
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl IntakeError {
    /// Get the error type string for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) => pulse_metrics::ERROR_VALIDATION,
            IntakeError::UnknownUser(_) => pulse_metrics::ERROR_AUTH,
            IntakeError::QuotaBlocked { .. } => pulse_metrics::ERROR_QUOTA,
            IntakeError::Store(_) => pulse_metrics::ERROR_STORE,
        }
    }
}

/// Result of an admitted send.
#[derive(Debug)]
pub struct SendOutcome {
    pub message: Message,
    pub decision: Decision,
    /// Free messages left for this pair after the send.
    pub remaining_free: u32,
}

/// Orchestrates validation, quota, persistence and delivery for one send.
#[derive(Clone)]
pub struct MessageIntake {
    store: Arc<dyn Store>,
    ledger: Arc<QuotaLedger>,
    broadcast: Broadcaster,
}

impl MessageIntake {
    pub fn new(store: Arc<dyn Store>, ledger: Arc<QuotaLedger>, broadcast: Broadcaster) -> Self {
        Self {
            store,
            ledger,
            broadcast,
        }
    }

    pub async fn send(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        wants_to_spend: bool,
    ) -> Result<SendOutcome, IntakeError> {
        if sender_id.is_empty() {
            return Err(IntakeError::Validation("senderId is required"));
        }
        if receiver_id.is_empty() {
            return Err(IntakeError::Validation("receiverId is required"));
        }
        if content.trim().is_empty() {
            return Err(IntakeError::Validation("content is required"));
        }

        let sender = self
            .store
            .get_user(sender_id)
            .await?
            .ok_or_else(|| IntakeError::UnknownUser(sender_id.to_string()))?;
        if self.store.get_user(receiver_id).await?.is_none() {
            return Err(IntakeError::UnknownUser(receiver_id.to_string()));
        }

        let pair = PairKey::new(sender_id, receiver_id);
        let cost = self.ledger.policy().message_cost;
        let decision = self.ledger.decide(
            sender_id,
            receiver_id,
            wants_to_spend,
            sender.diamonds,
            sender.vip_status,
        );

        if decision == Decision::Blocked {
            record_message_blocked();
            debug!(sender = %sender_id, receiver = %receiver_id, "send blocked by quota");
            return Err(IntakeError::QuotaBlocked {
                current_diamonds: sender.diamonds,
                diamonds_needed: cost,
            });
        }

        if decision == Decision::Paid {
            match self.store.debit_diamonds(sender_id, cost).await {
                Ok(balance) => {
                    debug!(sender = %sender_id, balance, "debited diamonds for message");
                }
                // Balance moved under us since the quota decision.
                Err(StoreError::InsufficientFunds { balance }) => {
                    self.ledger.rollback(&pair, decision);
                    record_message_blocked();
                    return Err(IntakeError::QuotaBlocked {
                        current_diamonds: balance,
                        diamonds_needed: cost,
                    });
                }
                Err(err) => {
                    self.ledger.rollback(&pair, decision);
                    return Err(err.into());
                }
            }
        }

        let is_paid = decision == Decision::Paid;
        let message = match self
            .store
            .create_message(NewMessage::new(sender_id, receiver_id, content, is_paid))
            .await
        {
            Ok(message) => message,
            Err(err) => {
                self.ledger.rollback(&pair, decision);
                if is_paid {
                    if let Err(refund_err) = self.store.credit_diamonds(sender_id, cost).await {
                        error!(
                            sender = %sender_id,
                            error = %refund_err,
                            "failed to refund diamonds after persist failure"
                        );
                    }
                }
                warn!(sender = %sender_id, receiver = %receiver_id, error = %err, "message persist failed");
                return Err(err.into());
            }
        };

        record_message_sent(if is_paid { "paid" } else { "free" });

        // Sender echo strictly before the receiver push.
        let frame = ServerFrame::NewMessage {
            message: message.clone(),
        };
        self.broadcast.deliver_to_user(sender_id, &frame);
        if receiver_id != sender_id {
            self.broadcast.deliver_to_user(receiver_id, &frame);
        }

        let remaining_free = self
            .ledger
            .policy()
            .free_limit
            .saturating_sub(self.ledger.counts(&pair).free_sent);

        Ok(SendOutcome {
            message,
            decision,
            remaining_free,
        })
    }

    /// Drop a conversation's history and restore the pair's free allowance.
    pub async fn delete_conversation(
        &self,
        user_id: &str,
        peer_id: &str,
    ) -> Result<(), IntakeError> {
        if peer_id.is_empty() {
            return Err(IntakeError::Validation("peerId is required"));
        }
        let pair = PairKey::new(user_id, peer_id);
        self.store.delete_conversation(&pair).await?;
        self.ledger.reset(&pair);
        debug!(pair = %pair, "conversation deleted");
        Ok(())
    }
}
