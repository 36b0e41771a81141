//! VIP tier type.

use serde::{Deserialize, Serialize};

/// VIP membership tier of a user account.
///
/// Tiers grant an enlarged total per-conversation message allowance;
/// the exact limits are configuration, not properties of this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VipTier {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
}
