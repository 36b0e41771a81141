//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Quota Defaults
// ============================================================================

/// Free messages granted per conversation pair before any tier or
/// diamond spending applies.
pub const DEFAULT_FREE_MESSAGE_LIMIT: u32 = 3;
/// Total per-pair message allowance for bronze VIP.
pub const DEFAULT_BRONZE_MESSAGE_LIMIT: u32 = 20;
/// Total per-pair message allowance for silver VIP.
pub const DEFAULT_SILVER_MESSAGE_LIMIT: u32 = 40;
/// Total per-pair message allowance for gold VIP.
pub const DEFAULT_GOLD_MESSAGE_LIMIT: u32 = 60;
/// Diamonds charged per paid message.
pub const DEFAULT_MESSAGE_COST_DIAMONDS: u64 = 1;
/// Diamonds granted to seeded users when the config omits a balance.
pub const DEFAULT_SEED_DIAMONDS: u64 = 10;

// ============================================================================
// Server Defaults
// ============================================================================

/// Default WebSocket endpoint path.
pub const DEFAULT_WS_PATH: &str = "/ws";
/// Default TCP listener backlog.
pub const DEFAULT_CONNECTION_BACKLOG: u32 = 1024;
/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
