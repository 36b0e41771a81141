//! Serde default functions backed by the shared constants.

use pulse_core::defaults;

pub(crate) fn default_ws_path() -> String {
    defaults::DEFAULT_WS_PATH.to_string()
}

pub(crate) fn default_connection_backlog() -> u32 {
    defaults::DEFAULT_CONNECTION_BACKLOG
}

pub(crate) fn default_shutdown_timeout_secs() -> u64 {
    defaults::DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

pub(crate) fn default_free_message_limit() -> u32 {
    defaults::DEFAULT_FREE_MESSAGE_LIMIT
}

pub(crate) fn default_bronze_message_limit() -> u32 {
    defaults::DEFAULT_BRONZE_MESSAGE_LIMIT
}

pub(crate) fn default_silver_message_limit() -> u32 {
    defaults::DEFAULT_SILVER_MESSAGE_LIMIT
}

pub(crate) fn default_gold_message_limit() -> u32 {
    defaults::DEFAULT_GOLD_MESSAGE_LIMIT
}

pub(crate) fn default_message_cost_diamonds() -> u64 {
    defaults::DEFAULT_MESSAGE_COST_DIAMONDS
}
