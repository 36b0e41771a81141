//! Configuration type definitions for server, quota, metrics, and logging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use pulse_store::SeedUser;

use crate::defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    /// User accounts seeded into the in-memory store at startup.
    /// Production deployments replace this with a real storage backend.
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen: String,
    /// WebSocket endpoint path clients must request.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Maximum concurrent connections (None = unlimited)
    #[serde(default)]
    pub max_connections: Option<usize>,
    /// TCP listener backlog (pending connections queue size).
    #[serde(default = "default_connection_backlog")]
    pub connection_backlog: u32,
    /// Graceful shutdown drain timeout in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

/// Message quota policy limits.
///
/// The free limit applies per conversation pair; VIP limits are the total
/// per-pair allowance (free plus paid) granted by each tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    #[serde(default = "default_free_message_limit")]
    pub free_message_limit: u32,
    #[serde(default = "default_bronze_message_limit")]
    pub bronze_message_limit: u32,
    #[serde(default = "default_silver_message_limit")]
    pub silver_message_limit: u32,
    #[serde(default = "default_gold_message_limit")]
    pub gold_message_limit: u32,
    /// Diamonds charged per paid message.
    #[serde(default = "default_message_cost_diamonds")]
    pub message_cost_diamonds: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_message_limit: default_free_message_limit(),
            bronze_message_limit: default_bronze_message_limit(),
            silver_message_limit: default_silver_message_limit(),
            gold_message_limit: default_gold_message_limit(),
            message_cost_diamonds: default_message_cost_diamonds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsConfig {
    /// Prometheus exporter listen address (None = disabled).
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Base log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Output format (json, pretty, compact). Default: pretty
    pub format: Option<String>,
    /// Output target (stdout, stderr). Default: stderr
    pub output: Option<String>,
    /// Per-module log level overrides.
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
