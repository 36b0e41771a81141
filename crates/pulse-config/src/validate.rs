//! Configuration validation.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::loader::ConfigError;
use crate::types::Config;

/// Validate a loaded configuration before the server starts.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.listen.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation(format!(
            "invalid listen address: {}",
            config.server.listen
        )));
    }

    if !config.server.ws_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "ws_path must start with '/': {}",
            config.server.ws_path
        )));
    }

    if let Some(listen) = &config.metrics.listen {
        if listen.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "invalid metrics listen address: {listen}"
            )));
        }
    }

    if config.quota.message_cost_diamonds == 0 {
        return Err(ConfigError::Validation(
            "message_cost_diamonds must be at least 1".into(),
        ));
    }

    let quota = &config.quota;
    for (name, limit) in [
        ("bronze_message_limit", quota.bronze_message_limit),
        ("silver_message_limit", quota.silver_message_limit),
        ("gold_message_limit", quota.gold_message_limit),
    ] {
        if limit < quota.free_message_limit {
            return Err(ConfigError::Validation(format!(
                "{name} ({limit}) is below free_message_limit ({})",
                quota.free_message_limit
            )));
        }
    }

    let mut seen = HashSet::new();
    for user in &config.users {
        if user.id.is_empty() {
            return Err(ConfigError::Validation("seed user with empty id".into()));
        }
        if !seen.insert(user.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate seed user id: {}",
                user.id
            )));
        }
    }

    Ok(())
}
