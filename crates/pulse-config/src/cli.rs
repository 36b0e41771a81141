//! CLI override flags applied on top of the config file.

use clap::Parser;

use crate::types::Config;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override server listen address, e.g. 0.0.0.0:9000
    #[arg(long)]
    pub listen: Option<String>,
    /// Override the WebSocket endpoint path
    #[arg(long)]
    pub ws_path: Option<String>,
    /// Override maximum concurrent connections (0 = unlimited)
    #[arg(long)]
    pub max_connections: Option<usize>,
    /// Override metrics listen address
    #[arg(long)]
    pub metrics_listen: Option<String>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Apply CLI overrides onto a loaded config.
pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(listen) = &overrides.listen {
        config.server.listen = listen.clone();
    }
    if let Some(path) = &overrides.ws_path {
        config.server.ws_path = path.clone();
    }
    if let Some(max) = overrides.max_connections {
        config.server.max_connections = if max == 0 { None } else { Some(max) };
    }
    if let Some(listen) = &overrides.metrics_listen {
        config.metrics.listen = Some(listen.clone());
    }
    if let Some(level) = &overrides.log_level {
        config.logging.level = Some(level.clone());
    }
}
