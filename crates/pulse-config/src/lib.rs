//! Configuration loading and CLI definitions for pulse.

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_config};
pub use types::{Config, LoggingConfig, MetricsConfig, QuotaConfig, ServerConfig};
pub use validate::validate_config;
