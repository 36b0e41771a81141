//! Core types and constants shared across pulse crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Error type constants for metrics/logging
//! - The canonical conversation pair key and VIP tier type

pub mod defaults;
pub mod errors;
pub mod pair;
pub mod tier;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use errors::*;
pub use pair::PairKey;
pub use tier::VipTier;

/// Project name.
pub const PROJECT_NAME: &str = "pulse";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
