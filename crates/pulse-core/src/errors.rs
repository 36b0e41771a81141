//! Error type constants for metrics and logging.
//!
//! These constants provide consistent error classification across all crates.

/// I/O error.
pub const ERROR_IO: &str = "io";
/// WebSocket handshake/protocol error.
pub const ERROR_WEBSOCKET: &str = "websocket";
/// Authentication error (missing or unknown identity token).
pub const ERROR_AUTH: &str = "auth";
/// Request validation error.
pub const ERROR_VALIDATION: &str = "validation";
/// Quota blocked (diamonds required).
pub const ERROR_QUOTA: &str = "quota";
/// Storage collaborator error.
pub const ERROR_STORE: &str = "store";
/// Configuration error.
pub const ERROR_CONFIG: &str = "config";
