//! Server error types.

use pulse_metrics::{ERROR_CONFIG, ERROR_IO, ERROR_STORE, ERROR_WEBSOCKET};
use pulse_store::StoreError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("websocket: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("config: {0}")]
    Config(String),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl ServerError {
    /// Get the error type string for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Io(_) => ERROR_IO,
            ServerError::Ws(_) => ERROR_WEBSOCKET,
            ServerError::Config(_) => ERROR_CONFIG,
            ServerError::Store(_) => ERROR_STORE,
        }
    }
}
