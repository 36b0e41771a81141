//! Storage error types.

/// Storage collaborator error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Referenced user does not exist.
    #[error("user not found")]
    UserNotFound,

    /// Referenced message does not exist.
    #[error("message not found")]
    MessageNotFound,

    /// Balance too low for the requested debit. Carries the balance
    /// observed at debit time.
    #[error("insufficient diamonds (balance {balance})")]
    InsufficientFunds { balance: u64 },

    /// Backend failure (database, network, etc.).
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a backend error from any error type.
    #[inline]
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}
