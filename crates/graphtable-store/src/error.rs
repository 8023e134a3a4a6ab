//! Store error types.

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a [`crate::RecordStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A commit condition did not hold; nothing was applied.
    #[error("Conditional commit failed: {reason}")]
    Conflict { reason: String },

    /// The commit is malformed independent of table state.
    #[error("Invalid commit: {0}")]
    InvalidCommit(String),

    /// A token was reused with a different operation set.
    #[error("Idempotency token {token} was already used for a different commit")]
    IdempotencyMismatch { token: String },

    /// The backing service could not be reached. Opaque passthrough.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid store configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn conflict(reason: impl Into<String>) -> Self {
        StoreError::Conflict {
            reason: reason.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
