//! # Permission Errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionError {
    /// Recipient fees below the block sentinel have no meaning.
    #[error("Invalid recipient fee {0}; expected -1 (blocked), 0 (free) or a positive amount")]
    InvalidFee(i64),

    #[error("Invalid delivery fee {0}; must not be negative")]
    InvalidDeliveryFee(i64),

    #[error("Message box name must not be empty")]
    EmptyMessageBox,

    /// NUL terminates box names in storage keys.
    #[error("Message box name must not contain NUL: {0:?}")]
    InvalidMessageBox(String),

    #[error("Permission repository error: {0}")]
    Repository(String),
}

impl From<shared_types::KVStoreError> for PermissionError {
    fn from(e: shared_types::KVStoreError) -> Self {
        PermissionError::Repository(e.to_string())
    }
}
