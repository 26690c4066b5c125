//! Error types for the store module.

use fatoora_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Snapshot serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage or an invalid write.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A stored snapshot does not describe a valid chain position.
    #[error("corrupt chain state: {0}")]
    Corrupt(#[from] CoreError),

    /// A writer panicked while holding the lock.
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
