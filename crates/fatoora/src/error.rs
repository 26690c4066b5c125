//! Error types for the engine.

use fatoora_core::{AssemblyError, ChainKey, CoreError, ValidationError};
use fatoora_store::StoreError;
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request broke one or more business rules.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Structural or encoding failure while assembling the document.
    #[error("assembly error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Another writer advanced the chain first.
    #[error("chain {chain} moved: expected ICV {expected:?}, found {found:?}")]
    ChainConflict {
        chain: ChainKey,
        expected: Option<u64>,
        found: Option<u64>,
    },
}

impl From<AssemblyError> for EngineError {
    fn from(e: AssemblyError) -> Self {
        match e {
            AssemblyError::Validation(v) => EngineError::Validation(v),
            AssemblyError::Structural(c) => EngineError::Core(c),
        }
    }
}

impl EngineError {
    /// The validation failure, if that is what this is.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            EngineError::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// Whether retrying after a reload could succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::ChainConflict { .. })
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
