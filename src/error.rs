//! Error types for the Itemflow core.
//!
//! Each layer owns a narrow error enum; [`ItemflowError`] aggregates the ones
//! that are allowed to cross a layer boundary.

use thiserror::Error;

use crate::models::ItemValidationError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ItemflowError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Validation error: {0}")]
    Validation(#[from] ItemValidationError),
    #[error("Item not found: {id}")]
    NotFound { id: i64 },
    #[error("Batch failed: {0}")]
    BatchFailed(String),
}

impl ItemflowError {
    pub fn batch_failed(reason: impl Into<String>) -> Self {
        Self::BatchFailed(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, ItemflowError>;
