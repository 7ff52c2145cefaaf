//! # Item Storage
//!
//! The storage collaborator shared by every concurrently running batch task.
//! Implementations must be safe for concurrent access to independent keys;
//! no cross-call transactional isolation is assumed.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Item;

pub use memory::InMemoryItemRepository;
#[cfg(feature = "postgres")]
pub use postgres::PgItemRepository;

/// Errors raised by a storage backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Query failed during {operation}: {reason}")]
    QueryFailed { operation: String, reason: String },
    #[error("Inconsistent state for item {id}: {reason}")]
    Inconsistent { id: i64, reason: String },
}

impl StorageError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn query_failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::QueryFailed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Key-value style access to persisted items
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Snapshot of every stored identifier, in ascending order
    async fn find_all_ids(&self) -> StorageResult<Vec<i64>>;

    async fn find_all(&self) -> StorageResult<Vec<Item>>;

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>>;

    /// Upsert. Assigns an identifier when the item has none and returns the
    /// persisted value.
    async fn save(&self, item: Item) -> StorageResult<Item>;

    /// Remove an item. Deleting an unknown identifier is not an error.
    async fn delete_by_id(&self, id: i64) -> StorageResult<()>;
}
