//! # Item Processor
//!
//! The per-identifier unit of work run inside a worker slot: re-read one item,
//! mark it processed, persist it. One attempt per identifier, no retries.
//! Failures never escape [`ItemProcessor::process`]; they are logged and turned
//! into an empty result.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ProcessingConfig;
use crate::execution::worker_pool::panic_message;
use crate::logging::log_item_operation;
use crate::models::Item;
use crate::storage::{ItemRepository, StorageError};

/// Why a single item produced no result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemProcessingError {
    #[error("lookup of item {id} failed: {source}")]
    Lookup { id: i64, source: StorageError },

    #[error("persisting item {id} failed: {source}")]
    Persist { id: i64, source: StorageError },

    #[error("processing item {id} panicked: {message}")]
    Panicked { id: i64, message: String },
}

/// Tagged per-item result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Processed(Item),
    NotFound { id: i64 },
    Failed(ItemProcessingError),
}

impl ItemOutcome {
    pub fn into_item(self) -> Option<Item> {
        match self {
            ItemOutcome::Processed(item) => Some(item),
            ItemOutcome::NotFound { .. } | ItemOutcome::Failed(_) => None,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, ItemOutcome::Processed(_))
    }
}

/// Processes one item at a time against the shared repository
#[derive(Clone)]
pub struct ItemProcessor {
    repository: Arc<dyn ItemRepository>,
    latency: Duration,
}

impl std::fmt::Debug for ItemProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemProcessor")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl ItemProcessor {
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self::with_latency(repository, ProcessingConfig::default().item_latency())
    }

    /// `latency` is paid before each item touches storage, standing in for
    /// real per-item I/O cost
    pub fn with_latency(repository: Arc<dyn ItemRepository>, latency: Duration) -> Self {
        Self {
            repository,
            latency,
        }
    }

    pub fn from_config(repository: Arc<dyn ItemRepository>, config: &ProcessingConfig) -> Self {
        Self::with_latency(repository, config.item_latency())
    }

    /// Process one item; `None` when it is missing or anything failed
    pub async fn process(&self, id: i64) -> Option<Item> {
        self.process_outcome(id).await.into_item()
    }

    /// Process one item and report what happened
    #[instrument(skip_all, fields(item_id = id))]
    pub async fn process_outcome(&self, id: i64) -> ItemOutcome {
        let attempt = AssertUnwindSafe(self.try_process(id)).catch_unwind().await;

        let outcome = match attempt {
            Ok(Ok(Some(item))) => ItemOutcome::Processed(item),
            Ok(Ok(None)) => ItemOutcome::NotFound { id },
            Ok(Err(error)) => ItemOutcome::Failed(error),
            Err(payload) => ItemOutcome::Failed(ItemProcessingError::Panicked {
                id,
                message: panic_message(payload),
            }),
        };

        match &outcome {
            ItemOutcome::Processed(_) => log_item_operation("process", Some(id), "processed", None),
            ItemOutcome::NotFound { .. } => {
                debug!(item_id = id, "Item no longer exists, skipping");
            }
            ItemOutcome::Failed(error) => {
                warn!(item_id = id, error = %error, "Failed to process item");
            }
        }

        outcome
    }

    async fn try_process(&self, id: i64) -> Result<Option<Item>, ItemProcessingError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let Some(mut item) = self
            .repository
            .find_by_id(id)
            .await
            .map_err(|source| ItemProcessingError::Lookup { id, source })?
        else {
            return Ok(None);
        };

        item.mark_processed();

        let saved = self
            .repository
            .save(item)
            .await
            .map_err(|source| ItemProcessingError::Persist { id, source })?;

        Ok(Some(saved))
    }
}
