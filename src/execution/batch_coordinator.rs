//! # Batch Coordinator
//!
//! Entry point of the bulk status-transition job.
//!
//! A batch snapshots the stored identifiers once, submits one
//! [`ItemProcessor`] task per identifier to the shared [`WorkerPool`], waits
//! for every task to reach a terminal state, and only then aggregates the
//! processed items. Per-item failures shrink the result; only a failure to
//! enumerate identifiers fails the batch.
//!
//! Each task owns its own result slot (its [`TaskHandle`]), written once by
//! the worker and read once after the barrier, so aggregation needs no shared
//! mutable collection.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ItemflowError, Result};
use crate::execution::item_processor::{ItemOutcome, ItemProcessor};
use crate::execution::worker_pool::{TaskHandle, TaskResult, WorkerPool};
use crate::logging::{log_batch_operation, log_error};
use crate::models::Item;
use crate::storage::ItemRepository;

/// Counts and timing for one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub submitted: usize,
    pub processed: usize,
    pub not_found: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Final, immutable result of a batch: the successfully processed items in
/// submission order
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    batch_id: Uuid,
    items: Vec<Item>,
    summary: BatchSummary,
}

impl BatchOutcome {
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Accumulates terminal task results after the barrier
struct BatchAggregator {
    items: Vec<Item>,
    submitted: usize,
    not_found: usize,
    failed: usize,
}

impl BatchAggregator {
    fn new(submitted: usize) -> Self {
        Self {
            items: Vec::with_capacity(submitted),
            submitted,
            not_found: 0,
            failed: 0,
        }
    }

    fn record(&mut self, result: TaskResult<ItemOutcome>) {
        match result {
            Ok(ItemOutcome::Processed(item)) => self.items.push(item),
            Ok(ItemOutcome::NotFound { .. }) => self.not_found += 1,
            Ok(ItemOutcome::Failed(_)) => self.failed += 1,
            Err(pool_error) => {
                warn!(error = %pool_error, "Item task did not complete, excluding from batch");
                self.failed += 1;
            }
        }
    }

    fn finish(self, batch_id: Uuid, started_at: DateTime<Utc>, started: Instant) -> BatchOutcome {
        BatchOutcome {
            batch_id,
            summary: BatchSummary {
                submitted: self.submitted,
                processed: self.items.len(),
                not_found: self.not_found,
                failed: self.failed,
                started_at,
                completed_at: Utc::now(),
                duration_ms: started.elapsed().as_millis() as u64,
            },
            items: self.items,
        }
    }
}

/// Runs batches over a shared repository and worker pool
#[derive(Clone)]
pub struct BatchCoordinator {
    repository: Arc<dyn ItemRepository>,
    pool: WorkerPool,
    processor: ItemProcessor,
}

impl std::fmt::Debug for BatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCoordinator")
            .field("pool", &self.pool)
            .field("processor", &self.processor)
            .finish_non_exhaustive()
    }
}

impl BatchCoordinator {
    pub fn new(
        repository: Arc<dyn ItemRepository>,
        pool: WorkerPool,
        processor: ItemProcessor,
    ) -> Self {
        Self {
            repository,
            pool,
            processor,
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Process every stored item.
    ///
    /// Resolves only after every dispatched task has finished. Returns `Err`
    /// only when the identifier snapshot cannot be read.
    #[instrument(skip_all, fields(batch_id))]
    pub async fn run_batch(&self) -> Result<BatchOutcome> {
        let batch_id = Uuid::new_v4();
        tracing::Span::current().record("batch_id", tracing::field::display(batch_id));

        let started = Instant::now();
        let started_at = Utc::now();

        let ids = self.repository.find_all_ids().await.map_err(|e| {
            log_error("batch_coordinator", "find_all_ids", &e.to_string(), None);
            ItemflowError::from(e)
        })?;

        info!(
            batch_id = %batch_id,
            item_count = ids.len(),
            pool_capacity = self.pool.capacity(),
            "Starting batch"
        );

        let handles: Vec<TaskHandle<ItemOutcome>> = ids
            .iter()
            .map(|&id| {
                let processor = self.processor.clone();
                self.pool
                    .submit(async move { processor.process_outcome(id).await })
            })
            .collect();

        let mut aggregator = BatchAggregator::new(handles.len());
        for result in self.pool.await_all(handles).await {
            aggregator.record(result);
        }

        let outcome = aggregator.finish(batch_id, started_at, started);
        let summary = outcome.summary();

        log_batch_operation(
            "run_batch",
            &batch_id.to_string(),
            summary.submitted,
            summary.processed,
            if summary.processed == summary.submitted {
                "completed"
            } else {
                "completed_with_skips"
            },
            Some(summary.duration_ms),
        );

        if summary.failed > 0 || summary.not_found > 0 {
            warn!(
                batch_id = %batch_id,
                not_found = summary.not_found,
                failed = summary.failed,
                "Batch finished with excluded items"
            );
        }

        Ok(outcome)
    }

    /// Start a batch in the background and hand back a handle to its result
    pub fn spawn_batch(&self) -> BatchHandle {
        let coordinator = self.clone();
        BatchHandle {
            join_handle: tokio::spawn(async move { coordinator.run_batch().await }),
        }
    }
}

/// Resolves once the spawned batch has fully completed
#[derive(Debug)]
pub struct BatchHandle {
    join_handle: JoinHandle<Result<BatchOutcome>>,
}

impl BatchHandle {
    pub async fn wait(self) -> Result<BatchOutcome> {
        self.join_handle
            .await
            .map_err(|e| ItemflowError::batch_failed(format!("batch task did not complete: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemStatus;
    use crate::storage::InMemoryItemRepository;
    use std::time::Duration;

    fn coordinator_with(
        ids: &[i64],
        capacity: usize,
    ) -> (BatchCoordinator, Arc<InMemoryItemRepository>) {
        let repository = Arc::new(InMemoryItemRepository::with_items(ids.iter().map(|&id| {
            Item::new(format!("Item {id}"), "Description", "email@email.com").with_id(id)
        })));
        let processor = ItemProcessor::with_latency(repository.clone(), Duration::from_millis(5));
        let coordinator =
            BatchCoordinator::new(repository.clone(), WorkerPool::new(capacity), processor);
        (coordinator, repository)
    }

    #[tokio::test]
    async fn test_all_items_processed() {
        let (coordinator, repository) = coordinator_with(&[1, 2, 3, 4, 5], 2);

        let outcome = coordinator.run_batch().await.unwrap();

        assert_eq!(outcome.len(), 5);
        assert!(outcome.items().iter().all(Item::is_processed));
        let ids: Vec<i64> = outcome.items().iter().filter_map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        for item in repository.find_all().await.unwrap() {
            assert_eq!(item.status, ItemStatus::Processed);
        }

        let summary = outcome.summary();
        assert_eq!(summary.submitted, 5);
        assert_eq!(summary.processed, 5);
        assert_eq!(summary.failed, 0);
        assert!(summary.completed_at >= summary.started_at);
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let (coordinator, _) = coordinator_with(&[], 4);

        let outcome = coordinator.run_batch().await.unwrap();

        assert!(outcome.is_empty());
        assert_eq!(outcome.summary().submitted, 0);
        assert_eq!(coordinator.pool().stats().submitted, 0);
    }

    #[tokio::test]
    async fn test_spawned_batch_resolves_after_completion() {
        let (coordinator, _) = coordinator_with(&[1, 2, 3], 1);

        let outcome = coordinator.spawn_batch().wait().await.unwrap();

        assert_eq!(outcome.len(), 3);
        assert_eq!(coordinator.pool().stats().active_tasks, 0);
    }

    #[tokio::test]
    async fn test_pool_reused_across_batches() {
        let (coordinator, _) = coordinator_with(&[1, 2], 2);

        let first = coordinator.run_batch().await.unwrap();
        let second = coordinator.run_batch().await.unwrap();

        assert_ne!(first.batch_id(), second.batch_id());
        assert_eq!(second.len(), 2);
        assert_eq!(coordinator.pool().stats().completed, 4);
    }

    #[tokio::test]
    async fn test_closed_pool_excludes_items_without_failing_batch() {
        let (coordinator, _) = coordinator_with(&[1, 2], 2);
        coordinator.pool().close();

        let outcome = coordinator.run_batch().await.unwrap();

        assert!(outcome.is_empty());
        assert_eq!(outcome.summary().failed, 2);
    }
}
