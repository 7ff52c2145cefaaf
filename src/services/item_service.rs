//! # Item Service
//!
//! Record-management facade over the repository and the batch engine. The web
//! layer talks only to this type.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{ItemflowError, Result};
use crate::execution::{BatchCoordinator, BatchOutcome, ItemProcessor, WorkerPool};
use crate::logging::log_item_operation;
use crate::models::Item;
use crate::storage::ItemRepository;

#[derive(Clone)]
pub struct ItemService {
    repository: Arc<dyn ItemRepository>,
    coordinator: BatchCoordinator,
}

impl std::fmt::Debug for ItemService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemService")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl ItemService {
    pub fn new(repository: Arc<dyn ItemRepository>, coordinator: BatchCoordinator) -> Self {
        Self {
            repository,
            coordinator,
        }
    }

    /// Wire a service, its coordinator and processor around one repository
    pub fn with_pool(
        repository: Arc<dyn ItemRepository>,
        pool: WorkerPool,
        processor: ItemProcessor,
    ) -> Self {
        let coordinator = BatchCoordinator::new(repository.clone(), pool, processor);
        Self::new(repository, coordinator)
    }

    pub fn coordinator(&self) -> &BatchCoordinator {
        &self.coordinator
    }

    pub async fn find_all(&self) -> Result<Vec<Item>> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Item>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Validate and persist a new item. Any client-supplied id is discarded.
    #[instrument(skip_all)]
    pub async fn create(&self, mut item: Item) -> Result<Item> {
        item.validate()?;
        item.id = None;

        let saved = self.repository.save(item).await?;
        info!(item_id = ?saved.id, "Item created");
        Ok(saved)
    }

    /// Replace an existing item; the stored id always wins over the body
    #[instrument(skip(self, item))]
    pub async fn update(&self, id: i64, mut item: Item) -> Result<Item> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(ItemflowError::NotFound { id });
        }

        item.id = Some(id);
        let saved = self.repository.save(item).await?;
        log_item_operation("update", Some(id), saved.status.as_str(), None);
        Ok(saved)
    }

    /// Idempotent delete
    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.repository.delete_by_id(id).await?;
        debug!(item_id = id, "Item deleted");
        Ok(())
    }

    /// Run one bulk status-transition batch over every stored item
    pub async fn process_items(&self) -> Result<BatchOutcome> {
        self.coordinator.run_batch().await
    }
}
