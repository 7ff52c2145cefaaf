//! Test builders for items, coordinators and the web application.

use itemflow_core::config::ItemflowConfig;
use itemflow_core::execution::{BatchCoordinator, ItemProcessor, WorkerPool};
use itemflow_core::models::Item;
use itemflow_core::services::ItemService;
use itemflow_core::storage::ItemRepository;
use itemflow_core::web::{create_app, AppState};
use std::sync::Arc;
use std::time::Duration;

pub fn sample_item(id: i64) -> Item {
    Item::new(format!("Item {id}"), format!("Description {id}"), "email@email.com").with_id(id)
}

/// Coordinator over `repository` with no simulated per-item latency
pub fn coordinator(repository: Arc<dyn ItemRepository>, capacity: usize) -> BatchCoordinator {
    coordinator_with_pool(repository, WorkerPool::new(capacity))
}

pub fn coordinator_with_pool(
    repository: Arc<dyn ItemRepository>,
    pool: WorkerPool,
) -> BatchCoordinator {
    let processor = ItemProcessor::with_latency(repository.clone(), Duration::ZERO);
    BatchCoordinator::new(repository, pool, processor)
}

/// Fully wired router over `repository`, as the server builds it
pub fn test_app(repository: Arc<dyn ItemRepository>) -> axum::Router {
    let mut config = ItemflowConfig::default();
    config.environment = Some("test".to_string());
    config.processing.item_latency_ms = 0;
    config.worker_pool.max_concurrent_items = 4;

    let pool = WorkerPool::from_config(&config.worker_pool);
    let processor = ItemProcessor::from_config(repository.clone(), &config.processing);
    let service = ItemService::with_pool(repository, pool, processor);

    create_app(Arc::new(AppState::new(service, config)))
}

pub fn ids_of(items: &[Item]) -> Vec<i64> {
    items.iter().filter_map(|item| item.id).collect()
}
