//! Web Application State
//!
//! Shared state handed to every handler: the item service (which owns the
//! process-wide worker pool) and the loaded configuration.

use std::time::Instant;
use tracing::info;

use crate::config::ItemflowConfig;
use crate::execution::WorkerPool;
use crate::services::ItemService;

#[derive(Debug)]
pub struct AppState {
    pub service: ItemService,
    pub config: ItemflowConfig,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: ItemService, config: ItemflowConfig) -> Self {
        info!(
            worker_slots = service.coordinator().pool().capacity(),
            "Web application state initialized"
        );
        Self {
            service,
            config,
            started_at: Instant::now(),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        self.service.coordinator().pool()
    }

    pub fn environment(&self) -> &str {
        self.config.environment.as_deref().unwrap_or("development")
    }
}
