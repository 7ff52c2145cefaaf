#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Itemflow Core
//!
//! Record-management service core built around a bounded bulk
//! status-transition engine.
//!
//! ## Overview
//!
//! Items are stored through an [`ItemRepository`](storage::ItemRepository).
//! A batch snapshots every stored identifier, processes each one on a shared,
//! fixed-size [`WorkerPool`](execution::WorkerPool), and returns the items that
//! were successfully moved to `PROCESSED` once every task has finished.
//! Missing items and per-item storage failures are excluded from the result
//! without failing the batch.
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (TOML files + environment)
//! - [`error`] - Crate-wide error type
//! - [`logging`] - Structured logging setup and operation log helpers
//! - [`models`] - The `Item` record and its field validation
//! - [`storage`] - Repository trait with in-memory and PostgreSQL backends
//! - [`execution`] - Worker pool, item processor and batch coordinator
//! - [`services`] - `ItemService` facade used by the transport layer
//! - [`web`] - axum REST API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use itemflow_core::execution::{ItemProcessor, WorkerPool};
//! use itemflow_core::models::Item;
//! use itemflow_core::services::ItemService;
//! use itemflow_core::storage::{InMemoryItemRepository, ItemRepository};
//! use std::sync::Arc;
//!
//! # async fn example() -> itemflow_core::Result<()> {
//! let repository: Arc<dyn ItemRepository> = Arc::new(InMemoryItemRepository::new());
//! let processor = ItemProcessor::new(repository.clone());
//! let service = ItemService::with_pool(repository, WorkerPool::new(10), processor);
//!
//! service
//!     .create(Item::new("Item 1", "Description 1", "email@email.com"))
//!     .await?;
//!
//! let outcome = service.process_items().await?;
//! assert_eq!(outcome.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod web;

pub use config::{ConfigLoader, ItemflowConfig};
pub use error::{ItemflowError, Result};
pub use execution::{BatchCoordinator, BatchOutcome, BatchSummary, ItemProcessor, WorkerPool};
pub use models::{Item, ItemStatus};
pub use services::ItemService;
pub use storage::{InMemoryItemRepository, ItemRepository, StorageError};
