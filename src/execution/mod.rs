//! # Execution
//!
//! The bulk status-transition engine: a [`BatchCoordinator`] fans one
//! [`ItemProcessor`] task per stored item out onto a bounded [`WorkerPool`]
//! and collects the results once every task has finished.

pub mod batch_coordinator;
pub mod item_processor;
pub mod worker_pool;

pub use batch_coordinator::{BatchCoordinator, BatchHandle, BatchOutcome, BatchSummary};
pub use item_processor::{ItemOutcome, ItemProcessingError, ItemProcessor};
pub use worker_pool::{TaskHandle, TaskResult, WorkerPool, WorkerPoolError, WorkerPoolStats};
