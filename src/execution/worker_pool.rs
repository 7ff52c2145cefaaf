//! # Worker Pool
//!
//! Bounded pool of execution slots for independent units of work.
//!
//! Every submitted task is spawned onto the tokio runtime immediately, but it
//! only starts running its body once it holds one of the pool's semaphore
//! permits. With `capacity` permits, at most `capacity` task bodies execute at
//! any moment regardless of how many tasks are submitted; the rest wait in the
//! semaphore's FIFO queue.
//!
//! A task that panics or is aborted releases its permit and is reported as a
//! failed [`TaskHandle`] result. Sibling tasks and the pool's counters are
//! unaffected.
//!
//! # Examples
//!
//! ```rust
//! use itemflow_core::execution::WorkerPool;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = WorkerPool::new(4);
//!
//!     let handles: Vec<_> = (0..10u64).map(|n| pool.submit(async move { n * 2 })).collect();
//!     let results = pool.await_all(handles).await;
//!
//!     assert_eq!(results.len(), 10);
//!     assert!(results.iter().all(|r| r.is_ok()));
//! }
//! ```

use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Shared pool of bounded execution slots.
///
/// Cloning is cheap; clones share the same slots and counters, so one pool can
/// serve many batches.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    capacity: usize,
    semaphore: Arc<Semaphore>,
    counters: Arc<PoolCounters>,
}

#[derive(Debug, Default)]
struct PoolCounters {
    next_task_id: AtomicU64,
    active: AtomicUsize,
    peak_active: AtomicUsize,
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl WorkerPool {
    /// Create a pool with `capacity` execution slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            counters: Arc::new(PoolCounters::default()),
        }
    }

    pub fn from_config(config: &crate::config::WorkerPoolConfig) -> Self {
        Self::new(config.max_concurrent_items)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Submit a unit of work.
    ///
    /// Never blocks: the task is queued on the runtime and waits for a free
    /// slot there. Must be called from within a tokio runtime.
    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let task_id = self.counters.next_task_id.fetch_add(1, Ordering::Relaxed);
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);

        let semaphore = Arc::clone(&self.semaphore);
        let counters = Arc::clone(&self.counters);

        let join_handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    return Err(WorkerPoolError::PoolClosed { task_id });
                }
            };

            let mut slot = SlotGuard::enter(&counters);
            let output = task.await;
            slot.finish();

            Ok(output)
        });

        debug!(task_id = task_id, "Task submitted to worker pool");

        TaskHandle {
            task_id,
            join_handle,
        }
    }

    /// Wait until every handle has reached a terminal state.
    ///
    /// Results come back in the order the handles were given. Nothing is
    /// returned before the last task finishes.
    pub async fn await_all<T>(&self, handles: Vec<TaskHandle<T>>) -> Vec<TaskResult<T>>
    where
        T: Send + 'static,
    {
        futures::future::join_all(handles.into_iter().map(TaskHandle::join)).await
    }

    /// Stop handing out slots. Queued and future submissions fail with
    /// [`WorkerPoolError::PoolClosed`]; running tasks finish normally.
    pub fn close(&self) {
        self.semaphore.close();
        warn!(capacity = self.capacity, "Worker pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn stats(&self) -> WorkerPoolStats {
        let counters = &self.counters;
        WorkerPoolStats {
            capacity: self.capacity,
            available_slots: self.semaphore.available_permits(),
            active_tasks: counters.active.load(Ordering::SeqCst),
            peak_active_tasks: counters.peak_active.load(Ordering::SeqCst),
            submitted: counters.submitted.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }
}

/// Tracks one occupied slot; counts the task as failed unless `finish` ran,
/// which covers both panics and aborts.
struct SlotGuard<'a> {
    counters: &'a PoolCounters,
    finished: bool,
}

impl<'a> SlotGuard<'a> {
    fn enter(counters: &'a PoolCounters) -> Self {
        let active = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_active.fetch_max(active, Ordering::SeqCst);
        Self {
            counters,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        if self.finished {
            self.counters.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

pub type TaskResult<T> = Result<T, WorkerPoolError>;

/// Handle to a submitted task. Owned exclusively by the submitter.
#[derive(Debug)]
pub struct TaskHandle<T> {
    task_id: u64,
    join_handle: JoinHandle<TaskResult<T>>,
}

impl<T> TaskHandle<T> {
    /// Resolve to the task output, converting panics and cancellation into
    /// [`WorkerPoolError`]
    pub async fn join(self) -> TaskResult<T> {
        let task_id = self.task_id;
        match self.join_handle.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                let message = panic_message(join_error.into_panic());
                error!(task_id = task_id, panic = %message, "Worker pool task panicked");
                Err(WorkerPoolError::TaskPanicked { task_id, message })
            }
            Err(_) => {
                warn!(task_id = task_id, "Worker pool task was cancelled");
                Err(WorkerPoolError::TaskCancelled { task_id })
            }
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Worker pool statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerPoolStats {
    pub capacity: usize,
    pub available_slots: usize,
    pub active_tasks: usize,
    pub peak_active_tasks: usize,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Worker pool errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkerPoolError {
    #[error("Worker pool closed before task {task_id} could be scheduled")]
    PoolClosed { task_id: u64 },

    #[error("Task {task_id} panicked: {message}")]
    TaskPanicked { task_id: u64, message: String },

    #[error("Task {task_id} was cancelled")]
    TaskCancelled { task_id: u64 },
}
