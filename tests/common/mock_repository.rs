//! Mock Item Repository
//!
//! Wraps the in-memory store and lets a test script storage behavior per
//! identifier: items that vanish between enumeration and lookup, failing reads
//! and writes, panics, slow lookups and a failing enumeration. Lookups are
//! probed so tests can observe how many ran at the same time.

use async_trait::async_trait;
use itemflow_core::models::Item;
use itemflow_core::storage::{InMemoryItemRepository, ItemRepository, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::builders::sample_item;

/// Calls observed by the mock, for assertions
#[derive(Debug, Default, Clone)]
pub struct MockRepositoryState {
    pub enumerations: usize,
    pub lookups: Vec<i64>,
    pub saved_ids: Vec<i64>,
    pub rejected_writes: Vec<i64>,
}

/// Tracks concurrent lookups
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    fn enter(&self) -> ProbeGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ProbeGuard { probe: self }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }
}

struct ProbeGuard<'a> {
    probe: &'a ConcurrencyProbe,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        self.probe.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scriptable repository for batch and web tests
#[derive(Debug, Default)]
pub struct MockItemRepository {
    inner: InMemoryItemRepository,
    state: Mutex<MockRepositoryState>,
    probe: ConcurrencyProbe,
    vanished_ids: HashSet<i64>,
    failing_reads: HashSet<i64>,
    failing_writes: HashSet<i64>,
    panicking_ids: HashSet<i64>,
    slow_ids: HashMap<i64, Duration>,
    lookup_delay: Option<Duration>,
    fail_enumeration: bool,
}

impl MockItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed stored items with the given identifiers
    pub fn with_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            inner: InMemoryItemRepository::with_items(ids.into_iter().map(sample_item)),
            ..Self::default()
        }
    }

    /// Identifiers that show up in the snapshot but are gone by lookup time
    pub fn with_vanished_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.vanished_ids.extend(ids);
        self
    }

    pub fn with_failing_reads(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.failing_reads.extend(ids);
        self
    }

    pub fn with_failing_writes(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.failing_writes.extend(ids);
        self
    }

    pub fn with_panicking_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.panicking_ids.extend(ids);
        self
    }

    pub fn with_slow_item(mut self, id: i64, delay: Duration) -> Self {
        self.slow_ids.insert(id, delay);
        self
    }

    /// Delay applied to every lookup
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub fn with_enumeration_failure(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn state(&self) -> MockRepositoryState {
        self.state.lock().unwrap().clone()
    }

    pub fn probe(&self) -> &ConcurrencyProbe {
        &self.probe
    }

    /// Current stored value, bypassing scripted behavior
    pub async fn stored(&self, id: i64) -> Option<Item> {
        self.inner.find_by_id(id).await.unwrap()
    }

    fn delay_for(&self, id: i64) -> Option<Duration> {
        self.slow_ids.get(&id).copied().or(self.lookup_delay)
    }
}

#[async_trait]
impl ItemRepository for MockItemRepository {
    async fn find_all_ids(&self) -> StorageResult<Vec<i64>> {
        self.state.lock().unwrap().enumerations += 1;

        if self.fail_enumeration {
            return Err(StorageError::unavailable("mock enumeration failure"));
        }

        let mut ids = self.inner.find_all_ids().await?;
        ids.extend(self.vanished_ids.iter().copied());
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn find_all(&self) -> StorageResult<Vec<Item>> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>> {
        let _guard = self.probe.enter();
        self.state.lock().unwrap().lookups.push(id);

        if let Some(delay) = self.delay_for(id) {
            tokio::time::sleep(delay).await;
        }

        if self.panicking_ids.contains(&id) {
            panic!("mock lookup panic for item {id}");
        }
        if self.failing_reads.contains(&id) {
            return Err(StorageError::query_failed(
                "find_by_id",
                format!("mock read failure for item {id}"),
            ));
        }
        if self.vanished_ids.contains(&id) {
            return Ok(None);
        }

        self.inner.find_by_id(id).await
    }

    async fn save(&self, item: Item) -> StorageResult<Item> {
        if let Some(id) = item.id.filter(|id| self.failing_writes.contains(id)) {
            self.state.lock().unwrap().rejected_writes.push(id);
            return Err(StorageError::query_failed(
                "save",
                format!("mock write failure for item {id}"),
            ));
        }

        let saved = self.inner.save(item).await?;
        if let Some(id) = saved.id {
            self.state.lock().unwrap().saved_ids.push(id);
        }
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        self.inner.delete_by_id(id).await
    }
}
