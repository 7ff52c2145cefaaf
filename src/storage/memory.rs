//! In-process item store backed by an ordered map.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

use super::{ItemRepository, StorageResult};
use crate::models::Item;

/// Thread-safe in-memory repository.
///
/// Identifiers are assigned from a monotonic sequence which also advances past
/// any identifier supplied explicitly on save, so generated ids never collide
/// with stored ones.
#[derive(Debug)]
pub struct InMemoryItemRepository {
    items: RwLock<BTreeMap<i64, Item>>,
    next_id: AtomicI64,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Build a repository pre-populated with `items`
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let repository = Self::new();
        for item in items {
            repository.insert(item);
        }
        repository
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn insert(&self, mut item: Item) -> Item {
        let id = match item.id {
            Some(id) => {
                self.next_id.fetch_max(id + 1, Ordering::SeqCst);
                id
            }
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        item.id = Some(id);
        self.items.write().insert(id, item.clone());
        item
    }
}

impl Default for InMemoryItemRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn find_all_ids(&self) -> StorageResult<Vec<i64>> {
        Ok(self.items.read().keys().copied().collect())
    }

    async fn find_all(&self) -> StorageResult<Vec<Item>> {
        Ok(self.items.read().values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>> {
        Ok(self.items.read().get(&id).cloned())
    }

    async fn save(&self, item: Item) -> StorageResult<Item> {
        let saved = self.insert(item);
        debug!(item_id = ?saved.id, status = %saved.status, "Item saved");
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        let removed = self.items.write().remove(&id).is_some();
        debug!(item_id = id, removed = removed, "Item delete requested");
        Ok(())
    }
}
