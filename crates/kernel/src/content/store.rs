//! Content item persistence.
//!
//! Provides the storage trait consumed by [`ItemService`](super::ItemService)
//! and an in-memory implementation.

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use tessera_schema::types::ContentItem;

use crate::query::{QueryDescriptor, apply_to_in_memory_set};

/// Content item storage backend.
///
/// Items are addressed by content type and id; an id belonging to another
/// type is treated as missing.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a new item. Fails if the id is taken.
    async fn insert(&self, item: ContentItem) -> Result<()>;

    /// Load one item.
    async fn get(&self, content_type: &str, id: &str) -> Result<Option<ContentItem>>;

    /// Overwrite an existing item. Returns `false` if it does not exist.
    async fn replace(&self, item: ContentItem) -> Result<bool>;

    /// Remove an item. Returns `false` if it did not exist.
    async fn delete(&self, content_type: &str, id: &str) -> Result<bool>;

    /// All items matching the descriptor, in its sort order.
    async fn query(&self, query: &QueryDescriptor) -> Result<Vec<ContentItem>>;

    /// Backend name for logs (e.g., "memory").
    fn backend(&self) -> &'static str;
}

/// Process-local storage. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryContentStore {
    /// Insertion order is the tie-break order for sorting.
    items: RwLock<Vec<ContentItem>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items across all types.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn insert(&self, item: ContentItem) -> Result<()> {
        let mut items = self.items.write();
        if items.iter().any(|existing| existing.id == item.id) {
            bail!("item {} already exists", item.id);
        }
        items.push(item);
        Ok(())
    }

    async fn get(&self, content_type: &str, id: &str) -> Result<Option<ContentItem>> {
        Ok(self
            .items
            .read()
            .iter()
            .find(|item| item.id == id && item.content_type == content_type)
            .cloned())
    }

    async fn replace(&self, item: ContentItem) -> Result<bool> {
        let mut items = self.items.write();
        match items
            .iter_mut()
            .find(|existing| existing.id == item.id && existing.content_type == item.content_type)
        {
            Some(existing) => {
                *existing = item;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, content_type: &str, id: &str) -> Result<bool> {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|item| !(item.id == id && item.content_type == content_type));
        Ok(items.len() != before)
    }

    async fn query(&self, query: &QueryDescriptor) -> Result<Vec<ContentItem>> {
        let snapshot = self.items.read().clone();
        let result = apply_to_in_memory_set(snapshot, query);
        debug!(content_type = %query.content_type, matched = result.len(), "memory query");
        Ok(result)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
