//! Item service.
//!
//! Provides CRUD operations for content items: the content type is resolved
//! from the registry and the data validated before anything is persisted.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use tessera_schema::types::{ContentItem, ContentTypeDefinition};

use super::store::ContentStore;
use super::type_registry::ContentTypeRegistry;
use super::validation::{FieldErrors, ValidationEngine};
use crate::query::QueryDescriptor;

/// Default and maximum page size for listings.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Item service errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("content type '{0}' not found")]
    UnknownType(String),

    #[error("item '{0}' not found")]
    NotFound(String),

    #[error("validation failed")]
    Invalid(FieldErrors),

    #[error("storage error")]
    Store(#[from] anyhow::Error),
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct ItemPage {
    pub items: Vec<ContentItem>,
    /// Matching items across all pages.
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

/// Service for content item CRUD operations.
#[derive(Clone)]
pub struct ItemService {
    inner: Arc<ItemServiceInner>,
}

struct ItemServiceInner {
    registry: ContentTypeRegistry,
    engine: ValidationEngine,
    store: Arc<dyn ContentStore>,
    max_page_size: u32,
}

impl ItemService {
    /// Create a new item service.
    pub fn new(
        registry: ContentTypeRegistry,
        engine: ValidationEngine,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            inner: Arc::new(ItemServiceInner {
                registry,
                engine,
                store,
                max_page_size: DEFAULT_MAX_PAGE_SIZE,
            }),
        }
    }

    /// Cap listing pages at `max` items (at least 1).
    pub fn with_max_page_size(self, max: u32) -> Self {
        let inner = ItemServiceInner {
            registry: self.inner.registry.clone(),
            engine: self.inner.engine,
            store: Arc::clone(&self.inner.store),
            max_page_size: max.max(1),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn max_page_size(&self) -> u32 {
        self.inner.max_page_size
    }

    /// Resolve a content type or fail with `UnknownType`.
    pub fn content_type(&self, name: &str) -> Result<ContentTypeDefinition, ServiceError> {
        self.inner
            .registry
            .get(name)
            .ok_or_else(|| ServiceError::UnknownType(name.to_string()))
    }

    /// Create a new item. Missing fields take their declared default.
    pub async fn create(
        &self,
        content_type: &str,
        data: Map<String, Value>,
    ) -> Result<ContentItem, ServiceError> {
        let def = self.content_type(content_type)?;
        let data = with_defaults(&def, data);
        self.check(&def, &data)?;

        let now = Utc::now();
        let item = ContentItem {
            id: Uuid::now_v7().to_string(),
            content_type: def.name.clone(),
            data,
            created_at: now,
            updated_at: now,
        };
        self.inner.store.insert(item.clone()).await?;

        info!(content_type = %item.content_type, id = %item.id, "item created");
        Ok(item)
    }

    /// Load an item.
    pub async fn get(&self, content_type: &str, id: &str) -> Result<ContentItem, ServiceError> {
        self.content_type(content_type)?;
        self.inner
            .store
            .get(content_type, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Replace an item's data. `createdAt` is preserved.
    pub async fn update(
        &self,
        content_type: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<ContentItem, ServiceError> {
        let def = self.content_type(content_type)?;
        let existing = self
            .inner
            .store
            .get(content_type, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        self.check(&def, &data)?;

        let item = ContentItem {
            data,
            updated_at: Utc::now(),
            ..existing
        };
        if !self.inner.store.replace(item.clone()).await? {
            return Err(ServiceError::NotFound(id.to_string()));
        }

        info!(content_type = %item.content_type, id = %item.id, "item updated");
        Ok(item)
    }

    /// Delete an item.
    pub async fn delete(&self, content_type: &str, id: &str) -> Result<(), ServiceError> {
        self.content_type(content_type)?;
        if !self.inner.store.delete(content_type, id).await? {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        info!(content_type, id, "item deleted");
        Ok(())
    }

    /// One page of the items matching `query`. `page` is 1-based; `per_page`
    /// is clamped to `1..=max_page_size`.
    pub async fn list(
        &self,
        query: &QueryDescriptor,
        page: u32,
        per_page: u32,
    ) -> Result<ItemPage, ServiceError> {
        self.content_type(&query.content_type)?;

        let page = page.max(1);
        let per_page = per_page.clamp(1, self.inner.max_page_size);
        let matching = self.inner.store.query(query).await?;
        let total = matching.len();

        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let items = matching
            .into_iter()
            .skip(skip)
            .take(per_page as usize)
            .collect();

        Ok(ItemPage {
            items,
            total,
            page,
            per_page,
        })
    }

    fn check(&self, def: &ContentTypeDefinition, data: &Map<String, Value>) -> Result<(), ServiceError> {
        let errors = self.inner.engine.validate(def, data);
        if errors.is_empty() {
            Ok(())
        } else {
            info!(content_type = %def.name, fields = errors.len(), "item rejected by validation");
            Err(ServiceError::Invalid(errors))
        }
    }
}

fn with_defaults(def: &ContentTypeDefinition, mut data: Map<String, Value>) -> Map<String, Value> {
    for field in &def.fields {
        if let Some(default) = &field.default_value
            && !data.contains_key(&field.name)
        {
            data.insert(field.name.clone(), default.clone());
        }
    }
    data
}
