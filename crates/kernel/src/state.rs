//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::content::{
    ContentStore, ContentTypeRegistry, ItemService, MemoryContentStore, ValidationEngine, loader,
};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Content type registry.
    content_types: ContentTypeRegistry,

    /// Item service.
    items: ItemService,

    config: Config,
}

impl AppState {
    /// Build state for the configured server: presets, the content type file
    /// if one is configured, and an in-memory store.
    pub fn new(config: &Config) -> Result<Self> {
        let registry = ContentTypeRegistry::with_presets();

        if let Some(path) = &config.content_types_path {
            let count = loader::register_from_file(&registry, path)
                .with_context(|| format!("failed to load content types from {}", path.display()))?;
            info!(count, "user content types registered from file");
        }

        Ok(Self::with_store(
            config.clone(),
            registry,
            Arc::new(MemoryContentStore::new()),
        ))
    }

    /// Build state over an existing registry and store.
    pub fn with_store(
        config: Config,
        content_types: ContentTypeRegistry,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        let validation = ValidationEngine::new().strict(config.strict_constraints);
        info!(
            backend = store.backend(),
            strict_constraints = validation.is_strict(),
            "content store ready"
        );
        let items = ItemService::new(content_types.clone(), validation, store)
            .with_max_page_size(config.max_page_size);

        Self {
            inner: Arc::new(AppStateInner {
                content_types,
                items,
                config,
            }),
        }
    }

    /// Get the content type registry.
    pub fn content_types(&self) -> &ContentTypeRegistry {
        &self.inner.content_types
    }

    /// Get the item service.
    pub fn items(&self) -> &ItemService {
        &self.inner.items
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
