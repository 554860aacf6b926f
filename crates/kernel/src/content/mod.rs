//! Content management module.
//!
//! This module provides:
//! - ContentTypeRegistry: presets plus user-registered content types
//! - ValidationEngine: schema-driven checks on item data
//! - ItemService: CRUD operations over a ContentStore
//! - FormBuilder: Auto-generated admin forms
//! - loader: content types from a YAML file

mod form;
mod item_service;
pub mod loader;
pub mod presets;
pub mod store;
mod type_registry;
mod validation;

pub use form::FormBuilder;
pub use item_service::{DEFAULT_MAX_PAGE_SIZE, ItemPage, ItemService, ServiceError};
pub use loader::LoadError;
pub use store::{ContentStore, MemoryContentStore};
pub use type_registry::{ContentTypeRegistry, ContentTypeSet};
pub use validation::{FieldErrors, ValidationEngine};
