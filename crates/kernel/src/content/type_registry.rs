//! Content type registry.
//!
//! Holds the built-in presets plus the set of user-registered content types.
//! Registration replaces the whole user set at once; readers always see one
//! complete snapshot.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use tracing::info;

use tessera_schema::types::{ContentTypeDefinition, FieldType};

use super::presets;

/// Name-to-definition mapping used throughout the registry API.
pub type ContentTypeSet = BTreeMap<String, ContentTypeDefinition>;

/// Registry of content types.
///
/// Cheap to clone; clones share the same underlying state.
#[derive(Clone)]
pub struct ContentTypeRegistry {
    inner: Arc<ContentTypeRegistryInner>,
}

struct ContentTypeRegistryInner {
    presets: ContentTypeSet,
    /// Swapped wholesale by `register` and `upsert`, never mutated in place.
    user: RwLock<Arc<ContentTypeSet>>,
}

impl ContentTypeRegistry {
    /// Create a registry over the given presets with an empty user set.
    pub fn new(presets: ContentTypeSet) -> Self {
        Self {
            inner: Arc::new(ContentTypeRegistryInner {
                presets,
                user: RwLock::new(Arc::new(ContentTypeSet::new())),
            }),
        }
    }

    /// Create a registry over the built-in presets.
    pub fn with_presets() -> Self {
        Self::new(presets::all())
    }

    /// All content types: presets merged with the user set, user entries
    /// taking precedence on a name collision.
    pub fn get_all(&self) -> ContentTypeSet {
        let user = self.user_types();
        let mut all = self.inner.presets.clone();
        all.extend(user.iter().map(|(k, v)| (k.clone(), v.clone())));
        all
    }

    /// Get a content type by exact name.
    pub fn get(&self, name: &str) -> Option<ContentTypeDefinition> {
        let user = self.user_types();
        user.get(name)
            .or_else(|| self.inner.presets.get(name))
            .cloned()
    }

    /// Replace the entire user-registered set.
    ///
    /// Entries from a previous call are dropped unless `set` repeats them.
    /// Callers are expected to run [`ContentTypeRegistry::validate`] first.
    pub fn register(&self, set: ContentTypeSet) {
        let count = set.len();
        *self.inner.user.write() = Arc::new(set);
        info!(count, "user content types registered");
    }

    /// Add or replace a single user-registered type.
    ///
    /// The copy-and-swap happens under one write guard, so concurrent calls
    /// never drop each other's entries. Returns true when an existing user
    /// entry was replaced.
    pub fn upsert(&self, def: ContentTypeDefinition) -> bool {
        let name = def.name.clone();
        let mut user = self.inner.user.write();
        let mut set = ContentTypeSet::clone(&user);
        let replaced = set.insert(name.clone(), def).is_some();
        *user = Arc::new(set);
        drop(user);

        info!(content_type = %name, replaced, "user content type upserted");
        replaced
    }

    /// Relation fields whose target is neither a registered type nor the
    /// definition itself.
    pub fn check_relations(&self, def: &ContentTypeDefinition) -> Vec<String> {
        def.fields
            .iter()
            .filter(|field| field.field_type == FieldType::Relation)
            .filter_map(|field| {
                let target = field.relation_target.as_deref()?.trim();
                if target.is_empty() || target == def.name || self.exists(target) {
                    return None;
                }
                Some(format!(
                    "Field '{}' relates to unknown content type '{target}'",
                    field.name
                ))
            })
            .collect()
    }

    /// Current user-registered snapshot.
    pub fn user_types(&self) -> Arc<ContentTypeSet> {
        Arc::clone(&self.inner.user.read())
    }

    /// Names of all content types, sorted.
    pub fn names(&self) -> Vec<String> {
        self.get_all().into_keys().collect()
    }

    /// Check if a content type exists.
    pub fn exists(&self, name: &str) -> bool {
        self.user_types().contains_key(name) || self.inner.presets.contains_key(name)
    }

    /// Number of distinct content types.
    pub fn len(&self) -> usize {
        self.get_all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Structural checks on a definition.
    ///
    /// Returns one message per problem; an empty list means the definition
    /// is sound enough to register.
    pub fn validate(def: &ContentTypeDefinition) -> Vec<String> {
        let mut errors = Vec::new();

        if def.name.trim().is_empty() {
            errors.push("Content type name is required".to_string());
        } else if !is_valid_type_name(&def.name) {
            errors.push(format!(
                "Content type name '{}' must start with a lowercase letter and contain only lowercase letters and digits",
                def.name
            ));
        }

        if def.display_name.trim().is_empty() {
            errors.push("Content type displayName is required".to_string());
        }

        if def.fields.is_empty() {
            errors.push("Content type must have at least one field".to_string());
        }

        let mut seen = HashSet::new();
        let mut duplicates: Vec<&str> = Vec::new();
        for field in &def.fields {
            if !seen.insert(field.name.as_str()) && !duplicates.contains(&field.name.as_str()) {
                duplicates.push(&field.name);
            }
        }
        if !duplicates.is_empty() {
            errors.push(format!(
                "Duplicate field names found: {}",
                duplicates.join(", ")
            ));
        }

        for (index, field) in def.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                errors.push(format!("Field #{} has no name", index + 1));
                continue;
            }
            if field.field_type == FieldType::Relation
                && field
                    .relation_target
                    .as_deref()
                    .is_none_or(|t| t.trim().is_empty())
            {
                errors.push(format!(
                    "Field '{}' of type relation requires a relationTarget",
                    field.name
                ));
            }
            if let Some(pattern) = field.validation.as_ref().and_then(|v| v.pattern.as_deref())
                && let Err(e) = Regex::new(pattern)
            {
                errors.push(format!(
                    "Field '{}' has an invalid pattern: {e}",
                    field.name
                ));
            }
        }

        let option_refs = [
            ("titleField", def.options.title_field.as_deref()),
            ("slugField", def.options.slug_field.as_deref()),
            ("sortField", def.options.sort_field.as_deref()),
        ];
        for (option, target) in option_refs {
            if let Some(target) = target
                && def.field(target).is_none()
                && !matches!(target, "createdAt" | "updatedAt")
            {
                errors.push(format!(
                    "Option {option} refers to unknown field '{target}'"
                ));
            }
        }

        errors
    }
}

/// Matches `^[a-z][a-z0-9]*$`.
fn is_valid_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
