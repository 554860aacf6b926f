//! Builds [`QueryDescriptor`]s from listing requests.
//!
//! The content type definition is the only source of field semantics: it
//! decides which filters compare as booleans, which fields may be sorted
//! and how, and which declared fields free-text search scans.

use std::collections::BTreeMap;

use tracing::warn;

use tessera_schema::types::{ContentTypeDefinition, FieldType};

use super::types::{
    CREATED_AFTER, CREATED_BEFORE, CreatedRange, FieldFilter, FilterKind, QueryDescriptor,
    SearchSpec, SearchTarget, SortKey, SortOrder, SortRequest, SortSpec,
    WELL_KNOWN_SEARCH_FIELDS, parse_instant,
};

/// Build a descriptor for listing items of `def`.
///
/// Empty filter values are ignored. Dates that do not parse and sorts on
/// fields that cannot be sorted are dropped with a warning rather than
/// failing the request.
pub fn build_query(
    def: &ContentTypeDefinition,
    free_text: &str,
    filters: &BTreeMap<String, String>,
    sort: Option<&SortRequest>,
) -> QueryDescriptor {
    let mut created = CreatedRange::default();
    let mut field_filters = Vec::new();

    for (name, raw) in filters {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }

        match name.as_str() {
            CREATED_AFTER => created.after = date_bound(name, value),
            CREATED_BEFORE => created.before = date_bound(name, value),
            _ if !is_safe_key(name) => {
                warn!(content_type = %def.name, filter = %name, "ignoring filter on malformed key");
            }
            _ => field_filters.push(field_filter(def, name, value)),
        }
    }

    QueryDescriptor {
        content_type: def.name.clone(),
        search: search_spec(def, free_text),
        filters: field_filters,
        created,
        sort: resolve_sort(def, sort),
    }
}

fn date_bound(name: &str, value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let parsed = parse_instant(value);
    if parsed.is_none() {
        warn!(filter = %name, value, "ignoring unparseable date filter");
    }
    parsed
}

/// Data keys are identifiers; anything else never reaches a backend.
fn is_safe_key(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn field_filter(def: &ContentTypeDefinition, name: &str, value: &str) -> FieldFilter {
    let is_boolean = def
        .field(name)
        .is_some_and(|f| f.field_type == FieldType::Boolean);

    if is_boolean {
        FieldFilter {
            field: name.to_string(),
            value: normalize_boolean(value),
            kind: FilterKind::Boolean,
        }
    } else {
        FieldFilter {
            field: name.to_string(),
            value: value.to_string(),
            kind: FilterKind::Text,
        }
    }
}

/// Form-submitted spellings of a boolean. Unknown spellings pass through
/// unchanged and simply match nothing.
fn normalize_boolean(value: &str) -> String {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => "true".to_string(),
        "false" | "0" | "no" | "off" => "false".to_string(),
        _ => value.to_string(),
    }
}

fn search_spec(def: &ContentTypeDefinition, free_text: &str) -> Option<SearchSpec> {
    let needle = free_text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let mut targets = vec![SearchTarget::Id];
    let declared = def.fields.iter().map(|f| f.name.as_str());
    for name in WELL_KNOWN_SEARCH_FIELDS.into_iter().chain(declared) {
        let target = SearchTarget::Field(name.to_string());
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    Some(SearchSpec { needle, targets })
}

fn resolve_sort(def: &ContentTypeDefinition, request: Option<&SortRequest>) -> SortSpec {
    if let Some(request) = request {
        if let Some(key) = sort_key(def, &request.field) {
            return SortSpec {
                key,
                direction: request.direction,
            };
        }
        warn!(
            content_type = %def.name,
            field = %request.field,
            "field is not sortable; using default sort"
        );
    }
    default_sort(def)
}

/// The type's configured listing order, else most recently updated first.
fn default_sort(def: &ContentTypeDefinition) -> SortSpec {
    def.options
        .sort_field
        .as_deref()
        .and_then(|field| sort_key(def, field))
        .map(|key| SortSpec {
            key,
            direction: def.options.sort_order.unwrap_or_default(),
        })
        .unwrap_or_default()
}

fn sort_key(def: &ContentTypeDefinition, field: &str) -> Option<SortKey> {
    match field {
        "createdAt" => Some(SortKey::CreatedAt),
        "updatedAt" => Some(SortKey::UpdatedAt),
        _ => {
            let field = def.field(field).filter(|f| !f.multiple)?;
            SortOrder::for_field_type(field.field_type).map(|order| SortKey::Field {
                name: field.name.clone(),
                order,
            })
        }
    }
}
