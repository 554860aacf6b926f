//! Query descriptor types.
//!
//! A [`QueryDescriptor`] is the backend-agnostic form of a listing request:
//! free-text search, exact-match filters, a creation date range, and one
//! sort key. Every backend (in-memory, SQL, document) evaluates the same
//! predicate from it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tessera_schema::types::{FieldType, SortDirection};

/// Reserved filter key constraining `createdAt >= value`.
pub const CREATED_AFTER: &str = "createdAfter";

/// Reserved filter key constraining `createdAt <= value`.
pub const CREATED_BEFORE: &str = "createdBefore";

/// Data keys searched for every content type, declared or not.
pub const WELL_KNOWN_SEARCH_FIELDS: [&str; 5] = ["title", "slug", "excerpt", "content", "tags"];

/// Normalized listing query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Content type the items must belong to.
    pub content_type: String,

    /// Free-text search, if any.
    #[serde(default)]
    pub search: Option<SearchSpec>,

    /// Exact-match field filters, all of which must hold.
    #[serde(default)]
    pub filters: Vec<FieldFilter>,

    /// Inclusive `createdAt` bounds.
    #[serde(default)]
    pub created: CreatedRange,

    pub sort: SortSpec,
}

impl QueryDescriptor {
    /// A descriptor matching every item of a type, newest update first.
    pub fn all(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            search: None,
            filters: Vec::new(),
            created: CreatedRange::default(),
            sort: SortSpec::default(),
        }
    }
}

/// Case-insensitive substring search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Lowercased search text.
    pub needle: String,

    /// Where to look, de-duplicated, in scan order.
    pub targets: Vec<SearchTarget>,
}

/// A place a search needle is looked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTarget {
    /// The item's own identifier.
    Id,
    /// A key in the item's data. Array values are searched element-wise.
    Field(String),
}

/// How a filter value is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Stringified field value equals the filter value.
    Text,
    /// Field declared boolean; the value is normalized to `"true"`/`"false"`.
    Boolean,
}

/// Exact-match filter on one data key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
    pub kind: FilterKind,
}

/// Inclusive bounds on `createdAt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRange {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl CreatedRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.after.is_none_or(|after| instant >= after)
            && self.before.is_none_or(|before| instant <= before)
    }

    pub fn is_unbounded(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }
}

/// Natural ordering used for a field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Case-sensitive byte order.
    Text,
    Numeric,
    /// Values parsed as instants.
    Chronological,
    /// `false` before `true`.
    Boolean,
}

impl SortOrder {
    /// Ordering for a field type, or `None` if the type is not sortable.
    pub fn for_field_type(field_type: FieldType) -> Option<Self> {
        if !field_type.is_sortable() {
            return None;
        }
        Some(match field_type {
            FieldType::Number => SortOrder::Numeric,
            FieldType::Date | FieldType::Datetime => SortOrder::Chronological,
            FieldType::Boolean => SortOrder::Boolean,
            _ => SortOrder::Text,
        })
    }
}

/// What a listing is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Field { name: String, order: SortOrder },
}

/// Sort key plus direction. Ties keep input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::UpdatedAt,
            direction: SortDirection::Desc,
        }
    }
}

/// A requested sort, before it is checked against the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortRequest {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Parse a date or date-time as a UTC instant.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC), and
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Text form of a scalar JSON value as used by filters: strings verbatim,
/// numbers in JSON notation, booleans as `true`/`false`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
