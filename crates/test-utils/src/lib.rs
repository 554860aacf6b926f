//! Tessera test utilities.
//!
//! Helpers for integration testing: content type fixtures, item builders,
//! and assertion utilities for content system testing.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Map, Value as JsonValue, json};
use uuid::Uuid;

use tessera_schema::types::{
    ContentItem, ContentTypeDefinition, FieldDefinition, FieldType, FieldValidation,
};

/// A small content type covering the sortable and filterable field types.
///
/// `title` is required; `tags` is a multi-valued text field.
pub fn note_type() -> ContentTypeDefinition {
    ContentTypeDefinition::new("note", "Note")
        .with_field(
            FieldDefinition::new("title", FieldType::Text)
                .display_name("Title")
                .required()
                .with_validation(FieldValidation::default().max_length(200)),
        )
        .with_field(FieldDefinition::new("body", FieldType::Textarea).display_name("Body"))
        .with_field(FieldDefinition::new("rating", FieldType::Number).display_name("Rating"))
        .with_field(FieldDefinition::new("pinned", FieldType::Boolean).display_name("Pinned"))
        .with_field(FieldDefinition::new("due", FieldType::Date).display_name("Due"))
        .with_field(
            FieldDefinition::new("tags", FieldType::Text)
                .display_name("Tags")
                .multiple(),
        )
}

/// First day used by [`generate_items`]; item `n` is created `n` days later.
pub fn generation_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 12, 25, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Create a test item with default values.
pub fn test_item(content_type: &str) -> TestItem {
    let now = Utc::now();
    TestItem {
        id: Uuid::now_v7().to_string(),
        content_type: content_type.to_string(),
        data: Map::new(),
        created_at: now,
        updated_at: now,
    }
}

/// Generate `count` items of `content_type`.
///
/// Item `n` has title `Item n`, slug `item-n`, rating `n`, `pinned` set on
/// multiples of three, and the tag `odd` or `even`. Creation dates start at
/// [`generation_start`] and advance one day per item, so items 7 and later
/// fall in 2024.
pub fn generate_items(content_type: &str, count: usize) -> Vec<ContentItem> {
    let start = generation_start();
    (0..count)
        .map(|n| {
            let parity = if n % 2 == 1 { "odd" } else { "even" };
            let created = start + Duration::days(n as i64);
            test_item(content_type)
                .with_id(&format!("item-{n:02}"))
                .with_field("title", json!(format!("Item {n}")))
                .with_field("slug", json!(format!("item-{n}")))
                .with_field("rating", json!(n))
                .with_field("pinned", json!(n % 3 == 0))
                .with_field("tags", json!([parity]))
                .created_at(created)
                .build()
        })
        .collect()
}

/// A test item builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestItem {
    pub id: String,
    pub content_type: String,
    pub data: Map<String, JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TestItem {
    /// Set a custom ID.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Add a single field.
    pub fn with_field(mut self, name: &str, value: JsonValue) -> Self {
        self.data.insert(name.to_string(), value);
        self
    }

    /// Set both timestamps.
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }

    pub fn build(self) -> ContentItem {
        ContentItem {
            id: self.id,
            content_type: self.content_type,
            data: self.data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Ids of `items`, in order.
pub fn ids(items: &[ContentItem]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }
}
