//! In-memory evaluation of a [`QueryDescriptor`].
//!
//! Used by [`MemoryContentStore`](crate::content::store::MemoryContentStore)
//! and by any backend that cannot execute a descriptor natively.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use tessera_schema::types::{ContentItem, SortDirection};

use super::types::{
    FieldFilter, QueryDescriptor, SearchSpec, SearchTarget, SortKey, SortOrder, SortSpec,
    parse_instant, scalar_text,
};

/// Filter `items` by the descriptor's predicate, then sort them.
///
/// The sort is stable: items with equal keys keep their input order.
pub fn apply_to_in_memory_set(items: Vec<ContentItem>, query: &QueryDescriptor) -> Vec<ContentItem> {
    let matching: Vec<ContentItem> = items.into_iter().filter(|item| matches(item, query)).collect();
    sort_items(matching, &query.sort)
}

/// Whether one item satisfies the descriptor's predicate.
pub fn matches(item: &ContentItem, query: &QueryDescriptor) -> bool {
    item.content_type == query.content_type
        && query.created.contains(item.created_at)
        && query.search.as_ref().is_none_or(|search| matches_search(item, search))
        && query.filters.iter().all(|filter| matches_filter(item, filter))
}

fn matches_search(item: &ContentItem, search: &SearchSpec) -> bool {
    search.targets.iter().any(|target| match target {
        SearchTarget::Id => contains_needle(&item.id, &search.needle),
        SearchTarget::Field(name) => item
            .get(name)
            .is_some_and(|value| searchable_text(value).any(|s| contains_needle(&s, &search.needle))),
    })
}

fn contains_needle(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Strings and numbers are searchable; arrays contribute their scalar elements.
fn searchable_text(value: &Value) -> Box<dyn Iterator<Item = String> + '_> {
    match value {
        Value::String(s) => Box::new(std::iter::once(s.clone())),
        Value::Number(n) => Box::new(std::iter::once(n.to_string())),
        Value::Array(items) => Box::new(items.iter().filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })),
        _ => Box::new(std::iter::empty()),
    }
}

/// Scalars compare by their text form; arrays match if any element does.
fn matches_filter(item: &ContentItem, filter: &FieldFilter) -> bool {
    match item.get(&filter.field) {
        Some(Value::Array(items)) => items
            .iter()
            .any(|v| scalar_text(v).is_some_and(|s| s == filter.value)),
        Some(value) => scalar_text(value).is_some_and(|s| s == filter.value),
        None => false,
    }
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortValue {
    Text(String),
    Number(f64),
    Instant(DateTime<Utc>),
    Flag(bool),
}

fn sort_value(item: &ContentItem, key: &SortKey) -> Option<SortValue> {
    match key {
        SortKey::CreatedAt => Some(SortValue::Instant(item.created_at)),
        SortKey::UpdatedAt => Some(SortValue::Instant(item.updated_at)),
        SortKey::Field { name, order } => {
            let value = item.get(name)?;
            match order {
                SortOrder::Text => scalar_text(value).map(SortValue::Text),
                SortOrder::Numeric => value.as_f64().map(SortValue::Number),
                SortOrder::Chronological => value
                    .as_str()
                    .and_then(parse_instant)
                    .map(SortValue::Instant),
                SortOrder::Boolean => value.as_bool().map(SortValue::Flag),
            }
        }
    }
}

/// Missing values sort first ascending and last descending.
fn sort_items(items: Vec<ContentItem>, sort: &SortSpec) -> Vec<ContentItem> {
    let mut keyed: Vec<(Option<SortValue>, ContentItem)> = items
        .into_iter()
        .map(|item| (sort_value(&item, &sort.key), item))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = a.partial_cmp(b).unwrap_or(Ordering::Equal);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, item)| item).collect()
}
