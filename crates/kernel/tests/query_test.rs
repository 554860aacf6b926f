#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Query builder tests: descriptor construction and the in-memory, SQL, and
//! document backends evaluating it.

use std::collections::BTreeMap;

use serde_json::json;

use tessera_kernel::content::{ContentStore, MemoryContentStore};
use tessera_kernel::query::{
    SortRequest, SqlQueryBuilder, apply_to_in_memory_set, build_query, to_document_filter,
    to_document_sort,
};
use tessera_schema::types::SortDirection;
use tessera_test_utils::{generate_items, ids, note_type, test_item};

fn filters(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn sorted(mut ids: Vec<&str>) -> Vec<&str> {
    ids.sort_unstable();
    ids
}

#[test]
fn free_text_matches_tag_array_elements() {
    let query = build_query(&note_type(), "odd", &BTreeMap::new(), None);
    let result = apply_to_in_memory_set(generate_items("note", 15), &query);

    assert_eq!(
        sorted(ids(&result)),
        [
            "item-01", "item-03", "item-05", "item-07", "item-09", "item-11", "item-13"
        ]
    );
}

#[test]
fn free_text_is_case_insensitive_and_checks_ids() {
    let items = generate_items("note", 15);

    let query = build_query(&note_type(), "ITEM 1", &BTreeMap::new(), None);
    let result = apply_to_in_memory_set(items.clone(), &query);
    // "Item 1", "Item 10" .. "Item 14"
    assert_eq!(result.len(), 6);

    let query = build_query(&note_type(), "item-02", &BTreeMap::new(), None);
    assert_eq!(ids(&apply_to_in_memory_set(items, &query)), ["item-02"]);
}

#[test]
fn created_after_is_inclusive() {
    let query = build_query(
        &note_type(),
        "",
        &filters(&[("createdAfter", "2024-01-01")]),
        None,
    );
    let result = apply_to_in_memory_set(generate_items("note", 15), &query);

    assert_eq!(result.len(), 8);
    assert!(result.iter().any(|item| item.id == "item-07"));
    assert!(
        result
            .iter()
            .all(|item| item.created_at.format("%Y").to_string() == "2024")
    );
}

#[test]
fn created_range_combines_bounds() {
    let query = build_query(
        &note_type(),
        "",
        &filters(&[
            ("createdAfter", "2023-12-30"),
            ("createdBefore", "2024-01-02T00:00:00Z"),
        ]),
        None,
    );
    let result = apply_to_in_memory_set(generate_items("note", 15), &query);
    assert_eq!(sorted(ids(&result)), ["item-05", "item-06", "item-07", "item-08"]);
}

#[test]
fn unparseable_date_bound_is_ignored() {
    let query = build_query(
        &note_type(),
        "",
        &filters(&[("createdAfter", "next tuesday")]),
        None,
    );
    assert!(query.created.is_unbounded());
    assert_eq!(apply_to_in_memory_set(generate_items("note", 15), &query).len(), 15);
}

#[test]
fn title_sort_uses_byte_order() {
    let items = ["B", "a", "C"]
        .iter()
        .map(|title| {
            test_item("note")
                .with_id(title)
                .with_field("title", json!(title))
                .build()
        })
        .collect();

    let sort = SortRequest::new("title", SortDirection::Asc);
    let query = build_query(&note_type(), "", &BTreeMap::new(), Some(&sort));
    let result = apply_to_in_memory_set(items, &query);

    assert_eq!(ids(&result), ["B", "C", "a"]);
}

#[test]
fn numeric_sort_descending() {
    let sort = SortRequest::new("rating", SortDirection::Desc);
    let query = build_query(&note_type(), "", &BTreeMap::new(), Some(&sort));
    let result = apply_to_in_memory_set(generate_items("note", 12), &query);

    assert_eq!(ids(&result[..3]), ["item-11", "item-10", "item-09"]);
}

#[test]
fn sort_on_undeclared_field_falls_back_to_updated_desc() {
    let sort = SortRequest::new("nonexistent", SortDirection::Asc);
    let query = build_query(&note_type(), "", &BTreeMap::new(), Some(&sort));
    let result = apply_to_in_memory_set(generate_items("note", 4), &query);

    assert_eq!(ids(&result), ["item-03", "item-02", "item-01", "item-00"]);
}

#[test]
fn field_filters_match_scalars_and_arrays() {
    let items = generate_items("note", 15);

    let query = build_query(&note_type(), "", &filters(&[("rating", "3")]), None);
    assert_eq!(ids(&apply_to_in_memory_set(items.clone(), &query)), ["item-03"]);

    let query = build_query(&note_type(), "", &filters(&[("pinned", "yes")]), None);
    assert_eq!(apply_to_in_memory_set(items.clone(), &query).len(), 5);

    let query = build_query(&note_type(), "", &filters(&[("tags", "even")]), None);
    assert_eq!(apply_to_in_memory_set(items.clone(), &query).len(), 8);

    // Filters and search combine.
    let query = build_query(&note_type(), "odd", &filters(&[("pinned", "true")]), None);
    assert_eq!(
        sorted(ids(&apply_to_in_memory_set(items, &query))),
        ["item-03", "item-09"]
    );
}

#[test]
fn unsafe_filter_keys_are_dropped() {
    let query = build_query(
        &note_type(),
        "",
        &filters(&[("data->>'x'", "1"), ("title", " ")]),
        None,
    );
    assert!(query.filters.is_empty());
}

#[tokio::test]
async fn memory_store_applies_query_per_type() {
    let store = MemoryContentStore::new();
    for item in generate_items("note", 6) {
        store.insert(item).await.unwrap();
    }
    store
        .insert(test_item("other").with_field("tags", json!(["odd"])).build())
        .await
        .unwrap();

    let query = build_query(&note_type(), "odd", &BTreeMap::new(), None);
    let result = store.query(&query).await.unwrap();
    assert_eq!(result.len(), 3);
    assert!(result.iter().all(|item| item.content_type == "note"));
}

#[test]
fn sql_binds_every_user_value() {
    let sort = SortRequest::new("due", SortDirection::Asc);
    let query = build_query(
        &note_type(),
        "50%_off",
        &filters(&[("rating", "4"), ("createdAfter", "2024-01-01")]),
        Some(&sort),
    );
    let builder = SqlQueryBuilder::new(query);
    let (sql, values) = builder.build(3, 10);

    assert!(!sql.contains("50"));
    assert!(sql.contains("ILIKE"));
    assert!(sql.contains("LIMIT"));
    assert!(sql.contains("OFFSET"));
    assert!(sql.contains("NULLS FIRST"));
    assert!(sql.contains("timestamptz"));
    assert!(!values.0.is_empty());

    let (count_sql, _) = builder.build_count();
    assert!(count_sql.contains("COUNT(*)"));
    assert!(!count_sql.contains("LIMIT"));
}

#[test]
fn document_filter_mirrors_descriptor() {
    let sort = SortRequest::new("title", SortDirection::Desc);
    let query = build_query(
        &note_type(),
        "a.b",
        &filters(&[("pinned", "on"), ("createdBefore", "2024-02-01")]),
        Some(&sort),
    );

    let filter = to_document_filter(&query);
    assert_eq!(filter["contentType"], "note");
    assert!(filter["createdAt"]["$lte"]["$date"].is_string());
    assert!(filter["$or"].as_array().unwrap().len() > 1);
    assert_eq!(filter["$and"][0]["data.pinned"]["$in"][0], "true");
    assert_eq!(filter["$and"][0]["data.pinned"]["$in"][1], true);
    assert_eq!(to_document_sort(&query), json!({ "data.title": -1 }));
}
