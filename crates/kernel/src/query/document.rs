//! MongoDB-style rendering of a [`QueryDescriptor`].
//!
//! Documents are expected as `{ id, contentType, data: {..}, createdAt,
//! updatedAt }` with the timestamps stored as BSON dates. The filter is
//! returned as Extended JSON so any driver can load it.

use serde_json::{Map, Number, Value, json};

use tessera_schema::types::SortDirection;

use super::types::{FieldFilter, FilterKind, QueryDescriptor, SearchSpec, SearchTarget, SortKey};

/// Filter document for the descriptor's predicate.
pub fn to_document_filter(query: &QueryDescriptor) -> Value {
    let mut filter = Map::new();
    filter.insert("contentType".into(), Value::String(query.content_type.clone()));

    let mut created = Map::new();
    if let Some(after) = query.created.after {
        created.insert("$gte".into(), json!({ "$date": after.to_rfc3339() }));
    }
    if let Some(before) = query.created.before {
        created.insert("$lte".into(), json!({ "$date": before.to_rfc3339() }));
    }
    if !created.is_empty() {
        filter.insert("createdAt".into(), Value::Object(created));
    }

    if let Some(search) = &query.search {
        filter.insert("$or".into(), Value::Array(search_clauses(search)));
    }

    if !query.filters.is_empty() {
        let clauses = query.filters.iter().map(filter_clause).collect();
        filter.insert("$and".into(), Value::Array(clauses));
    }

    Value::Object(filter)
}

/// Sort document. Null and missing values sort first ascending.
pub fn to_document_sort(query: &QueryDescriptor) -> Value {
    let path = match &query.sort.key {
        SortKey::CreatedAt => "createdAt".to_string(),
        SortKey::UpdatedAt => "updatedAt".to_string(),
        SortKey::Field { name, .. } => format!("data.{name}"),
    };
    let direction = match query.sort.direction {
        SortDirection::Asc => 1,
        SortDirection::Desc => -1,
    };
    json!({ path: direction })
}

fn search_clauses(search: &SearchSpec) -> Vec<Value> {
    let pattern = regex::escape(&search.needle);
    let mut clauses = Vec::new();

    for target in &search.targets {
        match target {
            SearchTarget::Id => {
                clauses.push(json!({ "id": { "$regex": pattern, "$options": "i" } }));
            }
            SearchTarget::Field(name) => {
                let path = format!("data.{name}");
                // Strings, and string elements of arrays.
                clauses.push(json!({ path.clone(): { "$regex": pattern, "$options": "i" } }));
                // Numbers, through their text form.
                clauses.push(json!({
                    "$expr": {
                        "$and": [
                            { "$in": [{ "$type": format!("${path}") }, ["int", "long", "double", "decimal"]] },
                            { "$regexMatch": {
                                "input": { "$toString": format!("${path}") },
                                "regex": pattern,
                                "options": "i"
                            } }
                        ]
                    }
                }));
            }
        }
    }

    clauses
}

/// Stored values equal to the filter's text form: the string itself, plus the
/// number or boolean that prints as it.
fn filter_clause(filter: &FieldFilter) -> Value {
    let mut candidates = vec![Value::String(filter.value.clone())];

    match filter.kind {
        FilterKind::Boolean => {
            if let Ok(flag) = filter.value.parse::<bool>() {
                candidates.push(Value::Bool(flag));
            }
        }
        FilterKind::Text => {
            if let Ok(flag) = filter.value.parse::<bool>() {
                candidates.push(Value::Bool(flag));
            }
            if let Ok(number) = serde_json::from_str::<Number>(&filter.value)
                && number.to_string() == filter.value
            {
                candidates.push(Value::Number(number));
            }
        }
    }

    json!({ format!("data.{}", filter.field): { "$in": candidates } })
}
