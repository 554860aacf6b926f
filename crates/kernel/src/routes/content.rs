//! Content item API.
//!
//! CRUD for items of a content type plus filtered, sorted listings. Listing
//! query parameters other than the reserved ones below are field filters.

use std::collections::{BTreeMap, HashMap};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use tessera_schema::types::{ContentTypeDefinition, SortDirection};

use crate::error::{AppError, AppResult};
use crate::query::{QueryDescriptor, SortRequest, build_query};
use crate::state::AppState;

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 20;

const RESERVED_PARAMS: [&str; 6] = ["q", "search", "sort", "direction", "page", "per_page"];

/// Create the content item API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/cms/content/{content_type}",
            get(list_items).post(create_item),
        )
        .route(
            "/api/cms/content/{content_type}/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}

/// Body of create and update requests.
#[derive(Debug, Deserialize)]
struct ItemRequest {
    data: Option<Value>,
}

/// A listing request resolved against its content type.
pub(super) struct Listing {
    pub query: QueryDescriptor,
    pub page: u32,
    pub per_page: u32,
}

/// Turn raw listing parameters into a query descriptor and page window.
pub(super) fn listing(def: &ContentTypeDefinition, params: &HashMap<String, String>) -> Listing {
    let free_text = params
        .get("q")
        .or_else(|| params.get("search"))
        .map(String::as_str)
        .unwrap_or_default();

    let filters: BTreeMap<String, String> = params
        .iter()
        .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let sort = params
        .get("sort")
        .filter(|field| !field.trim().is_empty())
        .map(|field| {
            let direction = params
                .get("direction")
                .and_then(|d| SortDirection::parse(d))
                .unwrap_or_default();
            SortRequest::new(field.trim(), direction)
        });

    let page = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let per_page = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PER_PAGE);

    Listing {
        query: build_query(def, free_text, &filters, sort.as_ref()),
        page,
        per_page,
    }
}

fn item_data(payload: Result<Json<ItemRequest>, JsonRejection>) -> AppResult<Map<String, Value>> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    match request.data {
        Some(Value::Object(data)) => Ok(data),
        _ => Err(AppError::BadRequest("Content data is required".to_string())),
    }
}

async fn list_items(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    let items = state.items();
    let def = items.content_type(&content_type)?;
    let listing = listing(&def, &params);

    let page = items
        .list(&listing.query, listing.page, listing.per_page)
        .await?;

    Ok(Json(json!({
        "items": page.items,
        "total": page.total,
        "page": page.page,
        "perPage": page.per_page,
        "contentType": def,
    })))
}

async fn create_item(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    // Unknown types are reported before body problems.
    state.items().content_type(&content_type)?;
    let data = item_data(payload)?;

    let item = state.items().create(&content_type, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "item": item, "message": "Content created successfully" })),
    ))
}

async fn get_item(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let item = state.items().get(&content_type, &id).await?;
    Ok(Json(json!({ "item": item })))
}

async fn update_item(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    state.items().content_type(&content_type)?;
    let data = item_data(payload)?;

    let item = state.items().update(&content_type, &id, data).await?;
    Ok(Json(
        json!({ "item": item, "message": "Content updated successfully" }),
    ))
}

async fn delete_item(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    state.items().delete(&content_type, &id).await?;
    Ok(Json(
        json!({ "message": "Content deleted successfully", "id": id }),
    ))
}
