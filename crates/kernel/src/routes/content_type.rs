//! Content type API.
//!
//! Lists the registered content types and accepts new ones at runtime.

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::info;

use tessera_schema::types::ContentTypeDefinition;

use crate::content::ContentTypeRegistry;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the content type API router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/cms/content-types",
        get(list_content_types).post(create_content_type),
    )
}

/// All content types, or the one named by `?name=`.
async fn list_content_types(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    let registry = state.content_types();

    if let Some(name) = params.get("name") {
        let def = registry
            .get(name)
            .ok_or_else(AppError::content_type_not_found)?;
        return Ok(Json(json!({ "contentType": def })));
    }

    Ok(Json(json!({ "contentTypes": registry.get_all() })))
}

/// Register a new content type alongside the existing user types.
///
/// A definition whose name matches an existing user type replaces it.
async fn create_content_type(
    State(state): State<AppState>,
    payload: Result<Json<ContentTypeDefinition>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Json(def) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let replaced = register_definition(state.content_types(), def.clone())
        .map_err(AppError::InvalidDefinition)?;

    info!(content_type = %def.name, replaced, "content type registered via API");
    Ok((StatusCode::CREATED, Json(json!({ "contentType": def }))))
}

/// Structural and relation checks, then an atomic upsert.
///
/// Returns whether an existing user type was replaced, or every problem found.
pub(super) fn register_definition(
    registry: &ContentTypeRegistry,
    def: ContentTypeDefinition,
) -> Result<bool, Vec<String>> {
    let mut errors = ContentTypeRegistry::validate(&def);
    errors.extend(registry.check_relations(&def));
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(registry.upsert(def))
}
