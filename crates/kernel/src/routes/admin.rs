//! Admin pages: dashboard, content type pages, item listings and
//! auto-generated item forms.
//!
//! Forms post url-encoded bodies back to the page that rendered them. A
//! rejected submission re-renders the form with its messages and a 422; an
//! accepted one redirects to the matching listing.

use std::collections::HashMap;

use axum::Router;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use serde::Deserialize;
use tracing::info;

use tessera_schema::types::{ContentTypeDefinition, FieldDefinition};

use crate::content::{FormBuilder, ServiceError};
use crate::error::{AppError, AppResult};
use crate::routes::content::listing;
use crate::routes::content_type::register_definition;
use crate::routes::helpers::{admin_page, html_escape};
use crate::state::AppState;

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/content-types", get(content_types_page))
        .route(
            "/admin/content-types/new",
            get(new_content_type_form).post(create_content_type_from_form),
        )
        .route("/admin/content/{content_type}", get(list_page))
        .route(
            "/admin/content/{content_type}/new",
            get(add_form).post(create_from_form),
        )
        .route(
            "/admin/content/{content_type}/{id}/edit",
            get(edit_form).post(update_from_form),
        )
}

type FormPairs = Result<Form<Vec<(String, String)>>, FormRejection>;

fn form_pairs(payload: FormPairs) -> AppResult<Vec<(String, String)>> {
    payload
        .map(|Form(pairs)| pairs)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// =============================================================================
// Dashboard and content types
// =============================================================================

async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let types = state.content_types().get_all();

    let mut body = format!(
        r#"<div class="dashboard-stats">
<div class="stat-card"><h3>Content Types</h3><span class="stat-number">{}</span></div>
</div>
<p><a href="/admin/content-types">Manage content types</a></p>
<h2>Available Content Types</h2>
<div class="content-types-grid">"#,
        types.len()
    );
    for def in types.values() {
        let name = html_escape(&def.name);
        body.push_str(&format!(
            r#"<div class="content-type-card"><h3>{}</h3><p>{}</p><a href="/admin/content/{name}">Manage Content</a> <span class="field-count">{} fields</span></div>"#,
            html_escape(&def.display_name),
            describe(def),
            def.fields.len(),
        ));
    }
    body.push_str("</div>");

    admin_page("Dashboard", &body)
}

/// Every content type with its fields.
async fn content_types_page(State(state): State<AppState>) -> Html<String> {
    let mut body = String::from(
        r#"<p><a href="/admin/content-types/new" class="button">+ New Content Type</a></p>
<div class="content-types-list">"#,
    );
    for def in state.content_types().get_all().values() {
        let name = html_escape(&def.name);
        let fields: String = def
            .fields
            .iter()
            .map(|field| {
                let required = if field.required {
                    r#"<span class="required">*</span>"#
                } else {
                    ""
                };
                format!(
                    r#"<li><strong>{}</strong> <span class="field-type">({})</span>{required}</li>"#,
                    html_escape(&field.display_name),
                    field.field_type,
                )
            })
            .collect();
        body.push_str(&format!(
            r#"<div class="content-type-item">
<h3>{}</h3><p>{}</p>
<p class="content-type-meta">Name: {name} | Fields: {}</p>
<ul class="content-type-fields">{fields}</ul>
<a href="/admin/content/{name}">Manage Content</a>
</div>"#,
            html_escape(&def.display_name),
            describe(def),
            def.fields.len(),
        ));
    }
    body.push_str("</div>");

    admin_page("Content Types", &body)
}

fn describe(def: &ContentTypeDefinition) -> String {
    html_escape(
        def.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("No description"),
    )
}

/// Fields of the new content type form. `fields` holds a JSON array of
/// field definitions.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ContentTypeForm {
    name: String,
    display_name: String,
    description: String,
    fields: String,
}

async fn new_content_type_form() -> Html<String> {
    let form = ContentTypeForm {
        fields: "[]".to_string(),
        ..Default::default()
    };
    admin_page("Create New Content Type", &content_type_form(&form, &[]))
}

async fn create_content_type_from_form(
    State(state): State<AppState>,
    payload: Result<Form<ContentTypeForm>, FormRejection>,
) -> AppResult<Response> {
    let Form(form) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let result = match serde_json::from_str::<Vec<FieldDefinition>>(&form.fields) {
        Ok(fields) => {
            let mut def = ContentTypeDefinition::new(form.name.trim(), form.display_name.trim());
            if !form.description.trim().is_empty() {
                def = def.description(form.description.trim());
            }
            def.fields = fields;
            register_definition(state.content_types(), def)
        }
        Err(e) => Err(vec![format!(
            "Fields must be a JSON array of field definitions: {e}"
        )]),
    };

    match result {
        Ok(replaced) => {
            info!(content_type = %form.name.trim(), replaced, "content type registered via admin form");
            Ok(Redirect::to("/admin/content-types").into_response())
        }
        Err(errors) => {
            let page = admin_page("Create New Content Type", &content_type_form(&form, &errors));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

fn content_type_form(form: &ContentTypeForm, errors: &[String]) -> String {
    let errors = if errors.is_empty() {
        String::new()
    } else {
        let items: String = errors
            .iter()
            .map(|e| format!("<li>{}</li>", html_escape(e)))
            .collect();
        format!(r#"<ul class="error-message">{items}</ul>"#)
    };

    format!(
        r#"{errors}
<form method="post" action="/admin/content-types/new" class="content-type-form">
    <div class="form-group">
        <label for="name">Name *</label>
        <input type="text" id="name" name="name" value="{}" required pattern="[a-z][a-z0-9]*" class="form-control">
    </div>
    <div class="form-group">
        <label for="displayName">Display Name *</label>
        <input type="text" id="displayName" name="displayName" value="{}" required class="form-control">
    </div>
    <div class="form-group">
        <label for="description">Description</label>
        <textarea id="description" name="description" rows="2" class="form-control">{}</textarea>
    </div>
    <div class="form-group">
        <label for="fields">Fields *</label>
        <textarea id="fields" name="fields" rows="12" class="form-control" data-field-type="json">{}</textarea>
        <div class="form-help">JSON array, e.g. [{{"name": "title", "type": "text", "displayName": "Title", "required": true}}]</div>
    </div>
    <div class="form-actions">
        <button type="submit" class="btn btn-primary">Create Content Type</button>
    </div>
</form>"#,
        html_escape(&form.name),
        html_escape(&form.display_name),
        html_escape(&form.description),
        html_escape(&form.fields),
    )
}

// =============================================================================
// Items
// =============================================================================

/// Item table for a content type. Accepts the same parameters as the API
/// listing.
async fn list_page(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Html<String>> {
    let items = state.items();
    let def = items.content_type(&content_type)?;
    let listing = listing(&def, &params);
    let page = items
        .list(&listing.query, listing.page, listing.per_page)
        .await?;

    let type_name = html_escape(&def.name);
    let mut body = format!(
        r#"<p><a href="/admin/content/{type_name}/new" class="button">Add {}</a></p>
<p class="summary">{} item(s)</p>
<table class="content-list">
<thead><tr><th>Title</th><th>Updated</th><th></th></tr></thead>
<tbody>"#,
        html_escape(&def.display_name),
        page.total
    );
    for item in &page.items {
        let id = html_escape(&item.id);
        body.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td><a href="/admin/content/{type_name}/{id}/edit">Edit</a></td></tr>"#,
            html_escape(&item.title(&def)),
            item.updated_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    body.push_str("</tbody>\n</table>");

    Ok(admin_page(&def.display_name, &body))
}

async fn add_form(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
) -> AppResult<Html<String>> {
    let def = state.items().content_type(&content_type)?;
    let action = format!("/admin/content/{}/new", def.name);
    let title = format!("Add {}", def.display_name);

    let form = FormBuilder::new(def).build_add_form(&action);
    Ok(admin_page(&title, &form))
}

async fn create_from_form(
    State(state): State<AppState>,
    Path(content_type): Path<String>,
    payload: FormPairs,
) -> AppResult<Response> {
    let pairs = form_pairs(payload)?;
    let def = state.items().content_type(&content_type)?;
    let builder = FormBuilder::new(def.clone());
    let data = builder.read_submission(&pairs, None);

    match state.items().create(&def.name, data.clone()).await {
        Ok(item) => {
            info!(content_type = %def.name, id = %item.id, "item created via admin form");
            Ok(Redirect::to(&format!("/admin/content/{}", def.name)).into_response())
        }
        Err(ServiceError::Invalid(errors)) => {
            let action = format!("/admin/content/{}/new", def.name);
            let title = format!("Add {}", def.display_name);
            let form = builder.with_errors(errors).rebuild_add_form(&data, &action);
            Ok((StatusCode::UNPROCESSABLE_ENTITY, admin_page(&title, &form)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> AppResult<Html<String>> {
    let def = state.items().content_type(&content_type)?;
    let item = state.items().get(&content_type, &id).await?;
    let action = format!("/admin/content/{}/{}/edit", def.name, item.id);
    let title = format!("Edit {}", item.title(&def));

    let form = FormBuilder::new(def).build_edit_form(&item, &action);
    Ok(admin_page(&title, &form))
}

async fn update_from_form(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
    payload: FormPairs,
) -> AppResult<Response> {
    let pairs = form_pairs(payload)?;
    let def = state.items().content_type(&content_type)?;
    let mut item = state.items().get(&content_type, &id).await?;
    let builder = FormBuilder::new(def.clone());
    let data = builder.read_submission(&pairs, Some(&item.data));

    match state.items().update(&def.name, &item.id, data.clone()).await {
        Ok(updated) => {
            info!(content_type = %def.name, id = %updated.id, "item updated via admin form");
            Ok(Redirect::to(&format!("/admin/content/{}", def.name)).into_response())
        }
        Err(ServiceError::Invalid(errors)) => {
            let action = format!("/admin/content/{}/{}/edit", def.name, item.id);
            let title = format!("Edit {}", item.title(&def));
            item.data = data;
            let form = builder.with_errors(errors).build_edit_form(&item, &action);
            Ok((StatusCode::UNPROCESSABLE_ENTITY, admin_page(&title, &form)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
