#![allow(clippy::unwrap_used, clippy::expect_used)]
//! HTTP API tests.
//!
//! These go through the real router and in-memory store; no external
//! services are needed.

use axum::http::StatusCode;
use serde_json::{Value, json};

use tessera_test_utils::assert;

mod common;
use common::{TestApp, response_json, response_text};

fn article(title: &str, slug: &str) -> Value {
    json!({ "data": { "title": title, "slug": slug, "content": "<p>Body</p>" } })
}

async fn create(app: &TestApp, title: &str, slug: &str) -> Value {
    let response = app
        .post_json("/api/cms/content/article", &article(title, slug))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["item"].clone()
}

// =============================================================================
// Health and content types
// =============================================================================

#[tokio::test]
async fn health_check_reports_content_types() {
    let app = TestApp::new();
    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["content_types"], 1);
}

#[tokio::test]
async fn content_types_list_includes_presets() {
    let app = TestApp::new();
    let body = response_json(app.get("/api/cms/content-types").await).await;

    let types = body["contentTypes"].as_object().unwrap();
    assert_eq!(types.keys().collect::<Vec<_>>(), ["article"]);
    assert_eq!(types["article"]["name"], "article");
    assert_eq!(types["article"]["fields"][0]["type"], "text");
}

#[tokio::test]
async fn content_types_list_is_keyed_by_name() {
    let app = TestApp::new();
    let definition = json!({
        "name": "recipe",
        "displayName": "Recipe",
        "fields": [{ "name": "title", "type": "text", "displayName": "Title" }]
    });
    app.post_json("/api/cms/content-types", &definition).await;

    let body = response_json(app.get("/api/cms/content-types").await).await;
    assert_eq!(body["contentTypes"]["recipe"]["displayName"], "Recipe");
    assert_eq!(body["contentTypes"]["article"]["displayName"], "Article");
}

#[tokio::test]
async fn content_type_by_name() {
    let app = TestApp::new();

    let body = response_json(app.get("/api/cms/content-types?name=article").await).await;
    assert_eq!(body["contentType"]["displayName"], "Article");

    let response = app.get("/api/cms/content-types?name=recipe").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Content type not found");
}

#[tokio::test]
async fn register_content_type_then_create_items() {
    let app = TestApp::new();
    let definition = json!({
        "name": "recipe",
        "displayName": "Recipe",
        "fields": [
            { "name": "title", "type": "text", "displayName": "Title", "required": true },
            { "name": "servings", "type": "number", "displayName": "Servings" }
        ]
    });

    let response = app.post_json("/api/cms/content-types", &definition).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response_json(response).await["contentType"]["name"], "recipe");

    // Registering a second type keeps the first.
    let second = json!({
        "name": "note",
        "displayName": "Note",
        "fields": [{ "name": "text", "type": "textarea", "displayName": "Text" }]
    });
    let response = app.post_json("/api/cms/content-types", &second).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(app.state.content_types().exists("recipe"));
    assert_eq!(app.state.content_types().len(), 3);

    let response = app
        .post_json(
            "/api/cms/content/recipe",
            &json!({ "data": { "title": "Soup", "servings": 4 } }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn invalid_content_type_is_rejected() {
    let app = TestApp::new();
    let definition = json!({
        "name": "Bad Name",
        "displayName": "",
        "fields": []
    });

    let response = app.post_json("/api/cms/content-types", &definition).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert_eq!(body["error"], "Invalid content type definition");
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
    assert!(!app.state.content_types().exists("Bad Name"));
}

#[tokio::test]
async fn relation_to_unknown_type_is_rejected() {
    let app = TestApp::new();
    let definition = json!({
        "name": "review",
        "displayName": "Review",
        "fields": [
            { "name": "article", "type": "relation", "displayName": "Article", "relationTarget": "article" },
            { "name": "product", "type": "relation", "displayName": "Product", "relationTarget": "product" }
        ]
    });

    let response = app.post_json("/api/cms/content-types", &definition).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(
        body["errors"][0],
        "Field 'product' relates to unknown content type 'product'"
    );
    assert!(!app.state.content_types().exists("review"));
}

#[tokio::test]
async fn concurrent_registrations_are_all_kept() {
    let app = std::sync::Arc::new(TestApp::new());
    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let app = app.clone();
            tokio::spawn(async move {
                let definition = json!({
                    "name": format!("type{n}"),
                    "displayName": format!("Type {n}"),
                    "fields": [{ "name": "title", "type": "text", "displayName": "Title" }]
                });
                app.post_json("/api/cms/content-types", &definition)
                    .await
                    .status()
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::CREATED);
    }

    assert_eq!(app.state.content_types().user_types().len(), 8);
    assert_eq!(app.state.content_types().len(), 9);
}

// =============================================================================
// Content CRUD
// =============================================================================

#[tokio::test]
async fn create_item_returns_created_item() {
    let app = TestApp::new();
    let response = app
        .post_json("/api/cms/content/article", &article("Hello", "hello"))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Content created successfully");
    assert_eq!(body["item"]["contentType"], "article");
    assert_eq!(body["item"]["data"]["title"], "Hello");
    // Declared default applied.
    assert_eq!(body["item"]["data"]["published"], false);
    assert::has_key(&body["item"], "createdAt");
    assert::has_key(&body["item"], "id");
}

#[tokio::test]
async fn create_item_requires_data() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/cms/content/article", &json!({ "title": "no wrapper" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"], "Content data is required");
}

#[tokio::test]
async fn create_item_for_unknown_type_is_404() {
    let app = TestApp::new();
    let response = app
        .post_json("/api/cms/content/recipe", &article("A", "a"))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Content type not found");
}

#[tokio::test]
async fn create_item_reports_field_errors() {
    let app = TestApp::new();
    let response = app
        .post_json(
            "/api/cms/content/article",
            &json!({ "data": { "slug": "Not A Slug", "content": "x" } }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["errors"]["title"], "Title is required");
    assert_eq!(body["errors"]["slug"], "Slug format is invalid");
    assert!(body["errors"].get("content").is_none());
}

#[tokio::test]
async fn get_update_delete_item() {
    let app = TestApp::new();
    let item = create(&app, "First", "first").await;
    let id = item["id"].as_str().unwrap();
    let uri = format!("/api/cms/content/article/{id}");

    let body = response_json(app.get(&uri).await).await;
    assert_eq!(body["item"]["data"]["slug"], "first");

    let response = app.put_json(&uri, &article("First, revised", "first")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Content updated successfully");
    assert_eq!(body["item"]["data"]["title"], "First, revised");
    assert_eq!(body["item"]["createdAt"], item["createdAt"]);

    let response = app.delete(&uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Content deleted successfully");
    assert_eq!(body["id"], id);

    let response = app.get(&uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Content not found");
}

#[tokio::test]
async fn update_with_invalid_data_keeps_item() {
    let app = TestApp::new();
    let item = create(&app, "Keep", "keep").await;
    let uri = format!("/api/cms/content/article/{}", item["id"].as_str().unwrap());

    let response = app
        .put_json(&uri, &json!({ "data": { "title": "", "slug": "keep", "content": "x" } }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response_json(app.get(&uri).await).await;
    assert_eq!(body["item"]["data"]["title"], "Keep");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::new();
    let response = app
        .request(
            axum::http::Request::post("/api/cms/content/article")
                .header("content-type", "application/json")
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::has_key(&response_json(response).await, "error");
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn list_searches_filters_and_sorts() {
    let app = TestApp::new();
    create(&app, "Banana bread", "banana-bread").await;
    create(&app, "apple pie", "apple-pie").await;
    create(&app, "Cherry tart", "cherry-tart").await;

    let body = response_json(app.get("/api/cms/content/article?sort=title&direction=asc").await).await;
    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["data"]["title"].as_str().unwrap())
        .collect();
    // Byte order: uppercase before lowercase.
    assert_eq!(titles, ["Banana bread", "Cherry tart", "apple pie"]);
    assert_eq!(body["total"], 3);
    assert_eq!(body["contentType"]["name"], "article");

    let body = response_json(app.get("/api/cms/content/article?q=PIE").await).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["data"]["slug"], "apple-pie");

    let body = response_json(app.get("/api/cms/content/article?slug=cherry-tart").await).await;
    assert_eq!(body["total"], 1);

    let body = response_json(app.get("/api/cms/content/article?published=no").await).await;
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn list_paginates() {
    let app = TestApp::new();
    for n in 0..5 {
        create(&app, &format!("Post {n}"), &format!("post-{n}")).await;
    }

    let body = response_json(
        app.get("/api/cms/content/article?sort=title&direction=asc&page=2&per_page=2")
            .await,
    )
    .await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["page"], 2);
    assert_eq!(body["perPage"], 2);
    assert_eq!(body["items"][0]["data"]["title"], "Post 2");
    assert_eq!(body["items"][1]["data"]["title"], "Post 3");
}

#[tokio::test]
async fn list_unknown_type_is_404() {
    let app = TestApp::new();
    let response = app.get("/api/cms/content/recipe").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Admin pages
// =============================================================================

#[tokio::test]
async fn admin_add_form_renders_fields() {
    let app = TestApp::new();
    let response = app.get("/admin/content/article/new").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert::contains(&html, "<h1>Add Article</h1>");
    assert::contains(&html, r#"action="/admin/content/article/new""#);
    assert::contains(&html, r#"name="slug""#);
    assert::contains(&html, r#"type="checkbox""#);
}

#[tokio::test]
async fn admin_edit_form_and_list() {
    let app = TestApp::new();
    let item = create(&app, "Edit <me>", "edit-me").await;
    let id = item["id"].as_str().unwrap();

    let response = app.get(&format!("/admin/content/article/{id}/edit")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert::contains(&html, "Edit &lt;me&gt;");
    assert::contains(&html, &format!(r#"name="id" value="{id}""#));

    let html = response_text(app.get("/admin/content/article").await).await;
    assert::contains(&html, "1 item(s)");
    assert::contains(&html, &format!("/admin/content/article/{id}/edit"));
}

#[tokio::test]
async fn admin_pages_for_unknown_type_are_404() {
    let app = TestApp::new();
    assert_eq!(
        app.get("/admin/content/recipe/new").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/admin/content/article/missing/edit").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn admin_add_form_submission_creates_item() {
    let app = TestApp::new();
    let response = app
        .post_form(
            "/admin/content/article/new",
            "title=Hi&slug=hi&content=x&published=true&tags=news%2C+rust",
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin/content/article");

    let body = response_json(app.get("/api/cms/content/article").await).await;
    assert_eq!(body["total"], 1);
    let data = &body["items"][0]["data"];
    assert_eq!(data["title"], "Hi");
    assert_eq!(data["published"], true);
    assert_eq!(data["tags"], json!(["news", "rust"]));
}

#[tokio::test]
async fn admin_add_form_rejection_rerenders_with_errors() {
    let app = TestApp::new();
    let response = app
        .post_form("/admin/content/article/new", "title=Kept+title&slug=Not+A+Slug")
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = response_text(response).await;
    assert::contains(&html, r#"<div class="form-error">Slug format is invalid</div>"#);
    assert::contains(&html, r#"<div class="form-error">Content is required</div>"#);
    assert::contains(&html, r#"value="Kept title""#);

    let body = response_json(app.get("/api/cms/content/article").await).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn admin_edit_form_submission_updates_item() {
    let app = TestApp::new();
    let item = create(&app, "Before", "before").await;
    let id = item["id"].as_str().unwrap();
    let uri = format!("/admin/content/article/{id}/edit");

    let html = response_text(app.get(&uri).await).await;
    assert::contains(&html, &format!(r#"action="{uri}""#));

    let response = app
        .post_form(&uri, &format!("id={id}&title=After&slug=before&content=y"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = response_json(app.get(&format!("/api/cms/content/article/{id}")).await).await;
    assert_eq!(body["item"]["data"]["title"], "After");
    assert_eq!(body["item"]["data"]["content"], "y");
    assert_eq!(body["item"]["createdAt"], item["createdAt"]);

    let response = app
        .post_form(&uri, "title=&slug=before&content=y")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert::contains(&response_text(response).await, "Title is required");
}

#[tokio::test]
async fn admin_dashboard_lists_content_types() {
    let app = TestApp::new();
    let response = app.get("/admin").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert::contains(&html, "<h1>Dashboard</h1>");
    assert::contains(&html, r#"<span class="stat-number">1</span>"#);
    assert::contains(&html, r#"href="/admin/content/article""#);
    assert::contains(&html, "Blog articles and posts");
}

#[tokio::test]
async fn admin_content_types_page_lists_fields() {
    let app = TestApp::new();
    let html = response_text(app.get("/admin/content-types").await).await;

    assert::contains(&html, "<h1>Content Types</h1>");
    assert::contains(&html, "Name: article | Fields: 8");
    assert::contains(&html, r#"<strong>Slug</strong> <span class="field-type">(text)</span><span class="required">*</span>"#);
    assert::contains(&html, r#"href="/admin/content-types/new""#);
}

#[tokio::test]
async fn admin_new_content_type_form_registers_type() {
    let app = TestApp::new();
    let html = response_text(app.get("/admin/content-types/new").await).await;
    assert::contains(&html, r#"action="/admin/content-types/new""#);

    let fields = r#"[{"name":"title","type":"text","displayName":"Title","required":true}]"#;
    let body = format!(
        "name=recipe&displayName=Recipe&description=Dishes&fields={}",
        urlencode(fields)
    );
    let response = app.post_form("/admin/content-types/new", &body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin/content-types");

    let def = app.state.content_types().get("recipe").unwrap();
    assert_eq!(def.description.as_deref(), Some("Dishes"));
    assert_eq!(def.fields[0].name, "title");

    let html = response_text(app.get("/admin/content/recipe/new").await).await;
    assert::contains(&html, "<h1>Add Recipe</h1>");
}

#[tokio::test]
async fn admin_new_content_type_form_reports_errors() {
    let app = TestApp::new();

    let response = app
        .post_form("/admin/content-types/new", "name=Bad+Name&displayName=Bad&fields=%5B%5D")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = response_text(response).await;
    assert::contains(&html, "must start with a lowercase letter");
    assert::contains(&html, "Content type must have at least one field");
    assert::contains(&html, r#"value="Bad Name""#);

    let response = app
        .post_form("/admin/content-types/new", "name=broken&displayName=Broken&fields=not+json")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert::contains(&response_text(response).await, "Fields must be a JSON array");
    assert!(!app.state.content_types().exists("broken"));
}

/// Percent-encode every byte outside the unreserved set.
fn urlencode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
