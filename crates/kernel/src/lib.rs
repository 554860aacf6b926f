//! Tessera CMS Kernel Library
//!
//! Content type registry, validation, query building and the HTTP layer.
//! The main entry point for running the server is the `tessera` binary.

pub mod config;
pub mod content;
pub mod error;
pub mod query;
pub mod routes;
pub mod state;

use axum::Router;
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use config::Config;
pub use state::AppState;

/// Build the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let cors = build_cors_layer(state.config());

    Router::new()
        .merge(routes::health::router())
        .merge(routes::content_type::router())
        .merge(routes::content::router())
        .merge(routes::admin::router())
        // Middleware layers (last added = first executed in request flow)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    }
}
