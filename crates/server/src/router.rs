//! HTTP router construction.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use mindmap_core::config::ServerConfig;

use crate::api;
use crate::state::AppState;

/// Build the application router: API routes, CORS and the `/docs` UI.
pub fn build_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let upload_limit = server.max_upload_mb.max(1) * 1024 * 1024;

    Router::new()
        .route("/health", get(api::health))
        .route(
            "/process-file",
            post(api::process_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .layer(cors_layer(server))
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    if server.allows_any_origin() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
