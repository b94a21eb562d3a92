use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Registered backend discriminators.
    pub backends: Vec<String>,
    #[schema(value_type = Object)]
    pub config: serde_json::Value,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backends: state
            .registry
            .kinds()
            .into_iter()
            .map(|k| k.to_string())
            .collect(),
        config: state.config_summary.clone(),
    })
}
