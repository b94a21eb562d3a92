//! HTTP handlers.

pub mod doc;
mod health;
mod process;

use serde::Serialize;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub use health::{health, HealthResponse};
pub use process::process_file;
