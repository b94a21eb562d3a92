use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, error, warn};

use crate::pipeline::{self, ApiKeys, PipelineError, ProcessRequest, ProcessResponse, Upload};
use crate::state::AppState;

use super::ErrorResponse;

type ApiError = (StatusCode, Json<ErrorResponse>);

#[utoipa::path(
    post,
    path = "/process-file",
    tag = "Mindmap",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: prompt, pdf_file, audio_file, model (gemini|claude|mistral|ollama), ollama_model, api_keys (JSON)"
    ),
    responses(
        (status = 200, description = "Mind map generated", body = ProcessResponse),
        (status = 400, description = "Malformed form or unknown model", body = ErrorResponse),
        (status = 502, description = "LLM backend failed", body = ErrorResponse)
    )
)]
pub async fn process_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let request = read_form(multipart).await.map_err(into_response)?;

    match pipeline::run(&state, request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("process-file failed: {}", e);
            Err(into_response(e))
        }
    }
}

fn into_response(e: PipelineError) -> ApiError {
    (e.status(), Json(ErrorResponse { error: e.to_string() }))
}

// ── Form parsing ──────────────────────────────────────────────────

async fn read_form(mut multipart: Multipart) -> Result<ProcessRequest, PipelineError> {
    let mut request = ProcessRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "prompt" => request.prompt = field.text().await.map_err(form_error)?,
            "model" => {
                let model = field.text().await.map_err(form_error)?;
                if !model.trim().is_empty() {
                    request.model = model.trim().to_string();
                }
            }
            "ollama_model" => {
                request.ollama_model = Some(field.text().await.map_err(form_error)?);
            }
            "api_keys" => {
                let raw = field.text().await.map_err(form_error)?;
                if !raw.trim().is_empty() {
                    request.api_keys = serde_json::from_str::<ApiKeys>(&raw).map_err(|e| {
                        PipelineError::BadRequest(format!("api_keys is not valid JSON: {e}"))
                    })?;
                }
            }
            "pdf_file" => request.pdf = read_upload(field).await?,
            "audio_file" => request.audio = read_upload(field).await?,
            other => debug!("ignoring form field '{}'", other),
        }
    }

    Ok(request)
}

/// Empty file parts (a form submitted without a file) count as absent.
async fn read_upload(field: Field<'_>) -> Result<Option<Upload>, PipelineError> {
    let filename = field.file_name().map(str::to_string);
    let bytes = field.bytes().await.map_err(form_error)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    debug!(?filename, size = bytes.len(), "received upload");
    Ok(Some(Upload { filename, bytes }))
}

fn form_error(e: MultipartError) -> PipelineError {
    warn!("multipart error: {}", e);
    PipelineError::BadRequest(format!("multipart error: {}", e.body_text()))
}
