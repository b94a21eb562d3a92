//! Request orchestration for `/process-file`.
//!
//! Resolve backend → extract inputs → main pass → summary pass → structure.

use axum::body::Bytes;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use mindmap_ingest::{DocumentExtractor, ExtractionError, Transcriber};
use mindmap_llm::{
    Backend, BackendError, BackendKind, GenerateOptions, Generation, UnknownModelError,
};
use mindmap_outline::{
    aggregate, build_tree, render_markdown, AggregateOptions, DroppedLine, MindmapNode,
    DEFAULT_ROOT_TITLE,
};

use crate::state::AppState;

/// Backend used when the form carries no `model` field.
pub const DEFAULT_MODEL: &str = "gemini";

// ── Request ───────────────────────────────────────────────────────

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub bytes: Bytes,
}

/// Client-supplied credentials, as sent by the browser's key manager.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
    #[serde(rename = "geminiKey", default)]
    pub gemini: Option<String>,
    #[serde(rename = "claudeKey", default)]
    pub claude: Option<String>,
    #[serde(rename = "mistralKey", default)]
    pub mistral: Option<String>,
}

impl ApiKeys {
    /// Key for `kind`, ignoring blank values. Ollama takes no key.
    pub fn for_backend(&self, kind: BackendKind) -> Option<String> {
        let key = match kind {
            BackendKind::Gemini => &self.gemini,
            BackendKind::Claude => &self.claude,
            BackendKind::Mistral => &self.mistral,
            BackendKind::Ollama => return None,
        };
        key.as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub prompt: String,
    pub model: String,
    pub ollama_model: Option<String>,
    pub api_keys: ApiKeys,
    pub pdf: Option<Upload>,
    pub audio: Option<Upload>,
}

impl Default for ProcessRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: DEFAULT_MODEL.to_string(),
            ollama_model: None,
            api_keys: ApiKeys::default(),
            pdf: None,
            audio: None,
        }
    }
}

// ── Response ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Main,
    Summary,
}

/// A chunk left out of one of the generation passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct SkippedChunkReport {
    pub pass: Pass,
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProcessResponse {
    pub model: String,
    pub original_text: String,
    pub model_response: String,
    pub model_summary: String,
    pub markdown: String,
    /// Nested `{title, children}` tree.
    #[schema(value_type = Object)]
    pub mindmap: MindmapNode,
    pub skipped_chunks: Vec<SkippedChunkReport>,
    /// Subtopic/detail lines that had no open parent.
    #[schema(value_type = Vec<Object>)]
    pub dropped_lines: Vec<DroppedLine>,
}

// ── Errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    UnknownModel(#[from] UnknownModelError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::BadRequest(_) | PipelineError::UnknownModel(_) => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

// ── Pipeline ──────────────────────────────────────────────────────

/// Prompt, PDF text and audio transcript in fixed order.
pub fn build_input_text(prompt: &str, pdf_text: &str, audio_text: &str) -> String {
    format!("{prompt}\n\n{pdf_text}\n{audio_text}")
}

pub async fn run(state: &AppState, request: ProcessRequest) -> Result<ProcessResponse, PipelineError> {
    // Unknown models are rejected before any extraction or network work.
    let backend = state.registry.resolve(&request.model)?;
    let kind = backend.kind();
    info!(model = %kind, "processing request");

    let pdf_text = match &request.pdf {
        Some(upload) => recover("pdf", state.pdf.extract(&upload.bytes).await),
        None => String::new(),
    };
    let audio_text = match &request.audio {
        Some(upload) => recover(
            "audio",
            transcribe(state.transcriber.as_ref(), upload).await,
        ),
        None => String::new(),
    };

    let input = build_input_text(&request.prompt, &pdf_text, &audio_text);
    info!(
        pdf_chars = pdf_text.len(),
        audio_chars = audio_text.len(),
        input_chars = input.len(),
        "input assembled"
    );

    let model = match kind {
        BackendKind::Ollama => request.ollama_model.clone().filter(|m| !m.trim().is_empty()),
        _ => None,
    };
    let api_key = request.api_keys.for_backend(kind);

    let main_options = GenerateOptions {
        system_prompt: state.prompts.mindmap.clone(),
        model: model.clone(),
        api_key: api_key.clone(),
    };
    let main = backend.generate(&input, &main_options).await?;
    let model_response = join_results(backend, &main);

    let structured = build_tree(&model_response, DEFAULT_ROOT_TITLE);
    let markdown = render_markdown(&model_response, DEFAULT_ROOT_TITLE);
    info!(
        nodes = structured.root.node_count(),
        dropped = structured.dropped.len(),
        "mind map structured"
    );

    let summary_options = GenerateOptions {
        system_prompt: state.prompts.summary.clone(),
        model,
        api_key,
    };
    let summary = backend.generate(&input, &summary_options).await?;
    let model_summary = join_results(backend, &summary);

    let skipped_chunks = report_skips(Pass::Main, &main)
        .chain(report_skips(Pass::Summary, &summary))
        .collect();

    Ok(ProcessResponse {
        model: kind.to_string(),
        original_text: input,
        model_response,
        model_summary,
        markdown,
        mindmap: structured.root,
        skipped_chunks,
        dropped_lines: structured.dropped,
    })
}

async fn transcribe(transcriber: &dyn Transcriber, upload: &Upload) -> Result<String, ExtractionError> {
    transcriber
        .transcribe(&upload.bytes, upload.filename.as_deref())
        .await
}

/// Extraction failures degrade to empty text.
fn recover(source: &str, result: Result<String, ExtractionError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            warn!(source, "extraction failed, continuing without it: {}", e);
            String::new()
        }
    }
}

fn join_results(backend: &Backend, generation: &Generation) -> String {
    aggregate(
        &generation.results,
        AggregateOptions {
            strip_headings: backend.is_chunked(),
        },
    )
}

fn report_skips(pass: Pass, generation: &Generation) -> impl Iterator<Item = SkippedChunkReport> + '_ {
    generation.skipped.iter().map(move |s| SkippedChunkReport {
        pass,
        index: s.index,
        reason: s.reason.to_string(),
    })
}
