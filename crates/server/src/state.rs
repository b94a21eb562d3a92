use std::sync::Arc;

use tracing::info;

use mindmap_core::{Config, MindmapError};
use mindmap_ingest::{transcriber_from_config, DocumentExtractor, PdfExtractor, Transcriber};
use mindmap_llm::{BackendRegistry, PromptTemplates};

/// Immutable per-process state shared by all requests.
pub struct AppState {
    pub registry: BackendRegistry,
    pub pdf: Arc<dyn DocumentExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub prompts: PromptTemplates,
    /// Redacted config snapshot reported by `/health`.
    pub config_summary: serde_json::Value,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, MindmapError> {
        let registry = BackendRegistry::from_config(&config.llm, &config.ollama)
            .map_err(|e| MindmapError::Config(format!("backend setup: {e}")))?;
        let prompts = PromptTemplates::load(config.prompts.dir.as_deref())?;

        if !config.transcription.is_configured() {
            info!("No transcription endpoint configured; audio uploads will be ignored");
        }

        Ok(Self {
            registry,
            pdf: Arc::new(PdfExtractor),
            transcriber: transcriber_from_config(&config.transcription),
            prompts,
            config_summary: config.redacted_summary(),
        })
    }
}
