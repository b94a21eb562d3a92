pub mod claude;
pub mod gemini;
pub mod mistral;
pub mod ollama;

use std::sync::Arc;
use std::time::Duration;

use mindmap_core::config::{LlmConfig, OllamaConfig};

use crate::backend::BackendKind;
use crate::provider::{LlmError, LlmProvider};
use crate::retry::RetryPolicy;

/// Create the provider for one backend kind from config.
///
/// Missing API keys are not an error here: callers may supply a key per
/// request, and the provider reports `NotConfigured` at call time otherwise.
pub fn create_provider(
    kind: BackendKind,
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let timeout = Duration::from_secs(llm_config.request_timeout_secs);
    let provider: Arc<dyn LlmProvider> = match kind {
        BackendKind::Gemini => Arc::new(gemini::GeminiProvider::new(
            llm_config.gemini_api_key.clone(),
            llm_config.gemini_model.clone(),
            llm_config.gemini_base_url.clone(),
            timeout,
        )?),
        BackendKind::Claude => Arc::new(
            claude::ClaudeProvider::new(
                llm_config.anthropic_api_key.clone(),
                llm_config.anthropic_model.clone(),
                timeout,
            )?
            .with_base_url(llm_config.anthropic_base_url.clone()),
        ),
        BackendKind::Mistral => Arc::new(mistral::MistralProvider::new(
            llm_config.mistral_api_key.clone(),
            llm_config.mistral_model.clone(),
            llm_config.mistral_base_url.clone(),
            timeout,
        )?),
        BackendKind::Ollama => Arc::new(ollama::OllamaProvider::new(
            ollama_config.url.clone(),
            ollama_config.model.clone(),
            Duration::from_secs(ollama_config.timeout_secs),
            RetryPolicy::fixed(
                ollama_config.max_attempts,
                Duration::from_millis(ollama_config.retry_backoff_ms),
            ),
        )?),
    };
    Ok(provider)
}

// ── Shared HTTP plumbing ──────────────────────────────────────────

/// Client whose every request is bounded by `timeout`.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Decode a provider reply. Non-200 statuses become `ApiError`; a 200 whose
/// body is not JSON becomes `ParseError`.
pub(crate) async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = response.status().as_u16();
    if status != 200 {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::ApiError { status, body });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| LlmError::ParseError(format!("invalid JSON body: {e}")))
}
