use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chat message for the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Generation knobs. Fixed per backend, never taken from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    /// Nucleus-sampling threshold.
    pub top_p: Option<f32>,
    /// Maximum output length in tokens.
    pub max_tokens: u32,
    /// Only honoured by providers that have one (Ollama).
    pub repeat_penalty: Option<f32>,
}

/// One call to a provider. `model` and `api_key` override the provider's
/// configured defaults for this call only.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub params: SamplingParams,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl CompletionRequest {
    /// The system message, if any.
    pub fn system(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Pick the per-request key, else the configured one.
    pub(crate) fn resolve_key<'a>(
        &'a self,
        configured: Option<&'a str>,
        provider: &str,
    ) -> Result<&'a str, LlmError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .or(configured)
            .ok_or_else(|| LlmError::NotConfigured(format!("{provider} API key not set")))
    }

    pub(crate) fn resolve_model<'a>(&'a self, configured: &'a str) -> &'a str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(configured)
    }
}

/// One remote chat-completion API.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and return the assistant's response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(reqwest::Error),
    #[error("API error: {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for LlmError {
    /// The URL is stripped: error text reaches logs and HTTP responses.
    fn from(e: reqwest::Error) -> Self {
        LlmError::HttpError(e.without_url())
    }
}

impl LlmError {
    /// Connection, timeout and request-building failures. These are the only
    /// errors worth retrying; a non-2xx status or a bad payload is final.
    pub fn is_transport(&self) -> bool {
        match self {
            LlmError::HttpError(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}
