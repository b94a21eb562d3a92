use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{CompletionRequest, LlmError, LlmProvider, Message, Role, SamplingParams};
use super::{http_client, read_json};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

pub struct ClaudeProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl ClaudeProvider {
    pub fn new(api_key: Option<String>, model: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
            base_url: ANTHROPIC_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request_body(model: &str, messages: &[Message], params: &SamplingParams) -> serde_json::Value {
        // Claude API uses separate system parameter
        let system_msg = messages
            .iter()
            .find(|m| matches!(m.role, Role::System))
            .map(|m| m.content.clone());

        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .filter(|m| !matches!(m.role, Role::System))
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::Assistant => "assistant",
                        _ => "user",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let mut body = json!({
            "model": model,
            "messages": api_messages,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        if let Some(top_p) = params.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(system) = system_msg {
            body["system"] = json!(system);
        }

        body
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let api_key = request.resolve_key(self.api_key.as_deref(), "Claude")?;
        let model = request.resolve_model(&self.model);
        let url = format!("{}/v1/messages", self.base_url);

        let body = Self::build_request_body(model, &request.messages, &request.params);

        debug!("Claude request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let resp = read_json(response).await?;
        let content = resp["content"][0]["text"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing content[0].text".into()))?
            .to_string();

        Ok(content)
    }
}
