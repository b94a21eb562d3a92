use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{CompletionRequest, LlmError, LlmProvider, Message, Role, SamplingParams};
use crate::retry::RetryPolicy;
use super::{http_client, read_json};

/// Local/self-hosted models via Ollama's chat API. Each attempt is bounded
/// by the client timeout; transport failures go through `retry`.
pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    retry: RetryPolicy,
}

impl OllamaProvider {
    pub fn new(
        url: String,
        model: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(timeout)?,
            url: url.trim_end_matches('/').to_string(),
            model,
            retry,
        })
    }

    fn build_request_body(model: &str, messages: &[Message], params: &SamplingParams) -> serde_json::Value {
        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::System => "system",
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let mut options = json!({
            "temperature": params.temperature,
            "num_predict": params.max_tokens,
        });
        if let Some(top_p) = params.top_p {
            options["top_p"] = json!(top_p);
        }
        if let Some(penalty) = params.repeat_penalty {
            options["repeat_penalty"] = json!(penalty);
        }

        json!({
            "model": model,
            "messages": api_messages,
            "stream": false,
            "options": options,
        })
    }

    async fn send_once(&self, url: &str, body: &serde_json::Value) -> Result<String, LlmError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let resp = read_json(response).await?;
        let content = resp["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing message.content".into()))?
            .to_string();

        Ok(content)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.url);
        let model = request.resolve_model(&self.model);
        let body = Self::build_request_body(model, &request.messages, &request.params);

        debug!("Ollama request to {} (model={})", url, model);

        self.retry
            .run("ollama", || self.send_once(&url, &body))
            .await
    }
}
