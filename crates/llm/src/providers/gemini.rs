use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{CompletionRequest, LlmError, LlmProvider, Message, Role, SamplingParams};
use super::{http_client, read_json};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: Option<String>,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the request body for the Gemini generateContent API.
    fn build_request_body(messages: &[Message], params: &SamplingParams) -> serde_json::Value {
        // Gemini uses a separate system_instruction field (like Claude)
        let system_msg = messages
            .iter()
            .find(|m| matches!(m.role, Role::System))
            .map(|m| m.content.clone());

        let contents: Vec<serde_json::Value> = messages
            .iter()
            .filter(|m| !matches!(m.role, Role::System))
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::Assistant => "model",
                        _ => "user",
                    },
                    "parts": [{ "text": m.content }],
                })
            })
            .collect();

        let mut generation_config = json!({
            "temperature": params.temperature,
            "maxOutputTokens": params.max_tokens,
        });
        if let Some(top_p) = params.top_p {
            generation_config["topP"] = json!(top_p);
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });

        if let Some(system) = system_msg {
            body["system_instruction"] = json!({
                "parts": [{ "text": system }],
            });
        }

        body
    }

    /// Concatenate every text part of the first candidate.
    fn extract_text(resp: &serde_json::Value) -> Result<String, LlmError> {
        let parts = resp["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| LlmError::ParseError("missing candidates[0].content.parts".into()))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect();

        if text.is_empty() {
            return Err(LlmError::ParseError(
                "missing candidates[0].content.parts[].text".into(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let api_key = request.resolve_key(self.api_key.as_deref(), "Gemini")?;
        let model = request.resolve_model(&self.model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model,
        );

        let body = Self::build_request_body(&request.messages, &request.params);

        debug!("Gemini request to model={}", model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let resp = read_json(response).await?;
        Self::extract_text(&resp)
    }
}
