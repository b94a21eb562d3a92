use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{CompletionRequest, LlmError, LlmProvider, Message, Role, SamplingParams};
use super::{http_client, read_json};

/// Mistral's chat completions API (OpenAI-compatible request shape).
pub struct MistralProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl MistralProvider {
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

        let mut body = json!({
            "model": model,
            "messages": api_messages,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });
        if let Some(top_p) = params.top_p {
            body["top_p"] = json!(top_p);
        }
        body
    }
}

#[async_trait]
impl LlmProvider for MistralProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let api_key = request.resolve_key(self.api_key.as_deref(), "Mistral")?;
        let model = request.resolve_model(&self.model);
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = Self::build_request_body(model, &request.messages, &request.params);

        debug!("Mistral request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let resp = read_json(response).await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))?
            .to_string();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    use super::super::stub;
    use super::*;

    #[test]
    fn keeps_system_message_inline() {
        let messages = vec![Message::system("Style."), Message::user("Chunk text.")];
        let params = SamplingParams {
            temperature: 0.7,
            top_p: Some(0.9),
            max_tokens: 1024,
            repeat_penalty: None,
        };

        let body = MistralProvider::build_request_body("mistral-small", &messages, &params);

        let api_messages = body["messages"].as_array().unwrap();
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0]["role"], "system");
        assert_eq!(api_messages[1]["role"], "user");
        assert_eq!(body["model"], "mistral-small");
        assert_eq!(body["max_tokens"], 1024);
        assert!(body.get("top_p").is_some());
    }

    fn provider(base_url: String, timeout: Duration) -> MistralProvider {
        MistralProvider::new(None, "mistral-small".into(), base_url, timeout).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![Message::system("Style."), Message::user("Chunk text.")],
            params: SamplingParams {
                temperature: 0.7,
                top_p: Some(0.9),
                max_tokens: 1024,
                repeat_penalty: None,
            },
            model: None,
            api_key: Some("mistral-key".into()),
        }
    }

    #[tokio::test]
    async fn posts_chat_completion_with_bearer_key() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
                if auth != Some("Bearer mistral-key") || body["model"] != "mistral-small" {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })));
                }
                let reply = json!({
                    "choices": [{ "message": { "role": "assistant", "content": "*Chunk*" } }]
                });
                (StatusCode::OK, Json(reply))
            }),
        );
        let addr = stub::serve(app).await;

        let reply = provider(format!("http://{addr}"), Duration::from_secs(5))
            .complete(&request())
            .await
            .unwrap();
        assert_eq!(reply, "*Chunk*");
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "context too long") }),
        );
        let addr = stub::serve(app).await;

        let err = provider(format!("http://{addr}"), Duration::from_secs(5))
            .complete(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ApiError { status: 422, .. }), "got {err}");
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let app = Router::new().route("/v1/chat/completions", post(|| async { "not json" }));
        let addr = stub::serve(app).await;

        let err = provider(format!("http://{addr}"), Duration::from_secs(5))
            .complete(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)), "got {err}");
    }

    #[tokio::test]
    async fn slow_upstream_hits_the_client_timeout() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "choices": [{ "message": { "content": "late" } }] }))
            }),
        );
        let addr = stub::serve(app).await;

        let err = provider(format!("http://{addr}"), Duration::from_millis(100))
            .complete(&request())
            .await
            .unwrap_err();
        assert!(
            matches!(&err, LlmError::HttpError(e) if e.is_timeout()),
            "expected timeout, got {err}"
        );
    }
}
