//! Anthropic Messages API provider.
//!
//! The Messages API has no schema-constrained output mode, so the schema is
//! appended to the system prompt and any markdown fence around the reply is
//! stripped before it is handed back.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use celwrite_core::traits::{
    extract_json_from_markdown, ModelInfo, ScoreRequest, ScoreResponse, ScoringProvider,
    TokenUsage,
};

use crate::error::{check_status, ProviderError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API provider.
pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredential("anthropic".into()));
        }
        let client = crate::http_client(timeout_secs)?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs,
            client,
        })
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: AnthropicUsage,
    model: String,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

fn system_with_schema(request: &ScoreRequest) -> String {
    let schema = serde_json::to_string_pretty(&request.response_schema)
        .unwrap_or_else(|_| request.response_schema.to_string());
    format!(
        "{}\n\nRespond with one JSON object that validates against this JSON Schema, \
         and nothing else:\n{}",
        request.system_prompt, schema
    )
}

#[async_trait]
impl ScoringProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<ScoreResponse> {
        let start = Instant::now();

        let body = AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: system_with_schema(request),
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;

        let response = check_status(response, &request.model).await?;

        let api_response: AnthropicResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let text: String = api_response
            .content
            .iter()
            .map(|c| c.text.as_str())
            .collect();

        let usage = api_response.usage;
        Ok(ScoreResponse {
            content: extract_json_from_markdown(&text),
            model: api_response.model,
            token_usage: TokenUsage {
                prompt_tokens: usage.input_tokens,
                completion_tokens: usage.output_tokens,
                total_tokens: usage.input_tokens + usage.output_tokens,
            },
            latency_ms,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: "claude-sonnet-4-20250514".into(),
                name: "Claude Sonnet 4".into(),
                provider: "anthropic".into(),
                max_context: 200_000,
                native_schema: false,
            },
            ModelInfo {
                id: "claude-haiku-4-5-20251001".into(),
                name: "Claude Haiku 4.5".into(),
                provider: "anthropic".into(),
                max_context: 200_000,
                native_schema: false,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ScoreRequest {
        ScoreRequest {
            model: "claude-sonnet-4-20250514".into(),
            system_prompt: "You are an examiner.".into(),
            prompt: "TASK: EMAIL".into(),
            response_schema: json!({ "type": "object", "required": ["bandScore"] }),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }

    #[test]
    fn schema_goes_into_system_prompt() {
        let system = system_with_schema(&request());
        assert!(system.starts_with("You are an examiner."));
        assert!(system.contains("\"required\""));
    }

    #[tokio::test]
    async fn fenced_reply_is_unwrapped() {
        let server = MockServer::start().await;

        let response_body = json!({
            "content": [{"type": "text", "text": "```json\n{\"bandScore\": 10}\n```"}],
            "model": "claude-sonnet-4-20250514",
            "usage": {"input_tokens": 50, "output_tokens": 20}
        });

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("test-key", Some(server.uri()), 10).unwrap();
        let response = provider.score(&request()).await.unwrap();
        assert_eq!(response.content, "{\"bandScore\": 10}");
        assert_eq!(response.token_usage.total_tokens, 70);
    }

    #[tokio::test]
    async fn authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("bad-key", Some(server.uri()), 10).unwrap();
        let err = provider.score(&request()).await.unwrap_err();
        assert!(err.to_string().contains("authentication failed: invalid x-api-key"));
    }
}
