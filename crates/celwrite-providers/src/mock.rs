//! Offline provider returning canned evaluations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use celwrite_core::traits::{ModelInfo, ScoreRequest, ScoreResponse, ScoringProvider, TokenUsage};

/// A well-formed evaluation payload.
pub fn sample_evaluation_json() -> String {
    json!({
        "bandScore": 8,
        "sections": {
            "taskAchievement": "All bullet points are addressed, though the solution could be more specific.",
            "coherenceAndCohesion": "Paragraphs are well ordered; transitions are basic.",
            "vocabularyRange": "Adequate but repetitive; 'good' and 'bad' appear often.",
            "grammarAccuracy": "Mostly accurate with occasional article errors.",
            "toneAndFormality": "Polite and appropriate for the reader."
        },
        "suggestions": [
            "Open each paragraph with a clear topic sentence.",
            "Replace general adjectives with precise ones."
        ],
        "vocabularyReplacements": [
            { "original": "good", "replacement": "advantageous", "reason": "more precise and formal" },
            { "original": "bad", "replacement": "detrimental", "reason": "stronger register" },
            { "original": "a lot of", "replacement": "numerous", "reason": "avoids informal phrasing" },
            { "original": "get", "replacement": "obtain", "reason": "more formal" },
            { "original": "think", "replacement": "believe", "reason": "states opinion with conviction" }
        ],
        "sampleModelResponse": "Dear Mr. Patel,\n\nI am writing to bring a recurring issue to your attention...",
        "annotatedResponse": "I am writing [to] complain about the noise."
    })
    .to_string()
}

/// A mock scoring provider for tests and offline demos.
///
/// Returns configurable responses based on prompt content matching, or
/// fails every call when built with [`MockProvider::failing`].
pub struct MockProvider {
    /// Map of prompt substring → reply.
    responses: HashMap<String, String>,
    default_response: String,
    failure: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<ScoreRequest>>,
}

impl MockProvider {
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: sample_evaluation_json(),
            failure: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A mock that always returns the same reply.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(HashMap::new())
        }
    }

    /// A mock whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(HashMap::new())
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<ScoreRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

#[async_trait]
impl ScoringProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<ScoreResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        // Rough estimate
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(ScoreResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
            native_schema: true,
        }]
    }
}
