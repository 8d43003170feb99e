//! Evaluation client: request building, the response schema, strict parsing.
//!
//! Every failure on the way (transport, non-success status, deadline, empty
//! or malformed payload) is normalized to a single [`EvaluationError`]. No
//! retries happen here; the caller re-submits if the user asks to.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::error::{EvaluationError, ParseError};
use crate::model::{EvaluationResult, Question, TaskKind};
use crate::traits::{ScoreRequest, ScoringProvider};

/// What the scorer is told about the attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub task_kind: TaskKind,
    pub title: String,
    pub prompt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub response_text: String,
}

impl EvaluationRequest {
    pub fn new(question: &Question, response_text: &str) -> Self {
        Self {
            task_kind: question.kind,
            title: question.title.clone(),
            prompt_text: question.prompt_text.clone(),
            options: question.choices.clone(),
            response_text: response_text.to_string(),
        }
    }
}

/// Instruction given to the scoring model ahead of every request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are an experienced CELPIP Writing examiner. Assess the candidate's response \
strictly against official CELPIP Writing standards.

Assess five areas:
1. Task Achievement: relevance, completeness, every requirement addressed.
2. Coherence and Cohesion: logical organization and transitions.
3. Vocabulary Range: precision, range and naturalness.
4. Grammar Accuracy: sentence variety and correctness.
5. Tone and Formality: suitability for the audience and the task.

Return:
- bandScore: a level from 1 to 12 (12 is near perfect); be honest.
- sections: detailed feedback per area, naming strengths and weak points.
- suggestions: concrete next steps.
- vocabularyReplacements: at least five weak words from the response, each with a \
stronger (CLB 9+) replacement and the reason.
- sampleModelResponse: a level-12 answer to the same task in 150-200 words.
- annotatedResponse: the candidate's text with [corrections] inline.

Reply with JSON only.";

/// Render the user turn sent to the scorer.
pub fn build_scoring_prompt(request: &EvaluationRequest) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("TASK: {}\n", request.task_kind));
    prompt.push_str(&format!("TITLE: {}\n", request.title));
    prompt.push_str(&format!("PROMPT: {}\n", request.prompt_text));
    if let Some(options) = &request.options {
        prompt.push_str(&format!("OPTIONS: {}\n", options.join(", ")));
    }
    prompt.push_str("\nSTUDENT RESPONSE:\n---\n");
    prompt.push_str(&request.response_text);
    prompt.push_str("\n---\n\nProvide a robust and honest CELPIP evaluation in JSON format.");
    prompt
}

/// JSON Schema for [`EvaluationResult`]. All fields except
/// `annotatedResponse` are required and no extra properties are allowed.
pub fn response_schema() -> serde_json::Value {
    let string = json!({ "type": "string" });
    json!({
        "type": "object",
        "properties": {
            "bandScore": { "type": "number" },
            "sections": {
                "type": "object",
                "properties": {
                    "taskAchievement": string,
                    "coherenceAndCohesion": string,
                    "vocabularyRange": string,
                    "grammarAccuracy": string,
                    "toneAndFormality": string
                },
                "required": [
                    "taskAchievement",
                    "coherenceAndCohesion",
                    "vocabularyRange",
                    "grammarAccuracy",
                    "toneAndFormality"
                ],
                "additionalProperties": false
            },
            "suggestions": { "type": "array", "items": string },
            "vocabularyReplacements": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "original": string,
                        "replacement": string,
                        "reason": string
                    },
                    "required": ["original", "replacement", "reason"],
                    "additionalProperties": false
                }
            },
            "sampleModelResponse": string,
            "annotatedResponse": string
        },
        "required": [
            "bandScore",
            "sections",
            "suggestions",
            "vocabularyReplacements",
            "sampleModelResponse"
        ],
        "additionalProperties": false
    })
}

/// Parse a scorer payload into an [`EvaluationResult`].
///
/// Rejects empty payloads, missing required fields, wrong types and unknown
/// fields. No coercion is attempted.
pub fn parse_evaluation(raw: &str) -> Result<EvaluationResult, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let result: EvaluationResult =
        serde_json::from_str(trimmed).map_err(|e| ParseError::Schema(e.to_string()))?;
    if !result.band_score.is_finite() {
        return Err(ParseError::Schema("bandScore is not a finite number".into()));
    }
    Ok(result)
}

/// Tuning for scoring calls.
#[derive(Debug, Clone)]
pub struct ScoringSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Upper bound on a single scoring call; `None` waits indefinitely.
    pub deadline: Option<Duration>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            model: "gemini-3-flash-preview".into(),
            temperature: 0.7,
            max_tokens: 4096,
            deadline: Some(Duration::from_secs(120)),
        }
    }
}

/// Sends finished responses to a scoring provider and validates the reply.
pub struct EvaluationClient {
    provider: Arc<dyn ScoringProvider>,
    settings: ScoringSettings,
}

impl EvaluationClient {
    pub fn new(provider: Arc<dyn ScoringProvider>, settings: ScoringSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Score one response.
    #[instrument(skip_all, fields(provider = %self.provider.name(), title = %request.title))]
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationError> {
        let score_request = ScoreRequest {
            model: self.settings.model.clone(),
            system_prompt: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_scoring_prompt(request),
            response_schema: response_schema(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let call = self.provider.score(&score_request);
        let outcome = match self.settings.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("scoring call exceeded {}s deadline", deadline.as_secs());
                    return Err(EvaluationError::timeout(deadline.as_secs()));
                }
            },
            None => call.await,
        };

        let response = outcome.map_err(|e| {
            warn!("scoring call failed: {e:#}");
            EvaluationError::transport(format!("{e:#}"))
        })?;

        debug!(
            model = %response.model,
            latency_ms = response.latency_ms,
            tokens = response.token_usage.total_tokens,
            "scorer replied"
        );

        let result = parse_evaluation(&response.content).map_err(|e| {
            warn!("scorer payload rejected: {e}");
            EvaluationError::from(e)
        })?;

        info!(band_score = result.band_score, "evaluation complete");
        Ok(result)
    }
}
