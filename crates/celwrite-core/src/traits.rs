//! Core trait definitions for scoring providers.
//!
//! The trait is implemented by the `celwrite-providers` crate; the core only
//! sees raw text coming back and does its own strict parsing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scoring provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that score a written response.
#[async_trait]
pub trait ScoringProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send a scoring request and return the raw reply text.
    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<ScoreResponse>;

    /// List known models for this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// A single structured-output request to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Model identifier (e.g. "gemini-3-flash-preview").
    pub model: String,
    pub system_prompt: String,
    /// The user turn: task description plus the response under review.
    pub prompt: String,
    /// JSON Schema the reply must satisfy.
    pub response_schema: serde_json::Value,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Raw reply from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Reply text; expected to be a JSON document.
    pub content: String,
    /// Model that actually produced the reply.
    pub model: String,
    pub token_usage: TokenUsage,
    pub latency_ms: u64,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
    /// Whether the provider enforces the response schema itself.
    pub native_schema: bool,
}

// ---------------------------------------------------------------------------
// Markdown JSON extraction
// ---------------------------------------------------------------------------

/// Pull a JSON document out of a markdown-formatted reply.
///
/// Providers without native structured output sometimes wrap the object in a
/// fence. Handles:
/// - a ```json block (preferred)
/// - a bare ``` block
/// - an unclosed fence (truncated reply)
/// - no fence at all (returned trimmed)
pub fn extract_json_from_markdown(response: &str) -> String {
    let mut json_block: Option<String> = None;
    let mut generic_block: Option<String> = None;
    let mut in_block = false;
    let mut is_json_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block && json_block.is_none() {
                json_block = Some(current_block.clone());
            } else if !is_json_block && generic_block.is_none() {
                generic_block = Some(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    if in_block && !current_block.is_empty() {
        if is_json_block && json_block.is_none() {
            json_block = Some(current_block);
        } else if generic_block.is_none() {
            generic_block = Some(current_block);
        }
    }

    json_block
        .or(generic_block)
        .unwrap_or_else(|| response.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_block() {
        let input = "Here you go:\n\n```json\n{\"bandScore\": 8}\n```\n\nGood luck!";
        assert_eq!(extract_json_from_markdown(input), "{\"bandScore\": 8}");
    }

    #[test]
    fn extract_prefers_json_over_generic() {
        let input = "```\nnot this\n```\n\n```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json_from_markdown(input), "{\"a\": 1}");
    }

    #[test]
    fn extract_generic_block_fallback() {
        let input = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_from_markdown(input), "{\"a\": 1}");
    }

    #[test]
    fn extract_no_fence_returns_trimmed() {
        let input = "  {\"a\": 1}\n";
        assert_eq!(extract_json_from_markdown(input), "{\"a\": 1}");
    }

    #[test]
    fn extract_truncated_unclosed_block() {
        let input = "```json\n{\"a\":\n  1";
        let json = extract_json_from_markdown(input);
        assert!(json.starts_with("{\"a\":"), "got: {json}");
    }
}
