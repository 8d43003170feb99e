//! Session reports: a saved record of one scored attempt.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{word_count, EvaluationResult, Question};
use crate::session::{Phase, Session};

/// Everything needed to render feedback for one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub question: Question,
    pub response_text: String,
    pub word_count: usize,
    /// Time left on the clock at submission; 0 when time ran out.
    pub seconds_remaining: u32,
    pub provider: String,
    pub model: String,
    pub result: EvaluationResult,
}

impl SessionReport {
    /// Build a report from an evaluated session. `None` unless the session
    /// is in `Evaluated`.
    pub fn from_session(session: &Session, provider: &str, model: &str) -> Option<Self> {
        if session.phase() != Phase::Evaluated {
            return None;
        }
        let question = session.question()?.clone();
        let result = session.result()?.clone();
        Some(Self::new(
            question,
            session.response_text(),
            session.seconds_remaining(),
            provider,
            model,
            result,
        ))
    }

    pub fn new(
        question: Question,
        response_text: &str,
        seconds_remaining: u32,
        provider: &str,
        model: &str,
        result: EvaluationResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            question,
            response_text: response_text.to_string(),
            word_count: word_count(response_text),
            seconds_remaining,
            provider: provider.to_string(),
            model: model.to_string(),
            result,
        }
    }

    /// Whether the response length was inside the question's bounds.
    pub fn word_count_ok(&self) -> bool {
        self.question.word_count.contains(self.word_count)
    }

    /// Save the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse report JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::evaluation::parse_evaluation;
    use crate::evaluation::tests::valid_payload;

    fn result() -> EvaluationResult {
        parse_evaluation(&valid_payload().to_string()).unwrap()
    }

    #[test]
    fn from_session_requires_evaluated_phase() {
        let question = Catalog::builtin().get("t1-1").unwrap().clone();
        let mut session = Session::new();
        session.start(question, None).unwrap();
        session.update_response("Dear neighbour, the noise").unwrap();
        assert!(SessionReport::from_session(&session, "mock", "m").is_none());

        session.request_evaluation(true).unwrap();
        session.complete_evaluation(Ok(result())).unwrap();

        let report = SessionReport::from_session(&session, "mock", "m").unwrap();
        assert_eq!(report.word_count, 4);
        assert!(!report.word_count_ok());
        assert_eq!(report.seconds_remaining, 1620);
        assert_eq!(report.result.band_score, 8.5);
    }

    #[test]
    fn json_file_roundtrip() {
        let question = Catalog::builtin().get("t2-1").unwrap().clone();
        let report = SessionReport::new(question, "I choose A", 30, "gemini", "g", result());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        report.save_json(&path).unwrap();

        let loaded = SessionReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.question.id, "t2-1");
        assert_eq!(loaded.result, report.result);
    }

    #[test]
    fn load_missing_file_fails_with_context() {
        let err = SessionReport::load_json(Path::new("/nonexistent/report.json")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read report"));
    }
}
