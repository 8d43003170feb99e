//! Core data model types for celwrite.
//!
//! Questions are created once (catalog load or custom creation) and never
//! mutated; evaluation results are opaque snapshots returned by the scorer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// The closed set of writing task categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Task 1: write an email (correspondence).
    Email,
    /// Task 2: respond to a survey by choosing an option.
    Survey,
}

impl TaskKind {
    pub const ALL: [TaskKind; 2] = [TaskKind::Email, TaskKind::Survey];

    /// Default time limit in minutes for this kind of task.
    pub fn default_time_limit(self) -> u32 {
        match self {
            TaskKind::Email => 27,
            TaskKind::Survey => 26,
        }
    }

    /// Human-readable label used in listings.
    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Email => "Task 1: Email",
            TaskKind::Survey => "Task 2: Survey",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Email => write!(f, "EMAIL"),
            TaskKind::Survey => write!(f, "SURVEY"),
        }
    }
}

impl FromStr for TaskKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" | "task1" | "t1" => Ok(TaskKind::Email),
            "survey" | "task2" | "t2" => Ok(TaskKind::Survey),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// Inclusive word-count bounds for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    pub min: u32,
    pub max: u32,
}

impl WordRange {
    pub const DEFAULT: WordRange = WordRange { min: 150, max: 200 };

    pub fn contains(&self, count: usize) -> bool {
        count >= self.min as usize && count <= self.max as usize
    }
}

impl Default for WordRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for WordRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// A writing prompt the user answers under a countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier; also the draft key.
    pub id: String,
    pub kind: TaskKind,
    pub title: String,
    /// The task description shown to the user.
    pub prompt_text: String,
    #[serde(default)]
    pub word_count: WordRange,
    /// Minutes allowed for the response.
    pub time_limit_minutes: u32,
    /// Options to choose from (survey tasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    /// Checklist of what a good response includes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidelines: Option<Vec<String>>,
}

/// Longest countdown a question may ask for (one day).
pub const MAX_TIME_LIMIT_MINUTES: u32 = 24 * 60;

impl Question {
    /// Countdown length in seconds.
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }

    /// Check the structural invariants every question must hold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.prompt_text.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        if self.word_count.min == 0 || self.word_count.min > self.word_count.max {
            return Err(ValidationError::InvalidWordRange {
                min: self.word_count.min,
                max: self.word_count.max,
            });
        }
        if self.time_limit_minutes == 0 {
            return Err(ValidationError::ZeroTimeLimit);
        }
        if self.time_limit_minutes > MAX_TIME_LIMIT_MINUTES {
            return Err(ValidationError::TimeLimitTooLong {
                minutes: self.time_limit_minutes,
                max: MAX_TIME_LIMIT_MINUTES,
            });
        }
        Ok(())
    }
}

/// Count whitespace-delimited tokens in the trimmed text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ---------------------------------------------------------------------------
// Evaluation result
// ---------------------------------------------------------------------------

/// Structured feedback returned by the external scorer.
///
/// Deserialization is strict: every required field must be present and no
/// unknown fields are accepted at any level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EvaluationResult {
    pub band_score: f64,
    pub sections: RubricSections,
    pub suggestions: Vec<String>,
    pub vocabulary_replacements: Vec<VocabularyReplacement>,
    pub sample_model_response: String,
    /// The user's text with inline corrections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_response: Option<String>,
}

/// Narrative feedback per rubric category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RubricSections {
    pub task_achievement: String,
    pub coherence_and_cohesion: String,
    pub vocabulary_range: String,
    pub grammar_accuracy: String,
    pub tone_and_formality: String,
}

impl RubricSections {
    /// Sections in display order with their headings.
    pub fn iter(&self) -> [(&'static str, &str); 5] {
        [
            ("Task Achievement", self.task_achievement.as_str()),
            ("Coherence and Cohesion", self.coherence_and_cohesion.as_str()),
            ("Vocabulary Range", self.vocabulary_range.as_str()),
            ("Grammar Accuracy", self.grammar_accuracy.as_str()),
            ("Tone and Formality", self.tone_and_formality.as_str()),
        ]
    }
}

/// A suggested upgrade for a weak word or phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VocabularyReplacement {
    pub original: String,
    pub replacement: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            id: "q1".into(),
            kind: TaskKind::Email,
            title: "Title".into(),
            prompt_text: "Prompt".into(),
            word_count: WordRange::DEFAULT,
            time_limit_minutes: 27,
            choices: None,
            guidelines: None,
        }
    }

    #[test]
    fn task_kind_display_and_parse() {
        assert_eq!(TaskKind::Email.to_string(), "EMAIL");
        assert_eq!(TaskKind::Survey.to_string(), "SURVEY");
        assert_eq!("email".parse::<TaskKind>().unwrap(), TaskKind::Email);
        assert_eq!("Task2".parse::<TaskKind>().unwrap(), TaskKind::Survey);
        assert_eq!(" SURVEY ".parse::<TaskKind>().unwrap(), TaskKind::Survey);
        assert!("essay".parse::<TaskKind>().is_err());
    }

    #[test]
    fn word_count_handles_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  one two\nthree\tfour  "), 4);
    }

    #[test]
    fn word_range_is_inclusive() {
        let range = WordRange { min: 3, max: 5 };
        assert!(!range.contains(2));
        assert!(range.contains(3));
        assert!(range.contains(5));
        assert!(!range.contains(6));
    }

    #[test]
    fn validate_rejects_bad_questions() {
        assert!(sample_question().validate().is_ok());

        let mut q = sample_question();
        q.title = "  ".into();
        assert_eq!(q.validate(), Err(ValidationError::EmptyTitle));

        let mut q = sample_question();
        q.word_count = WordRange { min: 200, max: 150 };
        assert!(matches!(
            q.validate(),
            Err(ValidationError::InvalidWordRange { .. })
        ));

        let mut q = sample_question();
        q.time_limit_minutes = 0;
        assert_eq!(q.validate(), Err(ValidationError::ZeroTimeLimit));

        let mut q = sample_question();
        q.time_limit_minutes = MAX_TIME_LIMIT_MINUTES;
        assert!(q.validate().is_ok());
        q.time_limit_minutes = 80_000_000;
        assert_eq!(
            q.validate(),
            Err(ValidationError::TimeLimitTooLong {
                minutes: 80_000_000,
                max: MAX_TIME_LIMIT_MINUTES,
            })
        );
    }

    #[test]
    fn time_limit_in_seconds() {
        assert_eq!(sample_question().time_limit_secs(), 1620);

        let mut q = sample_question();
        q.time_limit_minutes = u32::MAX;
        assert_eq!(q.time_limit_secs(), u32::MAX);
    }

    #[test]
    fn evaluation_result_rejects_unknown_fields() {
        let json = serde_json::json!({
            "bandScore": 9,
            "sections": {
                "taskAchievement": "a",
                "coherenceAndCohesion": "b",
                "vocabularyRange": "c",
                "grammarAccuracy": "d",
                "toneAndFormality": "e",
                "extra": "nope"
            },
            "suggestions": [],
            "vocabularyReplacements": [],
            "sampleModelResponse": "s"
        });
        assert!(serde_json::from_value::<EvaluationResult>(json).is_err());
    }
}
