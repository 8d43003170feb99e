//! Error taxonomy for the exam core.
//!
//! Each error type maps to one failure surface: malformed question input,
//! an unreadable scorer payload, a failed scoring round-trip, local draft
//! storage, and phase-guard violations on the session state machine.

use thiserror::Error;

use crate::session::Phase;

/// Malformed question definition, caught before any session starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title was empty or whitespace-only.
    #[error("title must not be empty")]
    EmptyTitle,

    /// Prompt text was empty or whitespace-only.
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// Question id was empty.
    #[error("question id must not be empty")]
    EmptyId,

    /// Word-count bounds are inverted or start at zero.
    #[error("invalid word range {min}-{max}")]
    InvalidWordRange { min: u32, max: u32 },

    /// Time limit must be at least one minute.
    #[error("time limit must be greater than zero")]
    ZeroTimeLimit,

    /// Time limit above [`MAX_TIME_LIMIT_MINUTES`](crate::model::MAX_TIME_LIMIT_MINUTES).
    #[error("time limit of {minutes} minutes exceeds the maximum of {max}")]
    TimeLimitTooLong { minutes: u32, max: u32 },

    /// Unknown task kind string.
    #[error("unknown task kind: {0}")]
    UnknownKind(String),

    /// A question with this id is already in the catalog.
    #[error("duplicate question id: {0}")]
    DuplicateId(String),
}

/// The scorer's payload could not be turned into an `EvaluationResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing (or only whitespace) came back.
    #[error("empty response from scorer")]
    Empty,

    /// The payload did not match the evaluation schema.
    #[error("response does not match evaluation schema: {0}")]
    Schema(String),
}

/// Which stage of scoring failed. Logged, never branched on by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationFailure {
    /// Network, authentication or non-success HTTP status.
    Transport,
    /// The call exceeded the client's deadline.
    Timeout,
    /// The payload was empty or structurally invalid.
    Parse,
}

/// A failed evaluation, normalized to a single user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvaluationError {
    /// Message suitable for showing to the user.
    pub message: String,
    /// Underlying cause, for logs.
    pub cause: String,
    pub kind: EvaluationFailure,
}

impl EvaluationError {
    pub fn transport(cause: impl Into<String>) -> Self {
        Self {
            message: "Assessment failed. Please check your API key and connection.".into(),
            cause: cause.into(),
            kind: EvaluationFailure::Transport,
        }
    }

    pub fn timeout(secs: u64) -> Self {
        Self {
            message: format!("Assessment timed out after {secs}s. Your response was kept."),
            cause: format!("no response within {secs}s"),
            kind: EvaluationFailure::Timeout,
        }
    }
}

impl From<ParseError> for EvaluationError {
    fn from(err: ParseError) -> Self {
        Self {
            message: "Assessment failed: the scorer returned an unreadable report.".into(),
            cause: err.to_string(),
            kind: EvaluationFailure::Parse,
        }
    }
}

/// Local draft storage failure. Never surfaced past the draft store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be opened or has shut down.
    #[error("draft storage unavailable: {0}")]
    Unavailable(String),

    /// A read or write was rejected by the backend.
    #[error("draft storage operation failed: {0}")]
    Backend(String),
}

/// Operation attempted in a phase that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while session is {phase}")]
    InvalidTransition { phase: Phase, action: &'static str },

    /// User-initiated submission without explicit confirmation.
    #[error("submission requires confirmation")]
    ConfirmationRequired,

    /// The question handed to `start` failed validation.
    #[error("cannot start: {0}")]
    InvalidQuestion(#[from] ValidationError),
}
