//! Exam session state machine.
//!
//! A `Session` is an explicitly owned value. Every transition goes through
//! [`Session::apply`], which either mutates the session and returns the side
//! effects the caller must carry out (timer scheduling, draft persistence, the
//! scoring call), or returns a [`SessionError`] and leaves the session
//! untouched. Nothing here touches a clock, a store or the network.
//!
//! ```text
//! Idle ──start──▶ Active ──tick→0──▶ Finished ──auto──▶ Evaluating ──▶ Evaluated
//!                   │                                      ▲   │
//!                   └──────── submit(confirmed) ───────────┘   └──▶ EvaluationFailed
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EvaluationError, SessionError};
use crate::evaluation::EvaluationRequest;
use crate::model::{word_count, EvaluationResult, Question};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Active,
    /// Time ran out; scoring is about to be requested automatically.
    Finished,
    Evaluating,
    Evaluated,
    EvaluationFailed,
}

impl Phase {
    /// Phases a new session may be started from.
    pub fn can_start(self) -> bool {
        matches!(self, Phase::Idle | Phase::Evaluated | Phase::EvaluationFailed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Evaluated | Phase::EvaluationFailed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Active => "active",
            Phase::Finished => "finished",
            Phase::Evaluating => "evaluating",
            Phase::Evaluated => "evaluated",
            Phase::EvaluationFailed => "evaluation failed",
        };
        f.write_str(s)
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone)]
pub enum Event {
    /// Begin answering `question`. `draft` is the stored text for its id, if any.
    Start {
        question: Question,
        draft: Option<String>,
    },
    /// Replace the response with the full current text.
    UpdateResponse(String),
    /// One second elapsed.
    Tick,
    /// Submit for scoring. User-initiated submits from `Active` need `confirmed`.
    RequestEvaluation { confirmed: bool },
    EvaluationSucceeded(EvaluationResult),
    EvaluationFailed(EvaluationError),
    /// Abandon the session and return to question selection.
    Reset,
}

impl Event {
    fn action(&self) -> &'static str {
        match self {
            Event::Start { .. } => "start a session",
            Event::UpdateResponse(_) => "update the response",
            Event::Tick => "tick",
            Event::RequestEvaluation { .. } => "request evaluation",
            Event::EvaluationSucceeded(_) | Event::EvaluationFailed(_) => "complete evaluation",
            Event::Reset => "reset",
        }
    }
}

/// Side effects a transition asks its owner to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Begin delivering one `Tick` per second.
    ScheduleTimer,
    /// Stop delivering ticks; any tick already in flight must be discarded.
    CancelTimer,
    /// Fire-and-forget write of the current text under the question id.
    PersistDraft { question_id: String, text: String },
    /// The countdown expired; request evaluation without confirmation.
    AutoSubmit,
    /// Send the response to the scorer and feed the outcome back in.
    Evaluate(EvaluationRequest),
}

/// A single exam attempt.
#[derive(Debug, Clone)]
pub struct Session {
    question: Option<Question>,
    response_text: String,
    seconds_remaining: u32,
    phase: Phase,
    result: Option<EvaluationResult>,
    failure: Option<EvaluationError>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session in `Idle` with no question.
    pub fn new() -> Self {
        Self {
            question: None,
            response_text: String::new(),
            seconds_remaining: 0,
            phase: Phase::Idle,
            result: None,
            failure: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    /// The scorer's feedback; `Some` only in `Evaluated`.
    pub fn result(&self) -> Option<&EvaluationResult> {
        self.result.as_ref()
    }

    /// Why scoring failed; `Some` only in `EvaluationFailed`.
    pub fn failure(&self) -> Option<&EvaluationError> {
        self.failure.as_ref()
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.response_text)
    }

    /// Whether the response length is inside the question's bounds.
    /// Advisory only; never blocks submission.
    pub fn word_count_ok(&self) -> bool {
        self.question
            .as_ref()
            .is_some_and(|q| q.word_count.contains(self.word_count()))
    }

    // -- convenience wrappers ------------------------------------------------

    pub fn start(
        &mut self,
        question: Question,
        draft: Option<String>,
    ) -> Result<Vec<Effect>, SessionError> {
        self.apply(Event::Start { question, draft })
    }

    pub fn update_response(&mut self, text: impl Into<String>) -> Result<Vec<Effect>, SessionError> {
        self.apply(Event::UpdateResponse(text.into()))
    }

    pub fn tick(&mut self) -> Result<Vec<Effect>, SessionError> {
        self.apply(Event::Tick)
    }

    pub fn request_evaluation(&mut self, confirmed: bool) -> Result<Vec<Effect>, SessionError> {
        self.apply(Event::RequestEvaluation { confirmed })
    }

    pub fn complete_evaluation(
        &mut self,
        outcome: Result<EvaluationResult, EvaluationError>,
    ) -> Result<Vec<Effect>, SessionError> {
        match outcome {
            Ok(result) => self.apply(Event::EvaluationSucceeded(result)),
            Err(err) => self.apply(Event::EvaluationFailed(err)),
        }
    }

    pub fn reset(&mut self) -> Result<Vec<Effect>, SessionError> {
        self.apply(Event::Reset)
    }

    // -- transition function -------------------------------------------------

    /// Apply one event. On error the session is unchanged.
    pub fn apply(&mut self, event: Event) -> Result<Vec<Effect>, SessionError> {
        let from = self.phase;
        let invalid = SessionError::InvalidTransition {
            phase: from,
            action: event.action(),
        };

        let effects = match (from, event) {
            (phase, Event::Start { question, draft }) if phase.can_start() => {
                question.validate()?;
                self.seconds_remaining = question.time_limit_secs();
                self.response_text = draft.unwrap_or_default();
                self.question = Some(question);
                self.result = None;
                self.failure = None;
                self.phase = Phase::Active;
                vec![Effect::ScheduleTimer]
            }

            (Phase::Active, Event::UpdateResponse(text)) => {
                let question_id = self.question_id()?;
                self.response_text = text.clone();
                vec![Effect::PersistDraft { question_id, text }]
            }

            (Phase::Active, Event::Tick) => {
                self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
                if self.seconds_remaining == 0 {
                    self.phase = Phase::Finished;
                    vec![Effect::CancelTimer, Effect::AutoSubmit]
                } else {
                    Vec::new()
                }
            }

            (Phase::Active, Event::RequestEvaluation { confirmed }) => {
                if !confirmed {
                    return Err(SessionError::ConfirmationRequired);
                }
                let request = self.evaluation_request()?;
                self.phase = Phase::Evaluating;
                vec![Effect::CancelTimer, Effect::Evaluate(request)]
            }

            (Phase::Finished, Event::RequestEvaluation { .. }) => {
                let request = self.evaluation_request()?;
                self.phase = Phase::Evaluating;
                vec![Effect::Evaluate(request)]
            }

            // Retry after a failed scoring call; the response text is still here.
            (Phase::EvaluationFailed, Event::RequestEvaluation { confirmed }) => {
                if !confirmed {
                    return Err(SessionError::ConfirmationRequired);
                }
                let request = self.evaluation_request()?;
                self.failure = None;
                self.phase = Phase::Evaluating;
                vec![Effect::Evaluate(request)]
            }

            (Phase::Evaluating, Event::EvaluationSucceeded(result)) => {
                self.result = Some(result);
                self.failure = None;
                self.phase = Phase::Evaluated;
                Vec::new()
            }

            (Phase::Evaluating, Event::EvaluationFailed(err)) => {
                self.result = None;
                self.failure = Some(err);
                self.phase = Phase::EvaluationFailed;
                Vec::new()
            }

            (phase, Event::Reset) if phase != Phase::Evaluating => {
                *self = Session::new();
                if phase == Phase::Active {
                    vec![Effect::CancelTimer]
                } else {
                    Vec::new()
                }
            }

            _ => return Err(invalid),
        };

        if from != self.phase {
            debug!(from = %from, to = %self.phase, "session transition");
        }
        Ok(effects)
    }

    fn question_id(&self) -> Result<String, SessionError> {
        self.question
            .as_ref()
            .map(|q| q.id.clone())
            .ok_or(SessionError::InvalidTransition {
                phase: self.phase,
                action: "use a session without a question",
            })
    }

    fn evaluation_request(&self) -> Result<EvaluationRequest, SessionError> {
        let question = self.question.as_ref().ok_or(SessionError::InvalidTransition {
            phase: self.phase,
            action: "request evaluation without a question",
        })?;
        Ok(EvaluationRequest::new(question, &self.response_text))
    }
}
