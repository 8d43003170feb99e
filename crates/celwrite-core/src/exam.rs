//! Exam runner: drives a [`Session`] and carries out the effects it declares.
//!
//! The runner owns the countdown and is the only place that touches the
//! draft store and the evaluation client. Callers feed it user actions and
//! the ticks from the receiver returned by [`ExamRunner::new`].

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::draft::DraftStore;
use crate::error::{EvaluationError, SessionError};
use crate::evaluation::EvaluationClient;
use crate::model::{EvaluationResult, Question};
use crate::session::{Effect, Phase, Session};
use crate::timer::{tick_channel, Countdown, Tick};

/// Progress hooks for front-ends.
pub trait ExamObserver: Send + Sync {
    fn on_tick(&self, seconds_remaining: u32);
    fn on_time_up(&self);
    fn on_evaluation_start(&self);
    fn on_evaluation_complete(&self, outcome: Result<&EvaluationResult, &EvaluationError>);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl ExamObserver for NoopObserver {
    fn on_tick(&self, _: u32) {}
    fn on_time_up(&self) {}
    fn on_evaluation_start(&self) {}
    fn on_evaluation_complete(&self, _: Result<&EvaluationResult, &EvaluationError>) {}
}

pub struct ExamRunner {
    session: Session,
    countdown: Countdown,
    drafts: Arc<dyn DraftStore>,
    client: Arc<EvaluationClient>,
    observer: Arc<dyn ExamObserver>,
}

impl ExamRunner {
    /// Build a runner and the tick receiver the caller must poll.
    pub fn new(
        drafts: Arc<dyn DraftStore>,
        client: Arc<EvaluationClient>,
    ) -> (Self, mpsc::Receiver<Tick>) {
        let (tx, rx) = tick_channel();
        (Self::with_countdown(drafts, client, Countdown::new(tx)), rx)
    }

    /// Build a runner around an existing countdown (e.g. a faster period).
    pub fn with_countdown(
        drafts: Arc<dyn DraftStore>,
        client: Arc<EvaluationClient>,
        countdown: Countdown,
    ) -> Self {
        Self {
            session: Session::new(),
            countdown,
            drafts,
            client,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExamObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn client(&self) -> &EvaluationClient {
        &self.client
    }

    /// Start answering `question`, restoring its draft if one exists.
    pub async fn start(&mut self, question: Question) -> Result<(), SessionError> {
        if !self.session.phase().can_start() {
            return Err(SessionError::InvalidTransition {
                phase: self.session.phase(),
                action: "start a session",
            });
        }
        let draft = self.drafts.load(&question.id).await;
        info!(
            question = %question.id,
            restored = draft.as_ref().is_some_and(|d| !d.is_empty()),
            "session started"
        );
        let effects = self.session.start(question, draft)?;
        self.run(effects).await
    }

    pub async fn update_response(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let effects = self.session.update_response(text)?;
        self.run(effects).await
    }

    /// Feed one tick from the receiver. Returns `false` for a stale tick,
    /// which is dropped without touching the session.
    pub async fn on_tick(&mut self, tick: Tick) -> Result<bool, SessionError> {
        if !self.countdown.is_current(&tick) {
            debug!(generation = tick.generation, "stale tick dropped");
            return Ok(false);
        }
        let effects = self.session.tick()?;
        self.observer.on_tick(self.session.seconds_remaining());
        self.run(effects).await?;
        Ok(true)
    }

    /// User-initiated submission. Without `confirmed` the session stays put.
    pub async fn submit(&mut self, confirmed: bool) -> Result<(), SessionError> {
        let effects = self.session.request_evaluation(confirmed)?;
        info!(phase = %self.session.phase(), "response submitted");
        self.run(effects).await
    }

    /// Re-send a response whose scoring failed.
    pub async fn retry(&mut self) -> Result<(), SessionError> {
        if self.session.phase() != Phase::EvaluationFailed {
            return Err(SessionError::InvalidTransition {
                phase: self.session.phase(),
                action: "retry evaluation",
            });
        }
        self.submit(true).await
    }

    /// Drop the current session and go back to idle.
    pub async fn abandon(&mut self) -> Result<(), SessionError> {
        let effects = self.session.reset()?;
        self.run(effects).await
    }

    async fn run(&mut self, effects: Vec<Effect>) -> Result<(), SessionError> {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::ScheduleTimer => self.countdown.start(),
                Effect::CancelTimer => self.countdown.cancel(),
                Effect::PersistDraft { question_id, text } => {
                    self.drafts.save(&question_id, &text);
                }
                Effect::AutoSubmit => {
                    info!("time is up; submitting automatically");
                    self.observer.on_time_up();
                    queue.extend(self.session.request_evaluation(false)?);
                }
                Effect::Evaluate(request) => {
                    self.observer.on_evaluation_start();
                    let outcome = self.client.evaluate(&request).await;
                    self.observer.on_evaluation_complete(outcome.as_ref());
                    queue.extend(self.session.complete_evaluation(outcome)?);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::MemoryDraftStore;
    use crate::evaluation::tests::{valid_payload, ScriptedProvider};
    use crate::evaluation::ScoringSettings;
    use crate::model::{TaskKind, WordRange};
    use std::time::Duration;

    fn question(minutes: u32) -> Question {
        Question {
            id: "t1-1".into(),
            kind: TaskKind::Email,
            title: "Noise".into(),
            prompt_text: "Write to your neighbor".into(),
            word_count: WordRange::DEFAULT,
            time_limit_minutes: minutes,
            choices: None,
            guidelines: None,
        }
    }

    fn runner(
        provider: ScriptedProvider,
    ) -> (
        ExamRunner,
        mpsc::Receiver<Tick>,
        Arc<MemoryDraftStore>,
        Arc<ScriptedProvider>,
    ) {
        let drafts = Arc::new(MemoryDraftStore::new());
        let provider = Arc::new(provider);
        let client = Arc::new(EvaluationClient::new(
            provider.clone(),
            ScoringSettings::default(),
        ));
        let (runner, ticks) = ExamRunner::new(drafts.clone(), client);
        (runner, ticks, drafts, provider)
    }

    #[tokio::test]
    async fn start_restores_saved_draft() {
        let (mut runner, _ticks, drafts, _) = runner(ScriptedProvider::ok("{}"));
        drafts.save("t1-1", "Dear neighbour");

        runner.start(question(1)).await.unwrap();
        assert_eq!(runner.session().response_text(), "Dear neighbour");
        assert_eq!(runner.phase(), Phase::Active);
    }

    #[tokio::test]
    async fn typing_persists_draft() {
        let (mut runner, _ticks, drafts, _) = runner(ScriptedProvider::ok("{}"));
        runner.start(question(1)).await.unwrap();
        runner.update_response("first words").await.unwrap();
        assert_eq!(drafts.load("t1-1").await.as_deref(), Some("first words"));
    }

    #[tokio::test]
    async fn countdown_expiry_auto_submits() {
        tokio::time::pause();
        let (mut runner, mut ticks, _, provider) =
            runner(ScriptedProvider::ok(valid_payload().to_string()));
        runner.start(question(1)).await.unwrap();
        runner.update_response("some answer").await.unwrap();

        while runner.phase() == Phase::Active {
            let tick = ticks.recv().await.unwrap();
            runner.on_tick(tick).await.unwrap();
        }

        assert_eq!(runner.phase(), Phase::Evaluated);
        assert_eq!(runner.session().seconds_remaining(), 0);
        assert_eq!(provider.calls(), 1);
        assert_eq!(runner.session().result().unwrap().band_score, 8.5);

        let late = tokio::time::timeout(Duration::from_secs(5), ticks.recv()).await;
        assert!(late.is_err(), "timer must be cancelled after finish");
    }

    #[tokio::test]
    async fn unconfirmed_submit_keeps_session_active() {
        let (mut runner, _ticks, _, provider) = runner(ScriptedProvider::ok("{}"));
        runner.start(question(1)).await.unwrap();
        assert_eq!(
            runner.submit(false).await,
            Err(SessionError::ConfirmationRequired)
        );
        assert_eq!(runner.phase(), Phase::Active);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn failed_evaluation_then_retry() {
        let (mut runner, _ticks, _, provider) =
            runner(ScriptedProvider::err("connection refused"));
        runner.start(question(1)).await.unwrap();
        runner.update_response("kept text").await.unwrap();
        runner.submit(true).await.unwrap();

        assert_eq!(runner.phase(), Phase::EvaluationFailed);
        assert_eq!(runner.session().response_text(), "kept text");
        assert!(runner.session().failure().is_some());

        runner.retry().await.unwrap();
        assert_eq!(provider.calls(), 2);
        assert_eq!(runner.phase(), Phase::EvaluationFailed);
    }

    #[tokio::test]
    async fn stale_tick_after_new_session_is_ignored() {
        tokio::time::pause();
        let (mut runner, mut ticks, _, _) =
            runner(ScriptedProvider::ok(valid_payload().to_string()));
        runner.start(question(1)).await.unwrap();
        let old = ticks.recv().await.unwrap();

        runner.abandon().await.unwrap();
        runner.start(question(2)).await.unwrap();

        assert!(!runner.on_tick(old).await.unwrap());
        assert_eq!(runner.session().seconds_remaining(), 120);
    }

    #[tokio::test]
    async fn retry_outside_failure_is_rejected() {
        let (mut runner, _ticks, _, _) = runner(ScriptedProvider::ok("{}"));
        runner.start(question(1)).await.unwrap();
        assert!(runner.retry().await.is_err());
    }
}
