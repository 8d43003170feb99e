//! The `celwrite evaluate` command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use celwrite_core::report::SessionReport;
use celwrite_core::session::{Effect, Phase, Session};
use celwrite_report::ReportFormat;

use super::{finish, Context, SessionOptions};

pub async fn execute(question_id: String, response: PathBuf, options: SessionOptions) -> Result<()> {
    let formats = ReportFormat::parse_list(&options.format)?;
    let ctx = Context::load(options.config.as_deref(), &options.bank)?;
    let question = ctx
        .catalog
        .get(&question_id)
        .cloned()
        .with_context(|| format!("unknown question '{question_id}' (see `celwrite list`)"))?;
    let text = std::fs::read_to_string(&response)
        .with_context(|| format!("failed to read response: {}", response.display()))?;
    if text.trim().is_empty() {
        anyhow::bail!("response file is empty: {}", response.display());
    }
    let client = ctx.client(options.provider.as_deref(), options.model.as_deref())?;

    // No countdown and no drafts: the timer and persistence effects are
    // simply not carried out.
    let mut session = Session::new();
    session.start(question, Some(text.trim_end().to_string()))?;
    let request = session
        .request_evaluation(true)?
        .into_iter()
        .find_map(|effect| match effect {
            Effect::Evaluate(request) => Some(request),
            _ => None,
        })
        .context("submission did not produce a scoring request")?;

    eprintln!(
        "Evaluating {} words with {} ({})...",
        session.word_count(),
        client.provider_name(),
        client.model()
    );
    let outcome = client.evaluate(&request).await;
    session.complete_evaluation(outcome)?;

    if session.phase() == Phase::EvaluationFailed {
        let message = session
            .failure()
            .map(|e| format!("{e} ({})", e.cause))
            .unwrap_or_default();
        anyhow::bail!("evaluation failed: {message}");
    }

    let report = SessionReport::from_session(&session, client.provider_name(), client.model())
        .context("session finished without a result")?;
    finish(&report, &options, &formats)
}
