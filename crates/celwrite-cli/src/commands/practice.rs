//! The `celwrite practice` command and the interactive session loop.

use std::io::{BufRead, IsTerminal};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tokio::sync::mpsc;

use celwrite_core::error::EvaluationError;
use celwrite_core::exam::{ExamObserver, ExamRunner};
use celwrite_core::model::{EvaluationResult, Question};
use celwrite_core::report::SessionReport;
use celwrite_core::session::Phase;
use celwrite_core::timer::{format_clock, is_urgent};
use celwrite_report::ReportFormat;

use super::{finish, render, Context, SessionOptions};

/// Console progress observer.
struct ConsoleObserver;

impl ExamObserver for ConsoleObserver {
    fn on_tick(&self, seconds_remaining: u32) {
        let milestone = seconds_remaining % 300 == 0
            || (is_urgent(seconds_remaining) && seconds_remaining % 30 == 0)
            || seconds_remaining == 10;
        if milestone && seconds_remaining > 0 {
            let marker = if is_urgent(seconds_remaining) { "!" } else { " " };
            eprintln!("{marker}[{}] remaining", format_clock(seconds_remaining));
        }
    }

    fn on_time_up(&self) {
        eprintln!("Time is up. Submitting your response.");
    }

    fn on_evaluation_start(&self) {
        eprintln!("Evaluating...");
    }

    fn on_evaluation_complete(&self, outcome: Result<&EvaluationResult, &EvaluationError>) {
        if let Err(e) = outcome {
            eprintln!("Evaluation failed: {e}");
        }
    }
}

pub async fn execute(question_id: String, options: SessionOptions) -> Result<()> {
    let ctx = Context::load(options.config.as_deref(), &options.bank)?;
    let question = ctx
        .catalog
        .get(&question_id)
        .cloned()
        .with_context(|| format!("unknown question '{question_id}' (see `celwrite list`)"))?;
    run(&ctx, question, &options).await
}

/// Run one interactive session on `question`.
pub(crate) async fn run(ctx: &Context, question: Question, options: &SessionOptions) -> Result<()> {
    let formats = ReportFormat::parse_list(&options.format)?;
    let client = ctx.client(options.provider.as_deref(), options.model.as_deref())?;
    let drafts = ctx.drafts(options.data_dir.as_deref());

    let (runner, mut ticks) = ExamRunner::new(drafts, client.clone());
    let mut runner = runner.with_observer(Arc::new(ConsoleObserver));

    render::print_question(&question);
    runner.start(question).await?;
    if !runner.session().response_text().is_empty() {
        eprintln!(
            "Restored your draft ({} words).",
            runner.session().word_count()
        );
    }
    eprintln!("Type your response. Commands: :count :time :show :clear :submit :quit");

    let at_end_of_input = EndOfInput::for_stdin(std::io::stdin().is_terminal());
    let mut lines = stdin_lines();
    let mut awaiting_confirmation = false;

    loop {
        match runner.phase() {
            Phase::Active => {}
            Phase::Evaluated => break,
            Phase::EvaluationFailed => {
                eprint!("Retry the evaluation? [y/N] ");
                if read_yes(&mut lines).await {
                    runner.retry().await?;
                    continue;
                }
                let message = runner
                    .session()
                    .failure()
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                anyhow::bail!("evaluation failed: {message} Your draft is saved.");
            }
            Phase::Idle => return Ok(()),
            other => anyhow::bail!("session stopped while {other}"),
        }

        tokio::select! {
            Some(tick) = ticks.recv() => {
                runner.on_tick(tick).await?;
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    match at_end_of_input {
                        EndOfInput::Submit => {
                            eprintln!("End of input. Submitting your response.");
                            runner.submit(true).await?;
                        }
                        EndOfInput::Abandon => {
                            runner.abandon().await?;
                            eprintln!("End of input. Session abandoned. Your draft is saved.");
                        }
                    }
                    continue;
                };
                if awaiting_confirmation {
                    awaiting_confirmation = false;
                    if is_yes(&line) {
                        runner.submit(true).await?;
                    } else {
                        eprintln!("Not submitted. Keep writing.");
                    }
                    continue;
                }
                match line.trim() {
                    ":count" => {
                        let session = runner.session();
                        let target = session.question().map(|q| q.word_count.to_string());
                        eprintln!(
                            "{} words (target {})",
                            session.word_count(),
                            target.unwrap_or_default()
                        );
                    }
                    ":time" => {
                        eprintln!("{} remaining", format_clock(runner.session().seconds_remaining()));
                    }
                    ":show" => println!("{}", runner.session().response_text()),
                    ":clear" => {
                        runner.update_response(String::new()).await?;
                        eprintln!("Response cleared.");
                    }
                    ":submit" => {
                        eprint!("Submit now? [y/N] ");
                        awaiting_confirmation = true;
                    }
                    ":quit" => {
                        runner.abandon().await?;
                        eprintln!("Session abandoned. Your draft is saved.");
                    }
                    _ => {
                        let text = append_line(runner.session().response_text(), &line);
                        runner.update_response(text).await?;
                    }
                }
            }
        }
    }

    let report = SessionReport::from_session(runner.session(), client.provider_name(), client.model())
        .context("session finished without a result")?;
    finish(&report, options, &formats)
}

/// What closing stdin means for an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndOfInput {
    /// Piped input: the whole response has been read.
    Submit,
    /// Ctrl-D at a terminal: keep the draft, score nothing.
    Abandon,
}

impl EndOfInput {
    fn for_stdin(interactive: bool) -> Self {
        if interactive {
            Self::Abandon
        } else {
            Self::Submit
        }
    }
}

/// Stdin lines, read on a detached thread so a pending read never holds up
/// runtime shutdown. The channel closes at end of input.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn read_yes(lines: &mut mpsc::Receiver<String>) -> bool {
    lines.recv().await.is_some_and(|l| is_yes(&l))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Append one typed line to the response, newline-separated.
fn append_line(current: &str, line: &str) -> String {
    if current.is_empty() {
        line.to_string()
    } else {
        format!("{current}\n{line}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_joined_with_newlines() {
        assert_eq!(append_line("", "Dear Sam,"), "Dear Sam,");
        assert_eq!(append_line("Dear Sam,", "Thanks."), "Dear Sam,\nThanks.");
    }

    #[test]
    fn end_of_input_submits_only_when_piped() {
        assert_eq!(EndOfInput::for_stdin(false), EndOfInput::Submit);
        assert_eq!(EndOfInput::for_stdin(true), EndOfInput::Abandon);
    }

    #[test]
    fn confirmation_answers() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }
}
