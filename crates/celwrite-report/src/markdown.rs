//! Markdown feedback report.

use std::path::Path;

use anyhow::{Context, Result};

use celwrite_core::report::SessionReport;

use crate::band_label;

/// Prefix every line with `> `.
fn quote(s: &str) -> String {
    s.lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape pipes so the text stays inside its table cell.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Render a session report as Markdown.
pub fn to_markdown(report: &SessionReport) -> String {
    let q = &report.question;
    let result = &report.result;
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", q.title));
    md.push_str(&format!(
        "*{}* | {} | scored by {} ({})\n\n",
        q.kind.label(),
        report.created_at.format("%Y-%m-%d %H:%M UTC"),
        report.provider,
        report.model
    ));

    md.push_str(&format!(
        "**Band {} / 12**: {}\n\n",
        result.band_score,
        band_label(result.band_score)
    ));
    let marker = if report.word_count_ok() { "" } else { " (outside range)" };
    md.push_str(&format!(
        "Words: {} (target {}){marker}\n\n",
        report.word_count, q.word_count
    ));

    md.push_str("## Task\n\n");
    md.push_str(&format!("{}\n\n", q.prompt_text));
    if let Some(options) = &q.choices {
        for option in options {
            md.push_str(&format!("- {option}\n"));
        }
        md.push('\n');
    }

    md.push_str("## Rubric\n\n| Area | Feedback |\n|------|----------|\n");
    for (name, feedback) in result.sections.iter() {
        md.push_str(&format!("| {name} | {} |\n", cell(feedback)));
    }
    md.push('\n');

    if !result.suggestions.is_empty() {
        md.push_str("## Suggestions\n\n");
        for (i, s) in result.suggestions.iter().enumerate() {
            md.push_str(&format!("{}. {s}\n", i + 1));
        }
        md.push('\n');
    }

    if !result.vocabulary_replacements.is_empty() {
        md.push_str("## Vocabulary\n\n| Instead of | Try | Why |\n|------------|-----|-----|\n");
        for v in &result.vocabulary_replacements {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(&v.original),
                cell(&v.replacement),
                cell(&v.reason)
            ));
        }
        md.push('\n');
    }

    md.push_str("## Your response\n\n");
    md.push_str(&quote(&report.response_text));
    md.push_str("\n\n");
    if let Some(annotated) = &result.annotated_response {
        md.push_str("### Annotated\n\n");
        md.push_str(&quote(annotated));
        md.push_str("\n\n");
    }

    md.push_str("## Model response\n\n");
    md.push_str(&quote(&result.sample_model_response));
    md.push('\n');
    md
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &SessionReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_markdown(report))
        .with_context(|| format!("failed to write Markdown report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::make_test_report;

    #[test]
    fn markdown_has_sections_and_tables() {
        let md = to_markdown(&make_test_report());
        assert!(md.starts_with("# Noise Complaint to Neighbor\n"));
        assert!(md.contains("**Band 9 / 12**: Effective proficiency"));
        assert!(md.contains("| Task Achievement | Covers the three points. |"));
        assert!(md.contains("| good | beneficial | more precise |"));
        assert!(md.contains("> Dear neighbour,\n> the noise at night keeps me awake."));
        assert!(md.contains("(outside range)"));
    }

    #[test]
    fn pipes_do_not_break_tables() {
        let mut report = make_test_report();
        report.result.sections.grammar_accuracy = "a | b".into();
        let md = to_markdown(&report);
        assert!(md.contains("| Grammar Accuracy | a \\| b |"));
    }
}
