//! celwrite-report: feedback reports for scored sessions.
//!
//! Renders a [`SessionReport`] as a self-contained HTML page or as Markdown,
//! and writes the requested set of formats into an output directory.

pub mod html;
pub mod markdown;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;

use celwrite_core::report::SessionReport;

/// Highest band on the scale.
pub const MAX_BAND: f64 = 12.0;

/// Proficiency descriptor for a band score.
pub fn band_label(score: f64) -> &'static str {
    match score {
        s if s >= 10.0 => "Advanced proficiency",
        s if s >= 9.0 => "Effective proficiency",
        s if s >= 8.0 => "Good proficiency",
        s if s >= 7.0 => "Adequate proficiency",
        s if s >= 6.0 => "Developing proficiency",
        s if s >= 5.0 => "Acquiring proficiency",
        s if s >= 4.0 => "Adequate for daily life",
        s if s >= 3.0 => "Some proficiency in limited contexts",
        _ => "Minimal proficiency",
    }
}

/// An output format for a saved session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Html,
    Markdown,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [ReportFormat::Json, ReportFormat::Html, ReportFormat::Markdown];

    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
            ReportFormat::Markdown => "md",
        }
    }

    /// Parse a comma-separated list such as `json,html` or `all`.
    pub fn parse_list(s: &str) -> Result<Vec<ReportFormat>> {
        let mut formats = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("all") {
                return Ok(Self::ALL.to_vec());
            }
            let format: ReportFormat = part.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        if formats.is_empty() {
            anyhow::bail!("no report format given");
        }
        Ok(formats)
    }
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            "md" | "markdown" => Ok(ReportFormat::Markdown),
            other => anyhow::bail!("unknown report format: {other} (expected json, html, md or all)"),
        }
    }
}

/// Write `report` to `dir` in each of `formats`. Files are named
/// `<question-id>-<timestamp>.<ext>`. Returns the written paths.
pub fn write_reports(
    report: &SessionReport,
    dir: &Path,
    formats: &[ReportFormat],
) -> Result<Vec<PathBuf>> {
    let stem = format!(
        "{}-{}",
        report.question.id,
        report.created_at.format("%Y%m%d-%H%M%S")
    );
    let mut written = Vec::new();
    for format in formats {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        match format {
            ReportFormat::Json => report.save_json(&path)?,
            ReportFormat::Html => html::write_html_report(report, &path)?,
            ReportFormat::Markdown => markdown::write_markdown_report(report, &path)?,
        }
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use celwrite_core::catalog::Catalog;
    use celwrite_core::model::{EvaluationResult, RubricSections, VocabularyReplacement};

    pub(crate) fn make_test_report() -> SessionReport {
        let question = Catalog::builtin().get("t1-1").unwrap().clone();
        let mut report = SessionReport::new(
            question,
            "Dear neighbour,\nthe noise at night keeps me awake.",
            95,
            "mock",
            "mock-model",
            EvaluationResult {
                band_score: 9.0,
                sections: RubricSections {
                    task_achievement: "Covers the three points.".into(),
                    coherence_and_cohesion: "Clear order.".into(),
                    vocabulary_range: "Limited range.".into(),
                    grammar_accuracy: "Mostly accurate.".into(),
                    tone_and_formality: "Polite.".into(),
                },
                suggestions: vec!["Propose a concrete quiet-hours window.".into()],
                vocabulary_replacements: vec![VocabularyReplacement {
                    original: "good".into(),
                    replacement: "beneficial".into(),
                    reason: "more precise".into(),
                }],
                sample_model_response: "Dear Ms. Chen,\nI hope this message finds you well.".into(),
                annotated_response: Some("the noise [at night] keeps me awake".into()),
            },
        );
        report.id = uuid::Uuid::nil();
        report
    }

    #[test]
    fn band_labels() {
        assert_eq!(band_label(12.0), "Advanced proficiency");
        assert_eq!(band_label(9.5), "Effective proficiency");
        assert_eq!(band_label(7.0), "Adequate proficiency");
        assert_eq!(band_label(1.0), "Minimal proficiency");
    }

    #[test]
    fn parse_format_lists() {
        assert_eq!(
            ReportFormat::parse_list("json,html").unwrap(),
            vec![ReportFormat::Json, ReportFormat::Html]
        );
        assert_eq!(ReportFormat::parse_list("all").unwrap().len(), 3);
        assert_eq!(
            ReportFormat::parse_list("md, markdown").unwrap(),
            vec![ReportFormat::Markdown]
        );
        assert!(ReportFormat::parse_list("pdf").is_err());
        assert!(ReportFormat::parse_list("").is_err());
    }

    #[test]
    fn writes_every_requested_format() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let paths = write_reports(&report, dir.path(), &ReportFormat::ALL).unwrap();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert!(path.exists(), "{} missing", path.display());
            assert!(path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("t1-1-"));
        }

        let loaded = SessionReport::load_json(&paths[0]).unwrap();
        assert_eq!(loaded.result.band_score, 9.0);
    }
}
