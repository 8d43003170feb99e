//! HTML feedback report.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use celwrite_core::report::SessionReport;

use crate::{band_label, MAX_BAND};

/// Escape a string for safe HTML insertion.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Escape and keep line breaks.
fn paragraphs(s: &str) -> String {
    html_escape(s).replace('\n', "<br>\n")
}

/// Generate an HTML report for one scored session.
pub fn generate_html(report: &SessionReport) -> String {
    let q = &report.question;
    let result = &report.result;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>celwrite feedback: {}</title>\n",
        html_escape(&q.title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&q.title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} | {} | scored by {} ({})</p>\n",
        q.kind.label(),
        report.created_at.format("%Y-%m-%d %H:%M UTC"),
        html_escape(&report.provider),
        html_escape(&report.model),
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"score\">\n");
    html.push_str(&band_gauge(result.band_score));
    let (count_class, count_note) = if report.word_count_ok() {
        ("pass", "within range")
    } else {
        ("fail", "outside range")
    };
    html.push_str(&format!(
        "<p>Words: <span class=\"{count_class}\">{} ({count_note}, target {})</span></p>\n",
        report.word_count, q.word_count
    ));
    html.push_str("</section>\n");

    html.push_str("<section>\n<h2>Task</h2>\n");
    html.push_str(&format!("<p>{}</p>\n", paragraphs(&q.prompt_text)));
    if let Some(options) = &q.choices {
        html.push_str("<ul>\n");
        for option in options {
            html.push_str(&format!("<li>{}</li>\n", html_escape(option)));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");

    html.push_str("<section>\n<h2>Rubric</h2>\n<table>\n<tbody>\n");
    for (name, feedback) in result.sections.iter() {
        html.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>\n",
            name,
            paragraphs(feedback)
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    if !result.suggestions.is_empty() {
        html.push_str("<section>\n<h2>Suggestions</h2>\n<ol>\n");
        for s in &result.suggestions {
            html.push_str(&format!("<li>{}</li>\n", html_escape(s)));
        }
        html.push_str("</ol>\n</section>\n");
    }

    if !result.vocabulary_replacements.is_empty() {
        html.push_str("<section>\n<h2>Vocabulary</h2>\n<table>\n");
        html.push_str("<thead><tr><th>Instead of</th><th>Try</th><th>Why</th></tr></thead>\n<tbody>\n");
        for v in &result.vocabulary_replacements {
            html.push_str(&format!(
                "<tr><td class=\"fail\">{}</td><td class=\"pass\">{}</td><td>{}</td></tr>\n",
                html_escape(&v.original),
                html_escape(&v.replacement),
                html_escape(&v.reason)
            ));
        }
        html.push_str("</tbody></table>\n</section>\n");
    }

    html.push_str("<section>\n<h2>Your response</h2>\n");
    html.push_str(&format!(
        "<blockquote>{}</blockquote>\n",
        paragraphs(&report.response_text)
    ));
    if let Some(annotated) = &result.annotated_response {
        html.push_str("<details>\n<summary>Annotated</summary>\n");
        html.push_str(&format!("<blockquote>{}</blockquote>\n", paragraphs(annotated)));
        html.push_str("</details>\n");
    }
    html.push_str("</section>\n");

    html.push_str("<section>\n<h2>Model response</h2>\n");
    html.push_str(&format!(
        "<blockquote class=\"model\">{}</blockquote>\n",
        paragraphs(&result.sample_model_response)
    ));
    html.push_str("</section>\n");

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &SessionReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn band_gauge(score: f64) -> String {
    let max_width = 360.0;
    let height = 28;
    let clamped = score.clamp(0.0, MAX_BAND);
    let width = (clamped / MAX_BAND * max_width) as usize;

    let color = if clamped >= 10.0 {
        "#22c55e"
    } else if clamped >= 7.0 {
        "#eab308"
    } else {
        "#ef4444"
    };

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        max_width as usize + 120,
        height
    );
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{height}\" fill=\"var(--border)\" rx=\"4\"/>\n",
        max_width as usize
    ));
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"{color}\" rx=\"4\"/>\n"
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-size=\"16\" fill=\"currentColor\" dominant-baseline=\"middle\">{score} / 12</text>\n",
        max_width as usize + 10,
        height / 2
    ));
    svg.push_str("</svg>\n");
    svg.push_str(&format!(
        "<p class=\"band\">Band {score}: {}</p>\n",
        band_label(score)
    ));
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0 auto; max-width: 56rem; padding: 2rem; background: var(--bg); color: var(--fg); line-height: 1.5; }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.band { font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
blockquote { border-left: 4px solid var(--border); margin: 1rem 0; padding: 0.5rem 1rem; }
blockquote.model { border-left-color: #22c55e; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0 0; }
"#;
