//! TOML question bank parser.
//!
//! Loads extra questions from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::default_guidelines;
use crate::model::{Question, TaskKind, WordRange};

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    kind: String,
    title: String,
    prompt: String,
    #[serde(default)]
    word_min: Option<u32>,
    #[serde(default)]
    word_max: Option<u32>,
    #[serde(default)]
    time_limit_minutes: Option<u32>,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    guidelines: Option<Vec<String>>,
}

/// A named set of questions loaded from one file.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    pub description: String,
    pub questions: Vec<Question>,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind: TaskKind = q
                .kind
                .parse()
                .with_context(|| format!("question '{}'", q.id))?;

            let question = Question {
                word_count: WordRange {
                    min: q.word_min.unwrap_or(WordRange::DEFAULT.min),
                    max: q.word_max.unwrap_or(WordRange::DEFAULT.max),
                },
                time_limit_minutes: q
                    .time_limit_minutes
                    .unwrap_or_else(|| kind.default_time_limit()),
                choices: q.options.filter(|o| !o.is_empty()),
                guidelines: q.guidelines.or_else(|| Some(default_guidelines(kind))),
                id: q.id,
                kind,
                title: q.title,
                prompt_text: q.prompt,
            };
            question
                .validate()
                .with_context(|| format!("invalid question '{}'", question.id))?;
            Ok(question)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct BankWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

/// Check a bank for issues that do not make it unloadable.
pub fn validate_bank(bank: &QuestionBank) -> Vec<BankWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = std::collections::HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(BankWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in &bank.questions {
        match (q.kind, &q.choices) {
            (TaskKind::Survey, None) => warnings.push(BankWarning {
                question_id: Some(q.id.clone()),
                message: "survey question has no options".into(),
            }),
            (TaskKind::Email, Some(_)) => warnings.push(BankWarning {
                question_id: Some(q.id.clone()),
                message: "email question lists options; they will be sent to the scorer".into(),
            }),
            _ => {}
        }
    }

    if bank.questions.is_empty() {
        warnings.push(BankWarning {
            question_id: None,
            message: "bank contains no questions".into(),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[bank]
id = "extra"
name = "Extra Practice"
description = "More tasks"

[[questions]]
id = "x1"
kind = "email"
title = "Broken Heater"
prompt = "Write to your landlord about a broken heater."

[[questions]]
id = "x2"
kind = "survey"
title = "Library Hours"
prompt = "Which change to library hours do you prefer?"
options = ["Option A: Open later", "Option B: Open on Sundays"]
word_min = 120
word_max = 180
time_limit_minutes = 20
"#;

    #[test]
    fn parse_valid_toml() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        assert_eq!(bank.id, "extra");
        assert_eq!(bank.questions.len(), 2);

        let email = &bank.questions[0];
        assert_eq!(email.kind, TaskKind::Email);
        assert_eq!(email.word_count, WordRange::DEFAULT);
        assert_eq!(email.time_limit_minutes, 27);
        assert_eq!(email.guidelines, Some(default_guidelines(TaskKind::Email)));

        let survey = &bank.questions[1];
        assert_eq!(survey.word_count, WordRange { min: 120, max: 180 });
        assert_eq!(survey.time_limit_minutes, 20);
        assert_eq!(survey.choices.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        let toml = r#"
[bank]
id = "bad"
name = "Bad"

[[questions]]
id = "q"
kind = "essay"
title = "T"
prompt = "P"
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown task kind"));
    }

    #[test]
    fn parse_rejects_blank_prompt() {
        let toml = r#"
[bank]
id = "bad"
name = "Bad"

[[questions]]
id = "q"
kind = "email"
title = "T"
prompt = "   "
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("prompt must not be empty"));
    }

    #[test]
    fn parse_rejects_oversized_time_limit() {
        let toml = r#"
[bank]
id = "bad"
name = "Bad"

[[questions]]
id = "forever"
kind = "email"
title = "T"
prompt = "P"
time_limit_minutes = 80000000
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("invalid question 'forever'"));
        assert!(msg.contains("exceeds the maximum"));
    }

    #[test]
    fn validate_flags_duplicates_and_missing_options() {
        let toml = r#"
[bank]
id = "dupes"
name = "Dupes"

[[questions]]
id = "same"
kind = "survey"
title = "First"
prompt = "Pick"

[[questions]]
id = "same"
kind = "email"
title = "Second"
prompt = "Write"
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("dupes.toml")).unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("no options")));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bank.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].name, "Extra Practice");
    }
}
