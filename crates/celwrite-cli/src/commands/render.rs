//! Terminal rendering for questions and feedback.

use comfy_table::{Cell, Table};

use celwrite_core::model::Question;
use celwrite_core::report::SessionReport;
use celwrite_report::{band_label, MAX_BAND};

pub fn print_question(question: &Question) {
    println!("{} | {}", question.kind.label(), question.title);
    println!(
        "Time: {} min | Words: {}",
        question.time_limit_minutes, question.word_count
    );
    println!();
    println!("{}", question.prompt_text);
    if let Some(options) = &question.choices {
        println!();
        for option in options {
            println!("  - {option}");
        }
    }
    if let Some(guidelines) = &question.guidelines {
        println!();
        println!("A strong response includes:");
        for (i, g) in guidelines.iter().enumerate() {
            println!("  {}. {g}", i + 1);
        }
    }
    println!();
}

pub fn print_report(report: &SessionReport) {
    let result = &report.result;

    println!();
    println!(
        "Band {} / {MAX_BAND}: {}",
        result.band_score,
        band_label(result.band_score)
    );
    let range_note = if report.word_count_ok() {
        "within range"
    } else {
        "outside range"
    };
    println!(
        "Words: {} ({range_note}, target {})",
        report.word_count, report.question.word_count
    );

    let mut table = Table::new();
    table.set_header(vec!["Category", "Feedback"]);
    for (name, feedback) in result.sections.iter() {
        table.add_row(vec![Cell::new(name), Cell::new(feedback)]);
    }
    println!("\n{table}");

    if !result.suggestions.is_empty() {
        println!("\nSuggestions:");
        for s in &result.suggestions {
            println!("  - {s}");
        }
    }

    if !result.vocabulary_replacements.is_empty() {
        let mut vocab = Table::new();
        vocab.set_header(vec!["Instead of", "Try", "Why"]);
        for v in &result.vocabulary_replacements {
            vocab.add_row(vec![
                Cell::new(&v.original),
                Cell::new(&v.replacement),
                Cell::new(&v.reason),
            ]);
        }
        println!("\n{vocab}");
    }

    println!("\nModel response:\n{}", result.sample_model_response);
}
