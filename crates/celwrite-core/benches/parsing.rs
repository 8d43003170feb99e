use criterion::{black_box, criterion_group, criterion_main, Criterion};

use celwrite_core::evaluation::parse_evaluation;
use celwrite_core::traits::extract_json_from_markdown;

fn evaluation_json(replacements: usize) -> String {
    let items: Vec<String> = (0..replacements)
        .map(|i| {
            format!(
                r#"{{"original": "word{i}", "replacement": "better{i}", "reason": "more precise"}}"#
            )
        })
        .collect();
    format!(
        r#"{{
  "bandScore": 9,
  "sections": {{
    "taskAchievement": "All points covered.",
    "coherenceAndCohesion": "Logical flow.",
    "vocabularyRange": "Adequate range.",
    "grammarAccuracy": "Few errors.",
    "toneAndFormality": "Polite and formal."
  }},
  "suggestions": ["Use more linking words.", "Vary sentence length."],
  "vocabularyReplacements": [{}],
  "sampleModelResponse": "Dear Manager, I am writing to express my interest in the senior role.",
  "annotatedResponse": "I am [very] interested."
}}"#,
        items.join(",")
    )
}

fn bench_parse_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_evaluation");

    let small = evaluation_json(5);
    let large = evaluation_json(200);

    group.bench_function("5_replacements", |b| {
        b.iter(|| parse_evaluation(black_box(&small)))
    });

    group.bench_function("200_replacements", |b| {
        b.iter(|| parse_evaluation(black_box(&large)))
    });

    group.finish();
}

fn bench_extract_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_json");

    let fenced = format!("Here is the evaluation:\n\n```json\n{}\n```\n", evaluation_json(5));
    let bare = evaluation_json(5);

    group.bench_function("fenced", |b| {
        b.iter(|| extract_json_from_markdown(black_box(&fenced)))
    });

    group.bench_function("bare", |b| {
        b.iter(|| extract_json_from_markdown(black_box(&bare)))
    });

    group.finish();
}

fn bench_bank_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bank_parsing");

    let small = generate_bank_toml(10);
    let large = generate_bank_toml(200);

    group.bench_function("10_questions", |b| {
        b.iter(|| {
            celwrite_core::bank::parse_bank_str(black_box(&small), black_box("bench.toml".as_ref()))
        })
    });

    group.bench_function("200_questions", |b| {
        b.iter(|| {
            celwrite_core::bank::parse_bank_str(black_box(&large), black_box("bench.toml".as_ref()))
        })
    });

    group.finish();
}

fn generate_bank_toml(n: usize) -> String {
    let mut s = String::from("[bank]\nid = \"bench\"\nname = \"Benchmark\"\n");
    for i in 0..n {
        let kind = if i % 2 == 0 { "email" } else { "survey" };
        s.push_str(&format!(
            r#"
[[questions]]
id = "q{i}"
kind = "{kind}"
title = "Question {i}"
prompt = "Write about topic {i}."
options = ["Option A: first", "Option B: second"]
"#
        ));
    }
    s
}

criterion_group!(benches, bench_parse_evaluation, bench_extract_json, bench_bank_parsing);
criterion_main!(benches);
