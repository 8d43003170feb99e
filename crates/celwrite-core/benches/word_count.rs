use criterion::{black_box, criterion_group, criterion_main, Criterion};

use celwrite_core::model::word_count;

fn essay(words: usize) -> String {
    let vocab = ["the", "council", "should", "build", "a", "playground", "because", "children"];
    let mut s = String::new();
    for i in 0..words {
        s.push_str(vocab[i % vocab.len()]);
        s.push(if i % 17 == 16 { '\n' } else { ' ' });
    }
    s
}

fn bench_word_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("word_count");

    let typical = essay(180);
    let long = essay(5_000);
    let padded = format!("   \n\t{}\n\n   ", essay(180));

    group.bench_function("180_words", |b| b.iter(|| word_count(black_box(&typical))));
    group.bench_function("5000_words", |b| b.iter(|| word_count(black_box(&long))));
    group.bench_function("padded", |b| b.iter(|| word_count(black_box(&padded))));

    group.finish();
}

criterion_group!(benches, bench_word_count);
criterion_main!(benches);
