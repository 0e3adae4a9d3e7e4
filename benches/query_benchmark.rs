//! Adjacency query and tokenizer benchmarks

use criterion::{Criterion, criterion_group, criterion_main};
use nextword_rs::{Config, PositionalStore, QueryEngine, TokenizedDocument, Tokenizer};
use std::hint::black_box;

const VOCABULARY: &[&str] = &[
    "지금", "뭐", "해", "자", "가자", "밥", "먹자", "오늘", "내일", "좋아", "그래", "응",
];

fn populated_store(documents: usize, words_per_document: usize) -> PositionalStore {
    let store = PositionalStore::memory().expect("in-memory store");
    store.create_batch("bench", None).expect("batch");

    let mut seed = 0x2545_f491_u64;
    for doc in 0..documents {
        let words: Vec<&str> = (0..words_per_document)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                VOCABULARY[(seed % VOCABULARY.len() as u64) as usize]
            })
            .collect();
        let mut document = TokenizedDocument::new(format!("d{}", doc));
        document.push_words(words.join(" "), words.iter().copied());
        store.insert_document("bench", &document).expect("insert");
    }
    store
}

fn bench_next_word_counts(c: &mut Criterion) {
    let store = populated_store(500, 200);
    let config = Config::default();
    let engine = QueryEngine::new(&store, &config);

    c.bench_function("query_top5_common_keyword", |b| {
        b.iter(|| engine.query(black_box("지금")).expect("query"))
    });

    c.bench_function("query_unknown_keyword", |b| {
        b.iter(|| engine.query(black_box("없음")).expect("query"))
    });
}

fn bench_tokenizer(c: &mut Criterion) {
    let tokenizer = Tokenizer::default();
    let line = "지금 뭐 해? 오늘 저녁에 밥 먹자, 내일은 좋아! ".repeat(40);

    c.bench_function("tokenize_dialogue_line", |b| {
        b.iter(|| tokenizer.tokenize(black_box(&line)))
    });
}

criterion_group!(benches, bench_next_word_counts, bench_tokenizer);
criterion_main!(benches);
