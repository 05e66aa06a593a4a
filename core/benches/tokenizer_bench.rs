use criterion::{criterion_group, criterion_main, Criterion};
use search_core::tokenizer::tokenize;

const PAGE: &str = "Cats are great. Cats love naps, and the best naps happen in the sun. \
Welcome home: dogs love walks, walks love dogs, and everyone loves a good search engine \
that finds the right page for the right query without fuss.";

fn bench_tokenize(c: &mut Criterion) {
    let text = PAGE.repeat(64);
    c.bench_function("tokenize_page", |b| b.iter(|| tokenize(&text)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
