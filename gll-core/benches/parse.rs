//! Benchmarks for the combinator engine.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use gll_core::{Grammar, ParserId};

/// Build a terminal chain matching `words` in order.
fn chain_of(g: &mut Grammar, words: &[&str]) -> ParserId {
    let mut parser = g.literal(words[0]);
    for word in &words[1..] {
        let next = g.literal(word);
        parser = g.followed_by(parser, next);
    }
    parser
}

/// Benchmark direct descent over a terminal sequence.
fn bench_terminal_chain(c: &mut Criterion) {
    let words = ["lorem", "ipsum", "dolor", "sit", "amet"];
    let input: String = words.concat();

    let mut g = Grammar::new();
    let parser = chain_of(&mut g, &words);

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("terminal_chain", |b| {
        b.iter(|| g.parse(parser, black_box(&input)))
    });
    group.finish();
}

/// Benchmark trampolined evaluation of an ambiguous disjunction.
fn bench_ambiguous_alternatives(c: &mut Criterion) {
    let input = "aab";

    let mut g = Grammar::new();
    let a = g.literal("a");
    let aa = g.literal("aa");
    let ab = g.literal("ab");
    let b = g.literal("b");
    let prefix = g.alternately(a, aa);
    let suffix = g.alternately(ab, b);
    let word = g.followed_by(prefix, suffix);

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("ambiguous_split", |b| {
        b.iter(|| g.parse(word, black_box(input)))
    });
    group.finish();
}

/// Benchmark scaling of a recursive grammar with input length.
fn bench_recursion_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_scaling");

    for size in [8usize, 32, 128] {
        let input = "a".repeat(size);

        let mut g = Grammar::new();
        let a = g.literal("a");
        let r = g.alternately(a, a);
        let step = g.followed_by(a, r);
        g.set_next(r, step).unwrap();

        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_function(format!("{}_as", size), |b| {
            b.iter(|| g.parse(r, black_box(&input)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_terminal_chain,
    bench_ambiguous_alternatives,
    bench_recursion_scaling
);
criterion_main!(benches);
