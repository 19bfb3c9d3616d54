//! Benchmark suite for rps-algo
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rps_algo::{
    build_training_set_from_moves, encode_window, Architecture, FitOptions, MlpClassifier, Move,
    MoveClassifier,
};

fn history(len: usize) -> Vec<Move> {
    (0..len).map(|i| Move::ALL[(i * 7 + i / 3) % 3]).collect()
}

fn bench_encode_window(c: &mut Criterion) {
    let moves = history(50);
    c.bench_function("encode_window/3", |b| {
        b.iter(|| encode_window(black_box(&moves), 3))
    });
}

fn bench_predict(c: &mut Criterion) {
    let model = MlpClassifier::new(Architecture::default(), 1);
    let input = encode_window(&history(3), 3).unwrap();
    c.bench_function("MlpClassifier::predict", |b| {
        b.iter(|| model.predict(black_box(&input)))
    });
}

fn bench_fit(c: &mut Criterion) {
    let samples = build_training_set_from_moves(&history(50), 3);
    let options = FitOptions::default();
    c.bench_function("MlpClassifier::fit/50 rounds", |b| {
        b.iter_batched(
            || MlpClassifier::new(Architecture::default(), 2),
            |mut model| model.fit(&samples, &options),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_encode_window, bench_predict, bench_fit);
criterion_main!(benches);
