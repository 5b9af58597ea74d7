//! Benchmarks for tick synthesis

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal_macros::dec;
use tickshift::synth::TickSynthesizer;

fn benchmark_bridge_60_ticks(c: &mut Criterion) {
    let mut synth = TickSynthesizer::with_seed(42);

    c.bench_function("bridge_60_ticks", |b| {
        b.iter(|| {
            synth.generate(
                black_box(dec!(21500)),
                black_box(dec!(21520)),
                black_box(dec!(21480)),
                black_box(dec!(21510)),
                60,
            )
        })
    });
}

fn benchmark_bridge_600_ticks(c: &mut Criterion) {
    let mut synth = TickSynthesizer::with_seed(42);

    c.bench_function("bridge_600_ticks", |b| {
        b.iter(|| {
            synth.generate(
                black_box(dec!(21500)),
                black_box(dec!(21520)),
                black_box(dec!(21480)),
                black_box(dec!(21510)),
                600,
            )
        })
    });
}

criterion_group!(benches, benchmark_bridge_60_ticks, benchmark_bridge_600_ticks);
criterion_main!(benches);
