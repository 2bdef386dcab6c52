//! # Line Estimation Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bot_lib::line_est::{LineEst, Params};
use util::module::State;

fn line_est_benchmark(c: &mut Criterion) {
    // ---- Build the estimator and readings ----

    let mut line_est = LineEst::new(Params::default()).unwrap();

    // Every combination of hits on a 5 sensor array
    let readings: Vec<Vec<u16>> = (0u32..32)
        .map(|mask| {
            (0..5)
                .map(|i| if mask & (1 << i) != 0 { 50 } else { 1000 })
                .collect()
        })
        .collect();

    c.bench_function("LineEst::estimate_offset", |b| {
        b.iter(|| {
            for r in readings.iter() {
                black_box(line_est.estimate_offset(black_box(r)).unwrap());
            }
        })
    });

    c.bench_function("LineEst::proc", |b| {
        b.iter(|| {
            for r in readings.iter() {
                black_box(line_est.proc(black_box(r)).unwrap());
            }
        })
    });
}

criterion_group!(benches, line_est_benchmark);
criterion_main!(benches);
