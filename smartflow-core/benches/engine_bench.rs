//! Criterion benchmarks for SmartFlow hot paths.
//!
//! Benchmarks:
//! 1. Per-candle engine step (buffer, cache update, gating, composition)
//! 2. Feature pre-compute over a full buffer
//! 3. Swing detection
//! 4. Liquidity analysis over the default window

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use smartflow_core::analysis::detect_swings;
use smartflow_core::domain::{Candle, Interval};
use smartflow_core::synthetic::{generate_candles, FeedParams, SeedHierarchy};
use smartflow_core::{SmartFlowConfig, SymbolEngine};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    generate_candles(
        &SeedHierarchy::new(42),
        "BTCUSDT",
        Interval::M15,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        n,
        FeedParams::default(),
    )
}

fn config() -> Arc<SmartFlowConfig> {
    Arc::new(SmartFlowConfig::single_interval("BTCUSDT", Interval::M15))
}

// ── 1. Engine step ───────────────────────────────────────────────────

fn bench_engine_step(c: &mut Criterion) {
    let candles = make_candles(1_200);
    let (history, live) = candles.split_at(200);

    c.bench_function("engine_1000_candles", |b| {
        b.iter(|| {
            let mut engine = SymbolEngine::new("BTCUSDT", config()).unwrap();
            engine
                .initialize_with_history(Interval::M15, history.to_vec())
                .unwrap();
            for candle in live {
                black_box(engine.on_closed_candle(Interval::M15, candle.clone()).unwrap());
            }
        })
    });
}

// ── 2. Pre-compute ───────────────────────────────────────────────────

fn bench_pre_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("pre_compute");
    for n in [50usize, 200] {
        let candles = make_candles(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &candles, |b, candles| {
            b.iter(|| {
                let mut cache = config().feature_cache();
                cache.pre_compute(black_box(candles));
                black_box(cache.structure().cloned())
            })
        });
    }
    group.finish();
}

// ── 3. Swings ────────────────────────────────────────────────────────

fn bench_swings(c: &mut Criterion) {
    let candles = make_candles(200);
    let mut group = c.benchmark_group("detect_swings");
    for lookback in [2usize, 5, 10] {
        group.bench_with_input(BenchmarkId::from_parameter(lookback), &lookback, |b, &lb| {
            b.iter(|| detect_swings(black_box(&candles), lb).count())
        });
    }
    group.finish();
}

// ── 4. Liquidity ─────────────────────────────────────────────────────

fn bench_liquidity(c: &mut Criterion) {
    let candles = make_candles(50);
    let analyzer = config().detection.liquidity_analyzer();
    c.bench_function("liquidity_analyze_50", |b| {
        b.iter(|| black_box(analyzer.analyze(black_box(&candles))))
    });
}

criterion_group!(
    benches,
    bench_engine_step,
    bench_pre_compute,
    bench_swings,
    bench_liquidity
);
criterion_main!(benches);
