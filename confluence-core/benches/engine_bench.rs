//! Criterion benchmarks for Confluence hot paths.
//!
//! Benchmarks:
//! 1. Rule set evaluation (six rules over one candle history)
//! 2. Timeframe analysis (rules + momentum + reversal + key levels)
//! 3. Full decision pipeline, sequential vs parallel timeframes
//! 4. Trade planning across four timeframes

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeMap;

use confluence_core::analysis::{ClassifierPrediction, TimeframeAnalyzer};
use confluence_core::domain::{Candle, IndicatorSnapshot, Signal, Timeframe};
use confluence_core::ledger::TradeLedger;
use confluence_core::planner::{TradePlanner, TradeRequest};
use confluence_core::rules::RuleSet;
use confluence_core::{DecisionEngine, EngineConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(timeframe: Timeframe, n: usize) -> Vec<Candle> {
    let t0 = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 1.10 + (i as f64 * 0.1).sin() * 0.02;
            let open = close - 0.0003;
            let x = i as f64;
            Candle::new(
                t0 + Duration::minutes(timeframe.minutes() * i as i64),
                open,
                close + 0.0015,
                close - 0.0015,
                close,
                1_000.0 + (i % 500) as f64,
            )
            .with_indicator("MA_20", close - 0.001 * (x * 0.05).cos())
            .with_indicator("MA_50", close - 0.002 * (x * 0.03).cos())
            .with_indicator("MA_200", 1.10)
            .with_indicator("EMA_12", close - 0.0005 * (x * 0.07).cos())
            .with_indicator("EMA_26", close - 0.001 * (x * 0.04).cos())
            .with_indicator("RSI", 50.0 + 20.0 * (x * 0.1).sin())
            .with_indicator("MACD", 0.001 * (x * 0.1).sin())
            .with_indicator("MACD_Signal", 0.001 * (x * 0.1 - 0.3).sin())
            .with_indicator("Stoch_K", 50.0 + 40.0 * (x * 0.2).sin())
            .with_indicator("Stoch_D", 50.0 + 40.0 * (x * 0.2 - 0.4).sin())
            .with_indicator("ATR", 0.004)
            .with_indicator("BB_Upper", close + 0.006)
            .with_indicator("BB_Lower", close - 0.006)
        })
        .collect()
}

fn make_series(n: usize) -> BTreeMap<Timeframe, Vec<Candle>> {
    [Timeframe::M15, Timeframe::H1, Timeframe::H4, Timeframe::D1]
        .into_iter()
        .map(|tf| (tf, make_candles(tf, n)))
        .collect()
}

// ── 1. Rule Set ──────────────────────────────────────────────────────

fn bench_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_set");
    let rules = RuleSet::default();

    for &n in &[100, 500, 2_000] {
        let candles = make_candles(Timeframe::H1, n);
        group.bench_with_input(BenchmarkId::new("evaluate", n), &n, |b, _| {
            b.iter(|| rules.evaluate(black_box(&candles)));
        });
    }

    group.finish();
}

// ── 2. Timeframe Analysis ────────────────────────────────────────────

fn bench_timeframe_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeframe_analysis");
    let analyzer = TimeframeAnalyzer::default();

    for &n in &[100, 500, 2_000] {
        let candles = make_candles(Timeframe::H1, n);
        group.bench_with_input(BenchmarkId::new("analyze", n), &n, |b, _| {
            b.iter(|| analyzer.analyze(Timeframe::H1, black_box(&candles)));
        });
    }

    group.finish();
}

// ── 3. Full Pipeline ─────────────────────────────────────────────────

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("decision_pipeline");
    let series = make_series(500);
    let ledger = TradeLedger::default();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let prediction = Some(ClassifierPrediction::new(Signal::Buy, 0.9));

    for parallel in [false, true] {
        let engine = DecisionEngine::new(EngineConfig::default())
            .unwrap()
            .with_parallelism(parallel);
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(format!("4_timeframes_500_candles_{label}"), |b| {
            b.iter(|| {
                engine.evaluate(
                    "EURUSD",
                    black_box(&series),
                    prediction,
                    10_000.0,
                    &ledger,
                    now,
                )
            });
        });
    }

    group.finish();
}

// ── 4. Trade Planning ────────────────────────────────────────────────

fn bench_planner(c: &mut Criterion) {
    let mut group = c.benchmark_group("trade_planner");
    let planner = TradePlanner::default();
    let ledger = TradeLedger::default();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let snapshot: IndicatorSnapshot = [("ATR", 0.005), ("BB_Lower", 1.094), ("RSI", 55.0)]
        .into_iter()
        .collect();
    let snapshots: BTreeMap<Timeframe, IndicatorSnapshot> =
        [Timeframe::M15, Timeframe::H1, Timeframe::H4, Timeframe::D1]
            .into_iter()
            .map(|tf| (tf, snapshot.clone()))
            .collect();
    let request = TradeRequest {
        signal: Signal::Buy,
        confidence: 0.8,
        entry_price: 1.1,
        balance: 10_000.0,
    };

    group.bench_function("plan_4_timeframes", |b| {
        b.iter(|| planner.plan(black_box(&request), black_box(&snapshots), &ledger, now));
    });
    group.bench_function("plan_single", |b| {
        b.iter(|| planner.plan_single(black_box(&request), &snapshot, &ledger, now));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_rules,
    bench_timeframe_analysis,
    bench_pipeline,
    bench_planner,
);
criterion_main!(benches);
