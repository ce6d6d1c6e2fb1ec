//! Property tests for decision-engine invariants.
//!
//! Uses proptest to verify:
//! 1. Ladder sides: stops on the losing side, targets on the winning side,
//!    including Bollinger-derived entries and out-of-range ATRs
//! 2. Take-profit close percentages sum to 100
//! 3. No reversal when historical and recent directions agree
//! 4. Weighted-signal monotonicity in the current signal and momentum score,
//!    for both bullish and bearish trends
//! 5. Consensus is HOLD when no side reaches the agreement minimum
//! 6. Ensemble is HOLD whenever both side scores are at most 0.5
//! 7. Short histories never panic and are reported as insufficient

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeMap;

use confluence_core::analysis::{
    ClassifierPrediction, ConsensusAggregator, EnsembleVoter, MarketSnapshot, TimeframeAnalysis,
    TimeframeAnalyzer, TimeframeOutcome,
};
use confluence_core::config::{ConsensusConfig, EnsembleConfig, SignalWeights};
use confluence_core::domain::{Candle, IndicatorSnapshot, Signal, Timeframe, TrendDirection};
use confluence_core::ledger::TradeLedger;
use confluence_core::momentum::{calculate_weighted_signal, detect_reversal, Reversal, TrendMomentum};
use confluence_core::planner::{
    ladders, size_position, Side, TradePlanner, TradeRequest,
};
use confluence_core::rules::SignalMap;
use confluence_core::{DecisionEngine, EngineConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![Just(Signal::Buy), Just(Signal::Sell), Just(Signal::Hold)]
}

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Long), Just(Side::Short)]
}

fn arb_trade_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![Just(Signal::Buy), Just(Signal::Sell)]
}

/// Snapshot with optional ATR (possibly far outside the usable range) and
/// optional Bollinger bands on either side of `entry`.
fn arb_snapshot(entry: f64) -> impl Strategy<Value = IndicatorSnapshot> {
    (
        prop::option::of(-0.01..0.6_f64),
        prop::option::of(-0.1..0.1_f64),
        prop::option::of(-0.1..0.1_f64),
    )
        .prop_map(move |(atr, lower, upper)| {
            let mut snapshot = IndicatorSnapshot::new();
            if let Some(atr) = atr {
                snapshot.insert("ATR", entry * atr);
            }
            if let Some(offset) = lower {
                snapshot.insert("BB_Lower", entry * (1.0 + offset));
            }
            if let Some(offset) = upper {
                snapshot.insert("BB_Upper", entry * (1.0 + offset));
            }
            snapshot
        })
}

fn arb_direction() -> impl Strategy<Value = TrendDirection> {
    prop_oneof![
        Just(TrendDirection::Bullish),
        Just(TrendDirection::Bearish),
        Just(TrendDirection::Neutral)
    ]
}

fn arb_price() -> impl Strategy<Value = f64> {
    (0.5..500.0_f64).prop_map(|p| (p * 10_000.0).round() / 10_000.0)
}

/// Candles whose close moves by `steps` (relative) each bar, opening at the prior close.
fn path(steps: &[f64]) -> Vec<Candle> {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut price = 1.10;
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let open = price;
            price *= 1.0 + step;
            let high = open.max(price) * 1.0005;
            let low = open.min(price) * 0.9995;
            Candle::new(t0 + Duration::hours(i as i64), open, high, low, price, 1_000.0)
        })
        .collect()
}

fn analysis(timeframe: Timeframe, signal: Signal, confidence: f64) -> TimeframeAnalysis {
    TimeframeAnalysis {
        timeframe,
        signals: SignalMap::new(),
        current_consensus: signal,
        enhanced_signal: signal,
        confidence,
        reasoning: String::new(),
        trend_strength: 0.5,
        momentum_direction: TrendDirection::Neutral,
        trend_momentum: TrendMomentum::neutral(),
        reversal: Reversal::none(),
        current: MarketSnapshot {
            price: 1.1,
            rsi: None,
            macd: None,
            atr: None,
            volume: 0.0,
        },
        support_levels: vec![],
        resistance_levels: vec![],
        signal_changed: false,
        signal_score: Default::default(),
    }
}

// ── 1-2. Ladders ─────────────────────────────────────────────────────

proptest! {
    /// With a positive ATR, every stop is on the losing side and every target
    /// on the winning side of the entry.
    #[test]
    fn ladder_sides(entry in arb_price(), atr_pct in 0.0001..0.05_f64, side in arb_side()) {
        let atr = entry * atr_pct;
        let dir = side.sign();
        let stops = ladders::stop_losses(entry, side, atr);
        let standard = stops.iter().find(|s| s.recommended).unwrap().price;
        let targets = ladders::take_profits(entry, side, atr, standard);

        for stop in &stops {
            prop_assert!(dir * (entry - stop.price) > 0.0, "stop {} vs entry {}", stop.price, entry);
        }
        for target in &targets {
            prop_assert!(dir * (target.price - entry) > 0.0, "target {} vs entry {}", target.price, entry);
        }
        let entries = ladders::entries(entry, side, atr, &IndicatorSnapshot::new());
        for e in &entries[1..] {
            prop_assert!(dir * (entry - e.price) > 0.0);
        }
    }

    /// Through the planner, with bands and ATRs of any quality: every stop is
    /// on the losing side, every target on the winning side, every limit entry
    /// better than the market entry, and nothing at or below zero.
    #[test]
    fn planned_ladders_keep_strict_order(
        (entry, snapshot) in arb_price().prop_flat_map(|entry| (Just(entry), arb_snapshot(entry))),
        signal in arb_trade_signal(),
    ) {
        let request = TradeRequest { signal, confidence: 0.9, entry_price: entry, balance: 10_000.0 };
        let snapshots: BTreeMap<Timeframe, IndicatorSnapshot> =
            [Timeframe::H1, Timeframe::D1].into_iter().map(|tf| (tf, snapshot.clone())).collect();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let outcome = TradePlanner::default().plan(&request, &snapshots, &TradeLedger::default(), now);
        let plan = outcome.approved().expect("valid request is approved");
        let dir = signal.score();

        for tf_plan in plan.timeframe_plans.values() {
            prop_assert!(ladders::atr_in_range(entry, tf_plan.atr), "atr {} at {}", tf_plan.atr, entry);
            for stop in &tf_plan.stop_losses {
                prop_assert!(stop.price > 0.0 && dir * (entry - stop.price) > 0.0, "stop {} vs {}", stop.price, entry);
            }
            for target in &tf_plan.take_profits {
                prop_assert!(target.price > 0.0 && dir * (target.price - entry) > 0.0, "target {} vs {}", target.price, entry);
            }
            prop_assert_eq!(tf_plan.entries[0].price, entry);
            for e in &tf_plan.entries[1..] {
                prop_assert!(e.price > 0.0 && dir * (entry - e.price) > 0.0, "{} {} vs {}", e.name, e.price, entry);
            }
        }
    }

    #[test]
    fn close_percentages_sum_to_100(entry in arb_price(), atr in 0.0001..5.0_f64, side in arb_side()) {
        let targets = ladders::take_profits(entry, side, atr, entry - side.sign() * 2.0 * atr);
        let total: f64 = targets.iter().map(|t| t.close_percentage).sum();
        prop_assert!((total - 100.0).abs() < 1e-9);
    }

    /// Hitting the stop loses exactly the configured risk.
    #[test]
    fn sizing_risks_fixed_fraction(
        balance in 100.0..1_000_000.0_f64,
        entry in arb_price(),
        distance_pct in 0.001..0.2_f64,
        risk in 0.001..0.05_f64,
    ) {
        let stop = entry * (1.0 - distance_pct);
        let size = size_position(balance, entry, stop, risk, 100_000.0).unwrap();
        prop_assert!((size.risk_amount - balance * risk).abs() < 1e-6 * balance);
        prop_assert!((size.units * (entry - stop) - size.risk_amount).abs() < 1e-6 * size.risk_amount);
    }
}

// ── 3. Reversal ──────────────────────────────────────────────────────

proptest! {
    /// A trend that keeps going in the same direction is never a reversal.
    #[test]
    fn no_reversal_when_directions_match(
        magnitudes in prop::collection::vec(0.0005..0.01_f64, 25..40),
        falling in any::<bool>(),
    ) {
        let sign = if falling { -1.0 } else { 1.0 };
        let steps: Vec<f64> = magnitudes.iter().map(|m| sign * m).collect();
        let r = detect_reversal(&path(&steps), 5, 20, 0.6);
        prop_assert!(!r.is_reversal);
        prop_assert_eq!(r.historical.direction, r.recent.direction);
    }
}

// ── 4. Weighted signal ───────────────────────────────────────────────

proptest! {
    /// A more bullish current signal never lowers the blended score.
    #[test]
    fn weighted_score_monotone_in_current_signal(
        direction in arb_direction(),
        momentum_score in 0.0..1.0_f64,
    ) {
        let momentum = TrendMomentum { direction, momentum_score, ..TrendMomentum::neutral() };
        let reversal = Reversal::none();
        let weights = SignalWeights::default();
        let score = |s| calculate_weighted_signal(s, &momentum, &reversal, &weights, 0.3).score;
        prop_assert!(score(Signal::Buy) >= score(Signal::Hold));
        prop_assert!(score(Signal::Hold) >= score(Signal::Sell));
    }

    /// Under a bullish trend, more momentum never lowers the score.
    #[test]
    fn weighted_score_monotone_in_momentum(
        current in arb_signal(),
        a in 0.0..1.0_f64,
        b in 0.0..1.0_f64,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let weights = SignalWeights::default();
        let reversal = Reversal::none();
        let at = |m| {
            let momentum = TrendMomentum {
                direction: TrendDirection::Bullish,
                momentum_score: m,
                ..TrendMomentum::neutral()
            };
            calculate_weighted_signal(current, &momentum, &reversal, &weights, 0.3)
        };
        let (low, high) = (at(lo), at(hi));
        prop_assert!(high.score >= low.score);
        prop_assert!(high.signal.score() >= low.signal.score());
        prop_assert!(high.confidence <= 1.0);
    }

    /// Under a bearish trend, more momentum never raises the score.
    #[test]
    fn weighted_score_monotone_in_bearish_momentum(
        current in arb_signal(),
        a in 0.0..1.0_f64,
        b in 0.0..1.0_f64,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let weights = SignalWeights::default();
        let reversal = Reversal::none();
        let at = |m| {
            let momentum = TrendMomentum {
                direction: TrendDirection::Bearish,
                momentum_score: m,
                ..TrendMomentum::neutral()
            };
            calculate_weighted_signal(current, &momentum, &reversal, &weights, 0.3)
        };
        let (low, high) = (at(lo), at(hi));
        prop_assert!(high.score <= low.score);
        prop_assert!(high.signal.score() <= low.signal.score());
        prop_assert!(high.confidence <= 1.0);
    }
}

// ── 5-6. Consensus and ensemble ──────────────────────────────────────

proptest! {
    #[test]
    fn consensus_holds_below_agreement_minimum(
        signals in prop::collection::vec(arb_signal(), 4),
        confidences in prop::collection::vec(0.0..1.0_f64, 4),
        min_agree in 1usize..5,
    ) {
        let timeframes = [Timeframe::M15, Timeframe::H1, Timeframe::H4, Timeframe::D1];
        let analyses: Vec<TimeframeAnalysis> = timeframes
            .iter()
            .zip(&signals)
            .zip(&confidences)
            .map(|((&tf, &s), &c)| analysis(tf, s, c))
            .collect();
        let aggregator = ConsensusAggregator::new(ConsensusConfig {
            min_timeframes_agree: min_agree,
            ..ConsensusConfig::default()
        });
        let result = aggregator.aggregate(&analyses);

        let buys = signals.iter().filter(|s| **s == Signal::Buy).count();
        let sells = signals.iter().filter(|s| **s == Signal::Sell).count();
        if buys.max(sells) < min_agree {
            prop_assert_eq!(result.consensus, Signal::Hold);
            prop_assert_eq!(result.confidence, 0.5);
        }
        if result.consensus.is_actionable() {
            prop_assert!(result.agreement_count >= min_agree);
        }
    }

    #[test]
    fn ensemble_holds_when_both_scores_small(
        rule_signals in prop::collection::vec(arb_signal(), 0..8),
        ml_signal in arb_signal(),
        ml_confidence in 0.0..1.0_f64,
        technical_weight in 0.0..1.0_f64,
    ) {
        let signals: SignalMap = rule_signals
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("rule_{i}"), *s))
            .collect();
        let voter = EnsembleVoter::new(EnsembleConfig {
            technical_weight,
            ml_weight: 1.0 - technical_weight,
            ..EnsembleConfig::default()
        });
        let d = voter.vote(&signals, Some(ClassifierPrediction::new(ml_signal, ml_confidence)));
        if d.buy_score <= 0.5 && d.sell_score <= 0.5 {
            prop_assert_eq!(d.signal, Signal::Hold);
        }
        if d.signal == Signal::Buy {
            prop_assert!(d.buy_score > d.sell_score && d.buy_score > 0.5);
        }
        if d.signal == Signal::Sell {
            prop_assert!(d.sell_score > d.buy_score && d.sell_score > 0.5);
        }
    }
}

// ── 7. Short data ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn short_history_never_panics(
        steps in prop::collection::vec(-0.01..0.01_f64, 0..49),
        ml_signal in arb_signal(),
    ) {
        let candles = path(&steps);
        let outcome = TimeframeAnalyzer::default().analyze(Timeframe::H1, &candles);
        let is_insufficient = matches!(outcome, TimeframeOutcome::InsufficientData { .. });
        prop_assert!(is_insufficient);

        let engine = DecisionEngine::new(EngineConfig::default()).unwrap();
        let series = BTreeMap::from([(Timeframe::H1, candles)]);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let result = engine.evaluate(
            "EURUSD",
            &series,
            Some(ClassifierPrediction::new(ml_signal, 0.9)),
            10_000.0,
            &TradeLedger::default(),
            now,
        );
        match result {
            Ok(decision) => {
                prop_assert!(decision.analyses.is_empty());
                prop_assert_eq!(decision.consensus.consensus, Signal::Hold);
            }
            Err(err) => prop_assert!(steps.is_empty(), "unexpected error {err}"),
        }
    }
}
