//! Blend the current rule consensus with momentum and reversal into one signal.

use serde::{Deserialize, Serialize};

use super::reversal::{Reversal, ReversalType};
use super::trend::TrendMomentum;
use crate::config::SignalWeights;
use crate::domain::{Signal, TrendDirection};

/// Outcome of the weighted blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedSignal {
    pub signal: Signal,
    /// Signed blended score, roughly in [-1, 1].
    pub score: f64,
    pub confidence: f64,
    pub reasoning: String,
}

/// Weighted sum of the current signal (±1/0), the signed momentum score and
/// the signed reversal strength.
///
/// BUY above `threshold`, SELL below `-threshold`, else HOLD. Weights are
/// normalized before use, so an inconsistent set still yields a bounded score.
pub fn calculate_weighted_signal(
    current: Signal,
    momentum: &TrendMomentum,
    reversal: &Reversal,
    weights: &SignalWeights,
    threshold: f64,
) -> WeightedSignal {
    let w = weights.normalized();
    let score = current.score() * w.current
        + momentum.signed_score() * w.momentum
        + reversal.signed_strength() * w.reversal;

    let signal = if score > threshold {
        Signal::Buy
    } else if score < -threshold {
        Signal::Sell
    } else {
        Signal::Hold
    };

    WeightedSignal {
        signal,
        score,
        confidence: score.abs().min(1.0),
        reasoning: reasoning(current, momentum, reversal),
    }
}

fn reasoning(current: Signal, momentum: &TrendMomentum, reversal: &Reversal) -> String {
    let mut parts = Vec::new();

    if current.is_actionable() {
        parts.push(format!("Current indicators suggest {current}"));
    }
    if momentum.direction != TrendDirection::Neutral {
        parts.push(format!(
            "Historical momentum is {} (strength: {:.1}%)",
            momentum.direction,
            momentum.momentum_score * 100.0
        ));
    }
    if reversal.is_reversal {
        let (from, to) = match reversal.reversal_type {
            ReversalType::BullishToBearish => ("bullish", "bearish"),
            ReversalType::BearishToBullish => ("bearish", "bullish"),
            ReversalType::None => ("", ""),
        };
        if !from.is_empty() {
            parts.push(format!(
                "REVERSAL DETECTED: Strong {from} trend reversing to {to} ({} confidence)",
                reversal.warning_level
            ));
        }
    }

    if parts.is_empty() {
        "No clear signal - market is neutral".to_string()
    } else {
        parts.join(" | ")
    }
}
