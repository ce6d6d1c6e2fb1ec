//! Reversal detection: a strong established trend met by opposite recent movement.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::trend::{calculate_trend_momentum, TrendMomentum};
use crate::domain::{Candle, TrendDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReversalType {
    #[default]
    None,
    BullishToBearish,
    BearishToBullish,
}

impl ReversalType {
    /// +1 when turning bullish, -1 when turning bearish.
    pub fn sign(self) -> f64 {
        match self {
            ReversalType::None => 0.0,
            ReversalType::BullishToBearish => -1.0,
            ReversalType::BearishToBullish => 1.0,
        }
    }
}

impl fmt::Display for ReversalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReversalType::None => "NONE",
            ReversalType::BullishToBearish => "BULLISH_TO_BEARISH",
            ReversalType::BearishToBullish => "BEARISH_TO_BULLISH",
        })
    }
}

/// How sudden a reversal is, from the recent window's consistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WarningLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl WarningLevel {
    pub fn from_consistency(consistency: f64) -> Self {
        if consistency > 0.7 {
            WarningLevel::High
        } else if consistency > 0.5 {
            WarningLevel::Medium
        } else {
            WarningLevel::Low
        }
    }
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WarningLevel::Low => "LOW",
            WarningLevel::Medium => "MEDIUM",
            WarningLevel::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reversal {
    pub is_reversal: bool,
    /// Consistency of the recent window when reversing, else 0.
    pub reversal_strength: f64,
    pub reversal_type: ReversalType,
    pub warning_level: WarningLevel,
    /// Momentum of the established trend preceding the recent window.
    pub historical: TrendMomentum,
    pub recent: TrendMomentum,
}

impl Reversal {
    pub fn none() -> Self {
        Self {
            is_reversal: false,
            reversal_strength: 0.0,
            reversal_type: ReversalType::None,
            warning_level: WarningLevel::Low,
            historical: TrendMomentum::neutral(),
            recent: TrendMomentum::neutral(),
        }
    }

    /// Reversal term of the weighted blend: ±strength by type, 0 without reversal.
    pub fn signed_strength(&self) -> f64 {
        if self.is_reversal {
            self.reversal_type.sign() * self.reversal_strength
        } else {
            0.0
        }
    }
}

impl Default for Reversal {
    fn default() -> Self {
        Self::none()
    }
}

/// Compare the `historical_lookback` candles preceding the last
/// `recent_lookback` candles against those last candles.
///
/// A reversal needs a historical momentum score above `strong_trend_threshold`
/// and a recent direction opposite the historical one.
pub fn detect_reversal(
    candles: &[Candle],
    recent_lookback: usize,
    historical_lookback: usize,
    strong_trend_threshold: f64,
) -> Reversal {
    let needed = recent_lookback + historical_lookback;
    if recent_lookback == 0 || historical_lookback == 0 || candles.len() < needed {
        return Reversal::none();
    }

    let split = candles.len() - recent_lookback;
    let historical_window = &candles[split - historical_lookback..split];
    let recent_window = &candles[split..];

    let historical = calculate_trend_momentum(historical_window, historical_lookback);
    let recent = calculate_trend_momentum(recent_window, recent_lookback);

    let reversal_type = if historical.momentum_score > strong_trend_threshold
        && historical.direction.opposes(recent.direction)
    {
        match historical.direction {
            TrendDirection::Bullish => ReversalType::BullishToBearish,
            _ => ReversalType::BearishToBullish,
        }
    } else {
        ReversalType::None
    };

    if reversal_type == ReversalType::None {
        return Reversal {
            historical,
            recent,
            ..Reversal::none()
        };
    }

    Reversal {
        is_reversal: true,
        reversal_strength: recent.consistency,
        reversal_type,
        warning_level: WarningLevel::from_consistency(recent.consistency),
        historical,
        recent,
    }
}
