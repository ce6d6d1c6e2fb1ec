//! Directional momentum over a rolling window of candles.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, TrendDirection};

/// A side must outnumber the other by this factor to set the direction.
const DIRECTIONAL_BIAS: f64 = 1.5;

/// Candles averaged at each end of the window for the volume trend.
const VOLUME_EDGE: usize = 5;

/// Momentum reading of one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendMomentum {
    pub direction: TrendDirection,
    /// Fraction of candles on the winning side (0.5 when neutral).
    pub strength: f64,
    /// Fraction of candles on the majority side, regardless of direction.
    pub consistency: f64,
    /// Overall trend quality in [0, 1].
    pub momentum_score: f64,
    /// First-to-last close change, in percent.
    pub price_change_pct: f64,
    pub bullish_candles: usize,
    pub bearish_candles: usize,
    pub higher_highs: usize,
    pub lower_lows: usize,
    /// Mean volume of the last candles over the first ones (1.0 when unknown).
    pub volume_trend: f64,
}

impl TrendMomentum {
    /// Result for a window too short to read.
    pub fn neutral() -> Self {
        Self {
            direction: TrendDirection::Neutral,
            strength: 0.0,
            consistency: 0.0,
            momentum_score: 0.0,
            price_change_pct: 0.0,
            bullish_candles: 0,
            bearish_candles: 0,
            higher_highs: 0,
            lower_lows: 0,
            volume_trend: 1.0,
        }
    }

    /// Momentum signed by direction: +score bullish, -score bearish, 0 neutral.
    pub fn signed_score(&self) -> f64 {
        self.direction.sign() * self.momentum_score
    }
}

impl Default for TrendMomentum {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Score the last `lookback` candles.
///
/// Fewer than `lookback` candles (or a zero lookback) yields
/// [`TrendMomentum::neutral`].
pub fn calculate_trend_momentum(candles: &[Candle], lookback: usize) -> TrendMomentum {
    if lookback == 0 || candles.len() < lookback {
        return TrendMomentum::neutral();
    }
    let window = &candles[candles.len() - lookback..];
    let total = window.len() as f64;

    let bullish = window.iter().filter(|c| c.is_bullish()).count();
    let bearish = window.iter().filter(|c| c.is_bearish()).count();

    let first_close = window[0].close;
    let last_close = window[window.len() - 1].close;
    let price_change_pct = if first_close != 0.0 {
        (last_close - first_close) / first_close * 100.0
    } else {
        0.0
    };

    let consistency = bullish.max(bearish) as f64 / total;

    let higher_highs = window.windows(2).filter(|w| w[1].high > w[0].high).count();
    let lower_lows = window.windows(2).filter(|w| w[1].low < w[0].low).count();

    let volume_trend = volume_trend(window);

    let (direction, strength) = if bullish as f64 > bearish as f64 * DIRECTIONAL_BIAS {
        (TrendDirection::Bullish, bullish as f64 / total)
    } else if bearish as f64 > bullish as f64 * DIRECTIONAL_BIAS {
        (TrendDirection::Bearish, bearish as f64 / total)
    } else {
        (TrendDirection::Neutral, 0.5)
    };

    // Only a bullish window credits higher highs; every other reads lower lows.
    let pattern_count = match direction {
        TrendDirection::Bullish => higher_highs,
        TrendDirection::Bearish | TrendDirection::Neutral => lower_lows,
    };
    let pattern_fraction = if window.len() > 1 {
        pattern_count as f64 / (window.len() - 1) as f64
    } else {
        0.0
    };

    let momentum_score = (0.3 * consistency
        + 0.3 * price_change_pct.abs() / 10.0
        + 0.2 * strength
        + 0.2 * pattern_fraction)
        .clamp(0.0, 1.0);

    TrendMomentum {
        direction,
        strength,
        consistency,
        momentum_score,
        price_change_pct,
        bullish_candles: bullish,
        bearish_candles: bearish,
        higher_highs,
        lower_lows,
        volume_trend,
    }
}

fn volume_trend(window: &[Candle]) -> f64 {
    let edge = VOLUME_EDGE.min(window.len());
    if edge == 0 {
        return 1.0;
    }
    let mean = |slice: &[Candle]| slice.iter().map(|c| c.volume).sum::<f64>() / slice.len() as f64;
    let early = mean(&window[..edge]);
    let late = mean(&window[window.len() - edge..]);
    if early > 0.0 && late.is_finite() {
        late / early
    } else {
        1.0
    }
}
