//! RSI rule: zone exits, zone extremes, and small neutral-zone moves.

use super::{last_two, SignalRule};
use crate::domain::{keys, Candle, Signal};

const MIDLINE: f64 = 50.0;

/// Relative strength index rule.
///
/// Tiers, checked in order:
/// 1. RSI climbs out of oversold (BUY) or falls out of overbought (SELL)
/// 2. RSI still oversold and rising (BUY), still overbought and falling (SELL)
/// 3. RSI below 50 and up more than `weak_delta` (BUY), mirrored above 50
#[derive(Debug, Clone)]
pub struct RsiRule {
    pub overbought: f64,
    pub oversold: f64,
    pub weak_delta: f64,
}

impl RsiRule {
    pub fn new(overbought: f64, oversold: f64, weak_delta: f64) -> Self {
        Self {
            overbought,
            oversold,
            weak_delta,
        }
    }
}

impl Default for RsiRule {
    fn default() -> Self {
        Self::new(70.0, 30.0, 2.0)
    }
}

impl SignalRule for RsiRule {
    fn name(&self) -> &str {
        "rsi"
    }

    fn evaluate(&self, candles: &[Candle]) -> Signal {
        let Some((prev, cur)) = last_two(candles, keys::RSI) else {
            return Signal::Hold;
        };

        if prev < self.oversold && cur >= self.oversold {
            Signal::Buy
        } else if prev > self.overbought && cur <= self.overbought {
            Signal::Sell
        } else if cur < self.oversold && cur > prev {
            Signal::Buy
        } else if cur > self.overbought && cur < prev {
            Signal::Sell
        } else if cur < MIDLINE && cur > prev + self.weak_delta {
            Signal::Buy
        } else if cur > MIDLINE && cur < prev - self.weak_delta {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
