//! Stochastic oscillator rule: %K/%D crosses inside the extreme bands.

use super::{last_two, SignalRule};
use crate::domain::{keys, Candle, Signal};

const MIDLINE: f64 = 50.0;

/// %K against %D with overbought/oversold bands.
///
/// Tiers, checked in order:
/// 1. %K crosses above %D while oversold (BUY), below %D while overbought (SELL)
/// 2. %K oversold and above %D (BUY), overbought and below %D (SELL)
/// 3. %K above %D, rising and under 50 (BUY), mirrored over 50
#[derive(Debug, Clone)]
pub struct StochasticRule {
    pub overbought: f64,
    pub oversold: f64,
}

impl StochasticRule {
    pub fn new(overbought: f64, oversold: f64) -> Self {
        Self {
            overbought,
            oversold,
        }
    }
}

impl Default for StochasticRule {
    fn default() -> Self {
        Self::new(80.0, 20.0)
    }
}

impl SignalRule for StochasticRule {
    fn name(&self) -> &str {
        "stochastic"
    }

    fn evaluate(&self, candles: &[Candle]) -> Signal {
        let (Some((k_prev, k)), Some((d_prev, d))) = (
            last_two(candles, keys::STOCH_K),
            last_two(candles, keys::STOCH_D),
        ) else {
            return Signal::Hold;
        };

        let crossed_up = k_prev <= d_prev && k > d;
        let crossed_down = k_prev >= d_prev && k < d;

        if crossed_up && k < self.oversold {
            Signal::Buy
        } else if crossed_down && k > self.overbought {
            Signal::Sell
        } else if k < self.oversold && k > d {
            Signal::Buy
        } else if k > self.overbought && k < d {
            Signal::Sell
        } else if k > d && k > k_prev && k < MIDLINE {
            Signal::Buy
        } else if k < d && k < k_prev && k > MIDLINE {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
