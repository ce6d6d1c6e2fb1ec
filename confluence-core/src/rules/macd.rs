//! MACD rule: signal-line cross, then histogram momentum.

use super::{last_two, SignalRule};
use crate::domain::{keys, Candle, Signal};

/// MACD against its signal line.
///
/// The histogram column is optional; when it is missing it is derived as
/// `MACD - MACD_Signal` on each of the two candles.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacdRule;

impl MacdRule {
    fn histogram(candle: &Candle, macd: f64, signal: f64) -> f64 {
        candle.indicator(keys::MACD_HIST).unwrap_or(macd - signal)
    }
}

impl SignalRule for MacdRule {
    fn name(&self) -> &str {
        "macd"
    }

    fn evaluate(&self, candles: &[Candle]) -> Signal {
        let (Some((macd_prev, macd_cur)), Some((sig_prev, sig_cur))) = (
            last_two(candles, keys::MACD),
            last_two(candles, keys::MACD_SIGNAL),
        ) else {
            return Signal::Hold;
        };
        let [.., prev, cur] = candles else {
            return Signal::Hold;
        };

        if macd_prev <= sig_prev && macd_cur > sig_cur {
            return Signal::Buy;
        }
        if macd_prev >= sig_prev && macd_cur < sig_cur {
            return Signal::Sell;
        }

        let hist_prev = Self::histogram(prev, macd_prev, sig_prev);
        let hist_cur = Self::histogram(cur, macd_cur, sig_cur);
        if macd_cur > sig_cur && hist_cur > hist_prev {
            Signal::Buy
        } else if macd_cur < sig_cur && hist_cur < hist_prev {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
