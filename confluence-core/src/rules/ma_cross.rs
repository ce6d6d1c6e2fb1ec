//! Moving average cross rule: golden/death cross, then trend alignment.
//!
//! Fires BUY when the fast average crosses above the slow one, SELL on the
//! mirror cross. Without a cross, a fast average above the slow one with price
//! above the fast average is still a BUY (mirrored for SELL).

use super::{last_two, SignalRule};
use crate::domain::{keys, Candle, Signal};

/// Moving average family selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaKind {
    Simple,
    Exponential,
}

impl MaKind {
    fn key(self, period: usize) -> String {
        match self {
            MaKind::Simple => keys::ma(period),
            MaKind::Exponential => keys::ema(period),
        }
    }

    fn rule_name(self) -> &'static str {
        match self {
            MaKind::Simple => "ma_cross",
            MaKind::Exponential => "ema_cross",
        }
    }
}

/// Fast/slow moving average cross.
///
/// # Indicator dependencies
/// - Fast: `MA_{fast}` or `EMA_{fast}` (e.g. `MA_20`, `EMA_12`)
/// - Slow: `MA_{slow}` or `EMA_{slow}` (e.g. `MA_50`, `EMA_26`)
#[derive(Debug, Clone)]
pub struct MaCross {
    pub fast_period: usize,
    pub slow_period: usize,
    pub kind: MaKind,
    fast_key: String,
    slow_key: String,
}

impl MaCross {
    pub fn new(fast_period: usize, slow_period: usize, kind: MaKind) -> Self {
        Self {
            fast_period,
            slow_period,
            kind,
            fast_key: kind.key(fast_period),
            slow_key: kind.key(slow_period),
        }
    }
}

impl SignalRule for MaCross {
    fn name(&self) -> &str {
        self.kind.rule_name()
    }

    fn evaluate(&self, candles: &[Candle]) -> Signal {
        let (Some((fast_prev, fast_cur)), Some((slow_prev, slow_cur))) = (
            last_two(candles, &self.fast_key),
            last_two(candles, &self.slow_key),
        ) else {
            return Signal::Hold;
        };
        let Some(close) = candles.last().map(|c| c.close) else {
            return Signal::Hold;
        };

        if fast_prev <= slow_prev && fast_cur > slow_cur {
            Signal::Buy
        } else if fast_prev >= slow_prev && fast_cur < slow_cur {
            Signal::Sell
        } else if fast_cur > slow_cur && close > fast_cur {
            Signal::Buy
        } else if fast_cur < slow_cur && close < fast_cur {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
