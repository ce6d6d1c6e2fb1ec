//! Point score of the latest candle and the price zones around it.
//!
//! Independent of the rule majority: each indicator family adds or removes
//! points, and the total maps onto a five-step recommendation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{keys, Candle};

/// Total at or beyond which a side is "strong".
const STRONG: f64 = 3.0;
/// Total at or beyond which a side is taken at all.
const WEAK: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[default]
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
}

impl Recommendation {
    pub fn from_total(total: f64) -> Self {
        if total >= STRONG {
            Recommendation::StrongBuy
        } else if total >= WEAK {
            Recommendation::Buy
        } else if total <= -STRONG {
            Recommendation::StrongSell
        } else if total <= -WEAK {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Recommendation::StrongBuy => "STRONG BUY",
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Sell => "SELL",
            Recommendation::StrongSell => "STRONG SELL",
        })
    }
}

/// Buy and sell ranges around the latest close.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceZones {
    /// Lower Bollinger band, or 2% under the close.
    pub strong_buy: f64,
    pub buy_zone_low: f64,
    pub buy_zone_high: f64,
    pub sell_zone_low: f64,
    pub sell_zone_high: f64,
    /// Upper Bollinger band, or 2% over the close.
    pub strong_sell: f64,
}

impl PriceZones {
    /// Zones at 0.5 and 1.5 ATR either side of `price`.
    pub fn around(price: f64, atr: f64, bb_lower: Option<f64>, bb_upper: Option<f64>) -> Self {
        Self {
            strong_buy: bb_lower.unwrap_or(price * 0.98),
            buy_zone_low: price - 1.5 * atr,
            buy_zone_high: price - 0.5 * atr,
            sell_zone_low: price + 0.5 * atr,
            sell_zone_high: price + 1.5 * atr,
            strong_sell: bb_upper.unwrap_or(price * 1.02),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalScore {
    pub trend: f64,
    pub momentum: f64,
    pub strength: f64,
    pub volatility: f64,
    pub total: f64,
    pub recommendation: Recommendation,
    pub zones: PriceZones,
}

impl SignalScore {
    /// Score `last` using `fast`/`mid` moving-average keys for the trend part.
    ///
    /// Missing indicators contribute nothing. Zones use ATR, or
    /// `atr_fallback_pct` of the close when ATR is absent or not positive.
    pub fn from_candle(last: &Candle, fast: &str, mid: &str, atr_fallback_pct: f64) -> Self {
        let close = last.close;
        let get = |name: &str| last.indicator(name);
        let vote = |up: bool| if up { 1.0 } else { -1.0 };

        let mut trend = 0.0;
        if let (Some(fast), Some(mid)) = (get(fast), get(mid)) {
            trend += vote(fast > mid);
            trend += vote(close > fast);
        }

        let mut momentum = 0.0;
        if let (Some(macd), Some(signal)) = (get(keys::MACD), get(keys::MACD_SIGNAL)) {
            momentum += vote(macd > signal);
            if let Some(hist) = get(keys::MACD_HIST) {
                momentum += 0.5 * vote(hist > 0.0);
            }
        }
        if let (Some(k), Some(d)) = (get(keys::STOCH_K), get(keys::STOCH_D)) {
            if k < 20.0 && k > d {
                momentum += 1.0;
            } else if k > 80.0 && k < d {
                momentum -= 1.0;
            }
        }

        let strength = match get(keys::RSI) {
            Some(rsi) if rsi < 30.0 => 2.0,
            Some(rsi) if rsi < 40.0 => 1.0,
            Some(rsi) if rsi > 70.0 => -2.0,
            Some(rsi) if rsi > 60.0 => -1.0,
            _ => 0.0,
        };

        let (bb_lower, bb_upper) = (get(keys::BB_LOWER), get(keys::BB_UPPER));
        let volatility = match (bb_lower, bb_upper) {
            (Some(lower), Some(_)) if close < lower => 1.0,
            (Some(_), Some(upper)) if close > upper => -1.0,
            _ => 0.0,
        };

        let total = trend + momentum + strength + volatility;
        let atr = get(keys::ATR)
            .filter(|a| *a > 0.0)
            .unwrap_or(close * atr_fallback_pct);

        Self {
            trend,
            momentum,
            strength,
            volatility,
            total,
            recommendation: Recommendation::from_total(total),
            zones: PriceZones::around(close, atr, bb_lower, bb_upper),
        }
    }
}
