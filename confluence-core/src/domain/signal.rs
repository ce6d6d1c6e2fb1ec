//! Discrete trading signals and trend directions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actionable direction emitted by every rule and aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// Signed score used by weighted blends: BUY +1, SELL -1, HOLD 0.
    pub fn score(self) -> f64 {
        match self {
            Signal::Buy => 1.0,
            Signal::Sell => -1.0,
            Signal::Hold => 0.0,
        }
    }

    pub fn is_actionable(self) -> bool {
        !matches!(self, Signal::Hold)
    }

    pub fn opposite(self) -> Self {
        match self {
            Signal::Buy => Signal::Sell,
            Signal::Sell => Signal::Buy,
            Signal::Hold => Signal::Hold,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Signal::Buy),
            "SELL" => Ok(Signal::Sell),
            "HOLD" => Ok(Signal::Hold),
            other => Err(format!("unknown signal '{other}' (expected BUY, SELL or HOLD)")),
        }
    }
}

/// Majority vote of BUY against SELL. Ties (including no votes) are HOLD.
pub fn majority<'a, I>(signals: I) -> Signal
where
    I: IntoIterator<Item = &'a Signal>,
{
    let (buy, sell) = tally(signals);
    if buy > sell {
        Signal::Buy
    } else if sell > buy {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Count BUY and SELL votes.
pub fn tally<'a, I>(signals: I) -> (usize, usize)
where
    I: IntoIterator<Item = &'a Signal>,
{
    signals.into_iter().fold((0, 0), |(b, s), sig| match sig {
        Signal::Buy => (b + 1, s),
        Signal::Sell => (b, s + 1),
        Signal::Hold => (b, s),
    })
}

/// Direction of a trend or momentum reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl TrendDirection {
    /// +1 bullish, -1 bearish, 0 neutral.
    pub fn sign(self) -> f64 {
        match self {
            TrendDirection::Bullish => 1.0,
            TrendDirection::Bearish => -1.0,
            TrendDirection::Neutral => 0.0,
        }
    }

    pub fn opposes(self, other: TrendDirection) -> bool {
        matches!(
            (self, other),
            (TrendDirection::Bullish, TrendDirection::Bearish)
                | (TrendDirection::Bearish, TrendDirection::Bullish)
        )
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendDirection::Bullish => "BULLISH",
            TrendDirection::Bearish => "BEARISH",
            TrendDirection::Neutral => "NEUTRAL",
        })
    }
}
