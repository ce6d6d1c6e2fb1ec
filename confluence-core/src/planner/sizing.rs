//! Risk-based position sizing.
//!
//! Size so that hitting the stop loses a fixed fraction of the balance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position size for one stop placement.
///
/// # Formula
/// ```text
/// risk_amount = balance * risk_per_trade
/// stop_distance = |entry - stop|
/// units = risk_amount / stop_distance
/// lots = units / lot_size
/// ```
///
/// # Example
/// - Balance: 10,000
/// - Risk per trade: 2% (200)
/// - Entry 1.10000, stop 1.09000 (distance 0.01)
/// - Units: 200 / 0.01 = 20,000 (0.2 standard lots)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub units: f64,
    pub lots: f64,
    pub risk_amount: f64,
    /// Risk per trade in percent (2.0 for 2%).
    pub risk_percentage: f64,
    pub stop_loss_distance: f64,
    /// Stop distance relative to entry, in percent.
    pub stop_loss_pct: f64,
}

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizingError {
    #[error("invalid stop loss: stop {stop} leaves no distance from entry {entry}")]
    InvalidStopLoss { entry: f64, stop: f64 },

    #[error("account balance {balance} cannot be sized")]
    InvalidBalance { balance: f64 },
}

/// Size a position risking `risk_per_trade` of `balance` between `entry` and `stop`.
pub fn size_position(
    balance: f64,
    entry: f64,
    stop: f64,
    risk_per_trade: f64,
    lot_size: f64,
) -> Result<PositionSize, SizingError> {
    if !(balance.is_finite() && balance > 0.0) {
        return Err(SizingError::InvalidBalance { balance });
    }
    let distance = (entry - stop).abs();
    if !(distance.is_finite() && distance > 0.0) {
        return Err(SizingError::InvalidStopLoss { entry, stop });
    }

    let risk_amount = balance * risk_per_trade;
    let units = risk_amount / distance;
    Ok(PositionSize {
        units,
        lots: units / lot_size,
        risk_amount,
        risk_percentage: risk_per_trade * 100.0,
        stop_loss_distance: distance,
        stop_loss_pct: distance / entry * 100.0,
    })
}
