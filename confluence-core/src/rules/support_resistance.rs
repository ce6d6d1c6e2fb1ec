//! Support/resistance rule: pivot levels and price proximity.
//!
//! Pivot highs (a high equal to the highest high within ±`pivot_window`
//! candles) become resistance candidates; pivot lows become support
//! candidates. Nearby candidates are merged, and the few levels closest to the
//! last close on each side are the key levels.

use serde::{Deserialize, Serialize};

use super::SignalRule;
use crate::config::SupportResistanceConfig;
use crate::domain::{Candle, Signal};

/// Key levels around the last close, nearest first on each side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    /// Supports strictly below the last close, descending.
    pub support: Vec<f64>,
    /// Resistances strictly above the last close, ascending.
    pub resistance: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct SupportResistance {
    pub pivot_window: usize,
    pub cluster_tolerance: f64,
    pub proximity_tolerance: f64,
    pub num_levels: usize,
}

impl Default for SupportResistance {
    fn default() -> Self {
        Self::from_config(&SupportResistanceConfig::default())
    }
}

impl SupportResistance {
    pub fn from_config(config: &SupportResistanceConfig) -> Self {
        Self {
            pivot_window: config.pivot_window,
            cluster_tolerance: config.cluster_tolerance,
            proximity_tolerance: config.proximity_tolerance,
            num_levels: config.num_levels,
        }
    }

    /// Raw pivot lows and pivot highs, in candle order.
    pub fn pivots(&self, candles: &[Candle]) -> (Vec<f64>, Vec<f64>) {
        let w = self.pivot_window;
        let mut lows = Vec::new();
        let mut highs = Vec::new();
        if w == 0 || candles.len() <= 2 * w {
            return (lows, highs);
        }

        for i in w..candles.len() - w {
            let neighbourhood = &candles[i - w..=i + w];
            let max_high = neighbourhood
                .iter()
                .map(|c| c.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let min_low = neighbourhood
                .iter()
                .map(|c| c.low)
                .fold(f64::INFINITY, f64::min);

            if candles[i].high == max_high {
                highs.push(candles[i].high);
            }
            if candles[i].low == min_low {
                lows.push(candles[i].low);
            }
        }
        (lows, highs)
    }

    /// Merge sorted levels whose distance to the running cluster mean is
    /// within the relative tolerance. Returns cluster means, ascending.
    pub fn cluster(&self, levels: &[f64]) -> Vec<f64> {
        let mut sorted: Vec<f64> = levels.iter().copied().filter(|l| l.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let mut clusters = Vec::new();
        let mut current: Vec<f64> = Vec::new();
        for level in sorted {
            if let Some(mean) = mean(&current) {
                if mean != 0.0 && ((level - mean) / mean).abs() > self.cluster_tolerance {
                    clusters.push(mean);
                    current.clear();
                }
            }
            current.push(level);
        }
        if let Some(mean) = mean(&current) {
            clusters.push(mean);
        }
        clusters
    }

    pub fn key_levels(&self, candles: &[Candle]) -> KeyLevels {
        let Some(price) = candles.last().map(|c| c.close) else {
            return KeyLevels::default();
        };
        let (lows, highs) = self.pivots(candles);

        let mut support: Vec<f64> = self
            .cluster(&lows)
            .into_iter()
            .filter(|s| *s < price)
            .collect();
        support.sort_by(|a, b| b.total_cmp(a));
        support.truncate(self.num_levels);

        let mut resistance: Vec<f64> = self
            .cluster(&highs)
            .into_iter()
            .filter(|r| *r > price)
            .collect();
        resistance.sort_by(f64::total_cmp);
        resistance.truncate(self.num_levels);

        KeyLevels {
            support,
            resistance,
        }
    }

    fn is_near(&self, price: f64, level: f64) -> bool {
        level != 0.0 && ((price - level) / level).abs() <= self.proximity_tolerance
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl SignalRule for SupportResistance {
    fn name(&self) -> &str {
        "support_resistance"
    }

    fn evaluate(&self, candles: &[Candle]) -> Signal {
        let Some(price) = candles.last().map(|c| c.close) else {
            return Signal::Hold;
        };
        let levels = self.key_levels(candles);

        if levels.support.iter().any(|s| self.is_near(price, *s)) {
            Signal::Buy
        } else if levels.resistance.iter().any(|r| self.is_near(price, *r)) {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
