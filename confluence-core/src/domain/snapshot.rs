//! Indicator snapshot: named indicator values attached to one candle.
//!
//! Values are computed upstream. A missing name and a non-finite value mean
//! the same thing here: the indicator has no opinion on this candle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical indicator names read by the engine.
pub mod keys {
    pub const RSI: &str = "RSI";
    pub const MACD: &str = "MACD";
    pub const MACD_SIGNAL: &str = "MACD_Signal";
    pub const MACD_HIST: &str = "MACD_Hist";
    pub const STOCH_K: &str = "Stoch_K";
    pub const STOCH_D: &str = "Stoch_D";
    pub const ATR: &str = "ATR";
    pub const BB_UPPER: &str = "BB_Upper";
    pub const BB_MIDDLE: &str = "BB_Middle";
    pub const BB_LOWER: &str = "BB_Lower";

    /// Simple moving average key for a period (e.g. `MA_20`).
    pub fn ma(period: usize) -> String {
        format!("MA_{period}")
    }

    /// Exponential moving average key for a period (e.g. `EMA_12`).
    pub fn ema(period: usize) -> String {
        format!("EMA_{period}")
    }
}

/// Mapping of indicator name to value for a single candle.
///
/// `BTreeMap` keeps serialization order stable. Upstream may send `null` for
/// an indicator still in warmup, hence the `Option`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSnapshot {
    values: BTreeMap<String, Option<f64>>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), Some(value));
    }

    /// Value for `name`, or `None` when absent or not finite.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .get(name)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Finite values only, rounded to `decimals` places.
    pub fn rounded(&self, decimals: i32) -> BTreeMap<String, f64> {
        let factor = 10f64.powi(decimals);
        self.values
            .iter()
            .filter_map(|(k, v)| v.filter(|x| x.is_finite()).map(|x| (k.clone(), x)))
            .map(|(k, v)| (k, (v * factor).round() / factor))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for IndicatorSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (k, v) in iter {
            snapshot.insert(k, v);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_insert_and_get() {
        let mut s = IndicatorSnapshot::new();
        s.insert(keys::RSI, 61.5);
        s.insert(keys::ma(20), 1.1012);
        assert_eq!(s.get("RSI"), Some(61.5));
        assert_eq!(s.get("MA_20"), Some(1.1012));
        assert_eq!(s.get("MA_50"), None);
    }

    #[test]
    fn snapshot_treats_nan_as_absent() {
        let s: IndicatorSnapshot = [(keys::ATR, f64::NAN)].into_iter().collect();
        assert_eq!(s.len(), 1);
        assert!(!s.contains(keys::ATR));
    }

    #[test]
    fn rounded_skips_non_finite() {
        let s: IndicatorSnapshot = [("RSI", 55.123456), ("ATR", f64::INFINITY)]
            .into_iter()
            .collect();
        let r = s.rounded(2);
        assert_eq!(r.len(), 1);
        assert_eq!(r["RSI"], 55.12);
    }

    #[test]
    fn snapshot_deserializes_null_as_absent() {
        let s: IndicatorSnapshot = serde_json::from_str(r#"{"RSI":null,"ATR":0.0012}"#).unwrap();
        assert_eq!(s.get("RSI"), None);
        assert_eq!(s.get("ATR"), Some(0.0012));
    }

    #[test]
    fn key_helpers() {
        assert_eq!(keys::ma(200), "MA_200");
        assert_eq!(keys::ema(26), "EMA_26");
    }
}
