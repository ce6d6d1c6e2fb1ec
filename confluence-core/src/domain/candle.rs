//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::snapshot::IndicatorSnapshot;

/// OHLCV candle for a single instrument on a single timeframe.
///
/// Indicator values computed upstream travel with the candle they belong to.
/// The engine reads them; it never writes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub indicators: IndicatorSnapshot,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            indicators: IndicatorSnapshot::new(),
        }
    }

    /// Attach an indicator value (builder style).
    pub fn with_indicator(mut self, name: impl Into<String>, value: f64) -> Self {
        self.indicators.insert(name, value);
        self
    }

    /// Returns true if any OHLC field is not finite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Indicator value on this candle, `None` when absent or not finite.
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators.get(name)
    }
}

/// Defects in a candle sequence. These are caller bugs, not market conditions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    #[error("candle {index} timestamp {timestamp} is not after the previous candle ({previous})")]
    NonMonotonic {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("candle {index} has a non-finite OHLC value")]
    VoidCandle { index: usize },
}

/// Check that a sequence is strictly ascending in time with finite prices.
pub fn validate_series(candles: &[Candle]) -> Result<(), SeriesError> {
    for (index, candle) in candles.iter().enumerate() {
        if candle.is_void() {
            return Err(SeriesError::VoidCandle { index });
        }
        if index > 0 {
            let previous = candles[index - 1].timestamp;
            if candle.timestamp <= previous {
                return Err(SeriesError::NonMonotonic {
                    index,
                    timestamp: candle.timestamp,
                    previous,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    }

    fn sample_candle() -> Candle {
        Candle::new(t0(), 1.1000, 1.1050, 1.0980, 1.1030, 5_000.0)
    }

    #[test]
    fn candle_direction() {
        let c = sample_candle();
        assert!(c.is_bullish());
        assert!(!c.is_bearish());
    }

    #[test]
    fn candle_detects_void() {
        let mut c = sample_candle();
        c.close = f64::NAN;
        assert!(c.is_void());
    }

    #[test]
    fn indicator_lookup_filters_nan() {
        let c = sample_candle()
            .with_indicator("RSI", 55.0)
            .with_indicator("ATR", f64::NAN);
        assert_eq!(c.indicator("RSI"), Some(55.0));
        assert_eq!(c.indicator("ATR"), None);
        assert_eq!(c.indicator("MACD"), None);
    }

    #[test]
    fn validate_accepts_ascending() {
        let candles: Vec<Candle> = (0..5)
            .map(|i| Candle::new(t0() + Duration::hours(i), 1.0, 1.1, 0.9, 1.0, 0.0))
            .collect();
        assert!(validate_series(&candles).is_ok());
        assert!(validate_series(&[]).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_timestamp() {
        let candles = vec![sample_candle(), sample_candle()];
        let err = validate_series(&candles).unwrap_err();
        assert!(matches!(err, SeriesError::NonMonotonic { index: 1, .. }));
    }

    #[test]
    fn validate_rejects_void_candle() {
        let mut bad = sample_candle();
        bad.open = f64::INFINITY;
        let err = validate_series(&[bad]).unwrap_err();
        assert_eq!(err, SeriesError::VoidCandle { index: 0 });
    }

    #[test]
    fn candle_deserializes_without_indicators() {
        let json = r#"{"timestamp":"2024-01-02T00:00:00Z","open":1.0,"high":1.2,"low":0.9,"close":1.1}"#;
        let c: Candle = serde_json::from_str(json).unwrap();
        assert_eq!(c.volume, 0.0);
        assert!(c.indicators.is_empty());
    }
}
