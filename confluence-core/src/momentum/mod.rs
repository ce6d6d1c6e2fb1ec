//! Trend momentum: rolling directional momentum, reversal detection, and the
//! weighted blend that turns a rule consensus into an enhanced signal.

pub mod reversal;
pub mod trend;
pub mod weighted;

use serde::{Deserialize, Serialize};

use crate::config::MomentumConfig;
use crate::domain::{Candle, Signal};

pub use reversal::{detect_reversal, Reversal, ReversalType, WarningLevel};
pub use trend::{calculate_trend_momentum, TrendMomentum};
pub use weighted::{calculate_weighted_signal, WeightedSignal};

/// Full momentum reading for one candle history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedSignal {
    pub original_signal: Signal,
    pub weighted: WeightedSignal,
    pub momentum: TrendMomentum,
    pub reversal: Reversal,
}

impl EnhancedSignal {
    pub fn signal_changed(&self) -> bool {
        self.original_signal != self.weighted.signal
    }
}

/// Momentum and reversal analysis bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct TrendMomentumEngine {
    config: MomentumConfig,
}

impl TrendMomentumEngine {
    pub fn new(config: MomentumConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MomentumConfig {
        &self.config
    }

    pub fn momentum(&self, candles: &[Candle]) -> TrendMomentum {
        calculate_trend_momentum(candles, self.config.lookback)
    }

    pub fn reversal(&self, candles: &[Candle]) -> Reversal {
        detect_reversal(
            candles,
            self.config.recent_lookback,
            self.config.historical_lookback,
            self.config.strong_trend_threshold,
        )
    }

    pub fn weighted_signal(
        &self,
        current: Signal,
        momentum: &TrendMomentum,
        reversal: &Reversal,
    ) -> WeightedSignal {
        calculate_weighted_signal(
            current,
            momentum,
            reversal,
            &self.config.weights,
            self.config.signal_threshold,
        )
    }

    /// Momentum, reversal and blend in one pass.
    pub fn enhance(&self, candles: &[Candle], current: Signal) -> EnhancedSignal {
        let momentum = self.momentum(candles);
        let reversal = self.reversal(candles);
        let weighted = self.weighted_signal(current, &momentum, &reversal);
        tracing::debug!(
            original = %current,
            enhanced = %weighted.signal,
            score = weighted.score,
            direction = %momentum.direction,
            reversal = %reversal.reversal_type,
            "momentum blend"
        );
        EnhancedSignal {
            original_signal: current,
            weighted,
            momentum,
            reversal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn enhance_flips_hold_into_buy_on_strong_trend() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut price = 1.10;
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let open = price;
                price *= 1.004;
                Candle::new(t0 + Duration::hours(i), open, price * 1.0005, open * 0.9995, price, 1_000.0)
            })
            .collect();

        let engine = TrendMomentumEngine::default();
        let e = engine.enhance(&candles, Signal::Hold);
        // momentum alone: 0.4 * score, score near 1
        assert_eq!(e.weighted.signal, Signal::Buy);
        assert!(e.signal_changed());
        assert!(!e.reversal.is_reversal);
    }

    #[test]
    fn enhance_on_short_history_keeps_current_weight_only() {
        let engine = TrendMomentumEngine::default();
        let e = engine.enhance(&[], Signal::Buy);
        assert_eq!(e.weighted.signal, Signal::Buy);
        assert!((e.weighted.confidence - 0.4).abs() < 1e-12);
        assert!(!e.signal_changed());
    }
}
