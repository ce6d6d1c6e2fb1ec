//! Indicator signal rules: turn a timeframe's latest indicator readings into
//! discrete BUY/SELL/HOLD signals.
//!
//! Rules are stateless and read only the candle history they are handed. Each
//! one works in tiers: a definitive crossover first, then a sustained
//! positional bias, then (where the family has one) a small move inside the
//! neutral zone. A missing indicator or fewer than two candles is a HOLD,
//! never an error.

pub mod ma_cross;
pub mod macd;
pub mod rsi;
pub mod stochastic;
pub mod support_resistance;

use std::collections::BTreeMap;

use crate::config::SignalConfig;
use crate::domain::{Candle, Signal};

pub use ma_cross::{MaCross, MaKind};
pub use macd::MacdRule;
pub use rsi::RsiRule;
pub use stochastic::StochasticRule;
pub use support_resistance::{KeyLevels, SupportResistance};

/// Trait for indicator signal rules.
///
/// # Architecture invariant
/// `evaluate` must only look at `candles`; rules never see configuration
/// beyond what they were constructed with, and never see other rules' output.
pub trait SignalRule: Send + Sync {
    /// Key of this rule in the signal map (e.g. "rsi").
    fn name(&self) -> &str;

    /// Signal for the most recent candle of `candles`.
    fn evaluate(&self, candles: &[Candle]) -> Signal;
}

/// Name → signal for one timeframe.
pub type SignalMap = BTreeMap<String, Signal>;

/// Previous and current value of an indicator on the last two candles.
///
/// `None` when there are fewer than two candles or either value is undefined.
pub(crate) fn last_two(candles: &[Candle], key: &str) -> Option<(f64, f64)> {
    let [.., prev, cur] = candles else {
        return None;
    };
    Some((prev.indicator(key)?, cur.indicator(key)?))
}

/// The full rule battery for one configuration.
pub struct RuleSet {
    rules: Vec<Box<dyn SignalRule>>,
    support_resistance: SupportResistance,
}

impl RuleSet {
    pub fn from_config(config: &SignalConfig) -> Self {
        let [ma_fast, ma_slow, _] = config.ma_periods;
        let [ema_fast, ema_slow] = config.ema_periods;
        let support_resistance = SupportResistance::from_config(&config.support_resistance);

        let rules: Vec<Box<dyn SignalRule>> = vec![
            Box::new(MaCross::new(ma_fast, ma_slow, MaKind::Simple)),
            Box::new(MaCross::new(ema_fast, ema_slow, MaKind::Exponential)),
            Box::new(RsiRule::new(
                config.rsi_overbought,
                config.rsi_oversold,
                config.rsi_weak_delta,
            )),
            Box::new(MacdRule),
            Box::new(StochasticRule::new(
                config.stoch_overbought,
                config.stoch_oversold,
            )),
            Box::new(support_resistance.clone()),
        ];

        Self {
            rules,
            support_resistance,
        }
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name())
    }

    /// Evaluate every rule against `candles`.
    pub fn evaluate(&self, candles: &[Candle]) -> SignalMap {
        self.rules
            .iter()
            .map(|rule| {
                let signal = rule.evaluate(candles);
                tracing::debug!(rule = rule.name(), %signal, "rule evaluated");
                (rule.name().to_string(), signal)
            })
            .collect()
    }

    /// Support/resistance levels around the last close.
    pub fn key_levels(&self, candles: &[Candle]) -> KeyLevels {
        self.support_resistance.key_levels(candles)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_config(&SignalConfig::default())
    }
}
