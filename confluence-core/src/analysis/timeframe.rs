//! Single-timeframe analysis: rules, trend context, and the enhanced signal.

use serde::{Deserialize, Serialize};

use super::recommendation::SignalScore;
use crate::config::EngineConfig;
use crate::domain::{keys, majority, Candle, Signal, Timeframe, TrendDirection};
use crate::momentum::{Reversal, TrendMomentum, TrendMomentumEngine};
use crate::rules::{RuleSet, SignalMap};

/// Candles spanned by the trend-strength price change.
const TREND_CHANGE_SPAN: usize = 20;

/// Latest market readings of a timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub atr: Option<f64>,
    pub volume: f64,
}

impl MarketSnapshot {
    fn from_candle(candle: &Candle) -> Self {
        Self {
            price: candle.close,
            rsi: candle.indicator(keys::RSI),
            macd: candle.indicator(keys::MACD),
            atr: candle.indicator(keys::ATR),
            volume: candle.volume,
        }
    }
}

/// Everything learned about one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeAnalysis {
    pub timeframe: Timeframe,
    pub signals: SignalMap,
    /// Raw BUY-vs-SELL majority of `signals`.
    pub current_consensus: Signal,
    /// Consensus after momentum and reversal weighting. Only this feeds aggregation.
    pub enhanced_signal: Signal,
    pub confidence: f64,
    pub reasoning: String,
    pub trend_strength: f64,
    pub momentum_direction: TrendDirection,
    pub trend_momentum: TrendMomentum,
    pub reversal: Reversal,
    pub current: MarketSnapshot,
    /// Nearest first.
    pub support_levels: Vec<f64>,
    /// Nearest first.
    pub resistance_levels: Vec<f64>,
    pub signal_changed: bool,
    /// Point score and price zones of the latest candle.
    pub signal_score: SignalScore,
}

/// Result of analyzing one timeframe. Short histories are a normal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeframeOutcome {
    Analyzed(Box<TimeframeAnalysis>),
    InsufficientData {
        timeframe: Timeframe,
        available: usize,
        required: usize,
    },
}

impl TimeframeOutcome {
    pub fn analysis(&self) -> Option<&TimeframeAnalysis> {
        match self {
            TimeframeOutcome::Analyzed(a) => Some(a),
            TimeframeOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn into_analysis(self) -> Option<TimeframeAnalysis> {
        match self {
            TimeframeOutcome::Analyzed(a) => Some(*a),
            TimeframeOutcome::InsufficientData { .. } => None,
        }
    }
}

pub struct TimeframeAnalyzer {
    rules: RuleSet,
    momentum: TrendMomentumEngine,
    min_candles: usize,
    ma_keys: [String; 3],
    zone_atr_fallback_pct: f64,
}

impl Default for TimeframeAnalyzer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl TimeframeAnalyzer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            rules: RuleSet::from_config(&config.signals),
            momentum: TrendMomentumEngine::new(config.momentum.clone()),
            min_candles: config.consensus.min_candles,
            ma_keys: config.signals.ma_periods.map(keys::ma),
            zone_atr_fallback_pct: config.risk.atr_fallback_pct,
        }
    }

    pub fn min_candles(&self) -> usize {
        self.min_candles
    }

    pub fn analyze(&self, timeframe: Timeframe, candles: &[Candle]) -> TimeframeOutcome {
        let Some(last) = candles.last().filter(|_| candles.len() >= self.min_candles) else {
            tracing::warn!(
                %timeframe,
                available = candles.len(),
                required = self.min_candles,
                "insufficient data, timeframe skipped"
            );
            return TimeframeOutcome::InsufficientData {
                timeframe,
                available: candles.len(),
                required: self.min_candles,
            };
        };

        let signals = self.rules.evaluate(candles);
        let current_consensus = majority(signals.values());
        let enhanced = self.momentum.enhance(candles, current_consensus);
        let levels = self.rules.key_levels(candles);

        let analysis = TimeframeAnalysis {
            timeframe,
            current_consensus,
            enhanced_signal: enhanced.weighted.signal,
            confidence: enhanced.weighted.confidence,
            signal_changed: enhanced.signal_changed(),
            reasoning: enhanced.weighted.reasoning,
            trend_strength: self.trend_strength(candles),
            momentum_direction: self.momentum_direction(last),
            trend_momentum: enhanced.momentum,
            reversal: enhanced.reversal,
            current: MarketSnapshot::from_candle(last),
            support_levels: levels.support,
            resistance_levels: levels.resistance,
            signal_score: SignalScore::from_candle(
                last,
                &self.ma_keys[0],
                &self.ma_keys[1],
                self.zone_atr_fallback_pct,
            ),
            signals,
        };

        tracing::debug!(
            %timeframe,
            consensus = %analysis.current_consensus,
            enhanced = %analysis.enhanced_signal,
            confidence = analysis.confidence,
            "timeframe analyzed"
        );
        TimeframeOutcome::Analyzed(Box::new(analysis))
    }

    /// Mean of the moving-average alignment score and the 20-candle price
    /// change score; 0.5 when neither is computable.
    fn trend_strength(&self, candles: &[Candle]) -> f64 {
        let mut scores = Vec::with_capacity(2);

        if let Some(last) = candles.last() {
            let [fast, mid, long] = &self.ma_keys;
            if let (Some(f), Some(m), Some(l)) = (
                last.indicator(fast),
                last.indicator(mid),
                last.indicator(long),
            ) {
                let aligned = (f > m && m > l) || (f < m && m < l);
                scores.push(if aligned { 1.0 } else { 0.3 });
            }
        }

        if candles.len() >= TREND_CHANGE_SPAN {
            let base = candles[candles.len() - TREND_CHANGE_SPAN].close;
            let last = candles[candles.len() - 1].close;
            if base != 0.0 {
                scores.push((((last - base) / base).abs() * 10.0).min(1.0));
            }
        }

        if scores.is_empty() {
            0.5
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    }

    /// Vote of RSI against 50, MACD against its signal line, and close against
    /// the mid moving average.
    fn momentum_direction(&self, last: &Candle) -> TrendDirection {
        let mut bullish = 0;
        let mut bearish = 0;

        if let Some(rsi) = last.indicator(keys::RSI) {
            if rsi > 50.0 {
                bullish += 1;
            } else if rsi < 50.0 {
                bearish += 1;
            }
        }
        if let (Some(macd), Some(signal)) = (
            last.indicator(keys::MACD),
            last.indicator(keys::MACD_SIGNAL),
        ) {
            if macd > signal {
                bullish += 1;
            } else {
                bearish += 1;
            }
        }
        if let Some(ma) = last.indicator(&self.ma_keys[1]) {
            if last.close > ma {
                bullish += 1;
            } else {
                bearish += 1;
            }
        }

        match bullish.cmp(&bearish) {
            std::cmp::Ordering::Greater => TrendDirection::Bullish,
            std::cmp::Ordering::Less => TrendDirection::Bearish,
            std::cmp::Ordering::Equal => TrendDirection::Neutral,
        }
    }
}
