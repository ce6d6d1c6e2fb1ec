//! Ensemble voting: the daily rule signals against an external classifier.

use serde::{Deserialize, Serialize};

use crate::config::EnsembleConfig;
use crate::domain::{tally, Signal};
use crate::rules::SignalMap;

/// Output of an external classifier for the latest daily candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPrediction {
    pub signal: Signal,
    pub confidence: f64,
}

impl ClassifierPrediction {
    pub fn new(signal: Signal, confidence: f64) -> Self {
        Self { signal, confidence }
    }

    /// Stand-in when no classifier is available.
    pub fn abstain() -> Self {
        Self::new(Signal::Hold, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleDecision {
    pub signal: Signal,
    pub confidence: f64,
    pub technical_signal: Signal,
    pub technical_confidence: f64,
    pub ml_signal: Signal,
    pub ml_confidence: f64,
    pub buy_score: f64,
    pub sell_score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct EnsembleVoter {
    config: EnsembleConfig,
}

impl EnsembleVoter {
    pub fn new(config: EnsembleConfig) -> Self {
        Self { config }
    }

    /// Technical majority of `signals` with its confidence.
    ///
    /// Confidence is the winning share of all rules; ties and an empty map
    /// are HOLD at 0.5.
    pub fn technical_side(signals: &SignalMap) -> (Signal, f64) {
        let (buy, sell) = tally(signals.values());
        let total = signals.len() as f64;
        if buy > sell {
            (Signal::Buy, buy as f64 / total)
        } else if sell > buy {
            (Signal::Sell, sell as f64 / total)
        } else {
            (Signal::Hold, 0.5)
        }
    }

    /// Vote the daily signal map against the classifier. A missing classifier
    /// abstains (HOLD at zero confidence), leaving the technical side alone.
    pub fn vote(&self, signals: &SignalMap, prediction: Option<ClassifierPrediction>) -> EnsembleDecision {
        let (technical_signal, technical_confidence) = Self::technical_side(signals);
        let ml = prediction.unwrap_or_else(ClassifierPrediction::abstain);
        let ml_confidence = if ml.confidence.is_finite() {
            ml.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut buy_score = 0.0;
        let mut sell_score = 0.0;
        match technical_signal {
            Signal::Buy => buy_score += self.config.technical_weight * technical_confidence,
            Signal::Sell => sell_score += self.config.technical_weight * technical_confidence,
            Signal::Hold => {}
        }
        match ml.signal {
            Signal::Buy => buy_score += self.config.ml_weight * ml_confidence,
            Signal::Sell => sell_score += self.config.ml_weight * ml_confidence,
            Signal::Hold => {}
        }

        let floor = self.config.decision_floor;
        let (signal, confidence) = if buy_score > sell_score && buy_score > floor {
            (Signal::Buy, buy_score)
        } else if sell_score > buy_score && sell_score > floor {
            (Signal::Sell, sell_score)
        } else {
            (Signal::Hold, 0.5)
        };

        tracing::info!(
            %signal,
            confidence,
            technical = %technical_signal,
            ml = %ml.signal,
            buy_score,
            sell_score,
            "ensemble vote"
        );

        EnsembleDecision {
            signal,
            confidence,
            technical_signal,
            technical_confidence,
            ml_signal: ml.signal,
            ml_confidence,
            buy_score,
            sell_score,
        }
    }
}
