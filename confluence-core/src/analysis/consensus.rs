//! Cross-timeframe consensus: importance- and confidence-weighted voting.

use serde::{Deserialize, Serialize};

use super::timeframe::TimeframeAnalysis;
use crate::config::ConsensusConfig;
use crate::domain::{Signal, Timeframe};
use crate::momentum::{ReversalType, WarningLevel};

/// A timeframe whose recent candles turned against its established trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalAlert {
    pub timeframe: Timeframe,
    pub reversal_type: ReversalType,
    pub strength: f64,
    pub warning_level: WarningLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub consensus: Signal,
    /// Timeframes on the winning side (HOLD timeframes when HOLD).
    pub agreement_count: usize,
    pub total_timeframes: usize,
    pub confidence: f64,
    pub buy_timeframes: usize,
    pub sell_timeframes: usize,
    pub hold_timeframes: usize,
    pub weighted_buy: f64,
    pub weighted_sell: f64,
    pub reversal_alerts: Vec<ReversalAlert>,
    pub has_reversal_warning: bool,
}

impl ConsensusResult {
    pub fn empty() -> Self {
        Self {
            consensus: Signal::Hold,
            agreement_count: 0,
            total_timeframes: 0,
            confidence: 0.0,
            buy_timeframes: 0,
            sell_timeframes: 0,
            hold_timeframes: 0,
            weighted_buy: 0.0,
            weighted_sell: 0.0,
            reversal_alerts: Vec::new(),
            has_reversal_warning: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsensusAggregator {
    config: ConsensusConfig,
}

impl ConsensusAggregator {
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    pub fn aggregate<'a, I>(&self, analyses: I) -> ConsensusResult
    where
        I: IntoIterator<Item = &'a TimeframeAnalysis>,
    {
        let mut result = ConsensusResult::empty();

        for analysis in analyses {
            result.total_timeframes += 1;
            let weight = self.config.weight_for(analysis.timeframe) * analysis.confidence;

            if analysis.reversal.is_reversal {
                result.reversal_alerts.push(ReversalAlert {
                    timeframe: analysis.timeframe,
                    reversal_type: analysis.reversal.reversal_type,
                    strength: analysis.reversal.reversal_strength,
                    warning_level: analysis.reversal.warning_level,
                });
            }

            match analysis.enhanced_signal {
                Signal::Buy => {
                    result.buy_timeframes += 1;
                    result.weighted_buy += weight;
                }
                Signal::Sell => {
                    result.sell_timeframes += 1;
                    result.weighted_sell += weight;
                }
                Signal::Hold => result.hold_timeframes += 1,
            }
        }
        result.has_reversal_warning = !result.reversal_alerts.is_empty();

        if result.total_timeframes == 0 {
            return result;
        }

        let min_agree = self.config.min_timeframes_agree;
        let (consensus, agreement_count, confidence) = if result.weighted_buy > result.weighted_sell
            && result.buy_timeframes >= min_agree
        {
            (Signal::Buy, result.buy_timeframes, result.weighted_buy)
        } else if result.weighted_sell > result.weighted_buy && result.sell_timeframes >= min_agree {
            (Signal::Sell, result.sell_timeframes, result.weighted_sell)
        } else {
            (Signal::Hold, result.hold_timeframes, 0.5)
        };

        result.consensus = consensus;
        result.agreement_count = agreement_count;
        result.confidence = confidence;

        tracing::info!(
            %consensus,
            agreement = agreement_count,
            total = result.total_timeframes,
            confidence,
            reversal_warning = result.has_reversal_warning,
            "timeframe consensus"
        );
        result
    }
}
