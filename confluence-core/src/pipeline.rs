//! Decision pipeline: candles in, one decision out.
//!
//! Per-timeframe analysis runs in parallel; consensus, ensemble and planning
//! wait for every timeframe to finish or be marked insufficient.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::analysis::{
    ClassifierPrediction, ConsensusAggregator, ConsensusResult, EnsembleDecision, EnsembleVoter,
    TimeframeAnalysis, TimeframeAnalyzer, TimeframeOutcome,
};
use crate::config::{ConfigError, ConfigFingerprint, EngineConfig};
use crate::domain::{validate_series, Candle, IndicatorSnapshot, SeriesError, Symbol, Timeframe};
use crate::ledger::TradeLedger;
use crate::planner::{MultiTimeframePlan, PlanOutcome, SinglePlan, TradePlanner, TradeRequest};
use crate::rules::SignalMap;

/// Errors from the decision pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("malformed {timeframe} series: {source}")]
    Series {
        timeframe: Timeframe,
        #[source]
        source: SeriesError,
    },
    #[error("no candles for symbol '{0}'")]
    NoData(Symbol),
}

/// Everything the engine concluded for one symbol at one moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub symbol: Symbol,
    /// Last close of the pricing timeframe.
    pub price: f64,
    pub price_timeframe: Timeframe,
    /// Timestamp of the candle the price came from.
    pub as_of: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
    pub config_fingerprint: ConfigFingerprint,
    pub analyses: BTreeMap<Timeframe, TimeframeAnalysis>,
    /// Timeframes without enough history, with what they had.
    pub skipped: Vec<TimeframeOutcome>,
    pub consensus: ConsensusResult,
    pub ensemble: EnsembleDecision,
    /// Present only when the ensemble signal is actionable.
    pub single_plan: Option<PlanOutcome<SinglePlan>>,
    pub plans: Option<PlanOutcome<MultiTimeframePlan>>,
}

impl Decision {
    pub fn is_actionable(&self) -> bool {
        self.ensemble.signal.is_actionable()
    }
}

/// One symbol's input to [`DecisionEngine::scan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub symbol: Symbol,
    pub series: BTreeMap<Timeframe, Vec<Candle>>,
    #[serde(default)]
    pub classifier: Option<ClassifierPrediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub symbol: Symbol,
    pub error: String,
}

/// Decisions for many symbols, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Actionable decisions first, then by ensemble confidence, then by symbol.
    pub ranked: Vec<Decision>,
    pub failed: Vec<ScanFailure>,
}

/// The full engine bound to one validated configuration.
pub struct DecisionEngine {
    config: EngineConfig,
    fingerprint: ConfigFingerprint,
    analyzer: TimeframeAnalyzer,
    aggregator: ConsensusAggregator,
    voter: EnsembleVoter,
    planner: TradePlanner,
    parallel: bool,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            fingerprint: config.fingerprint(),
            analyzer: TimeframeAnalyzer::new(&config),
            aggregator: ConsensusAggregator::new(config.consensus.clone()),
            voter: EnsembleVoter::new(config.ensemble.clone()),
            planner: TradePlanner::new(&config),
            parallel: true,
            config,
        })
    }

    /// Enables or disables parallel timeframe analysis.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &ConfigFingerprint {
        &self.fingerprint
    }

    /// Analyzes one timeframe per series entry.
    pub fn analyze_all(&self, series: &BTreeMap<Timeframe, Vec<Candle>>) -> Vec<TimeframeOutcome> {
        if self.parallel {
            series
                .par_iter()
                .map(|(&tf, candles)| self.analyzer.analyze(tf, candles))
                .collect()
        } else {
            series
                .iter()
                .map(|(&tf, candles)| self.analyzer.analyze(tf, candles))
                .collect()
        }
    }

    /// Evaluates every request against the same balance and ledger.
    ///
    /// A symbol that fails is recorded in [`ScanReport::failed`]; the rest
    /// of the scan still completes.
    pub fn scan(
        &self,
        requests: &[ScanRequest],
        balance: f64,
        ledger: &TradeLedger,
        now: DateTime<Utc>,
    ) -> ScanReport {
        let run = |req: &ScanRequest| {
            let result = self.evaluate(&req.symbol, &req.series, req.classifier, balance, ledger, now);
            (req.symbol.clone(), result)
        };
        let results: Vec<(Symbol, Result<Decision, EngineError>)> = if self.parallel {
            requests.par_iter().map(run).collect()
        } else {
            requests.iter().map(run).collect()
        };

        let mut ranked = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (symbol, result) in results {
            match result {
                Ok(decision) => ranked.push(decision),
                Err(err) => {
                    tracing::error!(symbol = %symbol, error = %err, "scan: symbol failed");
                    failed.push(ScanFailure {
                        symbol,
                        error: err.to_string(),
                    });
                }
            }
        }
        ranked.sort_by(|a, b| {
            b.is_actionable()
                .cmp(&a.is_actionable())
                .then(b.ensemble.confidence.total_cmp(&a.ensemble.confidence))
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        tracing::info!(
            symbols = requests.len(),
            actionable = ranked.iter().filter(|d| d.is_actionable()).count(),
            failed = failed.len(),
            "scan complete"
        );
        ScanReport { ranked, failed }
    }

    pub fn evaluate(
        &self,
        symbol: &str,
        series: &BTreeMap<Timeframe, Vec<Candle>>,
        classifier: Option<ClassifierPrediction>,
        balance: f64,
        ledger: &TradeLedger,
        now: DateTime<Utc>,
    ) -> Result<Decision, EngineError> {
        for (&timeframe, candles) in series {
            validate_series(candles).map_err(|source| {
                tracing::error!(symbol, %timeframe, stage = "validate", error = %source, "malformed series");
                EngineError::Series { timeframe, source }
            })?;
        }

        let primary = self.config.planner.primary_timeframe;
        let (price_timeframe, last) = series
            .get(&primary)
            .and_then(|c| c.last())
            .map(|c| (primary, c))
            .or_else(|| {
                series
                    .iter()
                    .rev()
                    .find_map(|(&tf, c)| c.last().map(|last| (tf, last)))
            })
            .ok_or_else(|| EngineError::NoData(symbol.to_string()))?;
        let price = last.close;

        let mut analyses = BTreeMap::new();
        let mut skipped = Vec::new();
        for outcome in self.analyze_all(series) {
            match outcome {
                TimeframeOutcome::Analyzed(analysis) => {
                    analyses.insert(analysis.timeframe, *analysis);
                }
                insufficient => skipped.push(insufficient),
            }
        }

        let consensus = self.aggregator.aggregate(analyses.values());
        let empty = SignalMap::new();
        let primary_signals = analyses.get(&primary).map_or(&empty, |a| &a.signals);
        let ensemble = self.voter.vote(primary_signals, classifier);

        tracing::info!(
            symbol,
            price,
            consensus = %consensus.consensus,
            signal = %ensemble.signal,
            confidence = ensemble.confidence,
            "decision"
        );

        let (single_plan, plans) = if ensemble.signal.is_actionable() {
            let request = TradeRequest {
                signal: ensemble.signal,
                confidence: ensemble.confidence,
                entry_price: price,
                balance,
            };
            // Only timeframes with enough history are planned.
            let snapshots: BTreeMap<Timeframe, IndicatorSnapshot> = analyses
                .keys()
                .filter_map(|tf| {
                    let last = series.get(tf)?.last()?;
                    Some((*tf, last.indicators.clone()))
                })
                .collect();
            let single = self
                .planner
                .plan_single(&request, &last.indicators, ledger, now);
            let multi = self.planner.plan(&request, &snapshots, ledger, now);
            (Some(single), Some(multi))
        } else {
            (None, None)
        };

        Ok(Decision {
            symbol: symbol.to_string(),
            price,
            price_timeframe,
            as_of: last.timestamp,
            timestamp: now,
            config_fingerprint: self.fingerprint.clone(),
            analyses,
            skipped,
            consensus,
            ensemble,
            single_plan,
            plans,
        })
    }
}
