//! Timeframe analysis and cross-timeframe aggregation.

pub mod consensus;
pub mod ensemble;
pub mod recommendation;
pub mod timeframe;

pub use consensus::{ConsensusAggregator, ConsensusResult, ReversalAlert};
pub use ensemble::{ClassifierPrediction, EnsembleDecision, EnsembleVoter};
pub use recommendation::{PriceZones, Recommendation, SignalScore};
pub use timeframe::{MarketSnapshot, TimeframeAnalysis, TimeframeAnalyzer, TimeframeOutcome};
