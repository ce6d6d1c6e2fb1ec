//! Confluence Core: the trading decision engine.
//!
//! This crate turns candle series with precomputed indicators into one
//! risk-managed decision:
//! - Indicator signal rules (MA/EMA cross, RSI, MACD, stochastic, support/resistance)
//! - Trend momentum and reversal detection over rolling windows
//! - Per-timeframe analysis and weighted multi-timeframe consensus
//! - Ensemble voting of the technical side against an external classifier
//! - Trade planning: entry/stop/target ladders, sizing, expected duration
//! - Multi-symbol scans ranked by decision strength
//!
//! Everything is synchronous and pure over its inputs. The only state a
//! caller carries between decisions is the [`ledger::TradeLedger`].

pub mod analysis;
pub mod config;
pub mod domain;
pub mod ledger;
pub mod momentum;
pub mod pipeline;
pub mod planner;
pub mod rules;

pub use config::{EngineConfig, Preset};
pub use pipeline::{Decision, DecisionEngine, EngineError, ScanReport, ScanRequest};
