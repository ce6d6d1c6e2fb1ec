//! Trade planner: turns a final signal into concrete, risk-managed orders.
//!
//! Planning is validated once, then repeated per timeframe with that
//! timeframe's ATR and Bollinger bands. A timeframe without indicator data is
//! skipped with a warning; the rest of the plan still stands.

pub mod ladders;
pub mod schedule;
pub mod sizing;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{EngineConfig, PlannerConfig, RiskConfig};
use crate::domain::{keys, IndicatorSnapshot, Signal, Timeframe};
use crate::ledger::TradeLedger;

pub use ladders::{
    EntryPoint, OrderType, Side, StopBasis, StopLevel, TakeProfitLevel, Urgency, STANDARD_STOP,
};
pub use schedule::{format_duration, ExpectedExecution, TradingStyle};
pub use sizing::{size_position, PositionSize, SizingError};

/// What the planner is asked to act on.
///
/// Only BUY and SELL with a positive finite entry price are planned. An ATR
/// outside [`ladders::atr_in_range`] for the entry is replaced by the
/// percentage fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub signal: Signal,
    pub confidence: f64,
    pub entry_price: f64,
    pub balance: f64,
}

/// Terminal state of a planning call. There is no retry state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanOutcome<T> {
    Rejected { signal: Signal, reasons: Vec<String> },
    Approved(T),
}

impl<T> PlanOutcome<T> {
    pub fn is_approved(&self) -> bool {
        matches!(self, PlanOutcome::Approved(_))
    }

    pub fn approved(&self) -> Option<&T> {
        match self {
            PlanOutcome::Approved(plan) => Some(plan),
            PlanOutcome::Rejected { .. } => None,
        }
    }
}

/// Plan for one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframePlan {
    pub timeframe: Timeframe,
    pub timeframe_description: String,
    pub atr: f64,
    /// ATR was missing or unusable and a percentage of entry stood in.
    pub atr_fallback: bool,
    pub entries: Vec<EntryPoint>,
    pub stop_losses: Vec<StopLevel>,
    pub take_profits: Vec<TakeProfitLevel>,
    /// Sized against the standard stop.
    pub sizing: Result<PositionSize, SizingError>,
    pub expected_execution: ExpectedExecution,
    pub trading_style: TradingStyle,
    /// Latest known indicator values, rounded to 5 places.
    pub current_indicators: BTreeMap<String, f64>,
}

impl TimeframePlan {
    pub fn standard_stop(&self) -> Option<&StopLevel> {
        self.stop_losses.iter().find(|s| s.recommended)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTimeframePlan {
    pub signal: Signal,
    pub confidence: f64,
    pub entry_price: f64,
    pub generated_at: DateTime<Utc>,
    pub timeframe_plans: BTreeMap<Timeframe, TimeframePlan>,
    /// Requested timeframes with no usable indicator data.
    pub skipped: Vec<Timeframe>,
}

/// One stop, one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePlan {
    pub signal: Signal,
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub atr_fallback: bool,
    pub sizing: PositionSize,
    pub potential_profit: f64,
    pub potential_loss: f64,
    pub risk_reward_ratio: f64,
    pub created_at: DateTime<Utc>,
}

pub struct TradePlanner {
    risk: RiskConfig,
    planner: PlannerConfig,
    indicator_keys: Vec<String>,
}

impl Default for TradePlanner {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl TradePlanner {
    pub fn new(config: &EngineConfig) -> Self {
        let [ma_fast, ma_mid, ma_long] = config.signals.ma_periods;
        let indicator_keys = [
            keys::RSI,
            keys::MACD,
            keys::MACD_SIGNAL,
            keys::MACD_HIST,
            keys::STOCH_K,
            keys::STOCH_D,
            keys::ATR,
            keys::BB_UPPER,
            keys::BB_MIDDLE,
            keys::BB_LOWER,
        ]
        .into_iter()
        .map(String::from)
        .chain([ma_fast, ma_mid, ma_long].map(keys::ma))
        .collect();

        Self {
            risk: config.risk.clone(),
            planner: config.planner.clone(),
            indicator_keys,
        }
    }

    /// Every reason the request cannot be traded. Empty means approved.
    pub fn validate(&self, request: &TradeRequest, ledger: &TradeLedger) -> Vec<String> {
        if request.signal == Signal::Hold {
            return vec!["Signal is HOLD".to_string()];
        }

        let mut reasons = Vec::new();
        if !(request.confidence >= self.risk.min_confidence) {
            reasons.push(format!(
                "Confidence {:.2}% below minimum {:.2}%",
                request.confidence * 100.0,
                self.risk.min_confidence * 100.0
            ));
        }
        let drawdown = ledger.current_drawdown();
        if drawdown > self.risk.max_drawdown {
            reasons.push(format!(
                "Drawdown {:.2}% exceeds limit {:.2}%",
                drawdown * 100.0,
                self.risk.max_drawdown * 100.0
            ));
        }
        if !(request.entry_price.is_finite() && request.entry_price > 0.0) {
            reasons.push(format!("Entry price {} is not a positive price", request.entry_price));
        }
        reasons
    }

    /// The side to plan, or the rejection carrying every validation failure.
    fn approve<T>(&self, request: &TradeRequest, ledger: &TradeLedger) -> Result<Side, PlanOutcome<T>> {
        let reasons = self.validate(request, ledger);
        match Side::of(request.signal) {
            Some(side) if reasons.is_empty() => Ok(side),
            _ => Err(self.reject(request, reasons)),
        }
    }

    fn reject<T>(&self, request: &TradeRequest, reasons: Vec<String>) -> PlanOutcome<T> {
        tracing::info!(signal = %request.signal, reasons = ?reasons, "trade rejected");
        PlanOutcome::Rejected {
            signal: request.signal,
            reasons,
        }
    }

    /// ATR from the snapshot, or the percentage fallback when absent or out of range.
    fn atr(&self, snapshot: &IndicatorSnapshot, entry: f64) -> (f64, bool) {
        match snapshot.get(keys::ATR) {
            Some(atr) if ladders::atr_in_range(entry, atr) => (atr, false),
            _ => (entry * self.risk.atr_fallback_pct, true),
        }
    }

    /// Plans for every configured timeframe that has a snapshot.
    pub fn plan(
        &self,
        request: &TradeRequest,
        snapshots: &BTreeMap<Timeframe, IndicatorSnapshot>,
        ledger: &TradeLedger,
        now: DateTime<Utc>,
    ) -> PlanOutcome<MultiTimeframePlan> {
        let side = match self.approve(request, ledger) {
            Ok(side) => side,
            Err(rejected) => return rejected,
        };

        let mut timeframe_plans = BTreeMap::new();
        let mut skipped = Vec::new();
        for &timeframe in &self.planner.timeframes {
            match snapshots.get(&timeframe) {
                Some(snapshot) => {
                    let plan = self.plan_timeframe(request, side, timeframe, snapshot, now);
                    timeframe_plans.insert(timeframe, plan);
                }
                None => {
                    tracing::warn!(%timeframe, "no indicator data, timeframe plan skipped");
                    skipped.push(timeframe);
                }
            }
        }

        tracing::info!(
            signal = %request.signal,
            entry = request.entry_price,
            timeframes = timeframe_plans.len(),
            "trade plan approved"
        );
        PlanOutcome::Approved(MultiTimeframePlan {
            signal: request.signal,
            confidence: request.confidence,
            entry_price: request.entry_price,
            generated_at: now,
            timeframe_plans,
            skipped,
        })
    }

    fn plan_timeframe(
        &self,
        request: &TradeRequest,
        side: Side,
        timeframe: Timeframe,
        snapshot: &IndicatorSnapshot,
        now: DateTime<Utc>,
    ) -> TimeframePlan {
        let entry = request.entry_price;
        let (atr, atr_fallback) = self.atr(snapshot, entry);
        if atr_fallback {
            tracing::warn!(%timeframe, "ATR unavailable, using percentage of entry");
        }

        let stop_losses = ladders::stop_losses(entry, side, atr);
        let standard = stop_losses
            .iter()
            .find(|s| s.name == STANDARD_STOP)
            .map_or(entry, |s| s.price);
        let take_profits = ladders::take_profits(entry, side, atr, standard);
        let entries = ladders::entries(entry, side, atr, snapshot);
        let sizing = size_position(
            request.balance,
            entry,
            standard,
            self.risk.risk_per_trade,
            self.risk.lot_size,
        );
        if let Err(err) = &sizing {
            tracing::warn!(%timeframe, error = %err, "position not sized");
        }

        let current_indicators = snapshot
            .rounded(5)
            .into_iter()
            .filter(|(k, _)| self.indicator_keys.contains(k))
            .collect();

        TimeframePlan {
            timeframe,
            timeframe_description: timeframe.description().to_string(),
            atr,
            atr_fallback,
            entries,
            stop_losses,
            take_profits,
            sizing,
            expected_execution: ExpectedExecution::estimate(timeframe, now),
            trading_style: TradingStyle::for_timeframe(timeframe),
            current_indicators,
        }
    }

    /// A single plan: stop at `atr_multiplier` ATRs, target at
    /// `min_risk_reward` times the stop distance.
    pub fn plan_single(
        &self,
        request: &TradeRequest,
        snapshot: &IndicatorSnapshot,
        ledger: &TradeLedger,
        now: DateTime<Utc>,
    ) -> PlanOutcome<SinglePlan> {
        let side = match self.approve(request, ledger) {
            Ok(side) => side,
            Err(rejected) => return rejected,
        };

        let entry = request.entry_price;
        let dir = side.sign();
        let (atr, atr_fallback) = self.atr(snapshot, entry);
        let stop_distance = if atr_fallback {
            atr
        } else {
            atr * self.risk.atr_multiplier
        };
        let stop_loss = entry - dir * stop_distance;
        let take_profit = entry + dir * stop_distance * self.risk.min_risk_reward;
        if stop_loss <= 0.0 || take_profit <= 0.0 {
            return self.reject(
                request,
                vec![format!(
                    "Levels not positive: stop {stop_loss:.5}, target {take_profit:.5}"
                )],
            );
        }

        let sizing = match size_position(
            request.balance,
            entry,
            stop_loss,
            self.risk.risk_per_trade,
            self.risk.lot_size,
        ) {
            Ok(sizing) => sizing,
            Err(err) => return self.reject(request, vec![err.to_string()]),
        };

        PlanOutcome::Approved(SinglePlan {
            signal: request.signal,
            confidence: request.confidence,
            entry_price: entry,
            stop_loss,
            take_profit,
            atr_fallback,
            potential_profit: (take_profit - entry).abs() * sizing.units,
            potential_loss: sizing.risk_amount,
            risk_reward_ratio: (take_profit - entry).abs() / (stop_loss - entry).abs(),
            sizing,
            created_at: now,
        })
    }
}
