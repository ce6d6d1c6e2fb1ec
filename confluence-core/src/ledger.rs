//! Trade ledger: append-only record of closed trades.
//!
//! The planner reads the ledger's current drawdown before approving a plan.
//! Appends take `&mut self`, so a shared ledger has exactly one writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Signal;

/// One closed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub signal: Signal,
    pub entry_price: f64,
    pub exit_price: f64,
    pub units: f64,
    /// Realized profit or loss in account currency.
    pub pnl: f64,
    pub closed_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Record a closed trade, deriving P&L from the price move and side.
    pub fn closed(
        symbol: impl Into<String>,
        signal: Signal,
        entry_price: f64,
        exit_price: f64,
        units: f64,
        closed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            signal,
            entry_price,
            exit_price,
            units,
            pnl: (exit_price - entry_price) * units * signal.score(),
            closed_at,
        }
    }
}

/// Aggregate statistics over the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub average_profit: f64,
    /// Mean loss as a positive number.
    pub average_loss: f64,
    /// Gross profit over gross loss. `None` when nothing was lost.
    pub profit_factor: Option<f64>,
    pub total_pnl: f64,
    pub current_drawdown: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLedger {
    starting_balance: f64,
    trades: Vec<TradeRecord>,
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new(10_000.0)
    }
}

impl TradeLedger {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            starting_balance,
            trades: Vec::new(),
        }
    }

    pub fn record(&mut self, trade: TradeRecord) {
        tracing::debug!(symbol = %trade.symbol, pnl = trade.pnl, "trade recorded");
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn starting_balance(&self) -> f64 {
        self.starting_balance
    }

    pub fn equity(&self) -> f64 {
        self.starting_balance + self.trades.iter().map(|t| t.pnl).sum::<f64>()
    }

    /// Equity after each trade, starting balance first.
    fn equity_curve(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::once(self.starting_balance).chain(self.trades.iter().scan(
            self.starting_balance,
            |equity, t| {
                *equity += t.pnl;
                Some(*equity)
            },
        ))
    }

    /// (current, maximum) peak-to-trough drawdown as fractions of the peak.
    fn drawdowns(&self) -> (f64, f64) {
        let mut peak = f64::NEG_INFINITY;
        let mut current = 0.0;
        let mut max = 0.0_f64;
        for equity in self.equity_curve() {
            peak = peak.max(equity);
            current = if peak > 0.0 {
                ((peak - equity) / peak).max(0.0)
            } else {
                0.0
            };
            max = max.max(current);
        }
        (current, max)
    }

    /// Drawdown of the latest equity from its running peak.
    pub fn current_drawdown(&self) -> f64 {
        self.drawdowns().0
    }

    pub fn max_drawdown(&self) -> f64 {
        self.drawdowns().1
    }

    pub fn performance(&self) -> PerformanceSummary {
        let wins: Vec<f64> = self.trades.iter().map(|t| t.pnl).filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = self.trades.iter().map(|t| t.pnl).filter(|p| *p < 0.0).collect();
        let total = self.trades.len();

        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum::<f64>().abs();
        let mean = |xs: &[f64], sum: f64| if xs.is_empty() { 0.0 } else { sum / xs.len() as f64 };
        let (current_drawdown, max_drawdown) = self.drawdowns();

        PerformanceSummary {
            total_trades: total,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: if total == 0 { 0.0 } else { wins.len() as f64 / total as f64 },
            average_profit: mean(&wins[..], gross_profit),
            average_loss: mean(&losses[..], gross_loss),
            profit_factor: (gross_loss > 0.0).then(|| gross_profit / gross_loss),
            total_pnl: self.trades.iter().map(|t| t.pnl).sum(),
            current_drawdown,
            max_drawdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trade(pnl: f64) -> TradeRecord {
        TradeRecord {
            symbol: "EURUSD".into(),
            signal: Signal::Buy,
            entry_price: 1.1,
            exit_price: 1.1,
            units: 0.0,
            pnl,
            closed_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_ledger_has_no_drawdown() {
        let ledger = TradeLedger::new(10_000.0);
        assert_eq!(ledger.current_drawdown(), 0.0);
        let p = ledger.performance();
        assert_eq!(p.total_trades, 0);
        assert_eq!(p.win_rate, 0.0);
        assert_eq!(p.profit_factor, None);
    }

    #[test]
    fn closed_trade_pnl_follows_side() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let long = TradeRecord::closed("EURUSD", Signal::Buy, 1.10, 1.11, 20_000.0, t0);
        assert!((long.pnl - 200.0).abs() < 1e-6);
        let short = TradeRecord::closed("EURUSD", Signal::Sell, 1.10, 1.11, 20_000.0, t0);
        assert!((short.pnl + 200.0).abs() < 1e-6);
    }

    #[test]
    fn drawdown_is_peak_to_trough() {
        let mut ledger = TradeLedger::new(10_000.0);
        ledger.record(trade(2_000.0)); // 12,000 peak
        ledger.record(trade(-3_000.0)); // 9,000
        assert!((ledger.current_drawdown() - 0.25).abs() < 1e-12);
        ledger.record(trade(1_500.0)); // 10,500
        assert!((ledger.current_drawdown() - 0.125).abs() < 1e-12);
        assert!((ledger.max_drawdown() - 0.25).abs() < 1e-12);
        ledger.record(trade(2_000.0)); // 12,500 new peak
        assert_eq!(ledger.current_drawdown(), 0.0);
        assert!((ledger.equity() - 12_500.0).abs() < 1e-9);
    }

    #[test]
    fn performance_summary() {
        let mut ledger = TradeLedger::new(10_000.0);
        for pnl in [300.0, -100.0, 200.0, -200.0, 0.0] {
            ledger.record(trade(pnl));
        }
        let p = ledger.performance();
        assert_eq!(p.total_trades, 5);
        assert_eq!(p.winning_trades, 2);
        assert_eq!(p.losing_trades, 2);
        assert!((p.win_rate - 0.4).abs() < 1e-12);
        assert!((p.average_profit - 250.0).abs() < 1e-12);
        assert!((p.average_loss - 150.0).abs() < 1e-12);
        assert!((p.profit_factor.unwrap() - 500.0 / 300.0).abs() < 1e-12);
        assert!((p.total_pnl - 200.0).abs() < 1e-12);
    }

    #[test]
    fn ledger_round_trips_through_json() {
        let mut ledger = TradeLedger::new(5_000.0);
        ledger.record(trade(-50.0));
        let json = serde_json::to_string(&ledger).unwrap();
        let back: TradeLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
