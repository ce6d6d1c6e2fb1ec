//! Plain-text rendering of decisions, scans and ledger performance.

use std::fmt::Write;

use confluence_core::analysis::{TimeframeAnalysis, TimeframeOutcome};
use confluence_core::ledger::PerformanceSummary;
use confluence_core::planner::{MultiTimeframePlan, PlanOutcome, SinglePlan, TimeframePlan};
use confluence_core::{Decision, ScanReport};

const RULE: &str = "============================================================";

// Writing to a String cannot fail, so the fmt::Result values below are dropped.

pub fn render(decision: &Decision) -> String {
    let mut out = String::new();
    let _ = write_report(&mut out, decision);
    out
}

pub fn render_scan(scan: &ScanReport) -> String {
    let mut out = String::new();
    let _ = write_scan(&mut out, scan);
    out
}

pub fn render_performance(summary: &PerformanceSummary) -> String {
    let mut out = String::new();
    let _ = write_performance(&mut out, summary);
    out
}

fn write_scan(out: &mut String, scan: &ScanReport) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(
        out,
        "=== Scan: {} symbols, {} failed ===",
        scan.ranked.len() + scan.failed.len(),
        scan.failed.len()
    )?;
    for (rank, d) in scan.ranked.iter().enumerate() {
        let planned = match &d.plans {
            Some(PlanOutcome::Approved(_)) => "planned",
            Some(PlanOutcome::Rejected { .. }) => "rejected",
            None => "-",
        };
        writeln!(
            out,
            "{:>2}. {:<10} {:<4} {:>5.1}%  consensus {:<4} ({}/{})  price {:.5}  {}",
            rank + 1,
            d.symbol,
            d.ensemble.signal,
            d.ensemble.confidence * 100.0,
            d.consensus.consensus,
            d.consensus.agreement_count,
            d.consensus.total_timeframes,
            d.price,
            planned
        )?;
    }
    for failure in &scan.failed {
        writeln!(out, "    {:<10} ERROR {}", failure.symbol, failure.error)?;
    }
    Ok(())
}

fn write_performance(out: &mut String, p: &PerformanceSummary) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "TRADING PERFORMANCE REPORT")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Total Trades:   {}", p.total_trades)?;
    writeln!(out, "Winning Trades: {}", p.winning_trades)?;
    writeln!(out, "Losing Trades:  {}", p.losing_trades)?;
    writeln!(out, "Win Rate:       {:.2}%", p.win_rate * 100.0)?;
    writeln!(out)?;
    writeln!(out, "Average Profit: {:.2}", p.average_profit)?;
    writeln!(out, "Average Loss:   {:.2}", p.average_loss)?;
    match p.profit_factor {
        Some(pf) => writeln!(out, "Profit Factor:  {pf:.2}")?,
        None => writeln!(out, "Profit Factor:  n/a")?,
    }
    writeln!(out)?;
    writeln!(out, "Total P&L:      {:.2}", p.total_pnl)?;
    writeln!(out, "Drawdown:       {:.2}% (max {:.2}%)", p.current_drawdown * 100.0, p.max_drawdown * 100.0)?;
    writeln!(out, "{RULE}")
}

fn write_report(out: &mut String, d: &Decision) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "=== Decision: {} ===", d.symbol)?;
    writeln!(out, "Price:          {:.5} ({} close at {})", d.price, d.price_timeframe, d.as_of)?;
    writeln!(out, "Generated:      {}", d.timestamp)?;
    writeln!(out, "Config:         {}", d.config_fingerprint)?;
    writeln!(
        out,
        "Signal:         {} ({:.1}% confidence)",
        d.ensemble.signal,
        d.ensemble.confidence * 100.0
    )?;
    writeln!(
        out,
        "Ensemble:       technical {} {:.1}% | classifier {} {:.1}% | buy {:.3} sell {:.3}",
        d.ensemble.technical_signal,
        d.ensemble.technical_confidence * 100.0,
        d.ensemble.ml_signal,
        d.ensemble.ml_confidence * 100.0,
        d.ensemble.buy_score,
        d.ensemble.sell_score
    )?;

    let c = &d.consensus;
    writeln!(out)?;
    writeln!(out, "--- Consensus ---")?;
    writeln!(
        out,
        "Consensus:      {} ({}/{} timeframes, {:.1}% confidence)",
        c.consensus,
        c.agreement_count,
        c.total_timeframes,
        c.confidence * 100.0
    )?;
    writeln!(
        out,
        "Votes:          {} buy / {} sell / {} hold (weighted {:.3} / {:.3})",
        c.buy_timeframes, c.sell_timeframes, c.hold_timeframes, c.weighted_buy, c.weighted_sell
    )?;
    for alert in &c.reversal_alerts {
        writeln!(
            out,
            "WARNING: {} reversal on {} (strength {:.1}%, {} confidence)",
            alert.reversal_type,
            alert.timeframe,
            alert.strength * 100.0,
            alert.warning_level
        )?;
    }

    writeln!(out)?;
    writeln!(out, "--- Timeframes ---")?;
    for analysis in d.analyses.values() {
        write_analysis(out, analysis)?;
    }
    for skipped in &d.skipped {
        if let TimeframeOutcome::InsufficientData {
            timeframe,
            available,
            required,
        } = skipped
        {
            writeln!(out, "{timeframe:<4} skipped: {available} candles, {required} required")?;
        }
    }

    match &d.single_plan {
        Some(outcome) => write_single(out, outcome)?,
        None => {
            writeln!(out)?;
            writeln!(out, "No trade: signal is {}", d.ensemble.signal)?;
        }
    }
    if let Some(outcome) = &d.plans {
        write_plans(out, outcome)?;
    }
    Ok(())
}

fn write_analysis(out: &mut String, a: &TimeframeAnalysis) -> std::fmt::Result {
    let changed = if a.signal_changed {
        format!(" (rules said {})", a.current_consensus)
    } else {
        String::new()
    };
    writeln!(
        out,
        "{:<4} {:<4} {:>5.1}%{}  trend {:.2}  momentum {}",
        a.timeframe,
        a.enhanced_signal,
        a.confidence * 100.0,
        changed,
        a.trend_strength,
        a.momentum_direction
    )?;
    let rules: Vec<String> = a.signals.iter().map(|(k, v)| format!("{k}={v}")).collect();
    writeln!(out, "     rules: {}", rules.join(", "))?;
    writeln!(out, "     {}", a.reasoning)?;
    let score = &a.signal_score;
    writeln!(
        out,
        "     score {:+.1} {}  buy {:.5}-{:.5}  sell {:.5}-{:.5}",
        score.total,
        score.recommendation,
        score.zones.buy_zone_low,
        score.zones.buy_zone_high,
        score.zones.sell_zone_low,
        score.zones.sell_zone_high
    )?;
    if !a.support_levels.is_empty() || !a.resistance_levels.is_empty() {
        writeln!(
            out,
            "     support {}  resistance {}",
            levels(&a.support_levels),
            levels(&a.resistance_levels)
        )?;
    }
    Ok(())
}

fn levels(values: &[f64]) -> String {
    if values.is_empty() {
        return "-".into();
    }
    values
        .iter()
        .map(|v| format!("{v:.5}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_single(out: &mut String, outcome: &PlanOutcome<SinglePlan>) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "--- Trade ---")?;
    match outcome {
        PlanOutcome::Rejected { signal, reasons } => {
            writeln!(out, "REJECTED {signal}")?;
            for reason in reasons {
                writeln!(out, "  - {reason}")?;
            }
        }
        PlanOutcome::Approved(p) => {
            writeln!(out, "Entry:          {:.5} {}", p.entry_price, p.signal)?;
            writeln!(out, "Stop Loss:      {:.5}", p.stop_loss)?;
            writeln!(out, "Take Profit:    {:.5}", p.take_profit)?;
            writeln!(
                out,
                "Size:           {:.0} units ({:.2} lots), risking {:.2}",
                p.sizing.units, p.sizing.lots, p.sizing.risk_amount
            )?;
            writeln!(
                out,
                "Reward/Risk:    {:.2} (+{:.2} / -{:.2})",
                p.risk_reward_ratio, p.potential_profit, p.potential_loss
            )?;
            if p.atr_fallback {
                writeln!(out, "WARNING: ATR unavailable, stop placed at a fixed percentage")?;
            }
        }
    }
    Ok(())
}

fn write_plans(out: &mut String, outcome: &PlanOutcome<MultiTimeframePlan>) -> std::fmt::Result {
    let PlanOutcome::Approved(plan) = outcome else {
        // The single plan already printed the rejection.
        return Ok(());
    };
    for tf_plan in plan.timeframe_plans.values() {
        write_timeframe_plan(out, tf_plan)?;
    }
    for tf in &plan.skipped {
        writeln!(out, "{tf}: no indicator data, no plan")?;
    }
    Ok(())
}

fn write_timeframe_plan(out: &mut String, p: &TimeframePlan) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(
        out,
        "--- {} plan: {} ({}) ---",
        p.timeframe, p.trading_style.style, p.trading_style.holding_period
    )?;
    writeln!(
        out,
        "ATR {:.5}{}  expected {} (by {})",
        p.atr,
        if p.atr_fallback { " (fallback)" } else { "" },
        p.expected_execution.duration_readable,
        p.expected_execution.estimated_completion.format("%Y-%m-%d %H:%M")
    )?;
    for e in &p.entries {
        writeln!(out, "  entry {:<18} {:.5}  {}", e.name, e.price, e.description)?;
    }
    for s in &p.stop_losses {
        let mark = if s.recommended { "*" } else { " " };
        writeln!(out, " {mark}stop  {:<18} {:.5}  {}", s.name, s.price, s.description)?;
    }
    for t in &p.take_profits {
        let mark = if t.recommended { "*" } else { " " };
        let rr = t.risk_reward.map_or_else(|| "-".to_string(), |r| format!("{r:.1}R"));
        writeln!(
            out,
            " {mark}tp    {:<18} {:.5}  {:>5}  close {:.0}%",
            t.name, t.price, rr, t.close_percentage
        )?;
    }
    match &p.sizing {
        Ok(size) => writeln!(
            out,
            "  size  {:.0} units ({:.2} lots), stop {:.2}% away",
            size.units, size.lots, size.stop_loss_pct
        ),
        Err(err) => writeln!(out, "  size  unavailable: {err}"),
    }
}
