//! Expected holding time and trading style per timeframe.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Timeframe;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedExecution {
    pub candles_to_target: u32,
    pub duration_minutes: i64,
    pub duration_readable: String,
    pub estimated_completion: DateTime<Utc>,
}

impl ExpectedExecution {
    pub fn estimate(timeframe: Timeframe, now: DateTime<Utc>) -> Self {
        let candles = candles_to_target(timeframe);
        let minutes = i64::from(candles) * timeframe.minutes();
        Self {
            candles_to_target: candles,
            duration_minutes: minutes,
            duration_readable: format_duration(minutes),
            estimated_completion: now + Duration::minutes(minutes),
        }
    }
}

/// Typical candles for price to reach the recommended target.
pub fn candles_to_target(timeframe: Timeframe) -> u32 {
    match timeframe {
        Timeframe::M15 => 20,
        Timeframe::H1 => 24,
        Timeframe::H4 => 18,
        Timeframe::D1 => 10,
        _ => 15,
    }
}

/// "45 minutes", "7 hours 30 minutes", "2 days 12 hours".
pub fn format_duration(minutes: i64) -> String {
    if minutes < 60 {
        format!("{minutes} minutes")
    } else if minutes < 1_440 {
        let (hours, mins) = (minutes / 60, minutes % 60);
        if mins > 0 {
            format!("{hours} hours {mins} minutes")
        } else {
            format!("{hours} hours")
        }
    } else {
        let (days, hours) = (minutes / 1_440, (minutes % 1_440) / 60);
        if hours > 0 {
            format!("{days} days {hours} hours")
        } else {
            format!("{days} days")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingStyle {
    pub style: String,
    pub holding_period: String,
    pub description: String,
    pub monitoring: String,
    pub suitable_for: String,
}

impl TradingStyle {
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        let (style, holding_period, description, monitoring, suitable_for) = match timeframe {
            Timeframe::M15 => (
                "Scalping",
                "15 minutes to 2 hours",
                "Quick in and out trades, capture small moves",
                "Requires active monitoring",
                "Day traders, active traders",
            ),
            Timeframe::H1 => (
                "Intraday Trading",
                "1 hour to 8 hours",
                "Intraday swings, close before end of day",
                "Check every 1-2 hours",
                "Day traders, part-time traders",
            ),
            Timeframe::H4 => (
                "Swing Trading",
                "4 hours to 3 days",
                "Capture medium-term trends",
                "Check 2-3 times per day",
                "Swing traders, working professionals",
            ),
            Timeframe::D1 => (
                "Position Trading",
                "1 day to several weeks",
                "Long-term trends, larger profit targets",
                "Check once per day",
                "Position traders, long-term investors",
            ),
            _ => (
                "Unknown",
                "Variable",
                "Custom timeframe",
                "As needed",
                "All traders",
            ),
        };
        Self {
            style: style.into(),
            holding_period: holding_period.into(),
            description: description.into(),
            monitoring: monitoring.into(),
            suitable_for: suitable_for.into(),
        }
    }
}
