//! Entry, stop-loss and take-profit ladders around an entry price.
//!
//! Every level is a fixed multiple of ATR (or a fixed percentage) from the
//! entry. With an ATR inside [`atr_in_range`], stops land strictly on the
//! losing side of the entry, targets strictly on the winning side, and every
//! level stays above zero.

use serde::{Deserialize, Serialize};

use crate::domain::{keys, IndicatorSnapshot, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Immediate,
    Patient,
    Opportunistic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub name: String,
    pub price: f64,
    pub order_type: OrderType,
    pub urgency: Urgency,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopBasis {
    Atr,
    Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLevel {
    pub name: String,
    pub price: f64,
    pub basis: StopBasis,
    /// ATR multiple or percentage, depending on `basis`.
    pub distance_factor: f64,
    pub recommended: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitLevel {
    pub name: String,
    pub price: f64,
    pub atr_multiple: f64,
    /// Share of the position closed at this target, in percent.
    pub close_percentage: f64,
    /// Target distance over the standard stop distance.
    pub risk_reward: Option<f64>,
    pub recommended: bool,
    pub description: String,
}

/// Name of the stop every sizing and risk:reward figure is based on.
pub const STANDARD_STOP: &str = "standard_2atr";

const STOPS: [(&str, StopBasis, f64, &str); 5] = [
    ("tight_1atr", StopBasis::Atr, 1.0, "Tight stop - Quick exit if wrong"),
    (STANDARD_STOP, StopBasis::Atr, 2.0, "Standard stop - Recommended (allows normal volatility)"),
    ("wide_3atr", StopBasis::Atr, 3.0, "Wide stop - More breathing room"),
    ("percentage_2pct", StopBasis::Percentage, 2.0, "2% fixed stop loss"),
    ("percentage_3pct", StopBasis::Percentage, 3.0, "3% fixed stop loss"),
];

const TARGETS: [(&str, f64, &str); 4] = [
    ("tp1_quick", 1.0, "Quick profit - Scalp (Close 25% position)"),
    ("tp2_conservative", 2.0, "Conservative target (Close 25% position)"),
    ("tp3_moderate", 3.0, "Moderate target (Close 25% position)"),
    ("tp4_aggressive", 5.0, "Aggressive target (Close remaining 25%)"),
];

const RECOMMENDED_TARGET: &str = "tp2_conservative";

/// Widest ATR multiple on any ladder.
pub const MAX_ATR_MULTIPLE: f64 = 5.0;

/// Smallest ATR, as a fraction of the entry, that keeps levels apart from the entry.
pub const MIN_ATR_FRACTION: f64 = 1e-6;

/// Direction of a planned position. HOLD has no side and cannot be laddered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn of(signal: Signal) -> Option<Side> {
        match signal {
            Signal::Buy => Some(Side::Long),
            Signal::Sell => Some(Side::Short),
            Signal::Hold => None,
        }
    }

    /// +1 long, -1 short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

/// Whether `atr` keeps every ladder level distinct from `entry` and above zero.
pub fn atr_in_range(entry: f64, atr: f64) -> bool {
    atr.is_finite() && atr >= entry * MIN_ATR_FRACTION && atr * MAX_ATR_MULTIPLE < entry
}

pub fn stop_losses(entry: f64, side: Side, atr: f64) -> Vec<StopLevel> {
    let dir = side.sign();
    STOPS
        .iter()
        .map(|&(name, basis, factor, description)| {
            let distance = match basis {
                StopBasis::Atr => factor * atr,
                StopBasis::Percentage => entry * factor / 100.0,
            };
            StopLevel {
                name: name.to_string(),
                price: entry - dir * distance,
                basis,
                distance_factor: factor,
                recommended: name == STANDARD_STOP,
                description: description.to_string(),
            }
        })
        .collect()
}

/// Take-profit ladder; risk:reward is measured against `standard_stop`.
pub fn take_profits(entry: f64, side: Side, atr: f64, standard_stop: f64) -> Vec<TakeProfitLevel> {
    let dir = side.sign();
    let risk = (entry - standard_stop).abs();
    let share = 100.0 / TARGETS.len() as f64;
    TARGETS
        .iter()
        .map(|&(name, multiple, description)| {
            let price = entry + dir * multiple * atr;
            TakeProfitLevel {
                name: name.to_string(),
                price,
                atr_multiple: multiple,
                close_percentage: share,
                risk_reward: (risk > 0.0).then(|| (price - entry).abs() / risk),
                recommended: name == RECOMMENDED_TARGET,
                description: description.to_string(),
            }
        })
        .collect()
}

/// Entry ladder ordered by urgency: market now, shallow pullback, best level.
///
/// The best level is the Bollinger band on the favourable side (lower band for
/// BUY, upper for SELL) when it is actually better than the entry, else
/// 1.5 ATR away.
pub fn entries(entry: f64, side: Side, atr: f64, snapshot: &IndicatorSnapshot) -> Vec<EntryPoint> {
    let dir = side.sign();
    let (band, best_description) = match side {
        Side::Long => (
            snapshot.get(keys::BB_LOWER),
            "Best entry near support/BB Lower - Most favorable",
        ),
        Side::Short => (
            snapshot.get(keys::BB_UPPER),
            "Best entry near resistance/BB Upper - Most favorable",
        ),
    };
    let best = band
        .filter(|b| *b > 0.0 && dir * (entry - b) > 0.0)
        .unwrap_or(entry - dir * 1.5 * atr);

    vec![
        EntryPoint {
            name: "entry_1_immediate".into(),
            price: entry,
            order_type: OrderType::Market,
            urgency: Urgency::Immediate,
            description: "Market entry - Enter now at current price".into(),
        },
        EntryPoint {
            name: "entry_2_pullback".into(),
            price: entry - dir * 0.5 * atr,
            order_type: OrderType::Limit,
            urgency: Urgency::Patient,
            description: "Wait for minor pullback - Better entry".into(),
        },
        EntryPoint {
            name: "entry_3_best".into(),
            price: best,
            order_type: OrderType::Limit,
            urgency: Urgency::Opportunistic,
            description: best_description.into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: f64 = 1.1;
    const ATR: f64 = 0.005;

    fn price_of<'a>(levels: impl IntoIterator<Item = (&'a str, f64)>, name: &str) -> f64 {
        levels
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| p)
            .unwrap()
    }

    #[test]
    fn buy_stops_sit_below_entry() {
        let stops = stop_losses(ENTRY, Side::Long, ATR);
        assert_eq!(stops.len(), 5);
        assert!(stops.iter().all(|s| s.price < ENTRY));
        let standard = price_of(stops.iter().map(|s| (s.name.as_str(), s.price)), STANDARD_STOP);
        assert!((standard - 1.09).abs() < 1e-12);
        assert_eq!(stops.iter().filter(|s| s.recommended).count(), 1);
        let pct2 = price_of(stops.iter().map(|s| (s.name.as_str(), s.price)), "percentage_2pct");
        assert!((pct2 - 1.078).abs() < 1e-12);
    }

    #[test]
    fn sell_stops_sit_above_entry() {
        let stops = stop_losses(ENTRY, Side::Short, ATR);
        assert!(stops.iter().all(|s| s.price > ENTRY));
    }

    #[test]
    fn buy_targets_and_risk_reward() {
        let tps = take_profits(ENTRY, Side::Long, ATR, 1.09);
        assert_eq!(tps.len(), 4);
        assert!(tps.iter().all(|t| t.price > ENTRY));
        let total: f64 = tps.iter().map(|t| t.close_percentage).sum();
        assert!((total - 100.0).abs() < 1e-12);

        let tp2 = tps.iter().find(|t| t.name == "tp2_conservative").unwrap();
        assert!((tp2.price - 1.11).abs() < 1e-12);
        assert!((tp2.risk_reward.unwrap() - 2.0).abs() < 1e-9);
        assert!(tp2.recommended);

        let tp4 = tps.iter().find(|t| t.name == "tp4_aggressive").unwrap();
        assert!((tp4.risk_reward.unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn sell_targets_sit_below_entry() {
        let tps = take_profits(ENTRY, Side::Short, ATR, 1.11);
        assert!(tps.iter().all(|t| t.price < ENTRY));
    }

    #[test]
    fn best_entry_uses_favourable_band() {
        let snapshot: IndicatorSnapshot = [("BB_Lower", 1.094), ("BB_Upper", 1.106)].into_iter().collect();
        let buy = entries(ENTRY, Side::Long, ATR, &snapshot);
        assert_eq!(buy[0].order_type, OrderType::Market);
        assert!((buy[1].price - 1.0975).abs() < 1e-12);
        assert_eq!(buy[2].price, 1.094);

        let sell = entries(ENTRY, Side::Short, ATR, &snapshot);
        assert!((sell[1].price - 1.1025).abs() < 1e-12);
        assert_eq!(sell[2].price, 1.106);
    }

    #[test]
    fn best_entry_ignores_band_on_wrong_side() {
        // Price already below the lower band: fall back to 1.5 ATR.
        let snapshot: IndicatorSnapshot = [("BB_Lower", 1.12)].into_iter().collect();
        let buy = entries(ENTRY, Side::Long, ATR, &snapshot);
        assert!((buy[2].price - 1.0925).abs() < 1e-12);

        let none = entries(ENTRY, Side::Short, ATR, &IndicatorSnapshot::new());
        assert!((none[2].price - 1.1075).abs() < 1e-12);
    }

    #[test]
    fn non_positive_band_is_not_an_entry() {
        let snapshot: IndicatorSnapshot = [("BB_Lower", -0.5)].into_iter().collect();
        let buy = entries(ENTRY, Side::Long, ATR, &snapshot);
        assert!((buy[2].price - 1.0925).abs() < 1e-12);
    }

    #[test]
    fn hold_has_no_side() {
        assert_eq!(Side::of(Signal::Hold), None);
        assert_eq!(Side::of(Signal::Buy), Some(Side::Long));
        assert_eq!(Side::of(Signal::Sell).map(Side::sign), Some(-1.0));
    }

    #[test]
    fn atr_range_bounds() {
        assert!(atr_in_range(ENTRY, ATR));
        assert!(!atr_in_range(ENTRY, 0.0));
        assert!(!atr_in_range(ENTRY, ENTRY * 1e-9));
        assert!(!atr_in_range(ENTRY, f64::NAN));
        // Five ATRs below a short entry would cross zero.
        assert!(!atr_in_range(ENTRY, ENTRY / 4.0));
        assert!(atr_in_range(ENTRY, ENTRY / 5.0 * 0.99));
    }

    #[test]
    fn levels_at_widest_atr_stay_positive_and_distinct() {
        let atr = ENTRY / MAX_ATR_MULTIPLE * 0.99;
        let stops = stop_losses(ENTRY, Side::Long, atr);
        assert!(stops.iter().all(|s| s.price > 0.0 && s.price < ENTRY));
        let tps = take_profits(ENTRY, Side::Short, atr, ENTRY + 2.0 * atr);
        assert!(tps.iter().all(|t| t.price > 0.0 && t.price < ENTRY));
    }

    #[test]
    fn entries_are_ordered_by_urgency() {
        let e = entries(ENTRY, Side::Long, ATR, &IndicatorSnapshot::new());
        assert!(e.windows(2).all(|w| w[0].urgency < w[1].urgency));
    }
}
