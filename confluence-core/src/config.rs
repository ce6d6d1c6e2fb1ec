//! Engine configuration: the explicit value object passed into every component.
//!
//! Every section carries `#[serde(default)]`, so a partial TOML file only needs
//! to name the tunables it overrides. The engine never reads files itself;
//! callers deserialize, call [`EngineConfig::validate`], and hand the value in.
//!
//! Three named presets mirror the usual sensitivity choices:
//! - **Conservative**: more timeframes must agree, smaller risk, wider stops
//! - **Balanced**: middle ground
//! - **Aggressive**: single-timeframe agreement, tighter RSI bands, larger risk

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::Timeframe;
use crate::planner::ladders;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub signals: SignalConfig,
    pub momentum: MomentumConfig,
    pub consensus: ConsensusConfig,
    pub ensemble: EnsembleConfig,
    pub risk: RiskConfig,
    pub planner: PlannerConfig,
}

/// Indicator rule thresholds and the indicator periods the rules look up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Fast / mid / long simple moving average periods (`MA_{period}` columns).
    pub ma_periods: [usize; 3],
    /// Fast / slow exponential moving average periods (`EMA_{period}` columns).
    pub ema_periods: [usize; 2],
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// Minimum one-candle RSI move for the weak neutral-zone signal.
    pub rsi_weak_delta: f64,
    pub stoch_overbought: f64,
    pub stoch_oversold: f64,
    pub support_resistance: SupportResistanceConfig,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            ma_periods: [20, 50, 200],
            ema_periods: [12, 26],
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            rsi_weak_delta: 2.0,
            stoch_overbought: 80.0,
            stoch_oversold: 20.0,
            support_resistance: SupportResistanceConfig::default(),
        }
    }
}

/// Pivot detection and proximity settings for support/resistance levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportResistanceConfig {
    /// Candles on each side a pivot must dominate.
    pub pivot_window: usize,
    /// Relative distance under which pivots merge into one level (0.001 = 0.1%).
    pub cluster_tolerance: f64,
    /// Relative distance under which price counts as "at" a level (0.002 = 0.2%).
    pub proximity_tolerance: f64,
    /// Key levels kept on each side of price.
    pub num_levels: usize,
}

impl Default for SupportResistanceConfig {
    fn default() -> Self {
        Self {
            pivot_window: 5,
            cluster_tolerance: 0.001,
            proximity_tolerance: 0.002,
            num_levels: 3,
        }
    }
}

/// Trend momentum, reversal detection and signal blending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub lookback: usize,
    pub recent_lookback: usize,
    pub historical_lookback: usize,
    /// Historical momentum score a trend must exceed before a reversal can be flagged.
    pub strong_trend_threshold: f64,
    /// Blended score magnitude needed for a BUY/SELL.
    pub signal_threshold: f64,
    pub weights: SignalWeights,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            recent_lookback: 5,
            historical_lookback: 20,
            strong_trend_threshold: 0.6,
            signal_threshold: 0.3,
            weights: SignalWeights::default(),
        }
    }
}

/// Weights of the three components of the enhanced signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub current: f64,
    pub momentum: f64,
    pub reversal: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            current: 0.4,
            momentum: 0.4,
            reversal: 0.2,
        }
    }
}

impl SignalWeights {
    pub fn sum(&self) -> f64 {
        self.current + self.momentum + self.reversal
    }

    /// Weights rescaled to sum to 1.0.
    ///
    /// Negative or non-finite weights, or an all-zero set, fall back to the defaults.
    pub fn normalized(&self) -> Self {
        let parts = [self.current, self.momentum, self.reversal];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) || self.sum() <= 0.0 {
            return Self::default();
        }
        let total = self.sum();
        Self {
            current: self.current / total,
            momentum: self.momentum / total,
            reversal: self.reversal / total,
        }
    }
}

/// Cross-timeframe aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Candles a timeframe needs before it is analyzed at all.
    pub min_candles: usize,
    pub timeframe_weights: BTreeMap<Timeframe, f64>,
    /// Weight for timeframes missing from `timeframe_weights`.
    pub default_weight: f64,
    pub min_timeframes_agree: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        let timeframe_weights = BTreeMap::from([
            (Timeframe::D1, 0.4),
            (Timeframe::H4, 0.3),
            (Timeframe::H1, 0.2),
            (Timeframe::M15, 0.1),
        ]);
        Self {
            min_candles: 50,
            timeframe_weights,
            default_weight: 0.1,
            min_timeframes_agree: 3,
        }
    }
}

impl ConsensusConfig {
    pub fn weight_for(&self, timeframe: Timeframe) -> f64 {
        self.timeframe_weights
            .get(&timeframe)
            .copied()
            .filter(|w| w.is_finite() && *w >= 0.0)
            .unwrap_or(self.default_weight)
    }
}

/// Technical vs classifier voting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub technical_weight: f64,
    pub ml_weight: f64,
    /// Score a side must exceed before the vote is actionable.
    pub decision_floor: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            technical_weight: 0.5,
            ml_weight: 0.5,
            decision_floor: 0.5,
        }
    }
}

/// Risk management and trade validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Fraction of balance risked per trade (0.02 = 2%).
    pub risk_per_trade: f64,
    /// Stop distance of the single plan, in ATRs.
    pub atr_multiplier: f64,
    /// Drawdown fraction above which new trades are rejected.
    pub max_drawdown: f64,
    /// Target distance of the single plan, in multiples of the stop distance.
    pub min_risk_reward: f64,
    pub min_confidence: f64,
    /// ATR substitute as a fraction of price when the ATR column is missing.
    pub atr_fallback_pct: f64,
    /// Units per standard lot.
    pub lot_size: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_per_trade: 0.02,
            atr_multiplier: 2.0,
            max_drawdown: 0.15,
            min_risk_reward: 1.5,
            min_confidence: 0.6,
            atr_fallback_pct: 0.02,
            lot_size: 100_000.0,
        }
    }
}

/// Which timeframes get trade plans, and which one prices the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub timeframes: Vec<Timeframe>,
    pub primary_timeframe: Timeframe,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            timeframes: vec![Timeframe::M15, Timeframe::H1, Timeframe::H4, Timeframe::D1],
            primary_timeframe: Timeframe::D1,
        }
    }
}

/// Named configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Preset::Conservative),
            "balanced" => Ok(Preset::Balanced),
            "aggressive" => Ok(Preset::Aggressive),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Preset::Conservative => "conservative",
            Preset::Balanced => "balanced",
            Preset::Aggressive => "aggressive",
        })
    }
}

/// Configuration errors. Raised by callers at load time, never inside the engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown preset '{0}' (expected conservative, balanced or aggressive)")]
    UnknownPreset(String),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// BLAKE3 hex digest of a configuration's canonical JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigFingerprint(pub String);

impl fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl EngineConfig {
    pub fn preset(preset: Preset) -> Self {
        let mut config = Self::default();
        let (agree, confidence, risk, atr, rr, overbought, oversold) = match preset {
            Preset::Conservative => (3, 0.6, 0.01, 2.5, 2.0, 70.0, 30.0),
            Preset::Balanced => (2, 0.5, 0.02, 2.0, 1.5, 70.0, 30.0),
            Preset::Aggressive => (1, 0.4, 0.03, 1.5, 1.2, 65.0, 35.0),
        };
        config.consensus.min_timeframes_agree = agree;
        config.risk.min_confidence = confidence;
        config.risk.risk_per_trade = risk;
        config.risk.atr_multiplier = atr;
        config.risk.min_risk_reward = rr;
        config.signals.rsi_overbought = overbought;
        config.signals.rsi_oversold = oversold;
        config
    }

    /// Deterministic identity of this configuration.
    ///
    /// Struct fields serialize in declaration order and maps are `BTreeMap`s,
    /// so equal configurations always hash equal.
    pub fn fingerprint(&self) -> ConfigFingerprint {
        let canonical = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        ConfigFingerprint(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }

    /// Collect every inconsistency in the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues = Vec::new();
        let s = &self.signals;

        let [fast, mid, long] = s.ma_periods;
        if !(fast < mid && mid < long) || fast == 0 {
            issues.push(format!(
                "ma_periods must be strictly increasing and non-zero, got {:?}",
                s.ma_periods
            ));
        }
        if s.ema_periods[0] == 0 || s.ema_periods[0] >= s.ema_periods[1] {
            issues.push(format!(
                "ema_periods must be [fast, slow] with 0 < fast < slow, got {:?}",
                s.ema_periods
            ));
        }
        if !(0.0 < s.rsi_oversold && s.rsi_oversold < 50.0 && 50.0 < s.rsi_overbought && s.rsi_overbought < 100.0) {
            issues.push(format!(
                "RSI bands must satisfy 0 < oversold < 50 < overbought < 100, got {}/{}",
                s.rsi_overbought, s.rsi_oversold
            ));
        }
        if !(0.0 < s.stoch_oversold && s.stoch_oversold < 50.0 && 50.0 < s.stoch_overbought && s.stoch_overbought < 100.0) {
            issues.push(format!(
                "stochastic bands must satisfy 0 < oversold < 50 < overbought < 100, got {}/{}",
                s.stoch_overbought, s.stoch_oversold
            ));
        }
        if s.support_resistance.pivot_window == 0 {
            issues.push("support_resistance.pivot_window must be > 0".into());
        }

        let m = &self.momentum;
        if m.lookback < 2 || m.recent_lookback < 2 || m.historical_lookback < 2 {
            issues.push("momentum lookbacks must each be at least 2 candles".into());
        }
        if (m.weights.sum() - 1.0).abs() > 1e-6 {
            issues.push(format!(
                "momentum weights must sum to 1.0, got {:.4}",
                m.weights.sum()
            ));
        }

        let c = &self.consensus;
        if c.min_candles < m.lookback.max(m.recent_lookback + m.historical_lookback) {
            issues.push(format!(
                "consensus.min_candles ({}) is shorter than the momentum windows",
                c.min_candles
            ));
        }
        if c.min_timeframes_agree == 0 {
            issues.push("consensus.min_timeframes_agree must be at least 1".into());
        }
        if c.timeframe_weights.values().any(|w| !w.is_finite() || *w < 0.0) {
            issues.push("timeframe weights must be finite and non-negative".into());
        }

        let e = &self.ensemble;
        if e.technical_weight < 0.0 || e.ml_weight < 0.0 {
            issues.push("ensemble weights must be non-negative".into());
        }

        let r = &self.risk;
        if !(r.risk_per_trade > 0.0 && r.risk_per_trade < 1.0) {
            issues.push(format!("risk_per_trade must be in (0, 1), got {}", r.risk_per_trade));
        }
        if r.atr_multiplier <= 0.0 || r.min_risk_reward <= 0.0 {
            issues.push("atr_multiplier and min_risk_reward must be positive".into());
        }
        if !(0.0..=1.0).contains(&r.min_confidence) {
            issues.push(format!("min_confidence must be in [0, 1], got {}", r.min_confidence));
        }
        if !(0.0..1.0).contains(&r.max_drawdown) {
            issues.push(format!("max_drawdown must be in [0, 1), got {}", r.max_drawdown));
        }
        if r.atr_fallback_pct <= 0.0 || r.lot_size <= 0.0 {
            issues.push("atr_fallback_pct and lot_size must be positive".into());
        }
        if r.atr_fallback_pct * ladders::MAX_ATR_MULTIPLE >= 1.0 {
            issues.push(format!(
                "atr_fallback_pct must be below {}, got {}",
                1.0 / ladders::MAX_ATR_MULTIPLE,
                r.atr_fallback_pct
            ));
        }

        if self.planner.timeframes.is_empty() {
            issues.push("planner.timeframes must not be empty".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }
}
