//! Confluence CLI: run the decision engine over candle files.
//!
//! Commands:
//! - `analyze`: evaluate a JSON candle file and print the decision
//! - `scan`: evaluate several candle files and rank the decisions
//! - `performance`: summarize a trade ledger
//! - `config`: print a preset as TOML, or check a TOML config file

mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

use confluence_core::analysis::ClassifierPrediction;
use confluence_core::domain::{Candle, Signal, Timeframe};
use confluence_core::ledger::TradeLedger;
use confluence_core::{DecisionEngine, EngineConfig, Preset, ScanRequest};

#[derive(Parser)]
#[command(
    name = "confluence",
    about = "Confluence CLI: multi-timeframe trading decision engine"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate candle series and print the decision.
    Analyze {
        /// JSON file: `{"symbol": "...", "series": {"1d": [candles...], ...}}`.
        #[arg(long)]
        input: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset: conservative, balanced, aggressive.
        #[arg(long)]
        preset: Option<String>,

        /// Overrides the symbol in the input file.
        #[arg(long)]
        symbol: Option<String>,

        /// Account balance used for position sizing.
        #[arg(long, default_value_t = 10_000.0)]
        balance: f64,

        /// Classifier signal for the latest daily candle (BUY, SELL, HOLD).
        /// Overrides a classifier given in the input file.
        #[arg(long)]
        ml_signal: Option<String>,

        /// Classifier confidence in [0, 1].
        #[arg(long, default_value_t = 0.5)]
        ml_confidence: f64,

        /// JSON trade ledger used for drawdown checks.
        #[arg(long)]
        ledger: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Evaluate several candle files and rank the decisions.
    Scan {
        /// One JSON candle file per symbol, same layout as `analyze --input`.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        preset: Option<String>,

        #[arg(long, default_value_t = 10_000.0)]
        balance: f64,

        #[arg(long)]
        ledger: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the performance summary of a JSON trade ledger.
    Performance {
        #[arg(long)]
        ledger: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print a preset as TOML, or validate a config file.
    Config {
        /// Preset to print. Defaults to the engine defaults.
        #[arg(long)]
        preset: Option<String>,

        /// Validate this TOML file and print its fingerprint instead.
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Candle file layout.
#[derive(Deserialize)]
struct MarketInput {
    #[serde(default)]
    symbol: Option<String>,
    series: BTreeMap<Timeframe, Vec<Candle>>,
    #[serde(default)]
    classifier: Option<ClassifierPrediction>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            config,
            preset,
            symbol,
            balance,
            ml_signal,
            ml_confidence,
            ledger,
            format,
        } => run_analyze(
            &input,
            load_config(config.as_deref(), preset.as_deref())?,
            symbol,
            balance,
            ml_signal.as_deref(),
            ml_confidence,
            ledger.as_deref(),
            format,
        ),
        Commands::Scan {
            inputs,
            config,
            preset,
            balance,
            ledger,
            format,
        } => run_scan(
            &inputs,
            load_config(config.as_deref(), preset.as_deref())?,
            balance,
            ledger.as_deref(),
            format,
        ),
        Commands::Performance { ledger, format } => run_performance(&ledger, format),
        Commands::Config { preset, check } => run_config(preset.as_deref(), check.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>, preset: Option<&str>) -> Result<EngineConfig> {
    let config = match (path, preset) {
        (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
        (Some(path), None) => read_config(path)?,
        (None, Some(name)) => {
            tracing::info!(preset = name, "using preset");
            EngineConfig::preset(name.parse::<Preset>()?)
        }
        (None, None) => EngineConfig::default(),
    };
    config.validate()?;
    tracing::debug!(fingerprint = %config.fingerprint(), "config validated");
    Ok(config)
}

fn read_config(path: &Path) -> Result<EngineConfig> {
    tracing::info!(path = %path.display(), "loading config");
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    input: &Path,
    config: EngineConfig,
    symbol: Option<String>,
    balance: f64,
    ml_signal: Option<&str>,
    ml_confidence: f64,
    ledger_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let request = read_market(input)?;
    let symbol = symbol.unwrap_or(request.symbol);

    let classifier = match ml_signal {
        Some(s) => {
            let signal: Signal = s.parse().map_err(anyhow::Error::msg)?;
            Some(ClassifierPrediction::new(signal, ml_confidence))
        }
        None => request.classifier,
    };
    if classifier.is_none() {
        tracing::warn!(%symbol, "no classifier prediction, ensemble votes on rules alone");
    }

    let ledger = load_ledger(ledger_path, balance)?;
    let engine = DecisionEngine::new(config)?;
    let decision = engine.evaluate(
        &symbol,
        &request.series,
        classifier,
        balance,
        &ledger,
        chrono::Utc::now(),
    )?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&decision)?),
        OutputFormat::Text => {
            print!("{}", report::render(&decision));
            if ledger_path.is_some() {
                print!("{}", report::render_performance(&ledger.performance()));
            }
        }
    }
    Ok(())
}

fn run_scan(
    inputs: &[PathBuf],
    config: EngineConfig,
    balance: f64,
    ledger_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let requests = inputs
        .iter()
        .map(|path| read_market(path))
        .collect::<Result<Vec<_>>>()?;
    let ledger = load_ledger(ledger_path, balance)?;
    let engine = DecisionEngine::new(config)?;
    let scan = engine.scan(&requests, balance, &ledger, chrono::Utc::now());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scan)?),
        OutputFormat::Text => print!("{}", report::render_scan(&scan)),
    }
    Ok(())
}

fn run_performance(ledger_path: &Path, format: OutputFormat) -> Result<()> {
    let ledger = load_ledger(Some(ledger_path), 0.0)?;
    let summary = ledger.performance();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print!("{}", report::render_performance(&summary)),
    }
    Ok(())
}

/// Reads a candle file; the symbol falls back to the file stem.
fn read_market(path: &Path) -> Result<ScanRequest> {
    tracing::info!(path = %path.display(), "loading candles");
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading candles {}", path.display()))?;
    let market: MarketInput = serde_json::from_str(&text)
        .with_context(|| format!("parsing candles {}", path.display()))?;
    let symbol = market.symbol.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "UNKNOWN".to_string())
    });
    tracing::debug!(
        %symbol,
        timeframes = market.series.len(),
        candles = market.series.values().map(Vec::len).sum::<usize>(),
        "candles loaded"
    );
    Ok(ScanRequest {
        symbol,
        series: market.series,
        classifier: market.classifier,
    })
}

/// Reads a JSON ledger, or starts an empty one at `balance`.
fn load_ledger(path: Option<&Path>, balance: f64) -> Result<TradeLedger> {
    let Some(path) = path else {
        return Ok(TradeLedger::new(balance));
    };
    tracing::info!(path = %path.display(), "loading ledger");
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading ledger {}", path.display()))?;
    let ledger: TradeLedger = serde_json::from_str(&text)
        .with_context(|| format!("parsing ledger {}", path.display()))?;
    tracing::debug!(trades = ledger.trades().len(), drawdown = ledger.current_drawdown(), "ledger loaded");
    Ok(ledger)
}

fn run_config(preset: Option<&str>, check: Option<&Path>) -> Result<()> {
    if let Some(path) = check {
        let config = read_config(path)?;
        config.validate()?;
        println!("{}: ok ({})", path.display(), config.fingerprint());
        return Ok(());
    }

    let config = match preset {
        Some(name) => EngineConfig::preset(name.parse::<Preset>()?),
        None => EngineConfig::default(),
    };
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("confluence-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn market_file_symbol_falls_back_to_file_stem() {
        let body = r#"{
            "series": {"1d": []},
            "classifier": {"signal": "BUY", "confidence": 0.8}
        }"#;
        let request = read_market(&write_temp("GBPJPY.json", body)).unwrap();
        assert_eq!(request.symbol, "GBPJPY");
        assert_eq!(request.classifier, Some(ClassifierPrediction::new(Signal::Buy, 0.8)));
        assert!(request.series[&Timeframe::D1].is_empty());
    }

    #[test]
    fn missing_ledger_starts_at_balance() {
        let ledger = load_ledger(None, 2_500.0).unwrap();
        assert_eq!(ledger.starting_balance(), 2_500.0);
        assert!(load_ledger(Some(Path::new("/nonexistent/ledger.json")), 0.0).is_err());
    }

    #[test]
    fn config_and_preset_are_exclusive() {
        let err = load_config(Some(Path::new("x.toml")), Some("balanced")).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }
}
