//! Domain types for Confluence

pub mod candle;
pub mod signal;
pub mod snapshot;
pub mod timeframe;

pub use candle::{validate_series, Candle, SeriesError};
pub use signal::{majority, tally, Signal, TrendDirection};
pub use snapshot::{keys, IndicatorSnapshot};
pub use timeframe::Timeframe;

/// Symbol type alias
pub type Symbol = String;
