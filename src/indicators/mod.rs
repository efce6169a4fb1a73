//! Derived indicators computed from frozen buckets

mod series;
mod rolling;
mod survival;
mod index;

pub use series::{DerivedSeries, SeriesPoint};
pub use rolling::{RollingWindowEngine, ROLLING_WINDOW};
pub use survival::{SurvivalRateCalculator, Horizon};
pub use index::IndexSeriesBuilder;

/// Round to two decimals, as every published percentage and index is
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
