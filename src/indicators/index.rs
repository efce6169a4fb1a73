//! Rebasing of series to a baseline period

use super::round2;
use super::series::DerivedSeries;

/// Rebases a series so that the baseline period reads 100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSeriesBuilder<K> {
    baseline: K,
}

impl<K: Ord + Copy> IndexSeriesBuilder<K> {
    pub fn new(baseline: K) -> Self {
        Self { baseline }
    }

    /// Every point as `value / baseline * 100`, rounded to 2 decimals
    ///
    /// None when the baseline is missing, absent or zero: the series is then
    /// unavailable as a whole. Absent points stay absent.
    pub fn rebase(&self, series: &DerivedSeries<K>) -> Option<DerivedSeries<K>> {
        let base = series.value_at(&self.baseline).filter(|b| *b != 0.0)?;
        Some(DerivedSeries::from_points(series.iter().map(|point| {
            let value = if point.key == self.baseline {
                point.value.map(|_| 100.0)
            } else {
                point.value.map(|v| round2(v / base * 100.0))
            };
            (point.key, value)
        })))
    }
}
