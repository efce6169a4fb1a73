//! Trailing sums over monthly bankruptcy counts
//!
//! The window runs over the months that are present in the input, not over
//! calendar months. A month without any bankruptcies has no bucket, so a
//! sparse series yields windows spanning more than twelve calendar months.
//! `is_dense` tells callers whether that happened.

use log::debug;
use std::collections::BTreeMap;

use crate::aggregate::YearMonth;
use crate::records::BySector;

/// Number of present months in a trend window
pub const ROLLING_WINDOW: usize = 12;

/// Computes trailing per-sector sums over the last `window` present months
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindowEngine {
    window: usize,
}

impl Default for RollingWindowEngine {
    fn default() -> Self {
        Self { window: ROLLING_WINDOW }
    }
}

impl RollingWindowEngine {
    /// Engine with a window of `window` present entries (at least 1)
    pub fn with_window(window: usize) -> Self {
        Self { window: window.max(1) }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Trailing sums, one per month that has `window - 1` present months before it
    ///
    /// A sector with no value anywhere in a window is absent at that point.
    pub fn rolling_sums(
        &self,
        monthly: &BTreeMap<YearMonth, BySector<Option<f64>>>,
    ) -> Vec<(YearMonth, BySector<Option<f64>>)> {
        let entries: Vec<(&YearMonth, &BySector<Option<f64>>)> = monthly.iter().collect();
        if entries.len() < self.window {
            debug!("Only {} months present, no rolling window emitted", entries.len());
            return Vec::new();
        }

        entries
            .windows(self.window)
            .map(|window| {
                let (last, _) = window[window.len() - 1];
                let sums = BySector::new(
                    sum_present(window.iter().map(|(_, v)| v.construction)),
                    sum_present(window.iter().map(|(_, v)| v.non_construction)),
                );
                (*last, sums)
            })
            .collect()
    }

    /// Whether the months form one unbroken calendar sequence
    pub fn is_dense<V>(monthly: &BTreeMap<YearMonth, V>) -> bool {
        monthly
            .keys()
            .zip(monthly.keys().skip(1))
            .all(|(prev, next)| prev.next() == Some(*next))
    }
}

fn sum_present<I: Iterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    values.flatten().fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}
