//! Survival rates of registration cohorts

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::round2;
use super::series::DerivedSeries;
use crate::aggregate::CohortSums;
use crate::config::ReportConfig;
use crate::records::{BySector, Sector};

/// Survival horizon published in the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Horizon {
    OneYear,
    ThreeYear,
}

impl Horizon {
    pub fn years(&self) -> i32 {
        match self {
            Horizon::OneYear => 1,
            Horizon::ThreeYear => 3,
        }
    }

    /// Year in which a cohort's horizon is measured
    pub fn display_year(&self, cohort_year: i32) -> i32 {
        cohort_year.saturating_add(self.years())
    }
}

/// Derives survival percentages from cohort sums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurvivalRateCalculator {
    three_year_cutoff: i32,
}

impl SurvivalRateCalculator {
    /// `three_year_cutoff` is the last cohort whose 3-year horizon was measured
    pub fn new(three_year_cutoff: i32) -> Self {
        Self { three_year_cutoff }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.three_year_cutoff)
    }

    /// Whether the source measured `horizon` for this cohort
    pub fn is_measured(&self, cohort_year: i32, horizon: Horizon) -> bool {
        match horizon {
            Horizon::OneYear => true,
            Horizon::ThreeYear => cohort_year <= self.three_year_cutoff,
        }
    }

    /// Survivors as a percentage of first registrations, rounded to 2 decimals
    ///
    /// None when the horizon was not measured for the cohort or there were no
    /// registrations. Zero survivors out of a positive registration count is 0.0.
    pub fn rate(&self, cohort_year: i32, sums: &CohortSums, horizon: Horizon) -> Option<f64> {
        if !self.is_measured(cohort_year, horizon) || sums.first_registrations == 0 {
            return None;
        }
        let survivors = sums.survivors_after(horizon.years() as usize)?;
        Some(round2(survivors as f64 / sums.first_registrations as f64 * 100.0))
    }

    /// Rates of one sector keyed by display year (cohort year + horizon)
    ///
    /// Cohorts without a bucket for the sector are left out; cohorts whose
    /// horizon is unavailable appear with an absent value.
    pub fn series(
        &self,
        cohorts: &BTreeMap<i32, BySector<Option<CohortSums>>>,
        sector: Sector,
        horizon: Horizon,
    ) -> DerivedSeries<i32> {
        DerivedSeries::from_points(cohorts.iter().filter_map(|(year, sectors)| {
            sectors
                .get(sector)
                .as_ref()
                .map(|sums| (horizon.display_year(*year), self.rate(*year, sums, horizon)))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sums(regs: u64, surv1: u64, surv3: u64) -> CohortSums {
        CohortSums {
            first_registrations: regs,
            survivors: [surv1, surv1, surv3, surv3, surv3],
        }
    }

    #[test]
    fn test_one_year_rate() {
        let calc = SurvivalRateCalculator::new(2021);
        assert_eq!(calc.rate(2008, &sums(100, 80, 60), Horizon::OneYear), Some(80.0));
        assert_eq!(calc.rate(2008, &sums(100, 80, 60), Horizon::ThreeYear), Some(60.0));
        assert_relative_eq!(calc.rate(2010, &sums(3, 2, 1), Horizon::OneYear).unwrap(), 66.67);
    }

    #[test]
    fn test_zero_survivors_is_a_real_zero() {
        let calc = SurvivalRateCalculator::new(2021);
        assert_eq!(calc.rate(2012, &sums(40, 0, 0), Horizon::OneYear), Some(0.0));
        assert_eq!(calc.rate(2012, &sums(40, 0, 0), Horizon::ThreeYear), Some(0.0));
    }

    #[test]
    fn test_zero_registrations_is_absent() {
        let calc = SurvivalRateCalculator::new(2021);
        assert_eq!(calc.rate(2012, &sums(0, 0, 0), Horizon::OneYear), None);
    }

    #[test]
    fn test_three_year_cutoff() {
        let calc = SurvivalRateCalculator::new(2021);
        assert!(calc.is_measured(2021, Horizon::ThreeYear));
        assert!(!calc.is_measured(2022, Horizon::ThreeYear));
        assert!(calc.is_measured(2024, Horizon::OneYear));
        assert_eq!(calc.rate(2022, &sums(100, 90, 0), Horizon::ThreeYear), None);
        assert_eq!(calc.rate(2022, &sums(100, 90, 0), Horizon::OneYear), Some(90.0));
    }

    #[test]
    fn test_rate_bounds_for_well_formed_cohorts() {
        let calc = SurvivalRateCalculator::new(2021);
        for regs in 1..40u64 {
            for surv in 0..=regs {
                let rate = calc.rate(2010, &sums(regs, surv, surv), Horizon::OneYear).unwrap();
                assert!((0.0..=100.0).contains(&rate), "{surv}/{regs} gave {rate}");
            }
        }
    }

    #[test]
    fn test_display_year_saturates() {
        assert_eq!(Horizon::ThreeYear.display_year(2008), 2011);
        assert_eq!(Horizon::OneYear.display_year(i32::MAX), i32::MAX);
    }

    #[test]
    fn test_series_keyed_by_display_year() {
        let calc = SurvivalRateCalculator::new(2021);
        let mut cohorts = BTreeMap::new();
        cohorts.insert(2008, BySector::new(Some(sums(100, 80, 50)), None));
        cohorts.insert(2022, BySector::new(Some(sums(10, 9, 0)), Some(sums(5, 5, 5))));
        cohorts.insert(2023, BySector::new(None, Some(sums(5, 5, 5))));

        let one = calc.series(&cohorts, Sector::Construction, Horizon::OneYear);
        assert_eq!(one.len(), 2);
        assert_eq!(one.value_at(&2009), Some(80.0));
        assert_eq!(one.value_at(&2023), Some(90.0));

        let three = calc.series(&cohorts, Sector::Construction, Horizon::ThreeYear);
        assert_eq!(three.get(&2011), Some(Some(50.0)));
        assert_eq!(three.get(&2025), Some(None));
    }
}
