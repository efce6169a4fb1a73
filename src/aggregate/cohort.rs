//! Cohort accumulation of first registrations and survivors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::keys::BucketKey;
use crate::records::{BySector, GeographicEntity, SurvivalRecord, SURVIVAL_HORIZONS};

/// Running sums for one (entity, sector, cohort year)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSums {
    pub first_registrations: u64,
    /// Survivors after 1..=5 years
    pub survivors: [u64; SURVIVAL_HORIZONS],
}

impl CohortSums {
    fn add(&mut self, record: &SurvivalRecord) {
        self.first_registrations = self.first_registrations.saturating_add(record.first_registrations);
        for (sum, count) in self.survivors.iter_mut().zip(record.survivors) {
            *sum = sum.saturating_add(count);
        }
    }

    /// Survivor sum after `years` (1..=5); None outside that range
    pub fn survivors_after(&self, years: usize) -> Option<u64> {
        years.checked_sub(1).and_then(|i| self.survivors.get(i)).copied()
    }
}

/// Accumulates survival records by (entity, sector, cohort year)
#[derive(Debug, Default)]
pub struct CohortAggregator {
    buckets: BTreeMap<BucketKey<i32>, CohortSums>,
}

impl CohortAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record into its bucket; a key seen for the first time starts at zero
    pub fn add(&mut self, record: &SurvivalRecord) {
        let key = BucketKey::new(record.entity, record.sector, record.cohort_year);
        self.buckets.entry(key).or_default().add(record);
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// End ingestion; the returned buckets can no longer change
    pub fn finish(self) -> CohortBuckets {
        CohortBuckets { buckets: self.buckets }
    }
}

impl Extend<SurvivalRecord> for CohortAggregator {
    fn extend<I: IntoIterator<Item = SurvivalRecord>>(&mut self, iter: I) {
        for record in iter {
            self.add(&record);
        }
    }
}

/// Frozen cohort buckets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortBuckets {
    buckets: BTreeMap<BucketKey<i32>, CohortSums>,
}

impl CohortBuckets {
    pub fn get(&self, key: &BucketKey<i32>) -> Option<&CohortSums> {
        self.buckets.get(key)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey<i32>, &CohortSums)> {
        self.buckets.iter()
    }

    pub fn has_entity(&self, entity: GeographicEntity) -> bool {
        self.buckets.keys().any(|k| k.entity == entity)
    }

    /// Cohorts of one entity by year, each sector present only if it had records
    pub fn cohorts(&self, entity: GeographicEntity) -> BTreeMap<i32, BySector<Option<CohortSums>>> {
        let mut cohorts: BTreeMap<i32, BySector<Option<CohortSums>>> = BTreeMap::new();
        for (key, sums) in self.buckets.iter().filter(|(k, _)| k.entity == entity) {
            *cohorts.entry(key.time).or_default().get_mut(key.sector) = Some(*sums);
        }
        cohorts
    }
}
