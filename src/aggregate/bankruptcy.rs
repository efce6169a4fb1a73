//! Bankruptcy accumulation at monthly and yearly granularity

use std::collections::BTreeMap;

use super::keys::{BucketKey, YearMonth};
use crate::records::{BankruptcyRecord, BySector, GeographicEntity};

/// Accumulates bankruptcy counts by (entity, sector, month) and (entity, sector, year)
#[derive(Debug, Default)]
pub struct BankruptcyAggregator {
    monthly: BTreeMap<BucketKey<YearMonth>, f64>,
    yearly: BTreeMap<BucketKey<i32>, f64>,
    zero_counts: u64,
}

impl BankruptcyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to its monthly and yearly buckets
    ///
    /// Zero counts are skipped so they never mark a period as having data.
    /// Returns whether the record was accumulated.
    pub fn add(&mut self, record: &BankruptcyRecord) -> bool {
        if record.bankruptcies == 0.0 {
            self.zero_counts += 1;
            return false;
        }
        let monthly_key = BucketKey::new(record.entity, record.sector, record.period);
        *self.monthly.entry(monthly_key).or_insert(0.0) += record.bankruptcies;

        let yearly_key = BucketKey::new(record.entity, record.sector, record.period.year());
        *self.yearly.entry(yearly_key).or_insert(0.0) += record.bankruptcies;
        true
    }

    /// Records skipped because their count was zero
    pub fn zero_counts(&self) -> u64 {
        self.zero_counts
    }

    /// End ingestion; the returned buckets can no longer change
    pub fn finish(self) -> BankruptcyBuckets {
        BankruptcyBuckets {
            monthly: self.monthly,
            yearly: self.yearly,
            zero_counts: self.zero_counts,
        }
    }
}

/// Frozen bankruptcy buckets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankruptcyBuckets {
    monthly: BTreeMap<BucketKey<YearMonth>, f64>,
    yearly: BTreeMap<BucketKey<i32>, f64>,
    zero_counts: u64,
}

impl BankruptcyBuckets {
    pub fn monthly_bucket(&self, key: &BucketKey<YearMonth>) -> Option<f64> {
        self.monthly.get(key).copied()
    }

    pub fn yearly_bucket(&self, key: &BucketKey<i32>) -> Option<f64> {
        self.yearly.get(key).copied()
    }

    pub fn monthly_len(&self) -> usize {
        self.monthly.len()
    }

    pub fn yearly_len(&self) -> usize {
        self.yearly.len()
    }

    pub fn zero_counts(&self) -> u64 {
        self.zero_counts
    }

    pub fn has_entity(&self, entity: GeographicEntity) -> bool {
        self.monthly.keys().any(|k| k.entity == entity)
    }

    /// Monthly counts of one entity, keyed by month, per sector
    pub fn monthly(&self, entity: GeographicEntity) -> BTreeMap<YearMonth, BySector<Option<f64>>> {
        collect_entity(&self.monthly, entity)
    }

    /// Yearly counts of one entity, keyed by year, per sector
    pub fn yearly(&self, entity: GeographicEntity) -> BTreeMap<i32, BySector<Option<f64>>> {
        collect_entity(&self.yearly, entity)
    }
}

fn collect_entity<T: Ord + Copy>(
    buckets: &BTreeMap<BucketKey<T>, f64>,
    entity: GeographicEntity,
) -> BTreeMap<T, BySector<Option<f64>>> {
    let mut series: BTreeMap<T, BySector<Option<f64>>> = BTreeMap::new();
    for (key, count) in buckets.iter().filter(|(k, _)| k.entity == entity) {
        *series.entry(key.time).or_default().get_mut(key.sector) = Some(*count);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Sector;

    fn record(entity: GeographicEntity, sector: Sector, year: i32, month: u32, count: f64) -> BankruptcyRecord {
        BankruptcyRecord {
            period: YearMonth::new(year, month).unwrap(),
            entity,
            sector,
            bankruptcies: count,
        }
    }

    #[test]
    fn test_monthly_and_yearly_buckets() {
        let mut agg = BankruptcyAggregator::new();
        agg.add(&record(GeographicEntity::Henegouwen, Sector::Construction, 2009, 1, 4.0));
        agg.add(&record(GeographicEntity::Henegouwen, Sector::Construction, 2009, 1, 2.0));
        agg.add(&record(GeographicEntity::Henegouwen, Sector::Construction, 2009, 7, 5.0));
        agg.add(&record(GeographicEntity::Henegouwen, Sector::NonConstruction, 2009, 7, 20.0));
        let buckets = agg.finish();

        let jan = BucketKey::new(GeographicEntity::Henegouwen, Sector::Construction, YearMonth::new(2009, 1).unwrap());
        assert_eq!(buckets.monthly_bucket(&jan), Some(6.0));
        let year = BucketKey::new(GeographicEntity::Henegouwen, Sector::Construction, 2009);
        assert_eq!(buckets.yearly_bucket(&year), Some(11.0));
        assert_eq!(buckets.monthly_len(), 3);
        assert_eq!(buckets.yearly_len(), 2);
    }

    #[test]
    fn test_zero_count_creates_no_bucket() {
        let mut agg = BankruptcyAggregator::new();
        assert!(!agg.add(&record(GeographicEntity::Luik, Sector::Construction, 2010, 5, 0.0)));
        assert!(agg.add(&record(GeographicEntity::Luik, Sector::NonConstruction, 2010, 5, 1.0)));
        let buckets = agg.finish();

        assert_eq!(buckets.zero_counts(), 1);
        let yearly = buckets.yearly(GeographicEntity::Luik);
        assert_eq!(yearly[&2010].construction, None);
        assert_eq!(yearly[&2010].non_construction, Some(1.0));
    }

    #[test]
    fn test_entity_views_are_isolated() {
        let mut agg = BankruptcyAggregator::new();
        agg.add(&record(GeographicEntity::Namen, Sector::Construction, 2010, 5, 3.0));
        agg.add(&record(GeographicEntity::Luxemburg, Sector::Construction, 2010, 5, 8.0));
        let buckets = agg.finish();

        let namen = buckets.monthly(GeographicEntity::Namen);
        assert_eq!(namen.len(), 1);
        assert_eq!(namen.values().next().and_then(|s| s.construction), Some(3.0));
        assert!(!buckets.has_entity(GeographicEntity::Brussels));
    }
}
