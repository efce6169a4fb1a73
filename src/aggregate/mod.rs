//! Accumulation of normalized records into flat keyed buckets
//!
//! Aggregators are mutable only while records are ingested. `finish` consumes
//! an aggregator and returns a frozen bucket set that derivation reads from.

mod keys;
mod cohort;
mod bankruptcy;

pub use keys::{YearMonth, TimeKey, BucketKey};
pub use cohort::{CohortAggregator, CohortBuckets, CohortSums};
pub use bankruptcy::{BankruptcyAggregator, BankruptcyBuckets};
