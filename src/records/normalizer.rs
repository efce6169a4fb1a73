//! Row normalization: raw field maps into typed records
//!
//! Every rejected row is counted by reason. Nothing past this module reads
//! untyped fields.

use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::data::{BankruptcyRecord, GeographicEntity, Sector, SurvivalRecord, SURVIVAL_HORIZONS};
use super::loader::{RawRow, SchemaKind};
use crate::aggregate::YearMonth;

const SURVIVOR_COLUMNS: [&str; SURVIVAL_HORIZONS] = [
    "MS_CNT_SURV_YEAR_1",
    "MS_CNT_SURV_YEAR_2",
    "MS_CNT_SURV_YEAR_3",
    "MS_CNT_SURV_YEAR_4",
    "MS_CNT_SURV_YEAR_5",
];

/// Tokens Statbel uses for suppressed or unknown values
const UNKNOWN_TOKENS: [&str; 2] = ["?", "??.??"];

/// Why a row was left out
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    #[error("missing or unparseable time field")]
    MissingTime,
    #[error("missing sector code")]
    MissingSector,
    #[error("geographic code does not map to a reported entity")]
    UnmappedGeography,
    #[error("zero first registrations")]
    ZeroRegistrations,
    #[error("unparseable or negative count")]
    InvalidNumber,
}

/// Accepted and dropped row tallies for one source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    pub accepted: u64,
    pub missing_time: u64,
    pub missing_sector: u64,
    pub unmapped_geography: u64,
    pub zero_registrations: u64,
    pub invalid_number: u64,
}

impl DropCounts {
    pub fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingTime => self.missing_time += 1,
            DropReason::MissingSector => self.missing_sector += 1,
            DropReason::UnmappedGeography => self.unmapped_geography += 1,
            DropReason::ZeroRegistrations => self.zero_registrations += 1,
            DropReason::InvalidNumber => self.invalid_number += 1,
        }
    }

    pub fn count(&self, reason: DropReason) -> u64 {
        match reason {
            DropReason::MissingTime => self.missing_time,
            DropReason::MissingSector => self.missing_sector,
            DropReason::UnmappedGeography => self.unmapped_geography,
            DropReason::ZeroRegistrations => self.zero_registrations,
            DropReason::InvalidNumber => self.invalid_number,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.missing_time
            + self.missing_sector
            + self.unmapped_geography
            + self.zero_registrations
            + self.invalid_number
    }

    pub fn total(&self) -> u64 {
        self.accepted + self.dropped()
    }
}

/// Parse a Statbel-formatted number
///
/// Empty fields and unknown tokens are zero. `.` is a thousands separator and
/// `,` the decimal mark. Returns None for anything else that does not parse.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() || UNKNOWN_TOKENS.contains(&value) {
        return Some(0.0);
    }
    let cleaned = value.replace('.', "").replace(',', ".");
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Turns raw rows into typed records and keeps per-reason drop counts
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    construction_code: String,
    survival_counts: DropCounts,
    bankruptcy_counts: DropCounts,
}

impl RecordNormalizer {
    pub fn new(construction_code: impl Into<String>) -> Self {
        Self {
            construction_code: construction_code.into(),
            survival_counts: DropCounts::default(),
            bankruptcy_counts: DropCounts::default(),
        }
    }

    /// Normalize a survival row, counting the outcome
    pub fn normalize_survival(&mut self, row: &RawRow) -> Option<SurvivalRecord> {
        let result = self.parse_survival(row);
        Self::tally(&mut self.survival_counts, SchemaKind::Survival, result)
    }

    /// Normalize a bankruptcy row, counting the outcome
    pub fn normalize_bankruptcy(&mut self, row: &RawRow) -> Option<BankruptcyRecord> {
        let result = self.parse_bankruptcy(row);
        Self::tally(&mut self.bankruptcy_counts, SchemaKind::Bankruptcy, result)
    }

    fn tally<T>(counts: &mut DropCounts, kind: SchemaKind, result: Result<T, DropReason>) -> Option<T> {
        match result {
            Ok(record) => {
                counts.accepted += 1;
                Some(record)
            }
            Err(reason) => {
                trace!("Dropped {} row: {}", kind, reason);
                counts.record(reason);
                None
            }
        }
    }

    pub fn survival_counts(&self) -> DropCounts {
        self.survival_counts
    }

    pub fn bankruptcy_counts(&self) -> DropCounts {
        self.bankruptcy_counts
    }

    /// Parse a survival row without touching the counters
    pub fn parse_survival(&self, row: &RawRow) -> Result<SurvivalRecord, DropReason> {
        let cohort_year = parse_year(row, "CD_YEAR")?;

        let sector_code = field(row, "CD_NACE_LVL1");
        if sector_code.is_empty() {
            return Err(DropReason::MissingSector);
        }
        let sector = Sector::classify(sector_code, &self.construction_code);

        let entity = resolve_entity(row)?;

        let first_registrations = parse_count(field(row, "MS_CNT_FIRST_REGISTRATIONS"))?;
        let mut survivors = [0u64; SURVIVAL_HORIZONS];
        for (slot, column) in survivors.iter_mut().zip(SURVIVOR_COLUMNS) {
            *slot = parse_count(field(row, column))?;
        }

        if first_registrations == 0 {
            return Err(DropReason::ZeroRegistrations);
        }

        Ok(SurvivalRecord {
            cohort_year,
            entity,
            sector,
            first_registrations,
            survivors,
        })
    }

    /// Parse a bankruptcy row without touching the counters
    ///
    /// Zero-count rows are accepted here; the aggregator decides what a zero means.
    pub fn parse_bankruptcy(&self, row: &RawRow) -> Result<BankruptcyRecord, DropReason> {
        let year = parse_year(row, "CD_YEAR")?;
        let month: u32 = field(row, "CD_MONTH")
            .parse()
            .map_err(|_| DropReason::MissingTime)?;
        let period = YearMonth::new(year, month).ok_or(DropReason::MissingTime)?;

        let entity = resolve_entity(row)?;
        let sector = Sector::classify(field(row, "TX_NACE_REV2_SECTION"), &self.construction_code);

        let bankruptcies = parse_number(field(row, "MS_COUNTOF_BANKRUPTCIES"))
            .filter(|n| *n >= 0.0)
            .ok_or(DropReason::InvalidNumber)?;

        Ok(BankruptcyRecord {
            period,
            entity,
            sector,
            bankruptcies,
        })
    }
}

/// Trimmed field text; absent columns read as empty
fn field<'a>(row: &'a RawRow, column: &str) -> &'a str {
    row.get(column).map(str::trim).unwrap_or("")
}

/// A year is only accepted if its January is a representable calendar month
fn parse_year(row: &RawRow, column: &str) -> Result<i32, DropReason> {
    let year: i32 = field(row, column).parse().map_err(|_| DropReason::MissingTime)?;
    YearMonth::new(year, 1).map(|_| year).ok_or(DropReason::MissingTime)
}

/// Largest count an f64 still holds exactly (2^53)
const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0;

fn parse_count(value: &str) -> Result<u64, DropReason> {
    match parse_number(value) {
        Some(n) if (0.0..=MAX_EXACT_COUNT).contains(&n) && n.fract() == 0.0 => Ok(n as u64),
        _ => Err(DropReason::InvalidNumber),
    }
}

/// Province first; an empty province falls back to the region only for
/// entities without provinces (Brussels)
fn resolve_entity(row: &RawRow) -> Result<GeographicEntity, DropReason> {
    let province = field(row, "CD_PROV_REFNIS");
    if !province.is_empty() {
        return GeographicEntity::from_province_code(province).ok_or(DropReason::UnmappedGeography);
    }
    match GeographicEntity::from_region_code(field(row, "CD_RGN_REFNIS")) {
        Some(region) if !region.has_provinces() => Ok(region),
        _ => Err(DropReason::UnmappedGeography),
    }
}
