//! Time keys and composite bucket keys

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::records::{GeographicEntity, Sector};

/// A calendar month
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Returns None unless `month` is 1..=12 and the year is representable
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::from)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The following calendar month
    pub fn next(&self) -> Option<YearMonth> {
        self.first_day().checked_add_months(Months::new(1)).map(Self::from)
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Either a bare year or a year-month
///
/// A year sorts before every month of that year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeKey {
    Year(i32),
    Month(YearMonth),
}

impl TimeKey {
    pub fn year(&self) -> i32 {
        match self {
            TimeKey::Year(year) => *year,
            TimeKey::Month(ym) => ym.year(),
        }
    }

    fn sort_tuple(&self) -> (i32, u32) {
        match self {
            TimeKey::Year(year) => (*year, 0),
            TimeKey::Month(ym) => (ym.year(), ym.month()),
        }
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_tuple().cmp(&other.sort_tuple())
    }
}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i32> for TimeKey {
    fn from(year: i32) -> Self {
        TimeKey::Year(year)
    }
}

impl From<YearMonth> for TimeKey {
    fn from(ym: YearMonth) -> Self {
        TimeKey::Month(ym)
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeKey::Year(year) => write!(f, "{}", year),
            TimeKey::Month(ym) => ym.fmt(f),
        }
    }
}

/// Flat composite key of every bucket map: entity, then sector, then time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey<T> {
    pub entity: GeographicEntity,
    pub sector: Sector,
    pub time: T,
}

impl<T> BucketKey<T> {
    pub fn new(entity: GeographicEntity, sector: Sector, time: T) -> Self {
        Self { entity, sector, time }
    }
}
