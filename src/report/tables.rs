//! The eight fixed table shapes of the dashboard

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregate::TimeKey;
use crate::config::ReportConfig;
use crate::records::GeographicEntity;

/// Rendered in place of a value that does not exist
pub const ABSENT_MARKER: &str = "-";

/// Column header of the entity column in combined tables
const ENTITY_COLUMN: &str = "Entiteit";

/// Which of the published tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// 1-year survival of construction cohorts
    SurvivalOneYear,
    /// 3-year survival of construction cohorts
    SurvivalThreeYear,
    /// Yearly construction starters
    Starters,
    /// Yearly construction bankruptcies
    BankruptciesYearly,
    /// Rolling 12-month bankruptcies, indexed to the base year
    BankruptcyTrendIndex,
    /// Rolling 12-month construction bankruptcies, absolute
    BankruptcyTrendAbsolute,
    /// Yearly starters, indexed to the base year
    StartersIndex,
    /// Combined yearly summary of recent years
    YearlySummary,
}

impl TableKind {
    pub const ALL: [TableKind; 8] = [
        TableKind::SurvivalOneYear,
        TableKind::SurvivalThreeYear,
        TableKind::Starters,
        TableKind::BankruptciesYearly,
        TableKind::BankruptcyTrendIndex,
        TableKind::BankruptcyTrendAbsolute,
        TableKind::StartersIndex,
        TableKind::YearlySummary,
    ];

    /// Column names, time column first
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::SurvivalOneYear | TableKind::SurvivalThreeYear => &["Jaar", "Bouwsector (%)"],
            TableKind::Starters => &["Jaar", "Aantal nieuwe starters"],
            TableKind::BankruptciesYearly => &["Jaar", "Aantal faillissementen"],
            TableKind::BankruptcyTrendIndex => {
                &["Jaar-Maand", "Bouwsector (index)", "Niet-bouwsector (index)"]
            }
            TableKind::BankruptcyTrendAbsolute => {
                &["Jaar-Maand", "Aantal faillissementen (12-maands som)"]
            }
            TableKind::StartersIndex => &["Jaar", "Bouwsector (index)", "Niet-bouwsector (index)"],
            TableKind::YearlySummary => &[
                "Jaar",
                "1-jarige overlevingskans (%)",
                "3-jarige overlevingskans (%)",
                "Nieuwe starters",
                "Jaarlijkse faillissementen",
            ],
        }
    }

    /// CSV file name the dashboard loads this table from
    pub fn file_name(&self, config: &ReportConfig) -> String {
        match self {
            TableKind::SurvivalOneYear => "Overlevingskans na 1 jaar.csv".to_string(),
            TableKind::SurvivalThreeYear => "Overlevingskans na 3 jaar.csv".to_string(),
            TableKind::Starters => "Nieuwe starters bouwsector.csv".to_string(),
            TableKind::BankruptciesYearly => "Faillissementen bouwsector.csv".to_string(),
            TableKind::BankruptcyTrendIndex => format!(
                "12-maandelijkse trend faillissementen (index {} = 100).csv",
                config.base_year
            ),
            TableKind::BankruptcyTrendAbsolute => {
                "12-maandelijkse trend faillissementen bouwsector (absolute cijfers).csv".to_string()
            }
            TableKind::StartersIndex => format!("Nieuwe starters (index {} = 100).csv", config.base_year),
            TableKind::YearlySummary => format!(
                "Jaarlijkse cijfers bouwsector (sinds {}).csv",
                config.summary_since_year
            ),
        }
    }
}

/// One table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Int(i64),
    Decimal(f64),
    Absent,
}

impl Cell {
    /// A count; fractional parts are truncated
    pub fn count(value: f64) -> Self {
        Cell::Int(value.trunc() as i64)
    }

    pub fn decimal_or_absent(value: Option<f64>) -> Self {
        value.map_or(Cell::Absent, Cell::Decimal)
    }

    pub fn count_or_absent(value: Option<f64>) -> Self {
        value.map_or(Cell::Absent, Cell::count)
    }

    /// An unsigned total; values past `i64::MAX` are clamped
    pub fn total(value: u64) -> Self {
        Cell::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(n) => write!(f, "{}", n),
            // Whole decimals keep one fractional digit so "80.0" stays a percentage
            Cell::Decimal(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{:.1}", v),
            Cell::Decimal(v) => write!(f, "{}", v),
            Cell::Absent => f.write_str(ABSENT_MARKER),
        }
    }
}

/// A table row: its time key and the value cells after the time column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub key: TimeKey,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(key: impl Into<TimeKey>, cells: Vec<Cell>) -> Self {
        Self { key: key.into(), cells }
    }

    /// Rendered fields, time column first
    pub fn fields(&self) -> Vec<String> {
        std::iter::once(self.key.to_string())
            .chain(self.cells.iter().map(Cell::to_string))
            .collect()
    }
}

/// A table of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub kind: TableKind,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(kind: TableKind, rows: Vec<Row>) -> Self {
        Self { kind, rows }
    }

    pub fn header(&self) -> Vec<String> {
        self.kind.columns().iter().map(|c| c.to_string()).collect()
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(Row::fields).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, key: impl Into<TimeKey>) -> Option<&Row> {
        let key = key.into();
        self.rows.iter().find(|r| r.key == key)
    }
}

/// One table shape across entities, with a leading entity column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedTable {
    pub kind: TableKind,
    /// Ordered by time key, then entity
    pub rows: Vec<(GeographicEntity, Row)>,
}

impl CombinedTable {
    pub fn header(&self) -> Vec<String> {
        std::iter::once(ENTITY_COLUMN)
            .chain(self.kind.columns().iter().copied())
            .map(str::to_string)
            .collect()
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|(entity, row)| {
                std::iter::once(entity.name().to_string())
                    .chain(row.fields())
                    .collect()
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
