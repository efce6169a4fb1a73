//! Statbel Indicators - construction-sector dashboard data from Statbel open data
//!
//! This library provides:
//! - Normalization of the VAT survivals and bankruptcies source files
//! - Cohort and bankruptcy accumulation per province (and Brussels)
//! - Survival rates, rolling 12-month sums and base-year indices
//! - Assembly of the fixed dashboard tables and their CSV output

pub mod config;
pub mod error;
pub mod records;
pub mod aggregate;
pub mod indicators;
pub mod report;
pub mod pipeline;

// Re-export commonly used types
pub use config::ReportConfig;
pub use error::PipelineError;
pub use records::{GeographicEntity, Sector, RawRow, SchemaKind};
pub use report::{EntityReport, ReportWriter, TableKind};
pub use pipeline::{Pipeline, PipelineOutput, RunSummary};
