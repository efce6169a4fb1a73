//! Run configuration
//!
//! All fixed years and codes of the indicator set live here so a JSON file can
//! override them without touching the derivation code.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{PipelineError, Result};

fn default_construction_code() -> String {
    "F".to_string()
}
fn default_base_year() -> i32 { 2008 }
fn default_three_year_cutoff() -> i32 { 2021 }
fn default_bankruptcy_floor_year() -> i32 { 2005 }
fn default_summary_since_year() -> i32 { 2016 }

/// Constants shared by normalization, derivation and report assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// NACE section code that marks a record as construction
    #[serde(default = "default_construction_code")]
    pub construction_code: String,

    /// Baseline year (index = 100) for the starters and bankruptcy trend indices
    #[serde(default = "default_base_year")]
    pub base_year: i32,

    /// Last cohort year for which the 3-year survival horizon was measured
    #[serde(default = "default_three_year_cutoff")]
    pub three_year_cutoff: i32,

    /// First year listed in the yearly bankruptcy table
    #[serde(default = "default_bankruptcy_floor_year")]
    pub bankruptcy_floor_year: i32,

    /// First year listed in the combined yearly summary
    #[serde(default = "default_summary_since_year")]
    pub summary_since_year: i32,

    /// Also accumulate provinces into their region (Vlaanderen, Wallonië)
    #[serde(default)]
    pub region_rollups: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            construction_code: default_construction_code(),
            base_year: default_base_year(),
            three_year_cutoff: default_three_year_cutoff(),
            bankruptcy_floor_year: default_bankruptcy_floor_year(),
            summary_since_year: default_summary_since_year(),
            region_rollups: false,
        }
    }
}

impl ReportConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| PipelineError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
