//! Load the pipe-delimited Statbel source files into raw rows
//!
//! Rows stay untyped here; the normalizer is the only place that interprets
//! field values. The one check done at load time is that the header carries
//! every required column, since nothing can be derived without them.

use csv::{ReaderBuilder, StringRecord};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{PipelineError, Result};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Which source file a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    /// TF_VAT_SURVIVALS: cohort registrations and survivors
    Survival,
    /// TF_BANKRUPTCIES: monthly bankruptcy counts
    Bankruptcy,
}

impl SchemaKind {
    /// Columns that must be present in the header
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            SchemaKind::Survival => &[
                "CD_YEAR",
                "CD_RGN_REFNIS",
                "CD_NACE_LVL1",
                "MS_CNT_FIRST_REGISTRATIONS",
                "MS_CNT_SURV_YEAR_1",
                "MS_CNT_SURV_YEAR_2",
                "MS_CNT_SURV_YEAR_3",
                "MS_CNT_SURV_YEAR_4",
                "MS_CNT_SURV_YEAR_5",
            ],
            SchemaKind::Bankruptcy => &[
                "CD_YEAR",
                "CD_MONTH",
                "CD_RGN_REFNIS",
                "TX_NACE_REV2_SECTION",
                "MS_COUNTOF_BANKRUPTCIES",
            ],
        }
    }

    /// Required columns missing from a header
    pub fn missing_columns(&self, header: &[String]) -> Vec<String> {
        self.required_columns()
            .iter()
            .filter(|column| !header.iter().any(|h| h == *column))
            .map(|column| column.to_string())
            .collect()
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Survival => f.write_str("survival"),
            SchemaKind::Bankruptcy => f.write_str("bankruptcy"),
        }
    }
}

/// One untyped source row: column name to raw field text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    /// Build a row from (column, value) pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (normalize_header(k.as_ref()), v.into()))
            .collect();
        Self { fields }
    }

    fn from_record(header: &[String], record: &StringRecord) -> Self {
        let fields = header
            .iter()
            .zip(record.iter())
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        Self { fields }
    }

    /// Raw field text, untrimmed; None when the column is absent from the row
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches(BYTE_ORDER_MARK).trim().to_string()
}

/// Load all rows of a source file
pub fn load_rows<P: AsRef<Path>>(path: P, kind: SchemaKind) -> Result<Vec<RawRow>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let rows = read_rows(file, kind, path)?;
    info!("Loaded {} {} rows from {}", rows.len(), kind, path.display());
    Ok(rows)
}

/// Load rows from any reader (e.g., string buffer, decompressed archive entry)
pub fn load_rows_from_reader<R: Read>(reader: R, kind: SchemaKind) -> Result<Vec<RawRow>> {
    read_rows(reader, kind, Path::new("<reader>"))
}

fn read_rows<R: Read>(reader: R, kind: SchemaKind, path: &Path) -> Result<Vec<RawRow>> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'|')
        .flexible(true)
        .from_reader(reader);

    let header: Vec<String> = csv_reader.headers()?.iter().map(normalize_header).collect();

    let missing = kind.missing_columns(&header);
    if !missing.is_empty() {
        return Err(PipelineError::Schema {
            kind,
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(RawRow::from_record(&header, &record));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURVIVAL_HEADER: &str = "CD_YEAR|CD_RGN_REFNIS|CD_PROV_REFNIS|CD_NACE_LVL1|MS_CNT_FIRST_REGISTRATIONS|MS_CNT_SURV_YEAR_1|MS_CNT_SURV_YEAR_2|MS_CNT_SURV_YEAR_3|MS_CNT_SURV_YEAR_4|MS_CNT_SURV_YEAR_5";

    #[test]
    fn test_load_survival_rows() {
        let data = format!(
            "{}\n2008|02000|10000|F|100|80|70|60|55|50\n2009|04000||G|12|10|9|8|7|6\n",
            SURVIVAL_HEADER
        );
        let rows = load_rows_from_reader(data.as_bytes(), SchemaKind::Survival).expect("rows load");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("CD_PROV_REFNIS"), Some("10000"));
        assert_eq!(rows[1].get("CD_PROV_REFNIS"), Some(""));
        assert_eq!(rows[1].get("MS_CNT_SURV_YEAR_5"), Some("6"));
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let data = format!("\u{feff}{}\n2008|02000|10000|F|1|1|1|1|1|1\n", SURVIVAL_HEADER);
        let rows = load_rows_from_reader(data.as_bytes(), SchemaKind::Survival).expect("rows load");
        assert_eq!(rows[0].get("CD_YEAR"), Some("2008"));
    }

    #[test]
    fn test_missing_columns_is_fatal() {
        let data = "CD_YEAR|CD_MONTH|SOMETHING_ELSE\n2020|1|x\n";
        let err = load_rows_from_reader(data.as_bytes(), SchemaKind::Bankruptcy).unwrap_err();
        match err {
            PipelineError::Schema { kind, missing, .. } => {
                assert_eq!(kind, SchemaKind::Bankruptcy);
                assert!(missing.contains(&"TX_NACE_REV2_SECTION".to_string()));
                assert!(missing.contains(&"MS_COUNTOF_BANKRUPTCIES".to_string()));
                assert!(!missing.contains(&"CD_MONTH".to_string()));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let data = "CD_YEAR|CD_MONTH|CD_RGN_REFNIS|TX_NACE_REV2_SECTION|MS_COUNTOF_BANKRUPTCIES\n2020|1\n";
        let rows = load_rows_from_reader(data.as_bytes(), SchemaKind::Bankruptcy).expect("rows load");
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0].get("MS_COUNTOF_BANKRUPTCIES"), None);
    }

    #[test]
    fn test_province_column_is_optional() {
        let header = SURVIVAL_HEADER.replace("CD_PROV_REFNIS|", "");
        let fields: Vec<String> = header.split('|').map(str::to_string).collect();
        assert!(SchemaKind::Survival.missing_columns(&fields).is_empty());
    }
}
