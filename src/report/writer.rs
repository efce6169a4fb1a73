//! CSV sink: one folder per entity, one file per table

use csv::Writer;
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::assembler::{combine, EntityReport};
use super::tables::{CombinedTable, Table, TableKind};
use crate::config::ReportConfig;
use crate::error::{PipelineError, Result};

/// Folder of the cross-entity tables
pub const COMBINED_DIR: &str = "Alle entiteiten";

/// File name of the run summary in the output root
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Write one table as comma-separated text with a header row
pub fn write_table<W: Write>(table: &Table, writer: W) -> Result<()> {
    write_records(table.header(), table.records(), writer)
}

fn write_records<W: Write>(header: Vec<String>, records: Vec<Vec<String>>, writer: W) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(&header)?;
    for record in &records {
        csv_writer.write_record(record)?;
    }
    csv_writer.flush().map_err(|e| PipelineError::io("<table>", e))?;
    Ok(())
}

/// Writes reports below an output root directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    root: PathBuf,
    config: ReportConfig,
}

impl ReportWriter {
    pub fn new(root: impl Into<PathBuf>, config: ReportConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder that holds an entity's tables
    pub fn entity_dir(&self, report: &EntityReport) -> PathBuf {
        self.root.join(report.entity.name())
    }

    /// Write every table of one entity; returns the number of files written
    pub fn write_entity(&self, report: &EntityReport) -> Result<usize> {
        let dir = self.entity_dir(report);
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

        for table in &report.tables {
            let path = dir.join(table.kind.file_name(&self.config));
            let file = fs::File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
            write_table(table, file)?;
            debug!("Created {} ({} records)", path.display(), table.len());
        }

        info!("{}: wrote {} tables", report.entity, report.tables.len());
        Ok(report.tables.len())
    }

    /// Write the cross-entity version of every table shape
    pub fn write_combined(&self, reports: &[EntityReport]) -> Result<usize> {
        let dir = self.root.join(COMBINED_DIR);
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

        let tables: Vec<CombinedTable> = TableKind::ALL
            .iter()
            .map(|kind| combine(reports, *kind))
            .filter(|table| !table.is_empty())
            .collect();

        for table in &tables {
            let path = dir.join(table.kind.file_name(&self.config));
            let file = fs::File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
            write_records(table.header(), table.records(), file)?;
            debug!("Created {} ({} records)", path.display(), table.rows.len());
        }

        info!("Wrote {} combined tables to {}", tables.len(), dir.display());
        Ok(tables.len())
    }

    /// Write a JSON summary of the run next to the entity folders
    pub fn write_summary<S: Serialize>(&self, summary: &S) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).map_err(|e| PipelineError::io(&self.root, e))?;
        let path = self.root.join(SUMMARY_FILE);
        let file = fs::File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
        serde_json::to_writer_pretty(file, summary)?;
        Ok(path)
    }
}

/// Entity folders found in an output root and the CSV files each holds
///
/// Fails when the root has no entity folder at all.
pub fn verify_output(root: &Path) -> Result<Vec<(String, usize)>> {
    let entries = fs::read_dir(root).map_err(|e| PipelineError::io(root, e))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() || entry.file_name() == COMBINED_DIR {
            continue;
        }
        let csv_count = fs::read_dir(&path)
            .map_err(|e| PipelineError::io(&path, e))?
            .filter_map(|f| f.ok())
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "csv"))
            .count();
        found.push((entry.file_name().to_string_lossy().into_owned(), csv_count));
    }

    if found.is_empty() {
        return Err(PipelineError::EmptyOutput(root.to_path_buf()));
    }
    found.sort();
    Ok(found)
}
