//! Statbel Indicators CLI
//!
//! Reads TF_VAT_SURVIVALS and TF_BANKRUPTCIES and writes the dashboard tables
//! per province into the output directory.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::time::Instant;

use statbel_indicators::report::verify_output;
use statbel_indicators::{Pipeline, ReportConfig, ReportWriter};

#[derive(Parser)]
#[command(name = "statbel-indicators")]
#[command(about = "Derive construction-sector survival and bankruptcy indicators per province")]
#[command(version)]
struct Cli {
    /// Pipe-delimited VAT survivals file
    #[arg(long, default_value = "data/TF_VAT_SURVIVALS.txt")]
    survivals: PathBuf,

    /// Pipe-delimited bankruptcies file
    #[arg(long, default_value = "data/TF_BANKRUPTCIES.txt")]
    bankruptcies: PathBuf,

    /// Output directory; one folder per province is created below it
    #[arg(short, long, default_value = "data/data-grafieken")]
    output: PathBuf,

    /// JSON file overriding the default years and codes
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also report Vlaanderen and Wallonië as rollups of their provinces
    #[arg(long)]
    region_rollups: bool,

    /// Also write every table across all entities
    #[arg(long)]
    combined: bool,

    /// Check the output directory after writing
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_json_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if cli.region_rollups {
        config.region_rollups = true;
    }

    let pipeline = Pipeline::new(config.clone());
    let output = pipeline
        .run_files(&cli.survivals, &cli.bankruptcies)
        .context("processing source files")?;

    let writer = ReportWriter::new(&cli.output, config);
    let mut failed = Vec::new();
    for report in &output.reports {
        if let Err(e) = writer.write_entity(report) {
            error!("{}: {}", report.entity, e);
            failed.push(report.entity.name());
        }
    }
    if cli.combined {
        writer
            .write_combined(&output.reports)
            .context("writing combined tables")?;
    }
    let summary_path = writer
        .write_summary(&output.summary)
        .context("writing run summary")?;
    info!("Run summary written to {}", summary_path.display());

    if cli.verify {
        let found = verify_output(&cli.output)?;
        info!("Found data for {} provinces/regions", found.len());
        for (entity, csv_count) in &found {
            info!("  - {}: {} CSV files", entity, csv_count);
        }
    }

    info!(
        "Wrote {} entities to {} in {:?}",
        output.reports.len() - failed.len(),
        cli.output.display(),
        start.elapsed()
    );

    if !failed.is_empty() {
        bail!("failed to write output for: {}", failed.join(", "));
    }
    Ok(())
}
