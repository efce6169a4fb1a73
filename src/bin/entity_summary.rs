//! Print the yearly construction summary of one province
//!
//! Usage: cargo run --bin entity_summary -- <province name or REFNIS code>

use anyhow::{anyhow, Context, Result};
use statbel_indicators::report::Cell;
use statbel_indicators::{GeographicEntity, Pipeline, ReportConfig, TableKind};
use std::env;
use std::path::Path;

fn find_entity(query: &str) -> Option<GeographicEntity> {
    GeographicEntity::REPORTED
        .iter()
        .chain(GeographicEntity::ROLLUP_REGIONS.iter())
        .copied()
        .find(|e| e.name().eq_ignore_ascii_case(query) || e.code() == query)
}

fn main() -> Result<()> {
    env_logger::init();

    let query = env::args().nth(1).unwrap_or_else(|| "Antwerpen".to_string());
    let entity = find_entity(&query).ok_or_else(|| anyhow!("unknown province or region: {}", query))?;

    let config = ReportConfig {
        region_rollups: entity.has_provinces(),
        ..ReportConfig::default()
    };
    let since = config.summary_since_year;
    let pipeline = Pipeline::new(config);
    let output = pipeline
        .run_files(
            Path::new("data/TF_VAT_SURVIVALS.txt"),
            Path::new("data/TF_BANKRUPTCIES.txt"),
        )
        .context("processing source files")?;

    println!("{} ({})", entity.name(), entity.code());
    println!("{}", "=".repeat(60));

    let Some(table) = output
        .reports
        .iter()
        .find(|r| r.entity == entity)
        .and_then(|r| r.table(TableKind::YearlySummary))
    else {
        println!("No cohorts since {}", since);
        return Ok(());
    };

    println!("{:>6} {:>10} {:>10} {:>10} {:>12}", "Jaar", "1j (%)", "3j (%)", "Starters", "Faillissem.");
    println!("{}", "-".repeat(52));
    for row in &table.rows {
        let cells: Vec<String> = row.cells.iter().map(Cell::to_string).collect();
        println!(
            "{:>6} {:>10} {:>10} {:>10} {:>12}",
            row.key.to_string(), cells[0], cells[1], cells[2], cells[3]
        );
    }

    let summary = &output.summary;
    println!("\nSource rows:");
    println!("  Survivals:    {} accepted, {} dropped", summary.survival_rows.accepted, summary.survival_rows.dropped());
    println!("  Bankruptcies: {} accepted, {} dropped", summary.bankruptcy_rows.accepted, summary.bankruptcy_rows.dropped());
    Ok(())
}
