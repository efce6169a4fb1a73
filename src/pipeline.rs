//! Two-phase indicator run
//!
//! Phase one normalizes every raw row and accumulates it into the aggregators.
//! The aggregators are then frozen. Phase two assembles each entity's tables
//! from the frozen buckets; entities share no mutable state, so they are
//! assembled in parallel and re-ordered afterwards.

use log::info;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::aggregate::{BankruptcyAggregator, BankruptcyBuckets, CohortAggregator, CohortBuckets};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::records::{load_rows, DropCounts, GeographicEntity, RawRow, RecordNormalizer, SchemaKind};
use crate::report::{EntityReport, ReportAssembler, TableKind};

/// Frozen result of the ingestion phase
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub cohorts: CohortBuckets,
    pub bankruptcies: BankruptcyBuckets,
    pub survival_counts: DropCounts,
    pub bankruptcy_counts: DropCounts,
}

/// Tables written for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub entity: String,
    pub tables: Vec<(TableKind, usize)>,
}

/// Data-quality and output overview of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub config: ReportConfig,
    pub survival_rows: DropCounts,
    pub bankruptcy_rows: DropCounts,
    pub zero_bankruptcy_rows: u64,
    pub cohort_buckets: usize,
    pub monthly_bankruptcy_buckets: usize,
    pub yearly_bankruptcy_buckets: usize,
    pub entities: Vec<EntitySummary>,
    pub entities_without_data: Vec<String>,
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub reports: Vec<EntityReport>,
    pub summary: RunSummary,
}

/// Runs normalization, accumulation and derivation for one configuration
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: ReportConfig,
}

impl Pipeline {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Entities reported on, in stable order
    pub fn entities(&self) -> Vec<GeographicEntity> {
        let mut entities = GeographicEntity::REPORTED.to_vec();
        if self.config.region_rollups {
            entities.extend(GeographicEntity::ROLLUP_REGIONS);
        }
        entities
    }

    /// Phase one: normalize and accumulate every row, then freeze the buckets
    pub fn ingest(&self, survival_rows: &[RawRow], bankruptcy_rows: &[RawRow]) -> IngestedData {
        let mut normalizer = RecordNormalizer::new(self.config.construction_code.clone());
        let mut cohorts = CohortAggregator::new();
        let mut bankruptcies = BankruptcyAggregator::new();

        for row in survival_rows {
            if let Some(record) = normalizer.normalize_survival(row) {
                cohorts.add(&record);
                if let Some(region) = self.rollup_region(record.entity) {
                    cohorts.add(&record.with_entity(region));
                }
            }
        }

        for row in bankruptcy_rows {
            if let Some(record) = normalizer.normalize_bankruptcy(row) {
                bankruptcies.add(&record);
                if let Some(region) = self.rollup_region(record.entity) {
                    bankruptcies.add(&record.with_entity(region));
                }
            }
        }

        let survival_counts = normalizer.survival_counts();
        let bankruptcy_counts = normalizer.bankruptcy_counts();
        info!(
            "Survival rows: {} accepted, {} dropped; bankruptcy rows: {} accepted, {} dropped",
            survival_counts.accepted,
            survival_counts.dropped(),
            bankruptcy_counts.accepted,
            bankruptcy_counts.dropped()
        );

        let data = IngestedData {
            cohorts: cohorts.finish(),
            bankruptcies: bankruptcies.finish(),
            survival_counts,
            bankruptcy_counts,
        };
        info!(
            "Frozen {} cohort buckets, {} monthly and {} yearly bankruptcy buckets",
            data.cohorts.len(),
            data.bankruptcies.monthly_len(),
            data.bankruptcies.yearly_len()
        );
        data
    }

    fn rollup_region(&self, entity: GeographicEntity) -> Option<GeographicEntity> {
        if self.config.region_rollups {
            entity.region()
        } else {
            None
        }
    }

    /// Phase two: assemble the tables of every entity that has data
    pub fn derive(&self, data: &IngestedData) -> Vec<EntityReport> {
        let assembler = ReportAssembler::new(&self.config, &data.cohorts, &data.bankruptcies);
        let mut reports: Vec<EntityReport> = self
            .entities()
            .par_iter()
            .filter_map(|entity| assembler.assemble(*entity))
            .collect();
        reports.sort_by_key(|r| r.entity);
        info!("Assembled reports for {} entities", reports.len());
        reports
    }

    /// Both phases over in-memory rows
    pub fn run(&self, survival_rows: &[RawRow], bankruptcy_rows: &[RawRow]) -> PipelineOutput {
        let data = self.ingest(survival_rows, bankruptcy_rows);
        let reports = self.derive(&data);
        let summary = self.summarize(&data, &reports);
        PipelineOutput { reports, summary }
    }

    /// Both phases over the two source files
    pub fn run_files(&self, survival_path: &Path, bankruptcy_path: &Path) -> Result<PipelineOutput> {
        let survival_rows = load_rows(survival_path, SchemaKind::Survival)?;
        let bankruptcy_rows = load_rows(bankruptcy_path, SchemaKind::Bankruptcy)?;
        Ok(self.run(&survival_rows, &bankruptcy_rows))
    }

    fn summarize(&self, data: &IngestedData, reports: &[EntityReport]) -> RunSummary {
        let entities = reports
            .iter()
            .map(|report| EntitySummary {
                entity: report.entity.name().to_string(),
                tables: report.tables.iter().map(|t| (t.kind, t.len())).collect(),
            })
            .collect();
        let entities_without_data = self
            .entities()
            .into_iter()
            .filter(|e| !reports.iter().any(|r| r.entity == *e))
            .map(|e| e.name().to_string())
            .collect();

        RunSummary {
            config: self.config.clone(),
            survival_rows: data.survival_counts,
            bankruptcy_rows: data.bankruptcy_counts,
            zero_bankruptcy_rows: data.bankruptcies.zero_counts(),
            cohort_buckets: data.cohorts.len(),
            monthly_bankruptcy_buckets: data.bankruptcies.monthly_len(),
            yearly_bankruptcy_buckets: data.bankruptcies.yearly_len(),
            entities,
            entities_without_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{BucketKey, YearMonth};
    use crate::records::{load_rows_from_reader, Sector};
    use crate::report::{write_table, Cell};

    fn survival(year: i32, region: &str, province: &str, nace: &str, regs: u64, surv: [u64; 5]) -> RawRow {
        RawRow::from_pairs([
            ("CD_YEAR", year.to_string()),
            ("CD_RGN_REFNIS", region.to_string()),
            ("CD_PROV_REFNIS", province.to_string()),
            ("CD_NACE_LVL1", nace.to_string()),
            ("MS_CNT_FIRST_REGISTRATIONS", regs.to_string()),
            ("MS_CNT_SURV_YEAR_1", surv[0].to_string()),
            ("MS_CNT_SURV_YEAR_2", surv[1].to_string()),
            ("MS_CNT_SURV_YEAR_3", surv[2].to_string()),
            ("MS_CNT_SURV_YEAR_4", surv[3].to_string()),
            ("MS_CNT_SURV_YEAR_5", surv[4].to_string()),
        ])
    }

    fn bankruptcy(year: i32, month: u32, region: &str, province: &str, section: &str, count: &str) -> RawRow {
        RawRow::from_pairs([
            ("CD_YEAR", year.to_string()),
            ("CD_MONTH", month.to_string()),
            ("CD_RGN_REFNIS", region.to_string()),
            ("CD_PROV_REFNIS", province.to_string()),
            ("TX_NACE_REV2_SECTION", section.to_string()),
            ("MS_COUNTOF_BANKRUPTCIES", count.to_string()),
        ])
    }

    fn report_for(output: &PipelineOutput, entity: GeographicEntity) -> &EntityReport {
        output
            .reports
            .iter()
            .find(|r| r.entity == entity)
            .expect("entity report present")
    }

    fn render(output: &PipelineOutput) -> Vec<u8> {
        let mut buffer = Vec::new();
        for report in &output.reports {
            buffer.extend_from_slice(report.entity.name().as_bytes());
            buffer.push(b'\n');
            for table in &report.tables {
                write_table(table, &mut buffer).unwrap();
            }
        }
        buffer
    }

    fn sample_rows() -> (Vec<RawRow>, Vec<RawRow>) {
        let mut survivals = vec![
            survival(2008, "02000", "10000", "F", 60, [50, 45, 40, 35, 30]),
            survival(2008, "02000", "10000", "F", 40, [30, 28, 25, 20, 18]),
            survival(2008, "02000", "10000", "G", 300, [250, 220, 200, 180, 160]),
            survival(2010, "02000", "10000", "F", 75, [60, 50, 45, 40, 35]),
            survival(2017, "04000", "", "F", 20, [18, 16, 15, 14, 13]),
            survival(2017, "02000", "", "F", 20, [18, 16, 15, 14, 13]),
            survival(2017, "03000", "50000", "F", 0, [0, 0, 0, 0, 0]),
        ];
        survivals.push(survival(2018, "03000", "99999", "F", 5, [5, 5, 5, 5, 5]));

        let mut bankruptcies = Vec::new();
        for month in 1..=12 {
            bankruptcies.push(bankruptcy(2008, month, "02000", "10000", "F", "10"));
            bankruptcies.push(bankruptcy(2008, month, "02000", "10000", "C", "4"));
        }
        bankruptcies.push(bankruptcy(2009, 1, "02000", "10000", "F", "0"));
        bankruptcies.push(bankruptcy(2017, 6, "04000", "", "F", "7"));
        (survivals, bankruptcies)
    }

    #[test]
    fn test_one_year_survival_scenario() {
        let (survivals, bankruptcies) = sample_rows();
        let output = Pipeline::default().run(&survivals, &bankruptcies);
        let table = report_for(&output, GeographicEntity::Antwerpen)
            .table(TableKind::SurvivalOneYear)
            .unwrap();
        let row = table.row(2009).expect("cohort 2008 measured in 2009");
        assert_eq!(row.cells, vec![Cell::Decimal(80.0)]);
        assert_eq!(row.fields(), vec!["2009", "80.0"]);
    }

    #[test]
    fn test_rolling_sum_scenario() {
        let (survivals, bankruptcies) = sample_rows();
        let output = Pipeline::default().run(&survivals, &bankruptcies);
        let table = report_for(&output, GeographicEntity::Antwerpen)
            .table(TableKind::BankruptcyTrendAbsolute)
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].fields(), vec!["2008-12", "120"]);
    }

    #[test]
    fn test_starters_index_scenario() {
        let (survivals, bankruptcies) = sample_rows();
        let output = Pipeline::default().run(&survivals, &bankruptcies);
        let table = report_for(&output, GeographicEntity::Antwerpen)
            .table(TableKind::StartersIndex)
            .unwrap();
        assert_eq!(table.row(2008).unwrap().cells[0], Cell::Decimal(100.0));
        assert_eq!(table.row(2010).unwrap().cells[0], Cell::Decimal(75.0));
    }

    #[test]
    fn test_starters_index_from_fifty_to_seventy_five() {
        let survivals = vec![
            survival(2008, "04000", "", "F", 50, [40, 30, 30, 20, 20]),
            survival(2010, "04000", "", "F", 75, [60, 50, 45, 40, 35]),
        ];
        let output = Pipeline::default().run(&survivals, &[]);
        let table = report_for(&output, GeographicEntity::Brussels)
            .table(TableKind::StartersIndex)
            .unwrap();
        assert_eq!(table.row(2008).unwrap().cells[0], Cell::Decimal(100.0));
        assert_eq!(table.row(2010).unwrap().cells[0], Cell::Decimal(150.0));
        assert_eq!(table.row(2010).unwrap().fields()[1], "150.0");
    }

    #[test]
    fn test_drop_counts_are_reported() {
        let (survivals, bankruptcies) = sample_rows();
        let output = Pipeline::default().run(&survivals, &bankruptcies);
        let summary = &output.summary;
        assert_eq!(summary.survival_rows.accepted, 5);
        assert_eq!(summary.survival_rows.unmapped_geography, 2);
        assert_eq!(summary.survival_rows.zero_registrations, 1);
        assert_eq!(summary.bankruptcy_rows.accepted, 26);
        assert_eq!(summary.zero_bankruptcy_rows, 1);
        assert!(summary.entities_without_data.contains(&"Namen".to_string()));
        assert!(!summary.entities_without_data.contains(&"Brussels".to_string()));
    }

    #[test]
    fn test_bucket_sums_match_manual_summation() {
        let (survivals, bankruptcies) = sample_rows();
        let pipeline = Pipeline::default();
        let data = pipeline.ingest(&survivals, &bankruptcies);

        let key = BucketKey::new(GeographicEntity::Antwerpen, Sector::Construction, 2008);
        let sums = data.cohorts.get(&key).unwrap();
        assert_eq!(sums.first_registrations, 60 + 40);
        assert_eq!(sums.survivors, [80, 73, 65, 55, 48]);

        let yearly = BucketKey::new(GeographicEntity::Antwerpen, Sector::NonConstruction, 2008);
        assert_eq!(data.bankruptcies.yearly_bucket(&yearly), Some(48.0));
        let zero_month = BucketKey::new(GeographicEntity::Antwerpen, Sector::Construction, YearMonth::new(2009, 1).unwrap());
        assert_eq!(data.bankruptcies.monthly_bucket(&zero_month), None);
    }

    #[test]
    fn test_ingestion_is_order_independent() {
        let (survivals, bankruptcies) = sample_rows();
        let pipeline = Pipeline::default();
        let forward = pipeline.ingest(&survivals, &bankruptcies);

        let reversed_survivals: Vec<RawRow> = survivals.into_iter().rev().collect();
        let reversed_bankruptcies: Vec<RawRow> = bankruptcies.into_iter().rev().collect();
        let backward = pipeline.ingest(&reversed_survivals, &reversed_bankruptcies);

        assert_eq!(forward.cohorts, backward.cohorts);
        assert_eq!(forward.bankruptcies, backward.bankruptcies);
    }

    #[test]
    fn test_runs_are_byte_identical() {
        let (survivals, bankruptcies) = sample_rows();
        let pipeline = Pipeline::default();
        let first = render(&pipeline.run(&survivals, &bankruptcies));
        let second = render(&pipeline.run(&survivals, &bankruptcies));
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_region_rollups() {
        let (survivals, bankruptcies) = sample_rows();
        let config = ReportConfig {
            region_rollups: true,
            ..ReportConfig::default()
        };
        let pipeline = Pipeline::new(config);
        let data = pipeline.ingest(&survivals, &bankruptcies);

        let province = BucketKey::new(GeographicEntity::Antwerpen, Sector::Construction, 2008);
        let region = BucketKey::new(GeographicEntity::Vlaanderen, Sector::Construction, 2008);
        assert_eq!(data.cohorts.get(&province), data.cohorts.get(&region));

        let brussels = BucketKey::new(GeographicEntity::Brussels, Sector::Construction, 2017);
        assert_eq!(data.cohorts.get(&brussels).map(|s| s.first_registrations), Some(20));

        let output = pipeline.run(&survivals, &bankruptcies);
        let entities: Vec<GeographicEntity> = output.reports.iter().map(|r| r.entity).collect();
        assert_eq!(
            entities,
            vec![GeographicEntity::Antwerpen, GeographicEntity::Brussels, GeographicEntity::Vlaanderen]
        );
    }

    #[test]
    fn test_summary_marks_unmeasured_horizons() {
        let (mut survivals, bankruptcies) = sample_rows();
        survivals.push(survival(2023, "04000", "", "F", 10, [9, 0, 0, 0, 0]));
        let output = Pipeline::default().run(&survivals, &bankruptcies);
        let table = report_for(&output, GeographicEntity::Brussels)
            .table(TableKind::YearlySummary)
            .unwrap();
        assert_eq!(
            table.records(),
            vec![
                vec!["2023", "90.0", "-", "10", "-"],
                vec!["2017", "90.0", "75.0", "20", "7"],
            ]
        );
    }

    #[test]
    fn test_out_of_range_input_is_dropped_not_fatal() {
        let huge = "99999999999999999999";
        let mut survivals = vec![
            RawRow::from_pairs([
                ("CD_YEAR", "2147483647"),
                ("CD_RGN_REFNIS", "04000"),
                ("CD_PROV_REFNIS", ""),
                ("CD_NACE_LVL1", "F"),
                ("MS_CNT_FIRST_REGISTRATIONS", "5"),
                ("MS_CNT_SURV_YEAR_1", "4"),
                ("MS_CNT_SURV_YEAR_2", "3"),
                ("MS_CNT_SURV_YEAR_3", "3"),
                ("MS_CNT_SURV_YEAR_4", "2"),
                ("MS_CNT_SURV_YEAR_5", "2"),
            ]),
        ];
        for _ in 0..2 {
            survivals.push(RawRow::from_pairs([
                ("CD_YEAR", "2010"),
                ("CD_RGN_REFNIS", "04000"),
                ("CD_PROV_REFNIS", ""),
                ("CD_NACE_LVL1", "F"),
                ("MS_CNT_FIRST_REGISTRATIONS", huge),
                ("MS_CNT_SURV_YEAR_1", "1"),
                ("MS_CNT_SURV_YEAR_2", "1"),
                ("MS_CNT_SURV_YEAR_3", "1"),
                ("MS_CNT_SURV_YEAR_4", "1"),
                ("MS_CNT_SURV_YEAR_5", "1"),
            ]));
        }
        survivals.push(survival(2008, "02000", "10000", "F", 100, [80, 70, 60, 50, 40]));

        let output = Pipeline::default().run(&survivals, &[]);
        assert_eq!(output.summary.survival_rows.missing_time, 1);
        assert_eq!(output.summary.survival_rows.invalid_number, 2);
        assert_eq!(output.summary.survival_rows.accepted, 1);
        let table = report_for(&output, GeographicEntity::Antwerpen)
            .table(TableKind::SurvivalOneYear)
            .unwrap();
        assert_eq!(table.records(), vec![vec!["2009", "80.0"]]);
    }

    #[test]
    fn test_pipeline_from_delimited_text() {
        let survival_text = "\u{feff}CD_YEAR|CD_RGN_REFNIS|CD_PROV_REFNIS|CD_NACE_LVL1|MS_CNT_FIRST_REGISTRATIONS|MS_CNT_SURV_YEAR_1|MS_CNT_SURV_YEAR_2|MS_CNT_SURV_YEAR_3|MS_CNT_SURV_YEAR_4|MS_CNT_SURV_YEAR_5\n\
            2008 |02000|70000|F|1.200|960|900|840|800|700\n";
        let bankruptcy_text = "CD_YEAR|CD_MONTH|CD_RGN_REFNIS|CD_PROV_REFNIS|TX_NACE_REV2_SECTION|MS_COUNTOF_BANKRUPTCIES\n\
            2008|3|02000|70000|F|2\n";
        let survivals = load_rows_from_reader(survival_text.as_bytes(), SchemaKind::Survival).unwrap();
        let bankruptcies = load_rows_from_reader(bankruptcy_text.as_bytes(), SchemaKind::Bankruptcy).unwrap();

        let output = Pipeline::default().run(&survivals, &bankruptcies);
        let report = report_for(&output, GeographicEntity::Limburg);
        let starters = report.table(TableKind::Starters).unwrap();
        assert_eq!(starters.records(), vec![vec!["2008", "1200"]]);
        let survival = report.table(TableKind::SurvivalOneYear).unwrap();
        assert_eq!(survival.records(), vec![vec!["2009", "80.0"]]);
        let yearly = report.table(TableKind::BankruptciesYearly).unwrap();
        assert_eq!(yearly.records(), vec![vec!["2008", "2"]]);
    }
}
