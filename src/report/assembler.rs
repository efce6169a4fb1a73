//! Joins frozen buckets and derived series into the tables of one entity

use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use super::tables::{Cell, CombinedTable, Row, Table, TableKind};
use crate::aggregate::{BankruptcyBuckets, CohortBuckets, CohortSums, YearMonth};
use crate::config::ReportConfig;
use crate::indicators::{
    DerivedSeries, Horizon, IndexSeriesBuilder, RollingWindowEngine, SurvivalRateCalculator,
};
use crate::records::{BySector, GeographicEntity, Sector};

type Cohorts = BTreeMap<i32, BySector<Option<CohortSums>>>;
type Rolling = Vec<(YearMonth, BySector<Option<f64>>)>;

/// All non-empty tables of one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityReport {
    pub entity: GeographicEntity,
    pub tables: Vec<Table>,
}

impl EntityReport {
    pub fn table(&self, kind: TableKind) -> Option<&Table> {
        self.tables.iter().find(|t| t.kind == kind)
    }
}

/// Builds entity reports from frozen bucket sets
///
/// Holds only shared references, so one assembler can serve many threads.
#[derive(Debug, Clone, Copy)]
pub struct ReportAssembler<'a> {
    config: &'a ReportConfig,
    cohorts: &'a CohortBuckets,
    bankruptcies: &'a BankruptcyBuckets,
    survival: SurvivalRateCalculator,
    rolling: RollingWindowEngine,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        config: &'a ReportConfig,
        cohorts: &'a CohortBuckets,
        bankruptcies: &'a BankruptcyBuckets,
    ) -> Self {
        Self {
            config,
            cohorts,
            bankruptcies,
            survival: SurvivalRateCalculator::from_config(config),
            rolling: RollingWindowEngine::default(),
        }
    }

    /// Tables of one entity; None when the entity has no data at all
    pub fn assemble(&self, entity: GeographicEntity) -> Option<EntityReport> {
        if !self.cohorts.has_entity(entity) && !self.bankruptcies.has_entity(entity) {
            warn!("No data for {}, skipping", entity);
            return None;
        }

        let cohorts = self.cohorts.cohorts(entity);
        let monthly = self.bankruptcies.monthly(entity);
        let yearly = self.bankruptcies.yearly(entity);

        if !monthly.is_empty() && !RollingWindowEngine::is_dense(&monthly) {
            debug!("{}: monthly bankruptcies have gaps, windows span present months", entity);
        }
        let rolling = self.rolling.rolling_sums(&monthly);

        let tables: Vec<Table> = vec![
            self.survival_table(&cohorts, Horizon::OneYear),
            self.survival_table(&cohorts, Horizon::ThreeYear),
            self.starters_table(&cohorts),
            self.bankruptcies_yearly_table(&yearly),
            self.trend_index_table(entity, &rolling),
            self.trend_absolute_table(&rolling),
            self.starters_index_table(entity, &cohorts),
            self.summary_table(&cohorts, &yearly),
        ]
        .into_iter()
        .filter(|table| {
            debug!("{}: {:?} has {} rows", entity, table.kind, table.len());
            !table.is_empty()
        })
        .collect();

        Some(EntityReport { entity, tables })
    }

    /// Tables 1 and 2: construction survival keyed by measurement year
    fn survival_table(&self, cohorts: &Cohorts, horizon: Horizon) -> Table {
        let kind = match horizon {
            Horizon::OneYear => TableKind::SurvivalOneYear,
            Horizon::ThreeYear => TableKind::SurvivalThreeYear,
        };
        let rows = self
            .survival
            .series(cohorts, Sector::Construction, horizon)
            .present()
            .map(|(year, rate)| Row::new(year, vec![Cell::Decimal(rate)]))
            .collect();
        Table::new(kind, rows)
    }

    /// Table 3: construction first registrations per cohort
    fn starters_table(&self, cohorts: &Cohorts) -> Table {
        let rows = cohorts
            .iter()
            .filter_map(|(year, sectors)| {
                sectors
                    .construction
                    .map(|sums| Row::new(*year, vec![Cell::total(sums.first_registrations)]))
            })
            .collect();
        Table::new(TableKind::Starters, rows)
    }

    /// Table 4: construction bankruptcies per year from the floor year on
    fn bankruptcies_yearly_table(&self, yearly: &BTreeMap<i32, BySector<Option<f64>>>) -> Table {
        let rows = yearly
            .range(self.config.bankruptcy_floor_year..)
            .map(|(year, sectors)| Row::new(*year, vec![Cell::count_or_absent(sectors.construction)]))
            .collect();
        Table::new(TableKind::BankruptciesYearly, rows)
    }

    /// Table 5: rolling sums per sector, indexed to the first rolling month of the base year
    fn trend_index_table(&self, entity: GeographicEntity, rolling: &Rolling) -> Table {
        let base_year = self.config.base_year;
        let Some((baseline, _)) = rolling.iter().find(|(month, _)| month.year() == base_year) else {
            if !rolling.is_empty() {
                warn!("{}: no rolling bankruptcy data in {}, trend index skipped", entity, base_year);
            }
            return Table::new(TableKind::BankruptcyTrendIndex, Vec::new());
        };

        let builder = IndexSeriesBuilder::new(*baseline);
        let indexed = BySector::<()>::default().map(|sector, _| {
            let series = DerivedSeries::from_points(rolling.iter().map(|(month, sums)| (*month, *sums.get(sector))));
            builder.rebase(&series)
        });

        if indexed.construction.is_none() && indexed.non_construction.is_none() {
            warn!("{}: rolling bankruptcy baseline {} is zero, trend index skipped", entity, baseline);
            return Table::new(TableKind::BankruptcyTrendIndex, Vec::new());
        }

        let rows = rolling
            .iter()
            .map(|(month, _)| {
                let cells = [Sector::Construction, Sector::NonConstruction]
                    .into_iter()
                    .map(|sector| {
                        let value = indexed.get(sector).as_ref().and_then(|s| s.value_at(month));
                        Cell::decimal_or_absent(value)
                    })
                    .collect();
                Row::new(*month, cells)
            })
            .collect();
        Table::new(TableKind::BankruptcyTrendIndex, rows)
    }

    /// Table 6: rolling construction sums
    fn trend_absolute_table(&self, rolling: &Rolling) -> Table {
        let rows = rolling
            .iter()
            .filter_map(|(month, sums)| sums.construction.map(|sum| Row::new(*month, vec![Cell::count(sum)])))
            .collect();
        Table::new(TableKind::BankruptcyTrendAbsolute, rows)
    }

    /// Table 7: first registrations per sector, indexed to the base year
    fn starters_index_table(&self, entity: GeographicEntity, cohorts: &Cohorts) -> Table {
        let builder = IndexSeriesBuilder::new(self.config.base_year);
        let indexed = BySector::<()>::default().map(|sector, _| {
            let series = DerivedSeries::from_points(cohorts.iter().filter_map(|(year, sectors)| {
                sectors
                    .get(sector)
                    .map(|sums| (*year, Some(sums.first_registrations as f64)))
            }));
            builder.rebase(&series)
        });

        if indexed.construction.is_none() && indexed.non_construction.is_none() {
            if !cohorts.is_empty() {
                warn!("{}: no starters in {}, starters index skipped", entity, self.config.base_year);
            }
            return Table::new(TableKind::StartersIndex, Vec::new());
        }

        let rows = cohorts
            .iter()
            .filter(|(_, sectors)| sectors.construction.is_some())
            .map(|(year, _)| {
                let cells = [Sector::Construction, Sector::NonConstruction]
                    .into_iter()
                    .map(|sector| {
                        let value = indexed.get(sector).as_ref().and_then(|s| s.value_at(year));
                        Cell::decimal_or_absent(value)
                    })
                    .collect();
                Row::new(*year, cells)
            })
            .collect();
        Table::new(TableKind::StartersIndex, rows)
    }

    /// Table 8: recent cohorts, newest first
    fn summary_table(&self, cohorts: &Cohorts, yearly: &BTreeMap<i32, BySector<Option<f64>>>) -> Table {
        let rows = cohorts
            .range(self.config.summary_since_year..)
            .rev()
            .map(|(year, sectors)| {
                let construction = sectors.construction.as_ref();
                let rate = |horizon| construction.and_then(|sums| self.survival.rate(*year, sums, horizon));
                let bankruptcies = yearly.get(year).and_then(|s| s.construction);
                Row::new(
                    *year,
                    vec![
                        Cell::decimal_or_absent(rate(Horizon::OneYear)),
                        Cell::decimal_or_absent(rate(Horizon::ThreeYear)),
                        construction.map_or(Cell::Absent, |sums| Cell::total(sums.first_registrations)),
                        Cell::count_or_absent(bankruptcies),
                    ],
                )
            })
            .collect();
        Table::new(TableKind::YearlySummary, rows)
    }
}

/// Merge one table shape across entity reports
///
/// Rows are ordered by ascending time key, then by entity order.
pub fn combine(reports: &[EntityReport], kind: TableKind) -> CombinedTable {
    let mut rows: Vec<(GeographicEntity, Row)> = reports
        .iter()
        .filter_map(|report| report.table(kind).map(|table| (report.entity, table)))
        .flat_map(|(entity, table)| table.rows.iter().cloned().map(move |row| (entity, row)))
        .collect();
    rows.sort_by(|(ea, ra), (eb, rb)| ra.key.cmp(&rb.key).then(ea.cmp(eb)));
    CombinedTable { kind, rows }
}
