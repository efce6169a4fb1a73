//! Source records: typed data model, row normalization and file loading

mod data;
mod normalizer;
pub mod loader;

pub use data::{
    GeographicEntity, Sector, BySector, SurvivalRecord, BankruptcyRecord,
    BRUSSELS_REGION_CODE, SURVIVAL_HORIZONS,
};
pub use normalizer::{RecordNormalizer, DropReason, DropCounts, parse_number};
pub use loader::{RawRow, SchemaKind, load_rows, load_rows_from_reader};
