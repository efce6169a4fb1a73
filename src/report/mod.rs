//! Output tables: shapes, per-entity assembly and the CSV sink

mod tables;
mod assembler;
pub mod writer;

pub use tables::{Cell, Row, Table, TableKind, CombinedTable, ABSENT_MARKER};
pub use assembler::{ReportAssembler, EntityReport, combine};
pub use writer::{ReportWriter, write_table, verify_output};
