//! Error types for the indicator pipeline
//!
//! Only conditions that make the whole run meaningless end up here. Bad rows
//! are counted and dropped by the normalizer instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::records::SchemaKind;

/// Fatal pipeline error
#[derive(Error, Debug)]
pub enum PipelineError {
    /// File system error while reading sources or writing tables
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited-text reader or writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Source file does not carry the expected columns
    #[error("{kind} source {} is missing required columns: {}", .path.display(), .missing.join(", "))]
    Schema {
        kind: SchemaKind,
        path: PathBuf,
        missing: Vec<String>,
    },

    /// Configuration file could not be parsed
    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Run summary could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output directory holds no entity folders after a run
    #[error("no entity output found in {}", .0.display())]
    EmptyOutput(PathBuf),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
