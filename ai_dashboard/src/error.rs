//! Typed failures for loading, aggregating and writing the dashboard.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    /// An input (dataset or chart library) could not be obtained.
    #[error("missing resource {location}: {reason}")]
    MissingResource { location: String, reason: String },

    /// A column referenced by an aggregation is absent from the header.
    #[error("missing column '{column}' (available: {})", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// A non-empty cell that cannot be read as the column's type.
    /// `row` is 1-based over data rows, after the header.
    #[error("invalid value {value:?} in column '{column}' at data row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("failed to parse CSV from {location}")]
    Csv {
        location: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to serialize report data")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub fn missing_resource(location: impl Into<String>, reason: impl ToString) -> Self {
        ReportError::MissingResource {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}
