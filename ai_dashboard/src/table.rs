//! In-memory table loaded from CSV, addressed by column name.

use csv::{ReaderBuilder, StringRecord};

use crate::error::{ReportError, Result};

/// Column names of the agentic AI performance dataset.
pub mod columns {
    pub const AGENT_TYPE: &str = "agent_type";
    pub const MODEL_ARCHITECTURE: &str = "model_architecture";
    pub const TASK_CATEGORY: &str = "task_category";
    pub const MULTIMODAL_CAPABILITY: &str = "multimodal_capability";
    pub const BIAS_DETECTION_SCORE: &str = "bias_detection_score";
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<StringRecord>) -> Self {
        Self { headers, rows }
    }

    /// Parse CSV bytes. Records before `header_row` (zero-based) are title
    /// rows and are dropped; the record at `header_row` names the columns.
    pub fn from_csv(bytes: &[u8], header_row: usize, location: &str) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|source| ReportError::Csv {
                location: location.to_string(),
                source,
            })?;

            if idx < header_row {
                continue;
            }
            if headers.is_none() {
                headers = Some(
                    record
                        .iter()
                        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
                        .collect(),
                );
                continue;
            }
            rows.push(record);
        }

        Ok(Self::new(headers.unwrap_or_default(), rows))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> impl Iterator<Item = &StringRecord> {
        self.rows.iter()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReportError::MissingColumn {
                column: name.to_string(),
                available: self.headers.clone(),
            })
    }

    /// Number of rows with an empty cell in any of `columns`.
    pub fn count_incomplete(&self, columns: &[&str]) -> Result<usize> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;

        Ok(self
            .rows
            .iter()
            .filter(|record| indices.iter().any(|&i| cell(record, i).is_none()))
            .count())
    }
}

/// Trimmed cell contents; empty and short rows read as absent.
pub fn cell(record: &StringRecord, index: usize) -> Option<&str> {
    record
        .get(index)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "1.0" => Some(true),
        "false" | "0" | "no" | "n" | "0.0" => Some(false),
        _ => None,
    }
}

/// Finite numbers only; `NaN` and `inf` are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
