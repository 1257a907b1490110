//! Agentic AI performance dashboard: three TOP-3 aggregations over a CSV
//! dataset, rendered as a single self-contained HTML page.

pub mod aggregate;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod table;

pub use error::{ReportError, Result};
