//! Load -> aggregate (x3) -> assemble -> write.

use std::path::PathBuf;

use anyhow::Context;

use crate::aggregate::{median_by_group, proportion_by_group};
use crate::diagnostics;
use crate::report::{self, ChartLibrary, ReportData, ReportMeta};
use crate::source::{self, Location};
use crate::table::{columns, Table};

#[derive(Debug, Clone)]
pub struct Config {
    pub input: String,
    /// Zero-based CSV record holding the column names.
    pub header_row: usize,
    pub chart_lib: String,
    pub out: PathBuf,
    pub meta: ReportMeta,
}

/// (group column, target column) for each chart, in report order.
const AGGREGATIONS: [(&str, &str); 3] = [
    (columns::AGENT_TYPE, columns::MULTIMODAL_CAPABILITY),
    (columns::MODEL_ARCHITECTURE, columns::MULTIMODAL_CAPABILITY),
    (columns::TASK_CATEGORY, columns::BIAS_DETECTION_SCORE),
];

pub fn build_report_data(table: &Table) -> crate::Result<ReportData> {
    let [agents, architectures, tasks] = AGGREGATIONS;

    Ok(ReportData {
        total_rows: table.len(),
        data1: proportion_by_group(table, agents.0, agents.1)?,
        data2: proportion_by_group(table, architectures.0, architectures.1)?,
        data3: median_by_group(table, tasks.0, tasks.1)?,
    })
}

fn warn_incomplete(table: &Table) -> crate::Result<()> {
    for (group, target) in AGGREGATIONS {
        let skipped = table.count_incomplete(&[group, target])?;
        if skipped > 0 {
            diagnostics::warn(format!(
                "skipping {skipped} rows with empty {group} or {target}"
            ));
        }
    }
    Ok(())
}

fn print_summary(data: &ReportData) {
    eprintln!("\n=== Multimodal support by agent type (TOP 3) ===");
    for (i, item) in data.data1.iter().enumerate() {
        eprintln!("  {}. {}", i + 1, item);
    }

    eprintln!("\n=== Multimodal support by model architecture (TOP 3) ===");
    for (i, item) in data.data2.iter().enumerate() {
        eprintln!("  {}. {}", i + 1, item);
    }

    eprintln!("\n=== Median bias detection score by task category (TOP 3) ===");
    for (i, item) in data.data3.iter().enumerate() {
        eprintln!("  {}. {}", i + 1, item);
    }
    eprintln!();
}

/// Run the whole pipeline. Nothing is written unless every earlier step
/// succeeds.
pub async fn run(config: &Config) -> anyhow::Result<ReportData> {
    let input = Location::parse(&config.input);
    diagnostics::info(format!("Loading data from {input}"));

    let bytes = source::fetch(&input)
        .await
        .with_context(|| format!("Failed to load dataset: {input}"))?;
    let table = Table::from_csv(&bytes, config.header_row, &input.to_string())?;
    diagnostics::info(format!("Loaded {} records", table.len()));

    warn_incomplete(&table)?;
    let data = build_report_data(&table)?;
    print_summary(&data);

    let chart_location = Location::parse(&config.chart_lib);
    let chart_library = ChartLibrary::fetch(&chart_location)
        .await
        .with_context(|| format!("Failed to load chart library: {chart_location}"))?;

    let html = report::assemble(&data, &config.meta, &chart_library)?;
    report::write_report(&config.out, &html)?;
    diagnostics::info(format!("Dashboard written to {}", config.out.display()));

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_report_data_uses_dataset_columns() {
        let csv = "\
agent_type,model_architecture,task_category,multimodal_capability,bias_detection_score
Chatbot,Transformer,Coding,True,0.4
Chatbot,Mixture,Coding,False,0.6
Planner,Transformer,Research,True,0.9
";
        let table = Table::from_csv(csv.as_bytes(), 0, "inline").unwrap();
        let data = build_report_data(&table).unwrap();

        assert_eq!(data.total_rows, 3);
        assert_eq!(data.data1[0].name, "Planner");
        assert_eq!(data.data1[1].proportion, 50.0);
        assert_eq!(data.data2[0].name, "Transformer");
        assert_eq!(data.data2[0].count, 2);
        assert_eq!(data.data3[0].name, "Research");
        assert!((data.data3[1].median - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_build_report_data_requires_every_column() {
        let table =
            Table::from_csv(b"agent_type,multimodal_capability\nA,True\n", 0, "inline").unwrap();
        let err = build_report_data(&table).unwrap_err();
        assert!(err.to_string().contains("model_architecture"));
    }
}
