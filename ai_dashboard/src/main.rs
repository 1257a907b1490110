use std::path::PathBuf;

use ai_dashboard::diagnostics;
use ai_dashboard::pipeline::{self, Config};
use ai_dashboard::report::ReportMeta;
use clap::Parser;

#[derive(Parser)]
#[command(name = "ai_dashboard")]
#[command(about = "Agentic AI performance dashboard generator", long_about = None)]
struct Cli {
    /// Dataset CSV (local path or s3://bucket/key).
    #[arg(long, default_value = "agentic_ai_performance_dataset.csv")]
    input: String,

    /// Zero-based row holding the column names; earlier rows are skipped.
    /// The dataset export carries a title on row 0.
    #[arg(long, default_value_t = 1)]
    header_row: usize,

    /// Chart library script (local path or s3://bucket/key).
    #[arg(long, default_value = "chart.umd.min.js")]
    chart_lib: String,

    #[arg(short = 'o', long, default_value = "data-dashboard.html")]
    out: PathBuf,

    #[arg(long, default_value = "Agentic AI Performance Dashboard")]
    title: String,

    /// Also print the aggregated results as JSON on stdout.
    #[arg(long)]
    json: bool,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config {
        input: cli.input,
        header_row: cli.header_row,
        chart_lib: cli.chart_lib,
        out: cli.out,
        meta: ReportMeta {
            title: cli.title,
            ..ReportMeta::default()
        },
    };

    let data = pipeline::run(&config).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{}", diagnostics::error_message(format!("{err:#}")));
        std::process::exit(1);
    }
}
