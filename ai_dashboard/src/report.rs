//! Static HTML dashboard: three horizontal bar charts plus a record count,
//! with the chart library and the ranked results embedded inline.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::aggregate::{MedianResult, ProportionResult};
use crate::error::{ReportError, Result};
use crate::source::{self, Location};

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportData {
    pub total_rows: usize,
    /// Multimodal share by agent type.
    pub data1: Vec<ProportionResult>,
    /// Multimodal share by model architecture.
    pub data2: Vec<ProportionResult>,
    /// Median bias detection score by task category.
    pub data3: Vec<MedianResult>,
}

#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub title: String,
    pub subtitle: String,
    pub source_label: String,
}

impl Default for ReportMeta {
    fn default() -> Self {
        Self {
            title: "Agentic AI Performance Dashboard".to_string(),
            subtitle: "Multimodal support and bias detection overview".to_string(),
            source_label: "Agentic AI Performance Dataset 2025".to_string(),
        }
    }
}

/// Opaque chart library script, embedded verbatim.
#[derive(Debug, Clone)]
pub struct ChartLibrary(String);

impl ChartLibrary {
    pub fn new(source: impl Into<String>) -> Self {
        ChartLibrary(source.into())
    }

    pub async fn fetch(location: &Location) -> Result<Self> {
        source::fetch_text(location).await.map(ChartLibrary)
    }

    pub fn source(&self) -> &str {
        &self.0
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON for a `<script>` block. `<` never appears raw, so no value can
/// close the element early.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

/// Render the full dashboard document.
pub fn assemble(
    data: &ReportData,
    meta: &ReportMeta,
    chart_library: &ChartLibrary,
) -> Result<String> {
    let data1_js = script_json(&data.data1)?;
    let data2_js = script_json(&data.data2)?;
    let data3_js = script_json(&data.data3)?;

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #f5f7fa; padding: 20px; line-height: 1.6; }}
        .container {{ max-width: 1200px; margin: 0 auto; background: white; border-radius: 12px; padding: 30px; box-shadow: 0 2px 10px rgba(0, 0, 0, 0.08); }}
        h1 {{ color: #2c3e50; text-align: center; margin-bottom: 10px; font-size: 2em; }}
        .subtitle {{ text-align: center; color: #7f8c8d; margin-bottom: 30px; font-size: 1.1em; }}

        /* Charts */
        .chart-section {{ margin-bottom: 40px; background: #fafbfc; padding: 20px; border-radius: 8px; }}
        .chart-title {{ color: #34495e; font-size: 1.2em; margin-bottom: 15px; font-weight: 600; }}
        .chart-container {{ position: relative; height: 300px; }}

        /* Info panel */
        .info-box {{ background: #e8f4f8; padding: 15px 20px; border-left: 4px solid #3498db; margin: 0 0 30px 0; border-radius: 4px; }}
        .info-box p {{ color: #2c3e50; margin: 5px 0; }}

        @media (max-width: 768px) {{
            body {{ padding: 10px; }}
            .container {{ padding: 20px; }}
            h1 {{ font-size: 1.5em; }}
            .subtitle {{ font-size: 0.9em; }}
            .chart-container {{ height: 250px; }}
            .chart-title {{ font-size: 1em; }}
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <p class="subtitle">{subtitle}</p>

        <div class="info-box">
            <p><strong>Total records:</strong> <span id="totalRows">{total_rows}</span></p>
            <p><strong>Data source:</strong> {source_label}</p>
        </div>

        <div class="chart-section">
            <h2 class="chart-title">Agent types with the highest multimodal support (TOP 3)</h2>
            <div class="chart-container">
                <canvas id="chart1"></canvas>
            </div>
        </div>

        <div class="chart-section">
            <h2 class="chart-title">Model architectures with the highest multimodal support (TOP 3)</h2>
            <div class="chart-container">
                <canvas id="chart2"></canvas>
            </div>
        </div>

        <div class="chart-section">
            <h2 class="chart-title">Task categories by median bias detection score (TOP 3)</h2>
            <div class="chart-container">
                <canvas id="chart3"></canvas>
            </div>
        </div>
    </div>

    <script>
{chart_library}
    </script>

    <script>
        const data1 = {data1_js};
        const data2 = {data2_js};
        const data3 = {data3_js};

        function proportionConfig(data, colors) {{
            return {{
                type: 'bar',
                data: {{
                    labels: data.map(item => item.name),
                    datasets: [{{
                        label: 'Multimodal support (%)',
                        data: data.map(item => item.proportion),
                        backgroundColor: colors,
                        borderWidth: 0,
                        borderRadius: 5
                    }}]
                }},
                options: {{
                    indexAxis: 'y',
                    responsive: true,
                    maintainAspectRatio: false,
                    plugins: {{
                        legend: {{ display: false }},
                        tooltip: {{
                            callbacks: {{
                                label: function(context) {{
                                    const item = data[context.dataIndex];
                                    return `Share: ${{item.proportion}}% (${{item.count}}/${{item.total}})`;
                                }}
                            }}
                        }}
                    }},
                    scales: {{
                        x: {{ beginAtZero: true, max: 100, title: {{ display: true, text: 'Share (%)' }} }}
                    }}
                }}
            }};
        }}

        const chart1Config = proportionConfig(data1, ['#a8dadc', '#457b9d', '#1d3557']);
        const chart2Config = proportionConfig(data2, ['#b8e0d2', '#6a994e', '#386641']);

        const chart3Config = {{
            type: 'bar',
            data: {{
                labels: data3.map(item => item.name),
                datasets: [{{
                    label: 'Median bias detection score',
                    data: data3.map(item => item.median),
                    backgroundColor: ['#ffd6a5', '#fdac7a', '#f08080'],
                    borderWidth: 0,
                    borderRadius: 5
                }}]
            }},
            options: {{
                indexAxis: 'y',
                responsive: true,
                maintainAspectRatio: false,
                plugins: {{
                    legend: {{ display: false }},
                    tooltip: {{
                        callbacks: {{
                            label: function(context) {{
                                const item = data3[context.dataIndex];
                                return `Median: ${{item.median.toFixed(4)}}`;
                            }}
                        }}
                    }}
                }},
                scales: {{
                    x: {{ beginAtZero: true, max: 1.0, title: {{ display: true, text: 'Bias detection score (median)' }} }}
                }}
            }}
        }};

        window.addEventListener('DOMContentLoaded', function() {{
            new Chart(document.getElementById('chart1'), chart1Config);
            new Chart(document.getElementById('chart2'), chart2Config);
            new Chart(document.getElementById('chart3'), chart3Config);
        }});
    </script>
</body>
</html>
"#,
        title = escape_html(&meta.title),
        subtitle = escape_html(&meta.subtitle),
        source_label = escape_html(&meta.source_label),
        total_rows = data.total_rows,
        chart_library = chart_library.source(),
        data1_js = data1_js,
        data2_js = data2_js,
        data3_js = data3_js,
    );

    Ok(html)
}

/// Write `html` to `path` through a temp file in the same directory, so a
/// failed write never leaves a partial report behind.
pub fn write_report(path: &Path, html: &str) -> Result<()> {
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(html.as_bytes()).map_err(write_err)?;
    set_report_permissions(tmp.as_file(), path).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Temp files are created 0600; keep the replaced file's mode, or use 0644
/// for a new report.
#[cfg(unix)]
fn set_report_permissions(file: &std::fs::File, target: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = match std::fs::metadata(target) {
        Ok(meta) => meta.permissions(),
        Err(_) => std::fs::Permissions::from_mode(0o644),
    };
    file.set_permissions(permissions)
}

#[cfg(not(unix))]
fn set_report_permissions(_file: &std::fs::File, _target: &Path) -> std::io::Result<()> {
    Ok(())
}
