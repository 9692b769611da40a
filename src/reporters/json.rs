//! JSON reporter
//!
//! Pretty-printed `AnalysisReport`, suitable for piping to jq.

use crate::models::AnalysisReport;
use anyhow::Result;
use serde::Serialize;

pub fn render(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a str,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

/// Array of reports, each tagged with its file path
pub fn render_many(reports: &[(String, AnalysisReport)]) -> Result<String> {
    let tagged: Vec<FileReport<'_>> = reports
        .iter()
        .map(|(path, report)| FileReport { path, report })
        .collect();
    Ok(serde_json::to_string_pretty(&tagged)?)
}
