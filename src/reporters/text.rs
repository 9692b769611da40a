//! Text (terminal) reporter with colors and formatting

use crate::models::{AnalysisReport, Band, Finding, Severity};
use anyhow::Result;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Findings listed before truncating
const MAX_FINDINGS: usize = 15;

fn band_color(band: Band) -> &'static str {
    match band {
        Band::Green => "\x1b[32m",
        Band::Yellow => "\x1b[33m",
        Band::Red => "\x1b[31m",
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "\x1b[31m", // Red
        Severity::High => "\x1b[91m",     // Light red
        Severity::Medium => "\x1b[33m",   // Yellow
        Severity::Low => "\x1b[34m",      // Blue
        Severity::Info => "\x1b[90m",     // Gray
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[C]",
        Severity::High => "[H]",
        Severity::Medium => "[M]",
        Severity::Low => "[L]",
        Severity::Info => "[I]",
    }
}

pub fn render(report: &AnalysisReport) -> Result<String> {
    render_titled(report, "DAG Prognosis")
}

/// Render with a custom header line, e.g. the file path
pub fn render_titled(report: &AnalysisReport, title: &str) -> Result<String> {
    let mut out = String::new();

    let band_c = band_color(report.band);
    out.push_str(&format!("\n{BOLD}{}{RESET}\n", title));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Score: {band_c}{BOLD}{:.1}/100{RESET}  Band: {band_c}{BOLD}{}{RESET}  Mode: {:?}\n",
        report.score, report.band, report.mode
    ));
    out.push_str(&format!("{DIM}{}{RESET}\n\n", report.summary));

    let imports = &report.imports;
    out.push_str(&format!(
        "{BOLD}IMPORTS{RESET} ({} total)\n  stdlib: {}  trusted: {}  third-party: {}\n",
        imports.len(),
        imports.stdlib.len(),
        imports.trusted.len(),
        imports.third_party.len()
    ));
    if !imports.third_party.is_empty() {
        let names: Vec<&str> = imports.third_party.iter().map(String::as_str).collect();
        out.push_str(&format!("  {DIM}{}{RESET}\n", names.join(", ")));
    }
    out.push('\n');

    let fs = &report.findings_summary;
    out.push_str(&format!("{BOLD}FINDINGS{RESET} ({} total)\n", fs.total));
    for (i, finding) in report.findings.iter().take(MAX_FINDINGS).enumerate() {
        out.push_str(&format_finding(i + 1, finding));
    }
    let remaining = report.findings.len().saturating_sub(MAX_FINDINGS);
    if remaining > 0 {
        out.push_str(&format!(
            "  {DIM}...and {} more (use --format json){RESET}\n",
            remaining
        ));
    }
    out.push('\n');

    if let Some(prognosis) = &report.dag_prognosis {
        let c = band_color(prognosis.band);
        out.push_str(&format!(
            "{BOLD}DAG PROGNOSIS{RESET} {} {c}{:.1}{RESET}\n",
            prognosis.dag_id, prognosis.score
        ));
        for issue in &prognosis.issues {
            out.push_str(&format!("  - {}\n", issue.message));
        }
        for task in prognosis.task_scores.values() {
            let c = band_color(task.band);
            out.push_str(&format!(
                "  {:<30} {c}{:>5.1}{RESET}  {DIM}{} issue(s){RESET}\n",
                task.task_id,
                task.score,
                task.issues.len()
            ));
        }
        out.push('\n');
    }

    if !report.dependencies.is_empty() {
        out.push_str(&format!(
            "{BOLD}DEPENDENCIES{RESET} ({} edges)\n",
            report.dependencies.len()
        ));
        for edge in &report.dependencies {
            out.push_str(&format!(
                "  {} {} {}  {DIM}line {}{RESET}\n",
                edge.from.text,
                edge.direction.operator(),
                edge.to.text,
                edge.from.line
            ));
        }
        out.push('\n');
    }

    if !report.recommendations.is_empty() {
        out.push_str(&format!("{BOLD}RECOMMENDATIONS{RESET}\n"));
        for rec in &report.recommendations {
            out.push_str(&format!("  * {}\n", rec));
        }
        out.push('\n');
    }

    Ok(out)
}

fn format_finding(index: usize, finding: &Finding) -> String {
    let sev_c = severity_color(finding.severity);
    let location = finding
        .line
        .map(|line| format!("line {}", line))
        .unwrap_or_default();
    format!(
        "  {DIM}{:>3}{RESET}  {sev_c}{}{RESET}  {:<55}  {DIM}{}{RESET}\n",
        index,
        severity_tag(finding.severity),
        finding.message,
        location
    )
}
