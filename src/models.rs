//! Core data models for dag-prognosis
//!
//! These models are produced by the analyzers, consumed by the scorer and
//! returned to the caller inside an [`AnalysisReport`].

use crate::performance::PerformanceInsight;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Every kind of finding the analyzers and the runtime prognosis can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    DirectDbAccess,
    DbOperationAtTopLevel,
    AirflowVariableAtTopLevel,
    DynamicStartDate,
    MissingProviderPackage,
    NoStartDate,
    NoDocumentation,
    NoTags,
    NoRetries,
    NoTimeout,
    DependsOnPast,
    NoQueue,
    HighComplexity,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingKind::DirectDbAccess => "direct_db_access",
            FindingKind::DbOperationAtTopLevel => "db_operation_at_top_level",
            FindingKind::AirflowVariableAtTopLevel => "airflow_variable_at_top_level",
            FindingKind::DynamicStartDate => "dynamic_start_date",
            FindingKind::MissingProviderPackage => "missing_provider_package",
            FindingKind::NoStartDate => "no_start_date",
            FindingKind::NoDocumentation => "no_documentation",
            FindingKind::NoTags => "no_tags",
            FindingKind::NoRetries => "no_retries",
            FindingKind::NoTimeout => "no_timeout",
            FindingKind::DependsOnPast => "depends_on_past",
            FindingKind::NoQueue => "no_queue",
            FindingKind::HighComplexity => "high_complexity",
        }
    }

    /// Default severity attached to findings of this kind
    pub fn severity(self) -> Severity {
        match self {
            FindingKind::DbOperationAtTopLevel
            | FindingKind::AirflowVariableAtTopLevel
            | FindingKind::DynamicStartDate
            | FindingKind::NoStartDate => Severity::Critical,
            FindingKind::DirectDbAccess | FindingKind::NoRetries => Severity::High,
            FindingKind::MissingProviderPackage
            | FindingKind::NoTimeout
            | FindingKind::DependsOnPast
            | FindingKind::HighComplexity => Severity::Medium,
            FindingKind::NoDocumentation | FindingKind::NoTags | FindingKind::NoQueue => {
                Severity::Low
            }
        }
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single issue discovered in a DAG file or a live DAG object.
///
/// Findings are appended in discovery order; nothing re-sorts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    #[serde(default)]
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Finding {
    pub fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            line: None,
            recommendation: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Summary of findings by severity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindingsSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub total: usize,
}

impl FindingsSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for f in findings {
            match f.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// Provenance bucket of an imported module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportCategory {
    Stdlib,
    Trusted,
    ThirdParty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub qualified_name: String,
    pub category: ImportCategory,
    /// True if any occurrence of this import sits at module scope
    pub is_top_level: bool,
    /// Line of the first occurrence (1-based)
    pub source_line: usize,
}

/// All imports of a file, bucketed by provenance.
///
/// The three category sets partition `records`: each distinct name lands in
/// exactly one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub stdlib: BTreeSet<String>,
    pub trusted: BTreeSet<String>,
    pub third_party: BTreeSet<String>,
    pub top_level: BTreeSet<String>,
    pub records: Vec<ImportRecord>,
}

impl ImportSummary {
    pub fn get(&self, name: &str) -> Option<&ImportRecord> {
        self.records.iter().find(|r| r.qualified_name == name)
    }

    pub fn third_party_records(&self) -> impl Iterator<Item = &ImportRecord> {
        self.records
            .iter()
            .filter(|r| r.category == ImportCategory::ThirdParty)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Source text of an operand in a chaining expression; not resolved to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionRef {
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    /// `a >> b`
    Downstream,
    /// `a << b`
    Upstream,
}

impl EdgeDirection {
    pub fn operator(self) -> &'static str {
        match self {
            EdgeDirection::Downstream => ">>",
            EdgeDirection::Upstream => "<<",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: ExpressionRef,
    pub to: ExpressionRef,
    pub direction: EdgeDirection,
}

/// A third-party package with a first-party provider alternative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub package: String,
    pub recommended_provider: String,
}

/// Operational settings of one task plus its derived complexity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub retries: u32,
    pub retry_delay_seconds: f64,
    pub pool: Option<String>,
    pub priority_weight: i64,
    pub queue: Option<String>,
    pub execution_timeout_seconds: Option<f64>,
    pub trigger_rule: Option<String>,
    pub depends_on_past: bool,
    pub wait_for_downstream: bool,
    pub email_on_retry: bool,
    pub email_on_failure: bool,
    /// 0-4, one point per reliability gap
    pub complexity_score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DagMetadata {
    pub schedule: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub catchup: Option<bool>,
    pub tags: BTreeSet<String>,
    pub default_args: BTreeMap<String, serde_json::Value>,
    pub concurrency: Option<u32>,
    pub max_active_runs: Option<u32>,
    pub dagrun_timeout_seconds: Option<f64>,
    pub description: Option<String>,
}

/// Severity band of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Green,
    Yellow,
    Red,
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Band::Green => write!(f, "green"),
            Band::Yellow => write!(f, "yellow"),
            Band::Red => write!(f, "red"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPrognosis {
    pub task_id: String,
    pub score: f64,
    pub band: Band,
    pub issues: Vec<Finding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagPrognosis {
    pub dag_id: String,
    pub score: f64,
    pub band: Band,
    pub issues: Vec<Finding>,
    pub task_scores: IndexMap<String, TaskPrognosis>,
}

/// Top-level code findings grouped the way DAG authors triage them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopLevelCodeReport {
    pub db_operations: Vec<Finding>,
    pub airflow_vars: Vec<Finding>,
    pub dynamic_dates: Vec<Finding>,
}

impl TopLevelCodeReport {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut report = Self::default();
        for f in findings {
            match f.kind {
                FindingKind::DbOperationAtTopLevel => report.db_operations.push(f.clone()),
                FindingKind::AirflowVariableAtTopLevel => report.airflow_vars.push(f.clone()),
                FindingKind::DynamicStartDate => report.dynamic_dates.push(f.clone()),
                _ => {}
            }
        }
        report
    }
}

/// Which scoring path produced the headline score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Static,
    Runtime,
}

/// The terminal artifact of one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub score: f64,
    pub band: Band,
    pub mode: ModeKind,
    pub summary: String,
    pub imports: ImportSummary,
    pub findings: Vec<Finding>,
    pub findings_summary: FindingsSummary,
    pub top_level_code: TopLevelCodeReport,
    pub dependencies: Vec<DependencyEdge>,
    pub provider_recommendations: Vec<Recommendation>,
    pub task_metrics: Option<IndexMap<String, TaskMetrics>>,
    pub dag_metadata: Option<DagMetadata>,
    pub dag_prognosis: Option<DagPrognosis>,
    pub performance_insights: Vec<PerformanceInsight>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_builder() {
        let f = Finding::new(FindingKind::MissingProviderPackage, "use amazon")
            .at_line(3)
            .with_recommendation("Consider using amazon")
            .with_meta("package", "boto3");
        assert_eq!(f.severity, Severity::Medium);
        assert_eq!(f.line, Some(3));
        assert_eq!(f.metadata.get("package").map(String::as_str), Some("boto3"));
        assert!(f.recommendation.is_some());
    }

    #[test]
    fn test_findings_summary() {
        let findings = vec![
            Finding::new(FindingKind::DbOperationAtTopLevel, "a"),
            Finding::new(FindingKind::DbOperationAtTopLevel, "b"),
            Finding::new(FindingKind::NoTags, "c"),
        ];
        let summary = FindingsSummary::from_findings(&findings);
        assert_eq!(summary.critical, 2);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_top_level_grouping() {
        let findings = vec![
            Finding::new(FindingKind::DbOperationAtTopLevel, "a"),
            Finding::new(FindingKind::DirectDbAccess, "b"),
            Finding::new(FindingKind::AirflowVariableAtTopLevel, "c"),
        ];
        let grouped = TopLevelCodeReport::from_findings(&findings);
        assert_eq!(grouped.db_operations.len(), 1);
        assert_eq!(grouped.airflow_vars.len(), 1);
        assert!(grouped.dynamic_dates.is_empty());
    }

    #[test]
    fn test_finding_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FindingKind::DbOperationAtTopLevel).unwrap();
        assert_eq!(json, "\"db_operation_at_top_level\"");
        assert_eq!(FindingKind::NoTags.to_string(), "no_tags");
    }
}
