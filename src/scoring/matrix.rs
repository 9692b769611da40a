//! The deduction matrix
//!
//! A process-wide constant. Static scoring subtracts each entry at most once
//! per file, no matter how many findings map onto it.

use crate::models::FindingKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    TopLevelCode,
    DynamicStartDate,
    NoRetries,
    DirectDbAccess,
    MissingProviderPackage,
    DynamicTaskMapping,
    NoDocumentation,
    NoTags,
    NoSla,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueCategory {
    Critical,
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringMatrixEntry {
    pub issue_kind: IssueKind,
    pub deduction: f64,
    pub category: IssueCategory,
    pub description: &'static str,
    pub rationale: &'static str,
}

/// Ordered like [`IssueKind`]
pub const SCORING_MATRIX: &[ScoringMatrixEntry] = &[
    ScoringMatrixEntry {
        issue_kind: IssueKind::TopLevelCode,
        deduction: 40.0,
        category: IssueCategory::Critical,
        description: "Top-level code (API calls, database queries, Variable reads)",
        rationale: "Runs on every scheduler parse of the file",
    },
    ScoringMatrixEntry {
        issue_kind: IssueKind::DynamicStartDate,
        deduction: 35.0,
        category: IssueCategory::Critical,
        description: "start_date missing or computed from the wall clock",
        rationale: "Runs cannot be scheduled reproducibly",
    },
    ScoringMatrixEntry {
        issue_kind: IssueKind::NoRetries,
        deduction: 30.0,
        category: IssueCategory::Critical,
        description: "No retries configured",
        rationale: "Transient failures fail the run",
    },
    ScoringMatrixEntry {
        issue_kind: IssueKind::DirectDbAccess,
        deduction: 25.0,
        category: IssueCategory::Major,
        description: "Direct database access outside hooks and connections",
        rationale: "Leaks connections and loads the metadata database",
    },
    ScoringMatrixEntry {
        issue_kind: IssueKind::MissingProviderPackage,
        deduction: 20.0,
        category: IssueCategory::Major,
        description: "Generic client library used where a provider package exists",
        rationale: "Misses maintained operators, hooks and connection handling",
    },
    ScoringMatrixEntry {
        issue_kind: IssueKind::DynamicTaskMapping,
        deduction: 20.0,
        category: IssueCategory::Major,
        description: "Task mapping expanded at parse time",
        rationale: "Slows parsing and adds scheduler overhead",
    },
    ScoringMatrixEntry {
        issue_kind: IssueKind::NoDocumentation,
        deduction: 10.0,
        category: IssueCategory::Minor,
        description: "No doc_md or description",
        rationale: "Harder to own and operate",
    },
    ScoringMatrixEntry {
        issue_kind: IssueKind::NoTags,
        deduction: 5.0,
        category: IssueCategory::Minor,
        description: "No tags",
        rationale: "Harder to filter in the UI",
    },
    ScoringMatrixEntry {
        issue_kind: IssueKind::NoSla,
        deduction: 5.0,
        category: IssueCategory::Minor,
        description: "No SLA on critical tasks",
        rationale: "Late runs go unnoticed",
    },
];

impl IssueKind {
    pub fn entry(self) -> &'static ScoringMatrixEntry {
        &SCORING_MATRIX[self as usize]
    }

    pub fn deduction(self) -> f64 {
        self.entry().deduction
    }
}

/// Matrix entry a finding kind is scored under, if any.
///
/// Task-level kinds (`NoTimeout`, `DependsOnPast`, `NoQueue`) and
/// `HighComplexity` have fixed deductions in the runtime prognosis and no
/// matrix entry.
pub fn issue_kind(kind: FindingKind) -> Option<IssueKind> {
    match kind {
        FindingKind::DbOperationAtTopLevel | FindingKind::AirflowVariableAtTopLevel => {
            Some(IssueKind::TopLevelCode)
        }
        FindingKind::DynamicStartDate | FindingKind::NoStartDate => {
            Some(IssueKind::DynamicStartDate)
        }
        FindingKind::DirectDbAccess => Some(IssueKind::DirectDbAccess),
        FindingKind::MissingProviderPackage => Some(IssueKind::MissingProviderPackage),
        FindingKind::NoDocumentation => Some(IssueKind::NoDocumentation),
        FindingKind::NoTags => Some(IssueKind::NoTags),
        FindingKind::NoRetries => Some(IssueKind::NoRetries),
        FindingKind::NoTimeout
        | FindingKind::DependsOnPast
        | FindingKind::NoQueue
        | FindingKind::HighComplexity => None,
    }
}
