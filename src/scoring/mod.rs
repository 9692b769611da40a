//! DAG health scoring
//!
//! Two independent paths:
//!
//! - **Static**: start at 100 and subtract each matrix entry once if any
//!   finding maps onto it. Repeated findings of one kind do not compound.
//! - **Runtime**: [`calculate_dag_prognosis`] over a live DAG object. When a
//!   live DAG is available its score is the headline score; the two are
//!   never averaged.
//!
//! Both are clamped to `[0, 100]` and banded by [`band_for_score`].

mod bands;
mod matrix;
mod prognosis;

pub use bands::{band_for_score, prognosis_band};
pub use matrix::{
    issue_kind, IssueCategory, IssueKind, ScoringMatrixEntry, SCORING_MATRIX,
};
pub use prognosis::{calculate_dag_prognosis, calculate_task_prognosis, clamp_score, MAX_TASKS};

use crate::models::Finding;
use std::collections::BTreeSet;
use tracing::debug;

/// Static score of a findings list. Findings without a matrix entry are
/// ignored.
pub fn static_score(findings: &[Finding]) -> f64 {
    let kinds: BTreeSet<IssueKind> = findings.iter().filter_map(|f| issue_kind(f.kind)).collect();

    let deduction: f64 = kinds
        .iter()
        .map(|kind| {
            debug!("Deducting {} for {:?}", kind.deduction(), kind);
            kind.deduction()
        })
        .sum();

    clamp_score(100.0 - deduction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FindingKind;

    fn findings(kinds: &[FindingKind]) -> Vec<Finding> {
        kinds.iter().map(|k| Finding::new(*k, "x")).collect()
    }

    #[test]
    fn test_clean_scores_100() {
        assert_eq!(static_score(&[]), 100.0);
    }

    #[test]
    fn test_deducts_once_per_kind() {
        let once = static_score(&findings(&[FindingKind::DbOperationAtTopLevel]));
        let five = static_score(&findings(&[FindingKind::DbOperationAtTopLevel; 5]));
        assert_eq!(once, 60.0);
        assert_eq!(once, five);
    }

    #[test]
    fn test_kinds_sharing_an_entry_deduct_once() {
        let score = static_score(&findings(&[
            FindingKind::DbOperationAtTopLevel,
            FindingKind::AirflowVariableAtTopLevel,
        ]));
        assert_eq!(score, 60.0);
    }

    #[test]
    fn test_unmapped_kinds_ignored() {
        let score = static_score(&findings(&[
            FindingKind::HighComplexity,
            FindingKind::NoQueue,
        ]));
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_clamped_at_zero() {
        let score = static_score(&findings(&[
            FindingKind::DbOperationAtTopLevel,
            FindingKind::DynamicStartDate,
            FindingKind::DirectDbAccess,
            FindingKind::MissingProviderPackage,
        ]));
        // 100 - 40 - 35 - 25 - 20
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_top_level_plus_provider() {
        let score = static_score(&findings(&[
            FindingKind::DbOperationAtTopLevel,
            FindingKind::MissingProviderPackage,
        ]));
        assert_eq!(score, 40.0);
        assert_eq!(band_for_score(score), crate::models::Band::Red);
    }
}
