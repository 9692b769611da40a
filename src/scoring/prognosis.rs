//! Runtime prognosis over a live DAG
//!
//! ```text
//! task score = 100 - 30 (no retries) - 5 (no timeout)
//!                  - 10 (depends_on_past) - 5 (no queue)       clamp [0, 100]
//!
//! dag score  = 100 - 35 (no start_date) - 10 (no doc_md/description)
//!                  - 5 (no tags)
//!                  - per task: 5 if task score < 70, else 2 if < 85
//!                  - 10 if more than 50 tasks                  clamp [0, 100]
//! ```

use super::bands::prognosis_band;
use super::matrix::IssueKind;
use crate::analyzers::analyze_task_complexity;
use crate::live::LiveDag;
use crate::models::{DagPrognosis, Finding, FindingKind, TaskMetrics, TaskPrognosis};
use indexmap::IndexMap;
use tracing::{debug, info};

const NO_TIMEOUT_DEDUCTION: f64 = 5.0;
const DEPENDS_ON_PAST_DEDUCTION: f64 = 10.0;
const NO_QUEUE_DEDUCTION: f64 = 5.0;

const CRITICAL_TASK_SCORE: f64 = 70.0;
const CRITICAL_TASK_DEDUCTION: f64 = 5.0;
const MAJOR_TASK_SCORE: f64 = 85.0;
const MAJOR_TASK_DEDUCTION: f64 = 2.0;

/// Task count above which a DAG is flagged as too large
pub const MAX_TASKS: usize = 50;
const HIGH_COMPLEXITY_DEDUCTION: f64 = 10.0;

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Prognosis of one task, scored on its own: every check applies once per
/// task
pub fn calculate_task_prognosis(task_id: &str, metrics: &TaskMetrics) -> TaskPrognosis {
    let mut score = 100.0;
    let mut issues = Vec::new();
    let mut deduct = |kind: FindingKind, deduction: f64, message: &str| {
        score -= deduction;
        issues.push(Finding::new(kind, message).with_meta("task_id", task_id));
    };

    if metrics.retries == 0 {
        deduct(
            FindingKind::NoRetries,
            IssueKind::NoRetries.deduction(),
            "Task has no retries configured",
        );
    }
    if metrics.execution_timeout_seconds.is_none() {
        deduct(
            FindingKind::NoTimeout,
            NO_TIMEOUT_DEDUCTION,
            "Task has no execution timeout",
        );
    }
    if metrics.depends_on_past {
        deduct(
            FindingKind::DependsOnPast,
            DEPENDS_ON_PAST_DEDUCTION,
            "Task sets depends_on_past, a failed run blocks every later one",
        );
    }
    if metrics.queue.is_none() {
        deduct(
            FindingKind::NoQueue,
            NO_QUEUE_DEDUCTION,
            "Task is not assigned to a queue",
        );
    }

    let score = clamp_score(score);
    TaskPrognosis {
        task_id: task_id.to_string(),
        score,
        band: prognosis_band(score),
        issues,
    }
}

/// Prognosis of a whole DAG. Independent of any static analysis of its
/// source.
pub fn calculate_dag_prognosis(dag: &dyn LiveDag) -> DagPrognosis {
    let mut score = 100.0;
    let mut issues = Vec::new();

    if dag.start_date().is_none() {
        score -= IssueKind::DynamicStartDate.deduction();
        issues.push(Finding::new(
            FindingKind::NoStartDate,
            "DAG has no start_date configured",
        ));
    }

    let documented = [dag.doc_md(), dag.description()]
        .iter()
        .any(|doc| doc.is_some_and(|d| !d.is_empty()));
    if !documented {
        score -= IssueKind::NoDocumentation.deduction();
        issues.push(Finding::new(
            FindingKind::NoDocumentation,
            "DAG has neither doc_md nor a description",
        ));
    }

    if dag.tags().is_empty() {
        score -= IssueKind::NoTags.deduction();
        issues.push(Finding::new(FindingKind::NoTags, "DAG has no tags"));
    }

    let tasks = dag.tasks();
    let mut task_scores = IndexMap::with_capacity(tasks.len());
    for task in &tasks {
        let metrics = analyze_task_complexity(*task);
        let prognosis = calculate_task_prognosis(task.task_id(), &metrics);

        if prognosis.score < CRITICAL_TASK_SCORE {
            score -= CRITICAL_TASK_DEDUCTION;
        } else if prognosis.score < MAJOR_TASK_SCORE {
            score -= MAJOR_TASK_DEDUCTION;
        }
        debug!(
            "Task {} prognosis {:.1} ({})",
            prognosis.task_id, prognosis.score, prognosis.band
        );
        task_scores.insert(prognosis.task_id.clone(), prognosis);
    }

    if tasks.len() > MAX_TASKS {
        score -= HIGH_COMPLEXITY_DEDUCTION;
        issues.push(
            Finding::new(
                FindingKind::HighComplexity,
                format!(
                    "DAG has {} tasks, consider splitting it into smaller DAGs",
                    tasks.len()
                ),
            )
            .with_meta("task_count", tasks.len().to_string()),
        );
    }

    let score = clamp_score(score);
    info!(
        "DAG {} prognosis {:.1} over {} tasks, {} DAG-level issues",
        dag.dag_id(),
        score,
        tasks.len(),
        issues.len()
    );

    DagPrognosis {
        dag_id: dag.dag_id().to_string(),
        score,
        band: prognosis_band(score),
        issues,
        task_scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::{DagSnapshot, TaskSnapshot};
    use crate::models::Band;
    use chrono::{TimeZone, Utc};

    fn healthy_task(id: &str) -> TaskSnapshot {
        TaskSnapshot {
            retries: Some(2),
            execution_timeout: Some(600.0),
            queue: Some("default".to_string()),
            ..TaskSnapshot::new(id)
        }
    }

    fn healthy_dag(tasks: usize) -> DagSnapshot {
        DagSnapshot {
            start_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            description: Some("Nightly load".to_string()),
            tags: vec!["etl".to_string()],
            tasks: (0..tasks).map(|i| healthy_task(&format!("t{}", i))).collect(),
            ..DagSnapshot::new("etl")
        }
    }

    fn task_prognosis(task: &TaskSnapshot) -> TaskPrognosis {
        calculate_task_prognosis(&task.task_id, &analyze_task_complexity(task))
    }

    #[test]
    fn test_healthy_task_scores_100() {
        let p = task_prognosis(&healthy_task("ok"));
        assert_eq!(p.score, 100.0);
        assert_eq!(p.band, Band::Green);
        assert!(p.issues.is_empty());
    }

    #[test]
    fn test_bare_task_deductions() {
        let mut task = TaskSnapshot::new("bare");
        task.depends_on_past = Some(true);
        let p = task_prognosis(&task);
        // 100 - 30 - 5 - 10 - 5
        assert_eq!(p.score, 50.0);
        assert_eq!(p.band, Band::Red);
        let kinds: Vec<FindingKind> = p.issues.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FindingKind::NoRetries,
                FindingKind::NoTimeout,
                FindingKind::DependsOnPast,
                FindingKind::NoQueue
            ]
        );
        assert!(p
            .issues
            .iter()
            .all(|f| f.metadata.get("task_id").map(String::as_str) == Some("bare")));
    }

    #[test]
    fn test_healthy_dag_scores_100() {
        let p = calculate_dag_prognosis(&healthy_dag(3));
        assert_eq!(p.score, 100.0);
        assert_eq!(p.band, Band::Green);
        assert!(p.issues.is_empty());
        assert_eq!(p.task_scores.len(), 3);
        assert_eq!(p.task_scores.keys().next().map(String::as_str), Some("t0"));
    }

    #[test]
    fn test_dag_level_deductions() {
        let dag = DagSnapshot {
            tasks: vec![healthy_task("a")],
            ..DagSnapshot::new("bare")
        };
        let p = calculate_dag_prognosis(&dag);
        // 100 - 35 - 10 - 5
        assert_eq!(p.score, 50.0);
        let kinds: Vec<FindingKind> = p.issues.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FindingKind::NoStartDate,
                FindingKind::NoDocumentation,
                FindingKind::NoTags
            ]
        );
    }

    #[test]
    fn test_doc_md_counts_as_documentation() {
        let mut dag = healthy_dag(0);
        dag.description = None;
        dag.doc_md = Some("# ETL".to_string());
        assert_eq!(calculate_dag_prognosis(&dag).score, 100.0);

        dag.doc_md = Some("   ".to_string());
        assert_eq!(calculate_dag_prognosis(&dag).score, 100.0);

        dag.doc_md = Some(String::new());
        assert_eq!(calculate_dag_prognosis(&dag).score, 90.0);
    }

    #[test]
    fn test_task_score_thresholds_are_strict() {
        // 100 - 5 (no queue) - 10 (depends_on_past) = 85: not < 85, no deduction
        let mut at_85 = healthy_task("at85");
        at_85.queue = None;
        at_85.depends_on_past = Some(true);

        // 100 - 30 = 70: not < 70, but < 85
        let mut at_70 = healthy_task("at70");
        at_70.retries = Some(0);

        // 100 - 30 - 5 = 65: < 70
        let mut at_65 = healthy_task("at65");
        at_65.retries = None;
        at_65.execution_timeout = None;

        let mut dag = healthy_dag(0);
        dag.tasks = vec![at_85];
        assert_eq!(calculate_dag_prognosis(&dag).score, 100.0);
        dag.tasks = vec![at_70];
        assert_eq!(calculate_dag_prognosis(&dag).score, 98.0);
        dag.tasks = vec![at_65];
        assert_eq!(calculate_dag_prognosis(&dag).score, 95.0);
    }

    #[test]
    fn test_task_count_penalty() {
        let p = calculate_dag_prognosis(&healthy_dag(MAX_TASKS));
        assert_eq!(p.score, 100.0);
        assert!(p.issues.is_empty());

        let p = calculate_dag_prognosis(&healthy_dag(MAX_TASKS + 1));
        assert_eq!(p.score, 90.0);
        assert_eq!(p.issues.len(), 1);
        assert_eq!(p.issues[0].kind, FindingKind::HighComplexity);
    }

    #[test]
    fn test_dag_score_clamped_at_zero() {
        let dag = DagSnapshot {
            tasks: (0..60).map(|i| TaskSnapshot::new(format!("t{}", i))).collect(),
            ..DagSnapshot::new("worst")
        };
        let p = calculate_dag_prognosis(&dag);
        assert_eq!(p.score, 0.0);
        assert_eq!(p.band, Band::Red);
    }
}
