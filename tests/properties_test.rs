//! Property tests for score bounds and per-kind deduction

use dag_prognosis::live::{DagSnapshot, TaskSnapshot};
use dag_prognosis::models::Finding;
use dag_prognosis::scoring::{calculate_dag_prognosis, static_score};
use dag_prognosis::{AnalysisMode, ClassificationSets, Engine, FindingKind, ProviderMapping};
use proptest::prelude::*;

const KINDS: [FindingKind; 13] = [
    FindingKind::DirectDbAccess,
    FindingKind::DbOperationAtTopLevel,
    FindingKind::AirflowVariableAtTopLevel,
    FindingKind::DynamicStartDate,
    FindingKind::MissingProviderPackage,
    FindingKind::NoStartDate,
    FindingKind::NoDocumentation,
    FindingKind::NoTags,
    FindingKind::NoRetries,
    FindingKind::NoTimeout,
    FindingKind::DependsOnPast,
    FindingKind::NoQueue,
    FindingKind::HighComplexity,
];

fn finding_kind() -> impl Strategy<Value = FindingKind> {
    (0..KINDS.len()).prop_map(|i| KINDS[i])
}

fn task() -> impl Strategy<Value = TaskSnapshot> {
    (
        proptest::option::of(0u32..5),
        proptest::option::of(0.0f64..3600.0),
        proptest::option::of(any::<bool>()),
        proptest::option::of("[a-z]{0,6}"),
    )
        .prop_map(|(retries, timeout, depends_on_past, queue)| TaskSnapshot {
            retries,
            execution_timeout: timeout,
            depends_on_past,
            queue,
            ..TaskSnapshot::new("t")
        })
}

fn dag() -> impl Strategy<Value = DagSnapshot> {
    (
        any::<bool>(),
        any::<bool>(),
        proptest::collection::vec("[a-z]{1,5}", 0..3),
        proptest::collection::vec(task(), 0..70),
    )
        .prop_map(|(has_start, has_doc, tags, tasks)| {
            let mut dag = DagSnapshot::new("generated");
            if has_start {
                dag.start_date = chrono::DateTime::from_timestamp(1_700_000_000, 0);
            }
            if has_doc {
                dag.description = Some("doc".to_string());
            }
            dag.tags = tags;
            // distinct ids keep task_scores one-to-one with tasks
            dag.tasks = tasks
                .into_iter()
                .enumerate()
                .map(|(i, mut t)| {
                    t.task_id = format!("t{}", i);
                    t
                })
                .collect();
            dag
        })
}

proptest! {
    #[test]
    fn static_score_is_bounded(kinds in proptest::collection::vec(finding_kind(), 0..40)) {
        let findings: Vec<Finding> = kinds.iter().map(|k| Finding::new(*k, "x")).collect();
        let score = static_score(&findings);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn repeats_do_not_compound(kinds in proptest::collection::vec(finding_kind(), 1..10), times in 2usize..6) {
        let once: Vec<Finding> = kinds.iter().map(|k| Finding::new(*k, "x")).collect();
        let repeated: Vec<Finding> = once
            .iter()
            .cloned()
            .cycle()
            .take(once.len() * times)
            .collect();
        prop_assert_eq!(static_score(&once), static_score(&repeated));
    }

    #[test]
    fn dag_prognosis_is_bounded(dag in dag()) {
        let prognosis = calculate_dag_prognosis(&dag);
        prop_assert!((0.0..=100.0).contains(&prognosis.score));
        prop_assert_eq!(prognosis.task_scores.len(), dag.tasks.len());
        for task in prognosis.task_scores.values() {
            prop_assert!((0.0..=100.0).contains(&task.score));
        }
    }

    #[test]
    fn runtime_report_uses_prognosis_score(dag in dag()) {
        let sets = ClassificationSets::default();
        let report = Engine::new(&sets, ProviderMapping::builtin())
            .analyze("import boto3\nsession.query(A)\n", AnalysisMode::Runtime(&dag))
            .unwrap();
        let prognosis = report.dag_prognosis.as_ref().unwrap();
        prop_assert_eq!(report.score, prognosis.score);
        prop_assert!((0.0..=100.0).contains(&report.score));
    }
}
