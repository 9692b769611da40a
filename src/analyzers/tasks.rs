//! Task and DAG metadata read from a live workflow object

use crate::live::{LiveDag, LiveTask};
use crate::models::{DagMetadata, TaskMetrics};
use tracing::debug;

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Operational settings of one task plus its complexity score.
///
/// Absent attributes resolve to `retries = 0`, `priority_weight = 1` and
/// `false` for every flag. One complexity point each for: no retries,
/// `depends_on_past`, `wait_for_downstream`, no execution timeout.
pub fn analyze_task_complexity(task: &dyn LiveTask) -> TaskMetrics {
    let retries = task.retries().unwrap_or(0);
    let execution_timeout = task.execution_timeout_seconds().filter(|t| *t > 0.0);
    let depends_on_past = task.depends_on_past().unwrap_or(false);
    let wait_for_downstream = task.wait_for_downstream().unwrap_or(false);

    let complexity_score = [
        retries == 0,
        depends_on_past,
        wait_for_downstream,
        execution_timeout.is_none(),
    ]
    .iter()
    .filter(|gap| **gap)
    .count() as u8;

    debug!(
        "Task {} complexity {} (retries={}, timeout={:?})",
        task.task_id(),
        complexity_score,
        retries,
        execution_timeout
    );

    TaskMetrics {
        retries,
        retry_delay_seconds: task.retry_delay_seconds().unwrap_or(0.0),
        pool: non_empty(task.pool()),
        priority_weight: task.priority_weight().unwrap_or(1),
        queue: non_empty(task.queue()),
        execution_timeout_seconds: execution_timeout,
        trigger_rule: non_empty(task.trigger_rule()),
        depends_on_past,
        wait_for_downstream,
        email_on_retry: task.email_on_retry().unwrap_or(false),
        email_on_failure: task.email_on_failure().unwrap_or(false),
        complexity_score,
    }
}

/// Field projection of a DAG, no derived score
pub fn analyze_dag_metadata(dag: &dyn LiveDag) -> DagMetadata {
    DagMetadata {
        schedule: dag.schedule().map(str::to_string),
        start_date: dag.start_date().map(|d| d.to_rfc3339()),
        end_date: dag.end_date().map(|d| d.to_rfc3339()),
        catchup: dag.catchup(),
        tags: dag.tags().into_iter().collect(),
        default_args: dag.default_args(),
        concurrency: dag.concurrency(),
        max_active_runs: dag.max_active_runs(),
        dagrun_timeout_seconds: dag.dagrun_timeout_seconds(),
        description: non_empty(dag.description()),
    }
}
