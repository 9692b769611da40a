//! Live workflow objects
//!
//! The runtime analyzers read a DAG the caller already built, through the
//! [`LiveDag`] / [`LiveTask`] traits. Accessors return `None` when the
//! attribute does not exist on the caller's engine version; the analyzers
//! resolve those to documented defaults.
//!
//! [`DagSnapshot`] is a serde implementation for DAGs exported as JSON.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub trait LiveTask {
    fn task_id(&self) -> &str;

    fn retries(&self) -> Option<u32> {
        None
    }
    fn retry_delay_seconds(&self) -> Option<f64> {
        None
    }
    fn pool(&self) -> Option<&str> {
        None
    }
    fn priority_weight(&self) -> Option<i64> {
        None
    }
    fn queue(&self) -> Option<&str> {
        None
    }
    fn execution_timeout_seconds(&self) -> Option<f64> {
        None
    }
    fn trigger_rule(&self) -> Option<&str> {
        None
    }
    fn depends_on_past(&self) -> Option<bool> {
        None
    }
    fn wait_for_downstream(&self) -> Option<bool> {
        None
    }
    fn email_on_retry(&self) -> Option<bool> {
        None
    }
    fn email_on_failure(&self) -> Option<bool> {
        None
    }
}

pub trait LiveDag {
    fn dag_id(&self) -> &str;

    /// Tasks in definition order
    fn tasks(&self) -> Vec<&dyn LiveTask>;

    fn schedule(&self) -> Option<&str> {
        None
    }
    fn start_date(&self) -> Option<DateTime<Utc>> {
        None
    }
    fn end_date(&self) -> Option<DateTime<Utc>> {
        None
    }
    fn catchup(&self) -> Option<bool> {
        None
    }
    fn tags(&self) -> Vec<String> {
        Vec::new()
    }
    fn default_args(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }
    fn concurrency(&self) -> Option<u32> {
        None
    }
    fn max_active_runs(&self) -> Option<u32> {
        None
    }
    fn dagrun_timeout_seconds(&self) -> Option<f64> {
        None
    }
    fn description(&self) -> Option<&str> {
        None
    }
    fn doc_md(&self) -> Option<&str> {
        None
    }
}

/// A task exported as JSON; missing keys behave like missing attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub retry_delay: Option<f64>,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub priority_weight: Option<i64>,
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default)]
    pub execution_timeout: Option<f64>,
    #[serde(default)]
    pub trigger_rule: Option<String>,
    #[serde(default)]
    pub depends_on_past: Option<bool>,
    #[serde(default)]
    pub wait_for_downstream: Option<bool>,
    #[serde(default)]
    pub email_on_retry: Option<bool>,
    #[serde(default)]
    pub email_on_failure: Option<bool>,
}

impl TaskSnapshot {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }
}

impl LiveTask for TaskSnapshot {
    fn task_id(&self) -> &str {
        &self.task_id
    }
    fn retries(&self) -> Option<u32> {
        self.retries
    }
    fn retry_delay_seconds(&self) -> Option<f64> {
        self.retry_delay
    }
    fn pool(&self) -> Option<&str> {
        self.pool.as_deref()
    }
    fn priority_weight(&self) -> Option<i64> {
        self.priority_weight
    }
    fn queue(&self) -> Option<&str> {
        self.queue.as_deref()
    }
    fn execution_timeout_seconds(&self) -> Option<f64> {
        self.execution_timeout
    }
    fn trigger_rule(&self) -> Option<&str> {
        self.trigger_rule.as_deref()
    }
    fn depends_on_past(&self) -> Option<bool> {
        self.depends_on_past
    }
    fn wait_for_downstream(&self) -> Option<bool> {
        self.wait_for_downstream
    }
    fn email_on_retry(&self) -> Option<bool> {
        self.email_on_retry
    }
    fn email_on_failure(&self) -> Option<bool> {
        self.email_on_failure
    }
}

/// A DAG exported as JSON
///
/// ```json
/// {
///   "dag_id": "etl",
///   "start_date": "2024-01-01T00:00:00Z",
///   "tags": ["finance"],
///   "tasks": [{"task_id": "extract", "retries": 2, "execution_timeout": 600}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DagSnapshot {
    pub dag_id: String,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub catchup: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub default_args: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub concurrency: Option<u32>,
    #[serde(default)]
    pub max_active_runs: Option<u32>,
    #[serde(default)]
    pub dagrun_timeout: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub doc_md: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskSnapshot>,
}

impl DagSnapshot {
    pub fn new(dag_id: impl Into<String>) -> Self {
        Self {
            dag_id: dag_id.into(),
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

impl LiveDag for DagSnapshot {
    fn dag_id(&self) -> &str {
        &self.dag_id
    }
    fn tasks(&self) -> Vec<&dyn LiveTask> {
        self.tasks.iter().map(|t| t as &dyn LiveTask).collect()
    }
    fn schedule(&self) -> Option<&str> {
        self.schedule.as_deref()
    }
    fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }
    fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }
    fn catchup(&self) -> Option<bool> {
        self.catchup
    }
    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }
    fn default_args(&self) -> BTreeMap<String, serde_json::Value> {
        self.default_args.clone()
    }
    fn concurrency(&self) -> Option<u32> {
        self.concurrency
    }
    fn max_active_runs(&self) -> Option<u32> {
        self.max_active_runs
    }
    fn dagrun_timeout_seconds(&self) -> Option<f64> {
        self.dagrun_timeout
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn doc_md(&self) -> Option<&str> {
        self.doc_md.as_deref()
    }
}
