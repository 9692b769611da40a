//! Performance metrics from an external profiling harness
//!
//! The harness runs a DAG script in a sandbox and returns a metrics document
//! with `cpu`, `memory`, `io`, `db` and `scheduling` sections. This crate
//! never runs anything itself: [`PerformanceHarness`] is the seam a caller
//! implements, and [`insights`] turns a delivered document into
//! recommendations with a fixed rule table.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub script_path: PathBuf,
    #[serde(default)]
    pub runtime_config: BTreeMap<String, Value>,
    #[serde(default)]
    pub task_id: Option<String>,
    pub duration_seconds: u64,
}

/// A sandboxed profiler. Container lifecycle, timeouts and cleanup are the
/// implementor's concern.
pub trait PerformanceHarness {
    fn profile(&self, request: &ProfileRequest) -> Result<PerformanceMetrics>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuMetrics {
    pub utilization_percent: f64,
    pub execution_time: Value,
    pub hotspots: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryMetrics {
    pub rss_mb: f64,
    pub virtual_mb: f64,
    pub allocations: Vec<Value>,
    pub leaks: Vec<Value>,
    pub large_objects: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoPatterns {
    pub sequential_reads: u64,
    pub random_reads: u64,
    pub write_patterns: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoMetrics {
    pub read_bytes: u64,
    pub write_bytes: u64,
    /// seconds
    pub io_wait: f64,
    pub patterns: IoPatterns,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbMetrics {
    pub queries: Vec<Value>,
    pub connection_patterns: Vec<Value>,
    pub transaction_time: Vec<Value>,
    pub slow_queries: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueMetrics {
    /// seconds, one entry per task instance
    pub waiting_time: Vec<f64>,
    pub execution_time: Vec<f64>,
    pub overlaps: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingMetrics {
    /// seconds
    pub dag_file_parse_time: f64,
    pub task_instances: Vec<Value>,
    pub queue_metrics: QueueMetrics,
}

/// The harness's metrics document; every section and field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub io: IoMetrics,
    pub db: DbMetrics,
    pub scheduling: SchedulingMetrics,
}

impl PerformanceMetrics {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// Limits above which a metric produces an insight (`[performance]` in
/// project config)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    #[serde(default = "default_cpu_utilization")]
    pub cpu_utilization_percent: f64,
    #[serde(default = "default_io_wait")]
    pub io_wait_seconds: f64,
    #[serde(default = "default_parse_time")]
    pub parse_time_seconds: f64,
    #[serde(default = "default_queue_wait")]
    pub queue_wait_seconds: f64,
}

fn default_cpu_utilization() -> f64 {
    80.0
}
fn default_io_wait() -> f64 {
    5.0
}
fn default_parse_time() -> f64 {
    2.0
}
fn default_queue_wait() -> f64 {
    60.0
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            cpu_utilization_percent: default_cpu_utilization(),
            io_wait_seconds: default_io_wait(),
            parse_time_seconds: default_parse_time(),
            queue_wait_seconds: default_queue_wait(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceArea {
    Cpu,
    Memory,
    Io,
    Db,
    Scheduling,
}

impl std::fmt::Display for PerformanceArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceArea::Cpu => write!(f, "cpu"),
            PerformanceArea::Memory => write!(f, "memory"),
            PerformanceArea::Io => write!(f, "io"),
            PerformanceArea::Db => write!(f, "db"),
            PerformanceArea::Scheduling => write!(f, "scheduling"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInsight {
    pub area: PerformanceArea,
    pub message: String,
}

impl PerformanceInsight {
    fn new(area: PerformanceArea, message: String) -> Self {
        Self { area, message }
    }
}

/// Evaluate the rule table, in order: CPU, leaks, I/O wait, slow queries,
/// parse time, queue wait
pub fn insights(
    metrics: &PerformanceMetrics,
    thresholds: &PerformanceThresholds,
) -> Vec<PerformanceInsight> {
    let mut out = Vec::new();

    if metrics.cpu.utilization_percent > thresholds.cpu_utilization_percent {
        out.push(PerformanceInsight::new(
            PerformanceArea::Cpu,
            format!(
                "High CPU utilization ({:.1}%): move heavy computation into tasks or split it across workers",
                metrics.cpu.utilization_percent
            ),
        ));
    }

    if !metrics.memory.leaks.is_empty() {
        out.push(PerformanceInsight::new(
            PerformanceArea::Memory,
            format!(
                "{} potential memory leak(s) detected: release large objects and connections when tasks finish",
                metrics.memory.leaks.len()
            ),
        ));
    }

    if metrics.io.io_wait > thresholds.io_wait_seconds {
        out.push(PerformanceInsight::new(
            PerformanceArea::Io,
            format!(
                "High I/O wait ({:.1}s): batch reads and writes or stage data closer to the worker",
                metrics.io.io_wait
            ),
        ));
    }

    if !metrics.db.slow_queries.is_empty() {
        out.push(PerformanceInsight::new(
            PerformanceArea::Db,
            format!(
                "{} slow database quer(ies): add indexes or move the queries into hook-based tasks",
                metrics.db.slow_queries.len()
            ),
        ));
    }

    if metrics.scheduling.dag_file_parse_time > thresholds.parse_time_seconds {
        out.push(PerformanceInsight::new(
            PerformanceArea::Scheduling,
            format!(
                "Slow DAG file parsing ({:.2}s): remove top-level code and heavy imports",
                metrics.scheduling.dag_file_parse_time
            ),
        ));
    }

    let slow_waits = metrics
        .scheduling
        .queue_metrics
        .waiting_time
        .iter()
        .filter(|wait| **wait > thresholds.queue_wait_seconds)
        .count();
    if slow_waits > 0 {
        out.push(PerformanceInsight::new(
            PerformanceArea::Scheduling,
            format!(
                "{} task instance(s) queued longer than {:.0}s: review pools, queues and concurrency limits",
                slow_waits, thresholds.queue_wait_seconds
            ),
        ));
    }

    debug!("Performance rules produced {} insights", out.len());
    out
}
