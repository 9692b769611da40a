//! dag-prognosis - health analysis for Airflow DAG definition files
//!
//! Parses a DAG file once and runs three source analyzers over it (import
//! classification, top-level side effects, task chaining edges), recommends
//! provider packages for third-party imports, and scores the result. When
//! the caller also hands over the live DAG object, a runtime prognosis over
//! its tasks supersedes the static score.
//!
//! ```no_run
//! use dag_prognosis::{AnalysisMode, ClassificationSets, Engine, ProviderMapping};
//!
//! let sets = ClassificationSets::default();
//! let engine = Engine::new(&sets, ProviderMapping::builtin());
//! let report = engine.analyze("import boto3\n", AnalysisMode::Static)?;
//! println!("{:.1} {}", report.score, report.band);
//! # Ok::<(), dag_prognosis::PrognosisError>(())
//! ```

pub mod analyzers;
pub mod config;
pub mod engine;
pub mod error;
pub mod live;
pub mod models;
pub mod performance;
pub mod providers;
pub mod reporters;
pub mod scoring;

pub use config::{ClassificationSets, EngineConfig};
pub use engine::{AnalysisMode, Engine};
pub use error::{PrognosisError, Result};
pub use live::{DagSnapshot, LiveDag, LiveTask, TaskSnapshot};
pub use models::{AnalysisReport, Band, Finding, FindingKind};
pub use performance::{PerformanceHarness, PerformanceMetrics, PerformanceThresholds};
pub use providers::ProviderMapping;
