//! Analyzers over DAG source text and live DAG objects
//!
//! Source analyzers share one parse and walk it with [`walk::AstVisitor`]:
//! - `imports` - provenance buckets and direct database imports
//! - `side_effects` - database calls, `Variable.get` and dynamic start dates
//! - `dependencies` - `>>` / `<<` task chaining edges
//!
//! `tasks` reads a live DAG object instead of the source.

pub mod dependencies;
pub mod imports;
pub mod side_effects;
pub mod tasks;
pub mod walk;

pub use dependencies::DependencyEdgeExtractor;
pub use imports::{ImportAnalysis, ImportClassifier};
pub use side_effects::TopLevelSideEffectDetector;
pub use tasks::{analyze_dag_metadata, analyze_task_complexity};
pub use walk::SourceMap;

use crate::error::{PrognosisError, Result};
use rustpython_parser::ast::{Mod, Suite};
use rustpython_parser::{parse, Mode};

/// Parse DAG source into a module body.
///
/// Malformed source is fatal: callers get `PrognosisError::Parse` and no
/// partial analysis.
pub fn parse_module(source: &str) -> Result<Suite> {
    let ast = parse(source, Mode::Module, "<dag>")
        .map_err(|e| PrognosisError::Parse(e.to_string()))?;

    match ast {
        Mod::Module(m) => Ok(m.body),
        _ => Ok(vec![]),
    }
}
