//! Import classification
//!
//! Buckets every import by the provenance of its root package
//! (standard library, trusted orchestration namespace, third party),
//! records whether it runs at module scope, and flags imports that give
//! the DAG file direct database access.

use super::walk::{walk_suite, AstVisitor, Scope, SourceMap};
use crate::config::ClassificationSets;
use crate::models::{Finding, FindingKind, ImportCategory, ImportRecord, ImportSummary};
use rustpython_parser::ast::{Stmt, StmtImportFrom};
use std::collections::HashMap;
use tracing::{debug, info};

/// Output of one import classification pass
#[derive(Debug, Clone, Default)]
pub struct ImportAnalysis {
    pub imports: ImportSummary,
    /// `DirectDbAccess` findings in discovery order
    pub findings: Vec<Finding>,
}

pub struct ImportClassifier<'a> {
    sets: &'a ClassificationSets,
}

impl<'a> ImportClassifier<'a> {
    pub fn new(sets: &'a ClassificationSets) -> Self {
        Self { sets }
    }

    pub fn classify(&self, name: &str) -> ImportCategory {
        let root = name.split('.').next().unwrap_or(name);
        if self.sets.stdlib.contains(root) {
            ImportCategory::Stdlib
        } else if self.sets.trusted.contains(root) {
            ImportCategory::Trusted
        } else {
            ImportCategory::ThirdParty
        }
    }

    pub fn analyze(&self, suite: &[Stmt], map: &SourceMap<'_>) -> ImportAnalysis {
        let mut visitor = ImportVisitor {
            classifier: self,
            map,
            index: HashMap::new(),
            result: ImportAnalysis::default(),
        };
        walk_suite(suite, &mut visitor);

        let result = visitor.result;
        info!(
            "ImportClassifier found {} imports ({} stdlib, {} trusted, {} third-party), {} direct db findings",
            result.imports.len(),
            result.imports.stdlib.len(),
            result.imports.trusted.len(),
            result.imports.third_party.len(),
            result.findings.len()
        );
        result
    }
}

struct ImportVisitor<'c, 'm> {
    classifier: &'c ImportClassifier<'c>,
    map: &'m SourceMap<'m>,
    /// qualified name -> position in `result.imports.records`
    index: HashMap<String, usize>,
    result: ImportAnalysis,
}

impl ImportVisitor<'_, '_> {
    fn record(&mut self, name: &str, line: usize, scope: Scope) {
        let top_level = scope == Scope::Module;
        let imports = &mut self.result.imports;
        if top_level {
            imports.top_level.insert(name.to_string());
        }

        if let Some(&idx) = self.index.get(name) {
            imports.records[idx].is_top_level |= top_level;
            return;
        }

        let category = self.classifier.classify(name);
        let bucket = match category {
            ImportCategory::Stdlib => &mut imports.stdlib,
            ImportCategory::Trusted => &mut imports.trusted,
            ImportCategory::ThirdParty => &mut imports.third_party,
        };
        bucket.insert(name.to_string());

        self.index.insert(name.to_string(), imports.records.len());
        imports.records.push(ImportRecord {
            qualified_name: name.to_string(),
            category,
            is_top_level: top_level,
            source_line: line,
        });
    }

    fn flag_db_access(&mut self, name: &str, line: usize) {
        debug!("Direct database import {} at line {}", name, line);
        self.result.findings.push(
            Finding::new(
                FindingKind::DirectDbAccess,
                format!("Direct database access detected: {}", name),
            )
            .at_line(line)
            .with_recommendation(format!(
                "Reach the database through an Airflow hook or connection inside a task instead of importing {}",
                name
            ))
            .with_meta("module", name),
        );
    }

    fn visit_import_from(&mut self, import: &StmtImportFrom, scope: Scope) {
        let line = self.map.line_at(import.range.start());

        // Relative imports point at the DAG's own package
        if import.level.as_ref().is_some_and(|level| level.to_u32() > 0) {
            return;
        }
        let Some(module) = &import.module else {
            return;
        };
        let module = module.as_str();
        self.record(module, line, scope);

        let db_name = if self.classifier.sets.db_access.contains(module) {
            Some(module)
        } else {
            import
                .names
                .iter()
                .map(|alias| alias.name.as_str())
                .find(|name| self.classifier.sets.db_access.contains(*name))
        };
        if let Some(name) = db_name {
            self.flag_db_access(name, line);
        }
    }
}

impl AstVisitor for ImportVisitor<'_, '_> {
    fn visit_stmt(&mut self, stmt: &Stmt, scope: Scope) {
        match stmt {
            Stmt::Import(import) => {
                let line = self.map.line_at(import.range.start());
                for alias in &import.names {
                    let name = alias.name.as_str();
                    self.record(name, line, scope);
                    if self.classifier.sets.db_access.contains(name) {
                        self.flag_db_access(name, line);
                    }
                }
            }
            Stmt::ImportFrom(import) => self.visit_import_from(import, scope),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::parse_module;

    fn run(source: &str) -> ImportAnalysis {
        let sets = ClassificationSets::default();
        let suite = parse_module(source).expect("parse");
        let map = SourceMap::new(source);
        ImportClassifier::new(&sets).analyze(&suite, &map)
    }

    #[test]
    fn test_classifies_by_root_segment() {
        let result = run(
            "import os.path\nimport pandas\nfrom airflow.operators.python import PythonOperator\n",
        );
        let imports = &result.imports;
        assert!(imports.stdlib.contains("os.path"));
        assert!(imports.third_party.contains("pandas"));
        assert!(imports.trusted.contains("airflow.operators.python"));
        assert_eq!(imports.get("pandas").map(|r| r.source_line), Some(2));
    }

    #[test]
    fn test_categories_partition_imports() {
        let result = run(
            "import json\nimport json\nimport boto3\nfrom airflow import DAG\nimport astronomer.providers\n",
        );
        let imports = &result.imports;
        assert_eq!(imports.len(), 4);
        let total = imports.stdlib.len() + imports.trusted.len() + imports.third_party.len();
        assert_eq!(total, imports.len());
        assert!(imports.stdlib.is_disjoint(&imports.trusted));
        assert!(imports.stdlib.is_disjoint(&imports.third_party));
        assert!(imports.trusted.is_disjoint(&imports.third_party));
    }

    #[test]
    fn test_top_level_vs_nested() {
        let result = run(
            r#"
import requests

def task():
    import numpy
    from json import loads

class Holder:
    import yaml
"#,
        );
        let imports = &result.imports;
        assert!(imports.get("requests").expect("requests").is_top_level);
        assert!(!imports.get("numpy").expect("numpy").is_top_level);
        assert!(!imports.get("json").expect("json").is_top_level);
        assert!(!imports.get("yaml").expect("yaml").is_top_level);
        assert_eq!(imports.top_level.len(), 1);
    }

    #[test]
    fn test_top_level_wins_when_imported_twice() {
        let result = run("def f():\n    import boto3\n\nimport boto3\n");
        let record = result.imports.get("boto3").expect("boto3");
        assert!(record.is_top_level);
        assert_eq!(record.source_line, 2);
    }

    #[test]
    fn test_conditional_module_import_is_top_level() {
        let result = run("import sys\nif sys.version_info > (3, 8):\n    import requests\n");
        assert!(result.imports.get("requests").expect("requests").is_top_level);
    }

    #[test]
    fn test_direct_db_access_any_category() {
        let result = run(
            "import psycopg2\nfrom sqlalchemy.orm import Session\nfrom airflow.utils.session import provide_session\n",
        );
        let lines: Vec<Option<usize>> = result.findings.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![Some(1), Some(2), Some(3)]);
        assert!(result
            .findings
            .iter()
            .all(|f| f.kind == FindingKind::DirectDbAccess && f.recommendation.is_some()));
        // airflow.utils.session is still trusted
        assert!(result.imports.trusted.contains("airflow.utils.session"));
    }

    #[test]
    fn test_db_access_requires_full_name() {
        // root segment alone is not enough: mysql.connector is flagged, mysql.utils is not
        let result = run("import mysql.utils\nimport mysql.connector\n");
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].line, Some(2));
    }

    #[test]
    fn test_relative_imports_skipped() {
        let result = run("from . import helpers\nfrom .common import defaults\n");
        assert!(result.imports.is_empty());
    }

    #[test]
    fn test_import_each_alias() {
        let result = run("import os, pandas as pd, boto3\n");
        assert_eq!(result.imports.len(), 3);
        assert!(result.imports.third_party.contains("pandas"));
        assert!(result.imports.third_party.contains("boto3"));
    }
}
