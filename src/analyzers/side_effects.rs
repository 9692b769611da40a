//! Top-level side-effect detection
//!
//! Code outside task callables runs every time the scheduler re-parses the
//! DAG file. Three patterns are flagged from a single pre-order walk:
//!
//! - database/ORM calls (`session.query(...)`, `create_engine(...)`). These
//!   are matched at any depth, including inside functions and classes.
//! - `Variable.get(...)` at module scope, which hits the metadata database on
//!   every parse.
//! - `start_date` values computed from the wall clock (`datetime.now()`),
//!   which make every parse produce a different DAG.

use super::walk::{walk_suite, AstVisitor, Scope, SourceMap};
use crate::config::ClassificationSets;
use crate::models::{Finding, FindingKind};
use rustpython_parser::ast::{Constant, Expr, ExprCall, Stmt};
use tracing::{debug, info};

const DYNAMIC_DATE_CALLS: &[&str] = &["now", "utcnow", "today"];

pub struct TopLevelSideEffectDetector<'a> {
    sets: &'a ClassificationSets,
}

impl<'a> TopLevelSideEffectDetector<'a> {
    pub fn new(sets: &'a ClassificationSets) -> Self {
        Self { sets }
    }

    /// Findings in discovery order
    pub fn detect(&self, suite: &[Stmt], map: &SourceMap<'_>) -> Vec<Finding> {
        let mut visitor = SideEffectVisitor {
            sets: self.sets,
            map,
            findings: Vec::new(),
        };
        walk_suite(suite, &mut visitor);

        let findings = visitor.findings;
        info!(
            "TopLevelSideEffectDetector found {} findings ({} db operations)",
            findings.len(),
            findings
                .iter()
                .filter(|f| f.kind == FindingKind::DbOperationAtTopLevel)
                .count()
        );
        findings
    }
}

struct SideEffectVisitor<'s, 'm> {
    sets: &'s ClassificationSets,
    map: &'m SourceMap<'m>,
    findings: Vec<Finding>,
}

/// True if a `now()`/`utcnow()`/`today()` call appears anywhere in the
/// value: `datetime.now() - timedelta(days=1)`,
/// `pendulum.now("UTC").subtract(days=1)`...
fn is_dynamic_date(expr: &Expr) -> bool {
    match expr {
        Expr::Call(call) => {
            let name = match call.func.as_ref() {
                Expr::Name(name) => Some(name.id.as_str()),
                Expr::Attribute(attr) => Some(attr.attr.as_str()),
                _ => None,
            };
            name.is_some_and(|name| DYNAMIC_DATE_CALLS.contains(&name))
                || is_dynamic_date(&call.func)
                || call.args.iter().any(is_dynamic_date)
                || call.keywords.iter().any(|kw| is_dynamic_date(&kw.value))
        }
        Expr::Attribute(attr) => is_dynamic_date(&attr.value),
        Expr::BinOp(op) => is_dynamic_date(&op.left) || is_dynamic_date(&op.right),
        Expr::UnaryOp(op) => is_dynamic_date(&op.operand),
        _ => false,
    }
}

impl SideEffectVisitor<'_, '_> {
    /// Name of the call if it looks like a database operation
    fn db_call_name(&self, call: &ExprCall) -> Option<String> {
        match call.func.as_ref() {
            Expr::Name(name) if self.sets.is_db_call_name(name.id.as_str()) => {
                Some(name.id.to_string())
            }
            Expr::Attribute(attr) => {
                let method = attr.attr.as_str();
                match attr.value.as_ref() {
                    Expr::Name(receiver)
                        if self.sets.is_db_attribute_call(receiver.id.as_str(), method) =>
                    {
                        Some(format!("{}.{}", receiver.id, method))
                    }
                    Expr::Name(_) => None,
                    _ if self.sets.db_functions.contains(method) => Some(method.to_string()),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn check_call(&mut self, expr: &Expr, call: &ExprCall, scope: Scope) {
        let line = self.map.expr_line(expr);

        if let Some(name) = self.db_call_name(call) {
            debug!("Database call {} at line {} ({:?} scope)", name, line, scope);
            self.findings.push(
                Finding::new(
                    FindingKind::DbOperationAtTopLevel,
                    format!("Database operation at top level: {}", name),
                )
                .at_line(line)
                .with_meta("call", self.map.expr_text(expr)),
            );
        }

        if scope == Scope::Module {
            if let Expr::Attribute(attr) = call.func.as_ref() {
                if matches!(attr.value.as_ref(), Expr::Name(n) if n.id.as_str() == "Variable")
                    && attr.attr.as_str() == "get"
                {
                    self.findings.push(
                        Finding::new(
                            FindingKind::AirflowVariableAtTopLevel,
                            "Airflow Variable read at top level: Variable.get",
                        )
                        .at_line(line)
                        .with_meta("call", self.map.expr_text(expr)),
                    );
                }
            }
        }

        for keyword in &call.keywords {
            let is_start_date = keyword
                .arg
                .as_ref()
                .is_some_and(|arg| arg.as_str() == "start_date");
            if is_start_date && is_dynamic_date(&keyword.value) {
                self.flag_dynamic_date(&keyword.value);
            }
        }
    }

    fn flag_dynamic_date(&mut self, value: &Expr) {
        let text = self.map.expr_text(value);
        self.findings.push(
            Finding::new(
                FindingKind::DynamicStartDate,
                format!("Dynamic start_date: {}", text),
            )
            .at_line(self.map.expr_line(value))
            .with_meta("value", text),
        );
    }
}

impl AstVisitor for SideEffectVisitor<'_, '_> {
    fn visit_expr(&mut self, expr: &Expr, scope: Scope) {
        match expr {
            Expr::Call(call) => self.check_call(expr, call, scope),
            Expr::Dict(dict) => {
                for (key, value) in dict.keys.iter().zip(&dict.values) {
                    let is_start_date = matches!(
                        key,
                        Some(Expr::Constant(c)) if matches!(&c.value, Constant::Str(s) if s == "start_date")
                    );
                    if is_start_date && is_dynamic_date(value) {
                        self.flag_dynamic_date(value);
                    }
                }
            }
            _ => {}
        }
    }
}
