//! Task chaining edges (`a >> b`, `a << b`)

use super::walk::{walk_suite, AstVisitor, Scope, SourceMap};
use crate::models::{DependencyEdge, EdgeDirection, ExpressionRef};
use rustpython_parser::ast::{Expr, Operator, Stmt};
use tracing::info;

/// Records one edge per syntactic `>>` / `<<` occurrence, at any depth.
///
/// Operands are kept as source text; resolving them to task ids is left to
/// the caller. `a >> b >> c` parses as `(a >> b) >> c`, so it yields the
/// outer edge `a >> b -> c` followed by `a -> b`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyEdgeExtractor;

impl DependencyEdgeExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, suite: &[Stmt], map: &SourceMap<'_>) -> Vec<DependencyEdge> {
        let mut visitor = EdgeVisitor {
            map,
            edges: Vec::new(),
        };
        walk_suite(suite, &mut visitor);
        info!(
            "DependencyEdgeExtractor found {} edges",
            visitor.edges.len()
        );
        visitor.edges
    }
}

struct EdgeVisitor<'m> {
    map: &'m SourceMap<'m>,
    edges: Vec<DependencyEdge>,
}

impl EdgeVisitor<'_> {
    fn operand(&self, expr: &Expr) -> ExpressionRef {
        ExpressionRef {
            text: self.map.expr_text(expr),
            line: self.map.expr_line(expr),
        }
    }
}

impl AstVisitor for EdgeVisitor<'_> {
    fn visit_expr(&mut self, expr: &Expr, _scope: Scope) {
        let Expr::BinOp(binop) = expr else {
            return;
        };
        let direction = match binop.op {
            Operator::RShift => EdgeDirection::Downstream,
            Operator::LShift => EdgeDirection::Upstream,
            _ => return,
        };
        let edge = DependencyEdge {
            from: self.operand(&binop.left),
            to: self.operand(&binop.right),
            direction,
        };
        self.edges.push(edge);
    }
}
