//! Pre-order traversal over the rustpython AST
//!
//! Every analyzer implements [`AstVisitor`] and is driven by [`walk_suite`].
//! Each node is handed to the visitor before its children, together with the
//! [`Scope`] it executes in, so analyzers never inspect parents.

use line_numbers::LinePositions;
use rustpython_parser::ast::{Arguments, Comprehension, ExceptHandler, Expr, Stmt};

/// Where a node executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Runs on every parse of the DAG file
    Module,
    Class,
    Function,
}

pub trait AstVisitor {
    fn visit_stmt(&mut self, _stmt: &Stmt, _scope: Scope) {}
    fn visit_expr(&mut self, _expr: &Expr, _scope: Scope) {}
}

/// Walk a module body in pre-order
pub fn walk_suite<V: AstVisitor>(suite: &[Stmt], visitor: &mut V) {
    walk_body(suite, Scope::Module, visitor);
}

fn walk_body<V: AstVisitor>(body: &[Stmt], scope: Scope, visitor: &mut V) {
    for stmt in body {
        walk_stmt(stmt, scope, visitor);
    }
}

fn walk_opt<V: AstVisitor>(expr: Option<&Expr>, scope: Scope, visitor: &mut V) {
    if let Some(expr) = expr {
        walk_expr(expr, scope, visitor);
    }
}

fn walk_exprs<V: AstVisitor>(exprs: &[Expr], scope: Scope, visitor: &mut V) {
    for expr in exprs {
        walk_expr(expr, scope, visitor);
    }
}

// Defaults and annotations are evaluated where the def statement runs.
fn walk_arguments<V: AstVisitor>(args: &Arguments, scope: Scope, visitor: &mut V) {
    for arg in args
        .posonlyargs
        .iter()
        .chain(&args.args)
        .chain(&args.kwonlyargs)
    {
        walk_opt(arg.def.annotation.as_deref(), scope, visitor);
        walk_opt(arg.default.as_deref(), scope, visitor);
    }
    for arg in args.vararg.iter().chain(&args.kwarg) {
        walk_opt(arg.annotation.as_deref(), scope, visitor);
    }
}

fn walk_handlers<V: AstVisitor>(handlers: &[ExceptHandler], scope: Scope, visitor: &mut V) {
    for handler in handlers {
        let ExceptHandler::ExceptHandler(h) = handler;
        walk_opt(h.type_.as_deref(), scope, visitor);
        walk_body(&h.body, scope, visitor);
    }
}

pub fn walk_stmt<V: AstVisitor>(stmt: &Stmt, scope: Scope, visitor: &mut V) {
    visitor.visit_stmt(stmt, scope);

    match stmt {
        Stmt::FunctionDef(func) => {
            walk_exprs(&func.decorator_list, scope, visitor);
            walk_arguments(&func.args, scope, visitor);
            walk_opt(func.returns.as_deref(), scope, visitor);
            walk_body(&func.body, Scope::Function, visitor);
        }
        Stmt::AsyncFunctionDef(func) => {
            walk_exprs(&func.decorator_list, scope, visitor);
            walk_arguments(&func.args, scope, visitor);
            walk_opt(func.returns.as_deref(), scope, visitor);
            walk_body(&func.body, Scope::Function, visitor);
        }
        Stmt::ClassDef(class) => {
            walk_exprs(&class.decorator_list, scope, visitor);
            walk_exprs(&class.bases, scope, visitor);
            for kw in &class.keywords {
                walk_expr(&kw.value, scope, visitor);
            }
            walk_body(&class.body, Scope::Class, visitor);
        }
        Stmt::Return(ret) => walk_opt(ret.value.as_deref(), scope, visitor),
        Stmt::Delete(del) => walk_exprs(&del.targets, scope, visitor),
        Stmt::Assign(assign) => {
            walk_exprs(&assign.targets, scope, visitor);
            walk_expr(&assign.value, scope, visitor);
        }
        Stmt::AugAssign(aug) => {
            walk_expr(&aug.target, scope, visitor);
            walk_expr(&aug.value, scope, visitor);
        }
        Stmt::AnnAssign(ann) => {
            walk_expr(&ann.target, scope, visitor);
            walk_expr(&ann.annotation, scope, visitor);
            walk_opt(ann.value.as_deref(), scope, visitor);
        }
        Stmt::For(for_stmt) => {
            walk_expr(&for_stmt.target, scope, visitor);
            walk_expr(&for_stmt.iter, scope, visitor);
            walk_body(&for_stmt.body, scope, visitor);
            walk_body(&for_stmt.orelse, scope, visitor);
        }
        Stmt::AsyncFor(for_stmt) => {
            walk_expr(&for_stmt.target, scope, visitor);
            walk_expr(&for_stmt.iter, scope, visitor);
            walk_body(&for_stmt.body, scope, visitor);
            walk_body(&for_stmt.orelse, scope, visitor);
        }
        Stmt::While(while_stmt) => {
            walk_expr(&while_stmt.test, scope, visitor);
            walk_body(&while_stmt.body, scope, visitor);
            walk_body(&while_stmt.orelse, scope, visitor);
        }
        Stmt::If(if_stmt) => {
            walk_expr(&if_stmt.test, scope, visitor);
            walk_body(&if_stmt.body, scope, visitor);
            walk_body(&if_stmt.orelse, scope, visitor);
        }
        Stmt::With(with_stmt) => {
            for item in &with_stmt.items {
                walk_expr(&item.context_expr, scope, visitor);
                walk_opt(item.optional_vars.as_deref(), scope, visitor);
            }
            walk_body(&with_stmt.body, scope, visitor);
        }
        Stmt::AsyncWith(with_stmt) => {
            for item in &with_stmt.items {
                walk_expr(&item.context_expr, scope, visitor);
                walk_opt(item.optional_vars.as_deref(), scope, visitor);
            }
            walk_body(&with_stmt.body, scope, visitor);
        }
        Stmt::Match(match_stmt) => {
            walk_expr(&match_stmt.subject, scope, visitor);
            for case in &match_stmt.cases {
                walk_opt(case.guard.as_deref(), scope, visitor);
                walk_body(&case.body, scope, visitor);
            }
        }
        Stmt::Raise(raise) => {
            walk_opt(raise.exc.as_deref(), scope, visitor);
            walk_opt(raise.cause.as_deref(), scope, visitor);
        }
        Stmt::Try(try_stmt) => {
            walk_body(&try_stmt.body, scope, visitor);
            walk_handlers(&try_stmt.handlers, scope, visitor);
            walk_body(&try_stmt.orelse, scope, visitor);
            walk_body(&try_stmt.finalbody, scope, visitor);
        }
        Stmt::TryStar(try_stmt) => {
            walk_body(&try_stmt.body, scope, visitor);
            walk_handlers(&try_stmt.handlers, scope, visitor);
            walk_body(&try_stmt.orelse, scope, visitor);
            walk_body(&try_stmt.finalbody, scope, visitor);
        }
        Stmt::Assert(assert) => {
            walk_expr(&assert.test, scope, visitor);
            walk_opt(assert.msg.as_deref(), scope, visitor);
        }
        Stmt::Expr(expr_stmt) => walk_expr(&expr_stmt.value, scope, visitor),
        _ => {}
    }
}

fn walk_generators<V: AstVisitor>(generators: &[Comprehension], scope: Scope, visitor: &mut V) {
    for gen in generators {
        walk_expr(&gen.target, scope, visitor);
        walk_expr(&gen.iter, scope, visitor);
        walk_exprs(&gen.ifs, scope, visitor);
    }
}

pub fn walk_expr<V: AstVisitor>(expr: &Expr, scope: Scope, visitor: &mut V) {
    visitor.visit_expr(expr, scope);

    match expr {
        Expr::BoolOp(b) => walk_exprs(&b.values, scope, visitor),
        Expr::NamedExpr(named) => {
            walk_expr(&named.target, scope, visitor);
            walk_expr(&named.value, scope, visitor);
        }
        Expr::BinOp(b) => {
            walk_expr(&b.left, scope, visitor);
            walk_expr(&b.right, scope, visitor);
        }
        Expr::UnaryOp(u) => walk_expr(&u.operand, scope, visitor),
        Expr::Lambda(lambda) => {
            walk_arguments(&lambda.args, scope, visitor);
            walk_expr(&lambda.body, Scope::Function, visitor);
        }
        Expr::IfExp(ifexp) => {
            walk_expr(&ifexp.test, scope, visitor);
            walk_expr(&ifexp.body, scope, visitor);
            walk_expr(&ifexp.orelse, scope, visitor);
        }
        Expr::Dict(dict) => {
            for (key, value) in dict.keys.iter().zip(&dict.values) {
                walk_opt(key.as_ref(), scope, visitor);
                walk_expr(value, scope, visitor);
            }
        }
        Expr::Set(set) => walk_exprs(&set.elts, scope, visitor),
        Expr::ListComp(comp) => {
            walk_expr(&comp.elt, scope, visitor);
            walk_generators(&comp.generators, scope, visitor);
        }
        Expr::SetComp(comp) => {
            walk_expr(&comp.elt, scope, visitor);
            walk_generators(&comp.generators, scope, visitor);
        }
        Expr::DictComp(comp) => {
            walk_expr(&comp.key, scope, visitor);
            walk_expr(&comp.value, scope, visitor);
            walk_generators(&comp.generators, scope, visitor);
        }
        Expr::GeneratorExp(gen) => {
            walk_expr(&gen.elt, scope, visitor);
            walk_generators(&gen.generators, scope, visitor);
        }
        Expr::Await(await_expr) => walk_expr(&await_expr.value, scope, visitor),
        Expr::Yield(yield_expr) => walk_opt(yield_expr.value.as_deref(), scope, visitor),
        Expr::YieldFrom(yf) => walk_expr(&yf.value, scope, visitor),
        Expr::Compare(cmp) => {
            walk_expr(&cmp.left, scope, visitor);
            walk_exprs(&cmp.comparators, scope, visitor);
        }
        Expr::Call(call) => {
            walk_expr(&call.func, scope, visitor);
            walk_exprs(&call.args, scope, visitor);
            for kw in &call.keywords {
                walk_expr(&kw.value, scope, visitor);
            }
        }
        Expr::FormattedValue(fv) => {
            walk_expr(&fv.value, scope, visitor);
            walk_opt(fv.format_spec.as_deref(), scope, visitor);
        }
        Expr::JoinedStr(js) => walk_exprs(&js.values, scope, visitor),
        Expr::Attribute(attr) => walk_expr(&attr.value, scope, visitor),
        Expr::Subscript(sub) => {
            walk_expr(&sub.value, scope, visitor);
            walk_expr(&sub.slice, scope, visitor);
        }
        Expr::Starred(starred) => walk_expr(&starred.value, scope, visitor),
        Expr::List(list) => walk_exprs(&list.elts, scope, visitor),
        Expr::Tuple(tuple) => walk_exprs(&tuple.elts, scope, visitor),
        Expr::Slice(slice) => {
            walk_opt(slice.lower.as_deref(), scope, visitor);
            walk_opt(slice.upper.as_deref(), scope, visitor);
            walk_opt(slice.step.as_deref(), scope, visitor);
        }
        Expr::Constant(_) | Expr::Name(_) => {}
    }
}

/// Byte span of an expression
pub fn expr_span(expr: &Expr) -> (usize, usize) {
    let range = match expr {
        Expr::BoolOp(e) => e.range,
        Expr::NamedExpr(e) => e.range,
        Expr::BinOp(e) => e.range,
        Expr::UnaryOp(e) => e.range,
        Expr::Lambda(e) => e.range,
        Expr::IfExp(e) => e.range,
        Expr::Dict(e) => e.range,
        Expr::Set(e) => e.range,
        Expr::ListComp(e) => e.range,
        Expr::SetComp(e) => e.range,
        Expr::DictComp(e) => e.range,
        Expr::GeneratorExp(e) => e.range,
        Expr::Await(e) => e.range,
        Expr::Yield(e) => e.range,
        Expr::YieldFrom(e) => e.range,
        Expr::Compare(e) => e.range,
        Expr::Call(e) => e.range,
        Expr::FormattedValue(e) => e.range,
        Expr::JoinedStr(e) => e.range,
        Expr::Constant(e) => e.range,
        Expr::Attribute(e) => e.range,
        Expr::Subscript(e) => e.range,
        Expr::Starred(e) => e.range,
        Expr::Name(e) => e.range,
        Expr::List(e) => e.range,
        Expr::Tuple(e) => e.range,
        Expr::Slice(e) => e.range,
    };
    (range.start().into(), range.end().into())
}

/// Dotted name of a `Name` / `Attribute` chain, e.g. `sqlalchemy.orm.Session`
pub fn dotted_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.id.to_string()),
        Expr::Attribute(attr) => {
            dotted_name(&attr.value).map(|base| format!("{}.{}", base, attr.attr))
        }
        _ => None,
    }
}

/// Offset-to-line lookups and source slicing for one file
pub struct SourceMap<'a> {
    source: &'a str,
    lines: LinePositions,
}

impl<'a> SourceMap<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lines: LinePositions::from(source),
        }
    }

    /// 1-based line of a byte offset
    pub fn line_at(&self, offset: impl Into<usize>) -> usize {
        self.lines.from_offset(offset.into()).as_usize() + 1
    }

    pub fn expr_line(&self, expr: &Expr) -> usize {
        self.line_at(expr_span(expr).0)
    }

    /// Source text of an expression, whitespace-collapsed
    pub fn expr_text(&self, expr: &Expr) -> String {
        let (start, end) = expr_span(expr);
        self.source
            .get(start..end)
            .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::parse_module;

    #[derive(Default)]
    struct CallCollector {
        calls: Vec<(String, Scope)>,
    }

    impl AstVisitor for CallCollector {
        fn visit_expr(&mut self, expr: &Expr, scope: Scope) {
            if let Expr::Call(call) = expr {
                if let Some(name) = dotted_name(&call.func) {
                    self.calls.push((name, scope));
                }
            }
        }
    }

    #[test]
    fn test_scopes_follow_definitions() {
        let source = r#"
setup()

@decorate(arg())
def task_fn(x=default()):
    inner()

class Holder:
    attr = class_level()

    def method(self):
        deep.call()
"#;
        let suite = parse_module(source).expect("parse");
        let mut collector = CallCollector::default();
        walk_suite(&suite, &mut collector);

        let scope_of = |name: &str| {
            collector
                .calls
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, s)| *s)
        };
        assert_eq!(scope_of("setup"), Some(Scope::Module));
        assert_eq!(scope_of("decorate"), Some(Scope::Module));
        assert_eq!(scope_of("arg"), Some(Scope::Module));
        assert_eq!(scope_of("default"), Some(Scope::Module));
        assert_eq!(scope_of("inner"), Some(Scope::Function));
        assert_eq!(scope_of("class_level"), Some(Scope::Class));
        assert_eq!(scope_of("deep.call"), Some(Scope::Function));
    }

    #[test]
    fn test_pre_order_visits_outer_call_first() {
        let suite = parse_module("outer(inner())\n").expect("parse");
        let mut collector = CallCollector::default();
        walk_suite(&suite, &mut collector);
        let names: Vec<&str> = collector.calls.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["outer", "inner"]);
    }

    #[test]
    fn test_source_map_lines_and_text() {
        let source = "a = 1\nb = foo(\n    1,\n    2)\n";
        let suite = parse_module(source).expect("parse");
        let map = SourceMap::new(source);
        let Stmt::Assign(assign) = &suite[1] else {
            panic!("expected assignment");
        };
        assert_eq!(map.expr_line(&assign.value), 2);
        assert_eq!(map.expr_text(&assign.value), "foo( 1, 2)");
    }
}
