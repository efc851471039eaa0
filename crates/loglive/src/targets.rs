//! Target Selector: which nodes get evaluated
//!
//! One pre-order walk over the program yields, in document order:
//!
//! - top-level expression statements, when "show all expressions" is on;
//! - variable initializers at any depth, under the same flag;
//! - `console.log(...)` calls at any depth, always.
//!
//! Nothing is deduplicated. `console.log(1);` with the flag on yields a
//! plain-expression target for the statement and a debug-print target for
//! the call, both on the same line.

use serde::Serialize;
use tracing::debug;

use crate::syntax::ast::{Expr, ExprKind, Program, Stmt, StmtKind, VarDeclarator};
use crate::syntax::visit::{self, Visitor};
use crate::syntax::Span;

/// Why a node was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetKind {
    /// A top-level expression statement
    PlainExpression,
    /// The initializer of a `var`/`let`/`const` declarator
    VariableInit,
    /// A `console.log(...)` call
    DebugPrintCall,
}

/// A node selected for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationTarget {
    /// Classification
    pub kind: TargetKind,

    /// Span of the selected node; annotations anchor to its first line
    pub span: Span,

    /// Value-only source text to evaluate
    pub source: String,
}

/// Select evaluation targets from `program`, parsed from `text`.
pub fn select_targets(program: &Program, text: &str, show_all: bool) -> Vec<EvaluationTarget> {
    let mut selector = Selector {
        program,
        text,
        show_all,
        nesting: 0,
        targets: Vec::new(),
    };
    visit::walk_program(&mut selector, program);
    selector.targets
}

struct Selector<'a> {
    program: &'a Program,
    text: &'a str,
    show_all: bool,

    /// Statements enclosing the one being visited
    nesting: usize,

    targets: Vec<EvaluationTarget>,
}

impl Selector<'_> {
    fn push(&mut self, kind: TargetKind, span: Span, source: String) {
        debug!(?kind, %source, "selected target");
        self.targets.push(EvaluationTarget { kind, span, source });
    }
}

impl<'ast> Visitor<'ast> for Selector<'_> {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        if let StmtKind::Expression(expr) = &stmt.kind {
            if self.show_all && self.nesting == 0 {
                let source = self.program.value_source(self.text, expr.span);
                self.push(TargetKind::PlainExpression, expr.span, source);
            }
        }
        self.nesting += 1;
        visit::walk_stmt(self, stmt);
        self.nesting -= 1;
    }

    fn visit_var_declarator(&mut self, declarator: &'ast VarDeclarator) {
        if let (true, Some(init)) = (self.show_all, &declarator.init) {
            let source = self.program.value_source(self.text, init.span);
            self.push(TargetKind::VariableInit, init.span, source);
        }
        visit::walk_var_declarator(self, declarator);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        if let ExprKind::Call { callee, args, .. } = &expr.kind {
            if callee.is_console_log() {
                // Arguments run as one comma sequence, so only the last
                // value survives. A spread keeps its `...` and fails to parse.
                let source = if args.is_empty() {
                    "undefined".to_string()
                } else {
                    args.iter()
                        .map(|arg| {
                            let text = self.program.value_source(self.text, arg.expr.span);
                            if arg.spread {
                                format!("...{}", text)
                            } else {
                                text
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                self.push(TargetKind::DebugPrintCall, expr.span, source);
            }
        }
        visit::walk_expr(self, expr);
    }
}
