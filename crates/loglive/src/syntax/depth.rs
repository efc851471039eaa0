//! Nesting limit on parsed trees

use super::ast::{Expr, Program, Stmt};
use super::visit::{walk_expr, walk_program, walk_stmt, Visitor};
use crate::error::SyntaxError;
use crate::stack::ensure_sufficient_stack;

/// Deepest chain of nested statements and expressions a document may hold.
pub const MAX_NESTING_DEPTH: usize = 1000;

pub(crate) const TOO_DEEP: &str = "nesting is too deep";

/// Offset of the first node nested deeper than [`MAX_NESTING_DEPTH`].
#[derive(Default)]
struct DepthCheck {
    depth: usize,
    too_deep_at: Option<usize>,
}

impl DepthCheck {
    fn enter(&mut self, offset: usize, walk: impl FnOnce(&mut Self)) {
        if self.too_deep_at.is_some() {
            return;
        }
        if self.depth == MAX_NESTING_DEPTH {
            self.too_deep_at = Some(offset);
            return;
        }
        self.depth += 1;
        ensure_sufficient_stack(|| walk(self));
        self.depth -= 1;
    }
}

impl<'ast> Visitor<'ast> for DepthCheck {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        self.enter(stmt.span.start, |v| walk_stmt(v, stmt));
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        self.enter(expr.span.start, |v| walk_expr(v, expr));
    }
}

pub(crate) fn check_program(source: &str, program: Program) -> Result<Program, SyntaxError> {
    let mut check = DepthCheck::default();
    walk_program(&mut check, &program);
    match check.too_deep_at {
        Some(offset) => Err(SyntaxError::at(source, offset, TOO_DEEP)),
        None => Ok(program),
    }
}

pub(crate) fn check_expr(source: &str, expr: Expr) -> Result<Expr, SyntaxError> {
    let mut check = DepthCheck::default();
    check.visit_expr(&expr);
    match check.too_deep_at {
        Some(offset) => Err(SyntaxError::at(source, offset, TOO_DEEP)),
        None => Ok(expr),
    }
}
