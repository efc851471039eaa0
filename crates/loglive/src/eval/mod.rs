//! Tree-walking evaluation
//!
//! An [`Interpreter`] borrows the [`Environment`] immutably and evaluates
//! AST nodes through the [`Evaluate`] trait. Free identifiers resolve
//! against the local [`Scope`] chain, then the visible prefix of the
//! Environment, then the built-in whitelist.

mod assign;
mod binary;
mod call;
mod class;
pub mod control;
mod function;
mod literal;
mod loops;
mod member;
mod methods;
mod pattern;
mod stmt;
mod unary;

pub use control::ControlFlow;

use std::time::Instant;

use crate::context::EvalContext;
use crate::environment::prelude::Prelude;
use crate::environment::{Environment, Scope};
use crate::error::{EnvironmentError, EvalError, EvalFailure};
use crate::stack::ensure_sufficient_stack;
use crate::syntax::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::syntax::{self, ParseOptions};
use crate::value::Value;

/// Steps between deadline and interrupt checks.
const CHECK_INTERVAL: u32 = 256;

/// Trait for evaluating AST nodes to values.
///
/// This is the core abstraction for the tree-walking interpreter.
/// Statements evaluate to `undefined` unless they jump.
pub trait Evaluate {
    /// Evaluate this node in `scope`.
    fn eval(&self, cx: &mut Interpreter<'_>, scope: &Scope) -> Result<Value, EvalError>;
}

/// Result of evaluating one snippet.
#[derive(Debug, Clone)]
pub enum EvaluationOutcome {
    /// The snippet produced a value, possibly `undefined`
    Value(Value),
    /// The snippet failed
    Failure(EvalFailure),
}

impl EvaluationOutcome {
    /// The produced value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            EvaluationOutcome::Value(v) => Some(v),
            EvaluationOutcome::Failure(_) => None,
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&EvalFailure> {
        match self {
            EvaluationOutcome::Value(_) => None,
            EvaluationOutcome::Failure(f) => Some(f),
        }
    }
}

impl From<Result<Value, EvalError>> for EvaluationOutcome {
    fn from(result: Result<Value, EvalError>) -> Self {
        match result {
            Ok(value) => EvaluationOutcome::Value(value),
            Err(err) => EvaluationOutcome::Failure(EvalFailure::from(&err)),
        }
    }
}

/// Evaluate `snippet` as a single expression against `env`.
///
/// Comma sequences are allowed and yield their last value. Failures of
/// every kind come back as [`EvaluationOutcome::Failure`].
///
/// ```
/// use loglive::{evaluate, EvalContext, Environment, Value};
///
/// let env = Environment::new();
/// let outcome = evaluate("1, 2, 3", &env, &EvalContext::new());
/// assert_eq!(outcome.value(), Some(&Value::Number(3.0)));
/// ```
pub fn evaluate(snippet: &str, env: &Environment, ctx: &EvalContext) -> EvaluationOutcome {
    let result = syntax::parse_expression(snippet, ParseOptions::javascript())
        .map_err(EvalError::from)
        .and_then(|expr| Interpreter::new(env, ctx).run_expression(&expr));
    result.into()
}

/// Evaluate one declaration (`function f() {}`, `class A {}`,
/// `const x = 1`) and return the value it binds to `name`.
pub fn evaluate_declaration(
    text: &str,
    name: &str,
    env: &Environment,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let program = syntax::parse(text, ParseOptions::javascript())?;
    let mut cx = Interpreter::new(env, ctx);
    let scope = Scope::root(None);
    for stmt in &program.body {
        cx.run_statement(stmt, &scope)?;
    }
    scope
        .lookup(name)
        .ok_or_else(|| EvalError::UndefinedVariable {
            name: name.to_string(),
        })
}

// ═══════════════════════════════════════════════════════════════════════
// Interpreter
// ═══════════════════════════════════════════════════════════════════════

/// Evaluation state for one snippet.
pub struct Interpreter<'a> {
    env: &'a Environment,
    ctx: &'a EvalContext,
    prelude: Prelude,

    /// Environment entries visible to the code being run
    visible: usize,

    /// Current call depth
    depth: usize,

    steps: u32,
    deadline: Option<Instant>,
}

impl<'a> Interpreter<'a> {
    /// An interpreter seeing every entry of `env`.
    pub fn new(env: &'a Environment, ctx: &'a EvalContext) -> Self {
        Self {
            env,
            ctx,
            prelude: Prelude::new(),
            visible: env.len(),
            depth: 0,
            steps: 0,
            deadline: ctx.timeout.map(|t| Instant::now() + t),
        }
    }

    /// Evaluate a top-level expression in a fresh scope.
    pub fn run_expression(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        let scope = Scope::root(None);
        expr.eval(self, &scope)
    }

    /// Run a statement; stray `break`/`continue`/`return` become errors.
    pub fn run_statement(&mut self, stmt: &Stmt, scope: &Scope) -> Result<Value, EvalError> {
        if let StmtKind::Block(body) = &stmt.kind {
            return self.run_block(body, &scope.child());
        }
        stmt.eval(self, scope)
    }

    /// Resolve a free identifier.
    pub fn lookup(&mut self, name: &str, scope: &Scope) -> Result<Value, EvalError> {
        self.try_lookup(name, scope)
            .ok_or_else(|| EvalError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn try_lookup(&mut self, name: &str, scope: &Scope) -> Option<Value> {
        if let Some(value) = scope.lookup(name) {
            return Some(value);
        }
        if let Some(value) = self.env.get_visible(name, self.visible) {
            return Some(value.clone());
        }
        self.prelude.get(name)
    }

    /// Assign to an identifier. Environment and built-in names are read-only.
    fn assign_name(&mut self, name: &str, value: Value, scope: &Scope) -> Result<(), EvalError> {
        if scope.assign(name, value)? {
            return Ok(());
        }
        if self.env.get_visible(name, self.visible).is_some() || self.prelude.get(name).is_some() {
            return Err(EnvironmentError::TopLevelAssignment {
                name: name.to_string(),
            }
            .into());
        }
        Err(EvalError::UndefinedVariable {
            name: name.to_string(),
        })
    }

    /// Count a step, checking the deadline and interrupt flag periodically.
    fn tick(&mut self) -> Result<(), EvalError> {
        self.steps = self.steps.wrapping_add(1);
        if self.steps % CHECK_INTERVAL != 0 {
            return Ok(());
        }
        if self.ctx.is_interrupted() {
            return Err(EvalError::Interrupted);
        }
        if let (Some(deadline), Some(limit)) = (self.deadline, self.ctx.timeout) {
            if Instant::now() >= deadline {
                return Err(EvalError::timeout(limit));
            }
        }
        Ok(())
    }

    /// Run `f` one call level deeper with the given visibility prefix.
    fn nested<T>(
        &mut self,
        visible: usize,
        f: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        if self.depth >= self.ctx.max_call_depth {
            return Err(EnvironmentError::StackOverflow {
                depth: self.depth + 1,
                max: self.ctx.max_call_depth,
            }
            .into());
        }
        self.tick()?;
        let saved = std::mem::replace(&mut self.visible, visible);
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        self.visible = saved;
        result
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Main Expression Dispatcher
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for Expr {
    fn eval(&self, cx: &mut Interpreter<'_>, scope: &Scope) -> Result<Value, EvalError> {
        ensure_sufficient_stack(|| match &self.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::String(s) => Ok(Value::string(s)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Template(parts) => cx.eval_template(parts, scope),
            ExprKind::Ident(name) => cx.lookup(name, scope),
            ExprKind::This => Ok(scope.this().unwrap_or_default()),
            ExprKind::Super => Err(EvalError::type_error("'super' keyword unexpected here")),
            ExprKind::Array(items) => cx.eval_array_literal(items, scope),
            ExprKind::Object(props) => cx.eval_object_literal(props, scope),
            ExprKind::Function(function) => Ok(cx.make_function(function, scope)),
            ExprKind::Class(class) => cx.create_class(class, None, scope),
            ExprKind::Unary { op, operand } => cx.eval_unary(*op, operand, scope),
            ExprKind::Update { op, prefix, target } => cx.eval_update(*op, *prefix, target, scope),
            ExprKind::Binary { op, left, right } => {
                let left = left.eval(cx, scope)?;
                let right = right.eval(cx, scope)?;
                cx.binary(*op, &left, &right)
            }
            ExprKind::Logical { op, left, right } => cx.eval_logical(*op, left, right, scope),
            ExprKind::Assign { op, target, value } => cx.eval_assign(*op, target, value, scope),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if test.eval(cx, scope)?.truthy() {
                    consequent.eval(cx, scope)
                } else {
                    alternate.eval(cx, scope)
                }
            }
            ExprKind::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for expr in exprs {
                    last = expr.eval(cx, scope)?;
                }
                Ok(last)
            }
            ExprKind::Member {
                object,
                property,
                optional,
            } => cx.eval_member(object, property, *optional, scope),
            ExprKind::Call {
                callee,
                args,
                optional,
            } => cx.eval_call(callee, args, *optional, scope),
            ExprKind::New { callee, args } => cx.eval_new(callee, args, scope),
            ExprKind::OptionalChain(inner) => match inner.eval(cx, scope) {
                Err(EvalError::ControlFlow(ControlFlow::ShortCircuit)) => Ok(Value::Undefined),
                other => other,
            },
            ExprKind::Await(_) => Err(EvalError::Unsupported {
                kind: "await".to_string(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{BindingKind, Origin};
    use crate::error::FailureKind;
    use pretty_assertions::assert_eq;

    fn eval_str(src: &str) -> String {
        match evaluate(src, &Environment::new(), &EvalContext::new()) {
            EvaluationOutcome::Value(v) => v.to_display_string(),
            EvaluationOutcome::Failure(f) => format!("!{}", f.message),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_sequence_yields_last_value() {
        assert_eq!(eval_str("1, 2, 3"), "3");
    }

    #[test]
    fn test_arithmetic_and_strings() {
        assert_eq!(eval_str("2 + 2"), "4");
        assert_eq!(eval_str("'a' + 1 + 2"), "a12");
        assert_eq!(eval_str("`x=${1 + 1}`"), "x=2");
        assert_eq!(eval_str("0.1 + 0.2"), "0.30000000000000004");
        assert_eq!(eval_str("7 % -3"), "1");
        assert_eq!(eval_str("2 ** 10"), "1024");
    }

    #[test]
    fn test_optional_chain_short_circuits() {
        assert_eq!(eval_str("null?.a.b.c"), "undefined");
        assert_eq!(eval_str("({ a: { b: 1 } })?.a.b"), "1");
        assert_eq!(eval_str("(undefined)?.()"), "undefined");
    }

    #[test]
    fn test_unbound_name_is_reference_failure() {
        let outcome = evaluate("missing + 1", &Environment::new(), &EvalContext::new());
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Reference);
        assert_eq!(failure.message, "ReferenceError: missing is not defined");
    }

    #[test]
    fn test_syntax_failure() {
        let outcome = evaluate("1 +", &Environment::new(), &EvalContext::new());
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Syntax);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Environment
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_environment_is_read_only() {
        let mut env = Environment::new();
        env.bind("x", Value::Number(1.0), BindingKind::Variable, Origin::Local);
        let outcome = evaluate("x = 2", &env, &EvalContext::new());
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Type);
        assert_eq!(env.get("x"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_builtins_are_read_only() {
        let outcome = evaluate("Math = 1", &Environment::new(), &EvalContext::new());
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Type);
    }

    #[test]
    fn test_environment_shadows_builtins() {
        let mut env = Environment::new();
        env.bind("Math", Value::Number(5.0), BindingKind::Variable, Origin::Local);
        let outcome = evaluate("Math + 1", &env, &EvalContext::new());
        assert_eq!(outcome.value(), Some(&Value::Number(6.0)));
    }

    #[test]
    fn test_evaluate_declaration() {
        let env = Environment::new();
        let ctx = EvalContext::new();
        let value = evaluate_declaration("function add(a, b) { return a + b }", "add", &env, &ctx)
            .unwrap();
        assert_eq!(value.to_display_string(), "[Function: add]");
        let value = evaluate_declaration("const n = [1, 2].length", "n", &env, &ctx).unwrap();
        assert_eq!(value, Value::Number(2.0));
    }

    // ═══════════════════════════════════════════════════════════════════
    // Limits
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_infinite_loop_times_out() {
        let ctx = EvalContext::new().with_timeout(Some(std::time::Duration::from_millis(20)));
        let outcome = evaluate("(() => { while (true) {} })()", &Environment::new(), &ctx);
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Timeout);
    }

    #[test]
    fn test_interrupt_stops_evaluation() {
        let ctx = EvalContext::new().with_timeout(None);
        ctx.interrupt();
        let outcome = evaluate("(() => { for (;;) {} })()", &Environment::new(), &ctx);
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Interrupted);
    }

    #[test]
    fn test_runaway_recursion_is_range_failure() {
        let ctx = EvalContext::with_max_call_depth(50);
        let outcome = evaluate(
            "(() => { const f = (n) => f(n + 1); return f(0); })()",
            &Environment::new(),
            &ctx,
        );
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Range);
    }
}
