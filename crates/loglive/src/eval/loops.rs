//! Loops and iteration

use super::pattern::BindMode;
use super::{ControlFlow, Evaluate, Interpreter};
use crate::environment::prelude::own_entries;
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{DeclKind, Expr, ForHead, ForInOfKind, ForInit, Pattern, Stmt};
use crate::value::Value;

/// What the loop should do after one run of its body.
enum Step {
    Next,
    Exit,
}

impl Interpreter<'_> {
    /// Run a loop body, absorbing `break` and `continue`.
    fn loop_body(&mut self, body: &Stmt, scope: &Scope) -> Result<Step, EvalError> {
        self.tick()?;
        match self.run_statement(body, scope) {
            Ok(_) | Err(EvalError::ControlFlow(ControlFlow::Continue)) => Ok(Step::Next),
            Err(EvalError::ControlFlow(ControlFlow::Break)) => Ok(Step::Exit),
            Err(err) => Err(err),
        }
    }

    /// `for (init; test; update) body`
    ///
    /// `let` loop variables get a fresh copy per iteration, so closures
    /// created in the body see the value of their own iteration.
    pub(super) fn eval_for(
        &mut self,
        init: Option<&ForInit>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let loop_scope = scope.child();
        let mut per_iteration = Vec::new();
        match init {
            Some(ForInit::VarDecl(decl)) => {
                self.declare_vars(decl, &loop_scope)?;
                let mutable = decl.kind != DeclKind::Const;
                for declarator in &decl.declarators {
                    let mut names = Vec::new();
                    pattern_names(&declarator.target, &mut names);
                    per_iteration.extend(names.into_iter().map(|n| (n, mutable)));
                }
            }
            Some(ForInit::Expr(expr)) => {
                expr.eval(self, &loop_scope)?;
            }
            None => {}
        }

        let mut iteration = copy_bindings(&loop_scope, scope, &per_iteration);
        loop {
            if let Some(test) = test {
                if !test.eval(self, &iteration)?.truthy() {
                    break;
                }
            }
            if let Step::Exit = self.loop_body(body, &iteration)? {
                break;
            }
            iteration = copy_bindings(&iteration, scope, &per_iteration);
            if let Some(update) = update {
                update.eval(self, &iteration)?;
            }
        }
        Ok(Value::Undefined)
    }

    /// `for (x of xs)` / `for (k in obj)`
    pub(super) fn eval_for_in_of(
        &mut self,
        kind: ForInOfKind,
        left: &ForHead,
        right: &Expr,
        body: &Stmt,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let subject = right.eval(self, scope)?;
        let items = match kind {
            ForInOfKind::Of => self.collect_iterable(&subject)?,
            ForInOfKind::In => enumerable_keys(&subject)?,
        };

        for item in items {
            let iteration = scope.child();
            match left {
                ForHead::Decl(kind, pattern) => {
                    self.bind_pattern(pattern, item, &iteration, BindMode::declaring(*kind))?;
                }
                ForHead::Target(pattern) => {
                    self.bind_pattern(pattern, item, scope, BindMode::Assign)?;
                }
            }
            if let Step::Exit = self.loop_body(body, &iteration)? {
                break;
            }
        }
        Ok(Value::Undefined)
    }

    /// `while (test) body`
    pub(super) fn eval_while(
        &mut self,
        test: &Expr,
        body: &Stmt,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        while test.eval(self, scope)?.truthy() {
            if let Step::Exit = self.loop_body(body, scope)? {
                break;
            }
        }
        Ok(Value::Undefined)
    }

    /// `do body while (test)`
    pub(super) fn eval_do_while(
        &mut self,
        body: &Stmt,
        test: &Expr,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        loop {
            if let Step::Exit = self.loop_body(body, scope)? {
                break;
            }
            if !test.eval(self, scope)?.truthy() {
                break;
            }
        }
        Ok(Value::Undefined)
    }

    /// Elements produced by iterating `value`: array elements, or the
    /// code points of a string.
    pub(super) fn collect_iterable(&mut self, value: &Value) -> Result<Vec<Value>, EvalError> {
        match value {
            Value::Array(items) => Ok(items.read().clone()),
            Value::String(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
            other => Err(EvalError::type_error(format!(
                "{} is not iterable",
                other.to_display_string()
            ))),
        }
    }
}

/// Keys visited by `for…in`.
fn enumerable_keys(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::Undefined | Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok((0..s.encode_utf16().count())
            .map(|i| Value::string(i.to_string()))
            .collect()),
        Value::Object(_) | Value::Array(_) | Value::Class(_) => Ok(own_entries(value)?
            .into_iter()
            .map(|(key, _)| Value::string(key))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// A fresh frame under `parent` holding the current values of `names`
/// from `from`.
fn copy_bindings(from: &Scope, parent: &Scope, names: &[(String, bool)]) -> Scope {
    if names.is_empty() {
        return from.clone();
    }
    let next = parent.child();
    for (name, mutable) in names {
        next.declare(name.clone(), from.lookup(name).unwrap_or_default(), *mutable);
    }
    next
}

/// Every identifier a pattern binds.
fn pattern_names(pattern: &Pattern, out: &mut Vec<String>) {
    match pattern {
        Pattern::Ident(name) => out.push(name.clone()),
        Pattern::Object { props, rest } => {
            for prop in props {
                pattern_names(&prop.value, out);
            }
            if let Some(rest) = rest {
                pattern_names(rest, out);
            }
        }
        Pattern::Array { elements, rest } => {
            for element in elements.iter().flatten() {
                pattern_names(&element.pattern, out);
            }
            if let Some(rest) = rest {
                pattern_names(rest, out);
            }
        }
        Pattern::Member(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::eval::evaluate;
    use crate::{EvalContext, Environment, EvaluationOutcome};
    use pretty_assertions::assert_eq;

    fn run(body: &str) -> String {
        let src = format!("(() => {{ {} }})()", body);
        match evaluate(&src, &Environment::new(), &EvalContext::new()) {
            EvaluationOutcome::Value(v) => v.to_display_string(),
            EvaluationOutcome::Failure(f) => format!("!{}", f.message),
        }
    }

    #[test]
    fn test_for_loop_sums() {
        assert_eq!(run("let s = 0; for (let i = 1; i <= 10; i++) s += i; return s;"), "55");
    }

    #[test]
    fn test_for_let_binding_per_iteration() {
        assert_eq!(
            run("const fs = []; for (let i = 0; i < 3; i++) { fs.push(() => i); } return fs.map(f => f());"),
            "[ 0, 1, 2 ]"
        );
    }

    #[test]
    fn test_break_and_continue() {
        assert_eq!(
            run("const out = []; for (let i = 0; i < 10; i++) { if (i % 2) continue; if (i > 6) break; out.push(i); } return out;"),
            "[ 0, 2, 4, 6 ]"
        );
    }

    #[test]
    fn test_for_of_and_for_in() {
        assert_eq!(run("let s = ''; for (const c of 'abc') s = c + s; return s;"), "cba");
        assert_eq!(
            run("const ks = []; for (const k in { a: 1, b: 2 }) ks.push(k); return ks;"),
            "[ 'a', 'b' ]"
        );
        assert_eq!(
            run("let t = 0; for (const [k, v] of Object.entries({ a: 1, b: 2 })) t += v; return t;"),
            "3"
        );
    }

    #[test]
    fn test_while_and_do_while() {
        assert_eq!(run("let n = 0; while (n < 5) n++; return n;"), "5");
        assert_eq!(run("let n = 10; do { n++ } while (n < 5); return n;"), "11");
    }

    #[test]
    fn test_iterating_non_iterable_fails() {
        assert!(run("for (const x of 5) {}").starts_with("!TypeError"));
    }
}
