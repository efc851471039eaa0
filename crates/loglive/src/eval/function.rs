//! Function values: creation and invocation

use std::sync::Arc;

use super::pattern::BindMode;
use super::{ControlFlow, Evaluate, Interpreter};
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{self, Expr, ExprKind, FunctionBody, StmtKind};
use crate::value::{FunctionValue, Value};

impl Interpreter<'_> {
    /// Close `function` over `scope` and the current visibility prefix.
    pub(super) fn make_function(&self, function: &Arc<ast::Function>, scope: &Scope) -> Value {
        Value::Function(Arc::new(FunctionValue::new(
            function.clone(),
            Some(scope.clone()),
            self.visible,
        )))
    }

    /// Evaluate `expr`, naming it `name` if it is an anonymous function or
    /// class (`const f = () => 1` gives `[Function: f]`).
    pub(super) fn eval_named(
        &mut self,
        expr: &Expr,
        name: &str,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Function(function) if function.name.is_none() => {
                let mut value =
                    FunctionValue::new(function.clone(), Some(scope.clone()), self.visible);
                value.name = Some(name.to_string());
                Ok(Value::Function(Arc::new(value)))
            }
            ExprKind::Class(class) if class.name.is_none() => {
                self.create_class(class, Some(name), scope)
            }
            _ => expr.eval(self, scope),
        }
    }

    /// Invoke a user function with `this` and `args`.
    pub(super) fn call_function(
        &mut self,
        f: &Arc<FunctionValue>,
        this: Value,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        if self.ctx.trace {
            tracing::trace!(function = f.display_name(), args = args.len(), "call");
        }
        let frame = if f.function.is_arrow {
            Scope::frame(f.captured.as_ref(), None, None)
        } else {
            Scope::frame(f.captured.as_ref(), Some(this.clone()), f.home_class())
        };

        // Self-reference: a method sees its class, a named function itself
        match f.home_class() {
            Some(class) => {
                if let Some(name) = &class.name {
                    frame.declare(name.clone(), Value::Class(class.clone()), false);
                }
            }
            None if !f.is_method => {
                if let Some(name) = &f.function.name {
                    frame.declare(name.clone(), Value::Function(f.clone()), false);
                }
            }
            None => {}
        }

        self.nested(f.visible, |cx| {
            cx.bind_params(&f.function, &frame, &this, args)?;
            match &f.function.body {
                FunctionBody::Expr(expr) => expr.eval(cx, &frame),
                FunctionBody::Block(body) => match cx.run_block(body, &frame) {
                    Ok(_) => Ok(Value::Undefined),
                    Err(EvalError::ControlFlow(ControlFlow::Return { value })) => Ok(value),
                    Err(err) => Err(err),
                },
            }
        })
    }

    fn bind_params(
        &mut self,
        function: &ast::Function,
        frame: &Scope,
        this: &Value,
        args: Vec<Value>,
    ) -> Result<(), EvalError> {
        let mut args = args.into_iter();
        for param in &function.params {
            let value = if param.rest {
                Value::array(args.by_ref().collect())
            } else {
                match (args.next().unwrap_or_default(), &param.default) {
                    (Value::Undefined, Some(default)) => match param.pattern.as_ident() {
                        Some(name) => self.eval_named(default, name, frame)?,
                        None => default.eval(self, frame)?,
                    },
                    (value, _) => value,
                }
            };
            if param.property {
                if let Some(name) = param.pattern.as_ident() {
                    self.set_property(this, name, value.clone())?;
                }
            }
            self.bind_pattern(&param.pattern, value, frame, BindMode::LET)?;
        }
        Ok(())
    }

    /// Run a statement list in `scope`, hoisting its function declarations.
    pub(super) fn run_block(
        &mut self,
        body: &[ast::Stmt],
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        for stmt in body {
            if let StmtKind::Function(function) = &stmt.kind {
                if let Some(name) = &function.name {
                    let value = self.make_function(function, scope);
                    scope.declare(name.clone(), value, true);
                }
            }
        }
        for stmt in body {
            stmt.eval(self, scope)?;
        }
        Ok(Value::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use crate::eval::evaluate;
    use crate::{EvalContext, Environment};
    use pretty_assertions::assert_eq;

    fn show(src: &str) -> String {
        match evaluate(src, &Environment::new(), &EvalContext::new()) {
            crate::EvaluationOutcome::Value(v) => v.to_display_string(),
            crate::EvaluationOutcome::Failure(f) => format!("!{}", f.message),
        }
    }

    #[test]
    fn test_closures_capture_scope() {
        assert_eq!(
            show("(() => { let n = 0; const inc = () => ++n; inc(); inc(); return n; })()"),
            "2"
        );
    }

    #[test]
    fn test_default_and_rest_params() {
        assert_eq!(show("((a, b = a * 2, ...rest) => [a, b, rest])(1)"), "[ 1, 2, [] ]");
        assert_eq!(show("((a, b = 5, ...rest) => [a, b, rest])(1, 2, 3, 4)"), "[ 1, 2, [ 3, 4 ] ]");
    }

    #[test]
    fn test_destructured_params() {
        assert_eq!(show("(({ a, b: [c] }) => a + c)({ a: 1, b: [2] })"), "3");
    }

    #[test]
    fn test_hoisted_function_declarations() {
        assert_eq!(
            show("(() => { const r = later(); function later() { return 7 } return r; })()"),
            "7"
        );
    }

    #[test]
    fn test_named_function_expression_recurses() {
        assert_eq!(
            show("(function fact(n) { return n <= 1 ? 1 : n * fact(n - 1) })(5)"),
            "120"
        );
    }

    #[test]
    fn test_arrow_keeps_outer_this() {
        assert_eq!(
            show("({ v: 3, get() { return (() => this.v)() } }).get()"),
            "3"
        );
    }

    #[test]
    fn test_missing_return_is_undefined() {
        assert_eq!(show("(function () {})()"), "undefined");
    }
}
