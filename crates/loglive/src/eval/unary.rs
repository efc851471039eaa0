//! Unary and update operators

use super::{Evaluate, Interpreter};
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{Expr, ExprKind, UnaryOp, UpdateOp};
use crate::value::Value;

impl Interpreter<'_> {
    pub(super) fn eval_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        match op {
            // `typeof undeclared` is "undefined", not a ReferenceError
            UnaryOp::Typeof => {
                let value = match &operand.kind {
                    ExprKind::Ident(name) => self.try_lookup(name, scope).unwrap_or_default(),
                    _ => operand.eval(self, scope)?,
                };
                Ok(Value::string(value.type_of()))
            }
            UnaryOp::Delete => match &operand.kind {
                ExprKind::Member {
                    object, property, ..
                } => {
                    let target = object.eval(self, scope)?;
                    let key = self.member_key(property, scope)?;
                    Ok(Value::Bool(self.delete_property(&target, &key)?))
                }
                _ => {
                    operand.eval(self, scope)?;
                    Ok(Value::Bool(true))
                }
            },
            _ => {
                let value = operand.eval(self, scope)?;
                Ok(apply_unary(op, &value))
            }
        }
    }

    pub(super) fn eval_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &Expr,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let delta = match op {
            UpdateOp::Increment => 1.0,
            UpdateOp::Decrement => -1.0,
        };
        let (old, new) = match &target.kind {
            ExprKind::Ident(name) => {
                let old = self.lookup(name, scope)?.to_number();
                let new = old + delta;
                self.assign_name(name, Value::Number(new), scope)?;
                (old, new)
            }
            ExprKind::Member {
                object, property, ..
            } => {
                let object = object.eval(self, scope)?;
                let key = self.member_key(property, scope)?;
                let old = self.get_property(&object, &key)?.to_number();
                let new = old + delta;
                self.set_property(&object, &key, Value::Number(new))?;
                (old, new)
            }
            _ => {
                return Err(EvalError::type_error(
                    "Invalid left-hand side expression in update operation",
                ))
            }
        };
        Ok(Value::Number(if prefix { new } else { old }))
    }
}

/// Operators that only need the operand's value.
fn apply_unary(op: UnaryOp, value: &Value) -> Value {
    match op {
        UnaryOp::Minus => Value::Number(-value.to_number()),
        UnaryOp::Plus => Value::Number(value.to_number()),
        UnaryOp::Not => Value::Bool(!value.truthy()),
        UnaryOp::BitNot => Value::Number(f64::from(!value.to_int32())),
        UnaryOp::Void => Value::Undefined,
        UnaryOp::Typeof => Value::string(value.type_of()),
        UnaryOp::Delete => Value::Bool(true),
    }
}

#[cfg(test)]
mod tests {
    use crate::eval::evaluate;
    use crate::{EvalContext, Environment, EvaluationOutcome};
    use pretty_assertions::assert_eq;

    fn show(src: &str) -> String {
        match evaluate(src, &Environment::new(), &EvalContext::new()) {
            EvaluationOutcome::Value(v) => v.to_display_string(),
            EvaluationOutcome::Failure(f) => format!("!{}", f.message),
        }
    }

    #[test]
    fn test_typeof() {
        assert_eq!(show("typeof nothingHere"), "undefined");
        assert_eq!(show("typeof null"), "object");
        assert_eq!(show("typeof (() => 1)"), "function");
        assert_eq!(show("typeof Math"), "object");
        assert_eq!(show("typeof 'x'"), "string");
    }

    #[test]
    fn test_numeric_unary() {
        assert_eq!(show("-'3'"), "-3");
        assert_eq!(show("+true"), "1");
        assert_eq!(show("~5"), "-6");
        assert_eq!(show("!0"), "true");
        assert_eq!(show("void 1"), "undefined");
        assert_eq!(show("-0"), "-0");
    }

    #[test]
    fn test_update_prefix_and_postfix() {
        assert_eq!(
            show("(() => { let i = 1; const a = i++; const b = ++i; return [a, b, i]; })()"),
            "[ 1, 3, 3 ]"
        );
        assert_eq!(
            show("(() => { const o = { n: 1 }; o.n--; return o.n; })()"),
            "0"
        );
    }
}
