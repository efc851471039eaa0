//! Assignment: `=`, compound `op=`, and logical `&&=`/`||=`/`??=`

use super::binary::short_circuits;
use super::pattern::BindMode;
use super::{Evaluate, Interpreter};
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{AssignOp, Expr, ExprKind, Pattern};
use crate::value::Value;

/// A resolved assignment target.
enum Place {
    Name(String),
    Property(Value, String),
}

impl Interpreter<'_> {
    pub(super) fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Pattern,
        value: &Expr,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let place = match target {
            Pattern::Ident(name) => Place::Name(name.clone()),
            Pattern::Member(expr) => self.resolve_member(expr, scope)?,
            Pattern::Object { .. } | Pattern::Array { .. } => {
                let AssignOp::Assign = op else {
                    return Err(EvalError::type_error(
                        "Invalid left-hand side in assignment",
                    ));
                };
                let value = value.eval(self, scope)?;
                self.bind_pattern(target, value.clone(), scope, BindMode::Assign)?;
                return Ok(value);
            }
        };

        let new = match op {
            AssignOp::Assign => self.eval_for_place(value, &place, scope)?,
            AssignOp::Compound(op) => {
                let old = self.read_place(&place, scope)?;
                let rhs = value.eval(self, scope)?;
                self.binary(op, &old, &rhs)?
            }
            AssignOp::Logical(op) => {
                let old = self.read_place(&place, scope)?;
                if short_circuits(op, &old) {
                    return Ok(old);
                }
                self.eval_for_place(value, &place, scope)?
            }
        };
        self.write_place(&place, new.clone(), scope)?;
        Ok(new)
    }

    fn resolve_member(&mut self, expr: &Expr, scope: &Scope) -> Result<Place, EvalError> {
        let ExprKind::Member {
            object, property, ..
        } = &expr.kind
        else {
            return Err(EvalError::type_error("Invalid left-hand side in assignment"));
        };
        let object = object.eval(self, scope)?;
        let key = self.member_key(property, scope)?;
        Ok(Place::Property(object, key))
    }

    /// `f = () => {}` names the function `f`.
    fn eval_for_place(
        &mut self,
        value: &Expr,
        place: &Place,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        match place {
            Place::Name(name) => self.eval_named(value, name, scope),
            Place::Property(..) => value.eval(self, scope),
        }
    }

    fn read_place(&mut self, place: &Place, scope: &Scope) -> Result<Value, EvalError> {
        match place {
            Place::Name(name) => self.lookup(name, scope),
            Place::Property(object, key) => self.get_property(object, key),
        }
    }

    fn write_place(&mut self, place: &Place, value: Value, scope: &Scope) -> Result<(), EvalError> {
        match place {
            Place::Name(name) => self.assign_name(name, value, scope),
            Place::Property(object, key) => self.set_property(object, key, value),
        }
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
    fn test_compound_assignment() {
        assert_eq!(
            show("(() => { let s = 'a'; s += 'b'; let n = 2; n **= 3; n -= 1; return [s, n]; })()"),
            "[ 'ab', 7 ]"
        );
    }

    #[test]
    fn test_logical_assignment() {
        assert_eq!(
            show("(() => { const o = { a: 0, b: null }; o.a ||= 5; o.b ??= 6; o.c &&= 7; return o; })()"),
            "{ a: 5, b: 6 }"
        );
    }

    #[test]
    fn test_assignment_names_functions() {
        assert_eq!(show("(() => { let f; f = () => 1; return f.name; })()"), "f");
    }

    #[test]
    fn test_computed_member_assignment() {
        assert_eq!(
            show("(() => { const o = {}; const k = 'x'; o[k + 1] = 2; return o; })()"),
            "{ x1: 2 }"
        );
    }

    #[test]
    fn test_assigning_undeclared_name_fails() {
        assert_eq!(
            show("(() => { ghost = 1; })()"),
            "!ReferenceError: ghost is not defined"
        );
    }
}
