//! Destructuring for declarations, parameters, and assignment

use std::collections::HashSet;

use indexmap::IndexMap;

use super::{Evaluate, Interpreter};
use crate::environment::prelude::own_entries;
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{DeclKind, Expr, ExprKind, MemberProp, Pattern};
use crate::value::Value;

/// How a pattern's names receive their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BindMode {
    /// Declare fresh variables in the target scope
    Declare {
        /// `let`/`var` versus `const`
        mutable: bool,
    },
    /// Assign to existing variables and properties
    Assign,
}

impl BindMode {
    pub(super) const LET: BindMode = BindMode::Declare { mutable: true };

    /// Declaration mode for a `let`/`const`/`var` binding.
    pub(super) fn declaring(kind: DeclKind) -> BindMode {
        BindMode::Declare {
            mutable: kind != DeclKind::Const,
        }
    }
}

impl Interpreter<'_> {
    /// Bind every name in `pattern` from `value`.
    pub(super) fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        scope: &Scope,
        mode: BindMode,
    ) -> Result<(), EvalError> {
        match pattern {
            Pattern::Ident(name) => match mode {
                BindMode::Declare { mutable } => {
                    scope.declare(name.clone(), value, mutable);
                    Ok(())
                }
                BindMode::Assign => self.assign_name(name, value, scope),
            },
            Pattern::Member(target) => self.assign_member(target, value, scope),
            Pattern::Object { props, rest } => {
                if value.is_nullish() {
                    return Err(EvalError::type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value.to_js_string(),
                        value.to_js_string()
                    )));
                }
                let mut used = HashSet::new();
                for prop in props {
                    let key = self.prop_key(&prop.key, scope)?;
                    let mut item = self.get_property(&value, &key)?;
                    if item.is_undefined() {
                        if let Some(default) = &prop.default {
                            item = self.eval_default(default, &prop.value, scope)?;
                        }
                    }
                    self.bind_pattern(&prop.value, item, scope, mode)?;
                    used.insert(key);
                }
                if let Some(rest) = rest {
                    let remaining: IndexMap<String, Value> = own_entries(&value)?
                        .into_iter()
                        .filter(|(k, _)| !used.contains(k))
                        .collect();
                    self.bind_pattern(rest, Value::object(remaining), scope, mode)?;
                }
                Ok(())
            }
            Pattern::Array { elements, rest } => {
                let items = self.collect_iterable(&value)?;
                let mut items = items.into_iter();
                for element in elements {
                    let item = items.next().unwrap_or_default();
                    let Some(element) = element else {
                        continue;
                    };
                    let item = match (&element.default, item) {
                        (Some(default), Value::Undefined) => {
                            self.eval_default(default, &element.pattern, scope)?
                        }
                        (_, item) => item,
                    };
                    self.bind_pattern(&element.pattern, item, scope, mode)?;
                }
                if let Some(rest) = rest {
                    self.bind_pattern(rest, Value::array(items.collect()), scope, mode)?;
                }
                Ok(())
            }
        }
    }

    fn eval_default(
        &mut self,
        default: &Expr,
        target: &Pattern,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        match target.as_ident() {
            Some(name) => self.eval_named(default, name, scope),
            None => default.eval(self, scope),
        }
    }

    /// `obj.key = value` / `obj[key] = value`.
    pub(super) fn assign_member(
        &mut self,
        target: &Expr,
        value: Value,
        scope: &Scope,
    ) -> Result<(), EvalError> {
        let ExprKind::Member {
            object, property, ..
        } = &target.kind
        else {
            return Err(EvalError::type_error("Invalid left-hand side in assignment"));
        };
        let object = object.eval(self, scope)?;
        let key = match property {
            MemberProp::Ident(name) => name.clone(),
            MemberProp::Computed(expr) => expr.eval(self, scope)?.to_property_key(),
        };
        self.set_property(&object, &key, value)
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
    fn test_object_destructuring_with_defaults_and_rest() {
        assert_eq!(
            show("(() => { const { a, b = 2, c: { d }, ...rest } = { a: 1, c: { d: 4 }, e: 5, f: 6 }; return [a, b, d, rest]; })()"),
            "[ 1, 2, 4, { e: 5, f: 6 } ]"
        );
    }

    #[test]
    fn test_array_destructuring() {
        assert_eq!(
            show("(() => { const [x, , y = 9, ...more] = [1, 2, undefined, 4, 5]; return [x, y, more]; })()"),
            "[ 1, 9, [ 4, 5 ] ]"
        );
    }

    #[test]
    fn test_destructuring_assignment_swaps() {
        assert_eq!(
            show("(() => { let a = 1, b = 2; [a, b] = [b, a]; return [a, b]; })()"),
            "[ 2, 1 ]"
        );
    }

    #[test]
    fn test_destructuring_nullish_is_type_error() {
        assert!(show("(() => { const { a } = null; })()").starts_with("!TypeError"));
    }

    #[test]
    fn test_const_reassignment_fails() {
        assert!(show("(() => { const k = 1; k = 2; })()").contains("constant"));
    }

    #[test]
    fn test_declaration_keyword_sets_mutability() {
        assert!(show("(() => { const [k] = [1]; k = 2; })()").contains("constant"));
        assert!(show("(() => { for (const { v } of [{ v: 1 }]) { v = 2; } })()").contains("constant"));
        assert_eq!(show("(() => { let [k] = [1]; k = 2; return k; })()"), "2");
    }
}
