//! Template, array, and object literals

use indexmap::IndexMap;

use super::{Evaluate, Interpreter};
use crate::environment::prelude::own_entries;
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{Argument, PropKey, Property, TemplatePart};
use crate::value::limits::check_string_length;
use crate::value::{FunctionValue, Value};

impl Interpreter<'_> {
    pub(super) fn eval_template(
        &mut self,
        parts: &[TemplatePart],
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Str(s) => out.push_str(s),
                TemplatePart::Expr(expr) => {
                    let piece = expr.eval(self, scope)?.to_js_string();
                    check_string_length(out.len() as f64 + piece.len() as f64)?;
                    out.push_str(&piece);
                }
            }
        }
        Ok(Value::from(out))
    }

    pub(super) fn eval_array_literal(
        &mut self,
        items: &[Option<Argument>],
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                // Holes read back as undefined
                None => out.push(Value::Undefined),
                Some(arg) if arg.spread => {
                    let value = arg.expr.eval(self, scope)?;
                    out.extend(self.collect_iterable(&value)?);
                }
                Some(arg) => out.push(arg.expr.eval(self, scope)?),
            }
        }
        Ok(Value::array(out))
    }

    pub(super) fn eval_object_literal(
        &mut self,
        props: &[Property],
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let mut properties = IndexMap::new();
        for prop in props {
            match prop {
                Property::KeyValue(key, value) => {
                    let key = self.prop_key(key, scope)?;
                    let value = self.eval_named(value, &key, scope)?;
                    properties.insert(key, value);
                }
                Property::Shorthand(name) => {
                    let value = self.lookup(name, scope)?;
                    properties.insert(name.clone(), value);
                }
                Property::Method(key, function) => {
                    let key = self.prop_key(key, scope)?;
                    let mut method =
                        FunctionValue::new(function.clone(), Some(scope.clone()), self.visible);
                    method.name = Some(key.clone());
                    method.is_method = true;
                    properties.insert(key, Value::Function(method.into()));
                }
                Property::Spread(expr) => {
                    let value = expr.eval(self, scope)?;
                    if value.is_nullish() {
                        continue;
                    }
                    for (k, v) in own_entries(&value)? {
                        properties.insert(k, v);
                    }
                }
            }
        }
        Ok(Value::object(properties))
    }

    /// Property name for an object key, class member, or pattern.
    pub(super) fn prop_key(&mut self, key: &PropKey, scope: &Scope) -> Result<String, EvalError> {
        match key {
            PropKey::Static(name) => Ok(name.clone()),
            PropKey::Computed(expr) => Ok(expr.eval(self, scope)?.to_property_key()),
        }
    }
}
