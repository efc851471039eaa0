//! Property access: `obj.key`, `obj[key]`, `obj?.key`

use std::sync::Arc;

use super::methods;
use super::{ControlFlow, Evaluate, Interpreter};
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{Expr, ExprKind, MemberProp};
use crate::value::limits::check_array_length;
use crate::value::{BuiltinFn, Value};

impl Interpreter<'_> {
    pub(super) fn eval_member(
        &mut self,
        object: &Expr,
        property: &MemberProp,
        optional: bool,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        if let ExprKind::Super = object.kind {
            let key = self.member_key(property, scope)?;
            return self.super_property(&key, scope);
        }
        let target = object.eval(self, scope)?;
        if optional && target.is_nullish() {
            return Err(EvalError::ControlFlow(ControlFlow::ShortCircuit));
        }
        let key = self.member_key(property, scope)?;
        self.get_property(&target, &key)
    }

    pub(super) fn member_key(
        &mut self,
        property: &MemberProp,
        scope: &Scope,
    ) -> Result<String, EvalError> {
        match property {
            MemberProp::Ident(name) => Ok(name.clone()),
            MemberProp::Computed(expr) => Ok(expr.eval(self, scope)?.to_property_key()),
        }
    }

    /// `super.key` inside a method.
    pub(super) fn super_property(&mut self, key: &str, scope: &Scope) -> Result<Value, EvalError> {
        let home = scope
            .home()
            .ok_or_else(|| EvalError::type_error("'super' keyword unexpected here"))?;
        let is_static = matches!(scope.this(), Some(Value::Class(_)));
        let found = match (&home.parent, is_static) {
            (Some(parent), false) => parent.method(key),
            (Some(parent), true) => parent.static_member(key),
            (None, true) => home.builtin_parent.as_ref().and_then(|b| b.statics.get(key).cloned()),
            (None, false) => None,
        };
        Ok(found.unwrap_or_default())
    }

    /// Read `target[key]`.
    pub fn get_property(&mut self, target: &Value, key: &str) -> Result<Value, EvalError> {
        match target {
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                target.to_js_string(),
                key
            ))),
            Value::Object(obj) => {
                if let Some(value) = obj.read().lookup(key) {
                    return Ok(value);
                }
                Ok(detached_method(target, key).unwrap_or_default())
            }
            Value::Array(items) => {
                if key == "length" {
                    return Ok(Value::Number(items.read().len() as f64));
                }
                if let Some(index) = Value::from(key).as_index() {
                    return Ok(items.read().get(index).cloned().unwrap_or_default());
                }
                Ok(detached_method(target, key).unwrap_or_default())
            }
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.encode_utf16().count() as f64));
                }
                if let Some(index) = Value::from(key).as_index() {
                    return Ok(methods::string_char_at(s, index));
                }
                Ok(detached_method(target, key).unwrap_or_default())
            }
            Value::Class(class) => match key {
                "name" => Ok(Value::string(class.name.as_deref().unwrap_or(""))),
                _ => Ok(class
                    .static_member(key)
                    .or_else(|| detached_method(target, key))
                    .unwrap_or_default()),
            },
            Value::Function(f) => match key {
                "name" => Ok(Value::string(f.name.as_deref().unwrap_or(""))),
                "length" => Ok(Value::Number(f.function.arity() as f64)),
                _ => Ok(detached_method(target, key).unwrap_or_default()),
            },
            Value::Builtin(b) => match key {
                "name" => Ok(Value::string(&*b.name)),
                "length" => Ok(Value::Number(b.arity.max(0) as f64)),
                _ => Ok(b
                    .statics
                    .get(key)
                    .cloned()
                    .or_else(|| detached_method(target, key))
                    .unwrap_or_default()),
            },
            Value::Bool(_) | Value::Number(_) => Ok(detached_method(target, key).unwrap_or_default()),
        }
    }

    /// Write `target[key] = value`.
    pub fn set_property(&mut self, target: &Value, key: &str, value: Value) -> Result<(), EvalError> {
        match target {
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                target.to_js_string(),
                key
            ))),
            Value::Object(obj) => {
                obj.write().properties.insert(key.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                if key == "length" {
                    let len = check_array_length(value.to_number())?;
                    items.write().resize(len, Value::Undefined);
                    return Ok(());
                }
                let Some(index) = Value::from(key).as_index() else {
                    return Err(EvalError::Unsupported {
                        kind: format!("non-index array property '{}'", key),
                    });
                };
                let mut items = items.write();
                if index >= items.len() {
                    let len = check_array_length(index as f64 + 1.0)?;
                    items.resize(len, Value::Undefined);
                }
                items[index] = value;
                Ok(())
            }
            Value::Class(class) => {
                class.statics.write().insert(key.to_string(), value);
                Ok(())
            }
            // Primitives and functions have no writable properties
            _ => Ok(()),
        }
    }

    /// `delete target[key]`.
    pub(super) fn delete_property(&mut self, target: &Value, key: &str) -> Result<bool, EvalError> {
        match target {
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot convert undefined or null to object (deleting '{}')",
                key
            ))),
            Value::Object(obj) => {
                obj.write().properties.shift_remove(key);
                Ok(true)
            }
            Value::Array(items) => {
                if let Some(index) = Value::from(key).as_index() {
                    if let Some(slot) = items.write().get_mut(index) {
                        *slot = Value::Undefined;
                    }
                }
                Ok(true)
            }
            _ => Ok(true),
        }
    }
}

/// A method read without calling it, e.g. `const up = s.toUpperCase`.
///
/// Only names the receiver actually supports produce a value. The result
/// reports itself as a function but cannot be invoked detached from its
/// receiver.
fn detached_method(target: &Value, key: &str) -> Option<Value> {
    if !methods::has_method(target, key) {
        return None;
    }
    let name = key.to_string();
    Some(Value::Builtin(BuiltinFn {
        name: Arc::from(key),
        arity: 0,
        func: Arc::new(move |_| {
            Err(EvalError::Unsupported {
                kind: format!("calling built-in method '{}' without its receiver", name),
            })
        }),
        statics: Default::default(),
    }))
}
