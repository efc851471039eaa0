//! Calls, method calls, and `new`

use super::methods;
use super::{ControlFlow, Evaluate, Interpreter};
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{Argument, Expr, ExprKind, MemberProp};
use crate::value::{ObjectData, Shared, Value};

impl Interpreter<'_> {
    pub(super) fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Argument],
        optional: bool,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        match &callee.kind {
            ExprKind::Super => {
                let args = self.eval_args(args, scope)?;
                self.super_call(args, scope)
            }
            ExprKind::Member {
                object,
                property,
                optional: member_optional,
            } => {
                let (receiver, method) = if let ExprKind::Super = object.kind {
                    let key = self.member_key(property, scope)?;
                    let method = self.super_property(&key, scope)?;
                    (scope.this().unwrap_or_default(), Callee::Value(method, key))
                } else {
                    let receiver = object.eval(self, scope)?;
                    if *member_optional && receiver.is_nullish() {
                        return Err(EvalError::ControlFlow(ControlFlow::ShortCircuit));
                    }
                    let key = self.member_key(property, scope)?;
                    let method = match own_member(&receiver, &key) {
                        Some(value) => Callee::Value(value, key),
                        None => Callee::Builtin(key),
                    };
                    (receiver, method)
                };
                let args_values = self.eval_args(args, scope)?;
                match method {
                    Callee::Value(f, key) => {
                        if optional && f.is_nullish() {
                            return Err(EvalError::ControlFlow(ControlFlow::ShortCircuit));
                        }
                        if !f.is_callable() {
                            return Err(not_a_function(&describe_member(object, property, &key)));
                        }
                        self.call(&f, receiver, args_values)
                    }
                    Callee::Builtin(key) => {
                        if receiver.is_nullish() {
                            return Err(EvalError::type_error(format!(
                                "Cannot read properties of {} (reading '{}')",
                                receiver.to_js_string(),
                                key
                            )));
                        }
                        match methods::call_method(self, &receiver, &key, args_values)? {
                            Some(value) => Ok(value),
                            None if optional => {
                                Err(EvalError::ControlFlow(ControlFlow::ShortCircuit))
                            }
                            None => Err(not_a_function(&describe_member(object, property, &key))),
                        }
                    }
                }
            }
            _ => {
                let f = callee.eval(self, scope)?;
                if optional && f.is_nullish() {
                    return Err(EvalError::ControlFlow(ControlFlow::ShortCircuit));
                }
                let args = self.eval_args(args, scope)?;
                if !f.is_callable() {
                    return Err(not_a_function(&describe(callee)));
                }
                self.call(&f, Value::Undefined, args)
            }
        }
    }

    pub(super) fn eval_new(
        &mut self,
        callee: &Expr,
        args: &[Argument],
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let target = callee.eval(self, scope)?;
        let args = self.eval_args(args, scope)?;
        match &target {
            Value::Class(class) => self.construct_class(class, args),
            Value::Builtin(b) => self.nested(self.visible, |_| b.call(&args)),
            Value::Function(f) if !f.function.is_arrow => {
                let this = Value::Object(Shared::new(ObjectData::default()));
                match self.call_function(f, this.clone(), args)? {
                    result @ (Value::Object(_) | Value::Array(_)) => Ok(result),
                    _ => Ok(this),
                }
            }
            _ => Err(EvalError::type_error(format!(
                "{} is not a constructor",
                describe(callee)
            ))),
        }
    }

    /// Evaluate call arguments, expanding spreads.
    pub(super) fn eval_args(
        &mut self,
        args: &[Argument],
        scope: &Scope,
    ) -> Result<Vec<Value>, EvalError> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            let value = arg.expr.eval(self, scope)?;
            if arg.spread {
                out.extend(self.collect_iterable(&value)?);
            } else {
                out.push(value);
            }
        }
        Ok(out)
    }

    /// Call any callable value.
    pub fn call(&mut self, f: &Value, this: Value, args: Vec<Value>) -> Result<Value, EvalError> {
        match f {
            Value::Function(function) => self.call_function(function, this, args),
            Value::Builtin(b) => {
                self.tick()?;
                b.call(&args)
            }
            Value::Class(class) => Err(EvalError::type_error(format!(
                "Class constructor {} cannot be invoked without 'new'",
                class.name.as_deref().unwrap_or("(anonymous)")
            ))),
            other => Err(not_a_function(&other.to_display_string())),
        }
    }
}

enum Callee {
    /// A property holding a value
    Value(Value, String),
    /// A built-in method of the receiver's type
    Builtin(String),
}

/// A property the receiver itself carries, as opposed to a built-in method.
fn own_member(receiver: &Value, key: &str) -> Option<Value> {
    match receiver {
        Value::Object(obj) => obj.read().lookup(key),
        Value::Class(class) => class.static_member(key),
        Value::Builtin(b) => b.statics.get(key).cloned(),
        _ => None,
    }
}

fn not_a_function(what: &str) -> EvalError {
    EvalError::type_error(format!("{} is not a function", what))
}

/// Short source-like description of a callee for error messages.
fn describe(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Ident(name) => name.clone(),
        ExprKind::This => "this".to_string(),
        ExprKind::Member {
            object, property, ..
        } => match property {
            MemberProp::Ident(key) => describe_member(object, property, key),
            MemberProp::Computed(_) => format!("{}[...]", describe(object)),
        },
        ExprKind::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}

fn describe_member(object: &Expr, property: &MemberProp, key: &str) -> String {
    match property {
        MemberProp::Ident(_) => format!("{}.{}", describe(object), key),
        MemberProp::Computed(_) => format!("{}[{}]", describe(object), key),
    }
}
