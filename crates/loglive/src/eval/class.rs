//! Class definition and construction

use std::sync::Arc;

use indexmap::IndexMap;

use super::{Evaluate, Interpreter};
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast::{self, ClassMember, PropKey};
use crate::value::{BuiltinFn, ClassValue, FunctionValue, ObjectData, Shared, Value};

impl Interpreter<'_> {
    /// Materialize a class: resolve `extends`, bind methods, run static
    /// field initializers.
    pub(super) fn create_class(
        &mut self,
        class: &Arc<ast::Class>,
        name_hint: Option<&str>,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let (parent, builtin_parent) = match &class.super_class {
            None => (None, None),
            Some(expr) => match expr.eval(self, scope)? {
                Value::Class(parent) => (Some(parent), None),
                Value::Builtin(builtin) => (None, Some(builtin)),
                Value::Null => (None, None),
                other => {
                    return Err(EvalError::type_error(format!(
                        "Class extends value {} is not a constructor or null",
                        other.to_display_string()
                    )))
                }
            },
        };

        // Member keys are evaluated once, in order, at definition time
        let mut keys = Vec::with_capacity(class.members.len());
        for member in &class.members {
            keys.push(match member {
                ClassMember::Constructor(_) => None,
                ClassMember::Method { key, .. } | ClassMember::Field { key, .. } => {
                    Some(self.prop_key(key, scope)?)
                }
            });
        }

        let name = class.name.clone().or_else(|| name_hint.map(str::to_string));
        let visible = self.visible;
        let value = Arc::new_cyclic(|home| {
            let mut prototype = IndexMap::new();
            let mut statics = IndexMap::new();
            for (member, key) in class.members.iter().zip(&keys) {
                let (ClassMember::Method {
                    function,
                    is_static,
                    ..
                }, Some(key)) = (member, key)
                else {
                    continue;
                };
                let method = Value::Function(Arc::new(FunctionValue {
                    name: Some(key.clone()),
                    function: function.clone(),
                    captured: Some(scope.clone()),
                    visible,
                    home: Some(home.clone()),
                    is_method: true,
                }));
                if *is_static {
                    statics.insert(key.clone(), method);
                } else {
                    prototype.insert(key.clone(), method);
                }
            }
            ClassValue {
                name,
                decl: class.clone(),
                parent,
                builtin_parent,
                captured: Some(scope.clone()),
                visible,
                prototype,
                statics: Shared::new(statics),
            }
        });

        let this = Value::Class(value.clone());
        let frame = self.class_frame(&value, this);
        for (member, key) in class.members.iter().zip(keys) {
            if let (
                ClassMember::Field {
                    value: init,
                    is_static: true,
                    ..
                },
                Some(key),
            ) = (member, key)
            {
                let field = match init {
                    Some(expr) => self.eval_named(expr, &key, &frame)?,
                    None => Value::Undefined,
                };
                value.statics.write().insert(key, field);
            }
        }

        tracing::trace!(class = value.name.as_deref().unwrap_or("(anonymous)"), "class defined");
        Ok(Value::Class(value))
    }

    /// A frame for initializers: `this` bound, class name visible.
    fn class_frame(&self, class: &Arc<ClassValue>, this: Value) -> Scope {
        let frame = Scope::frame(class.captured.as_ref(), Some(this), Some(class.clone()));
        if let Some(name) = &class.name {
            frame.declare(name.clone(), Value::Class(class.clone()), false);
        }
        frame
    }

    /// `new C(...args)`.
    pub(super) fn construct_class(
        &mut self,
        class: &Arc<ClassValue>,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        let this = Value::Object(Shared::new(ObjectData {
            class: Some(class.clone()),
            ..Default::default()
        }));
        match self.run_constructor(class, &this, args)? {
            Some(replacement) => Ok(replacement),
            None => Ok(this),
        }
    }

    /// Run `class`'s constructor on `this`. Returns the object the
    /// constructor explicitly returned, if any.
    fn run_constructor(
        &mut self,
        class: &Arc<ClassValue>,
        this: &Value,
        args: Vec<Value>,
    ) -> Result<Option<Value>, EvalError> {
        let Some(ctor) = class.decl.constructor() else {
            self.construct_parent(class, this, args)?;
            self.init_fields(class, this)?;
            return Ok(None);
        };

        if class.parent.is_none() && class.builtin_parent.is_none() {
            self.init_fields(class, this)?;
        }
        let ctor = Arc::new(FunctionValue {
            name: class.name.clone(),
            function: ctor.clone(),
            captured: class.captured.clone(),
            visible: class.visible,
            home: Some(Arc::downgrade(class)),
            is_method: true,
        });
        match self.call_function(&ctor, this.clone(), args)? {
            result @ (Value::Object(_) | Value::Array(_)) => Ok(Some(result)),
            _ => Ok(None),
        }
    }

    /// `super(...args)` inside a constructor.
    pub(super) fn super_call(&mut self, args: Vec<Value>, scope: &Scope) -> Result<Value, EvalError> {
        let home = scope
            .home()
            .ok_or_else(|| EvalError::type_error("'super' keyword unexpected here"))?;
        if home.parent.is_none() && home.builtin_parent.is_none() {
            return Err(EvalError::type_error("'super' keyword unexpected here"));
        }
        let this = scope.this().unwrap_or_default();
        self.construct_parent(&home, &this, args)?;
        self.init_fields(&home, &this)?;
        Ok(Value::Undefined)
    }

    fn construct_parent(
        &mut self,
        class: &Arc<ClassValue>,
        this: &Value,
        args: Vec<Value>,
    ) -> Result<(), EvalError> {
        if let Some(parent) = &class.parent {
            self.run_constructor(parent, this, args)?;
        } else if let Some(builtin) = &class.builtin_parent {
            self.adopt_builtin(builtin, this, &args)?;
        }
        Ok(())
    }

    /// `class E extends Error`: copy what the built-in produced onto `this`.
    fn adopt_builtin(
        &mut self,
        builtin: &BuiltinFn,
        this: &Value,
        args: &[Value],
    ) -> Result<(), EvalError> {
        let produced = builtin.call(args)?;
        if let (Value::Object(target), Value::Object(source)) = (this, &produced) {
            let source = source.read().clone();
            let mut target = target.write();
            target.error = source.error;
            for (key, value) in source.properties {
                target.properties.entry(key).or_insert(value);
            }
        }
        Ok(())
    }

    /// Instance field initializers, in declaration order.
    fn init_fields(&mut self, class: &Arc<ClassValue>, this: &Value) -> Result<(), EvalError> {
        let frame = self.class_frame(class, this.clone());
        let decl = class.decl.clone();
        self.nested(class.visible, |cx| {
            for member in &decl.members {
                let ClassMember::Field {
                    key,
                    value,
                    is_static: false,
                } = member
                else {
                    continue;
                };
                let key = match key {
                    PropKey::Static(name) => name.clone(),
                    PropKey::Computed(expr) => expr.eval(cx, &frame)?.to_property_key(),
                };
                let field = match value {
                    Some(expr) => cx.eval_named(expr, &key, &frame)?,
                    None => Value::Undefined,
                };
                cx.set_property(this, &key, field)?;
            }
            Ok(())
        })
    }
}
