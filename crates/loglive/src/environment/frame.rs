//! Local scope frames created during evaluation

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{EnvironmentError, EvalError};
use crate::value::{ClassValue, Value};

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    mutable: bool,
}

#[derive(Debug)]
struct Frame {
    vars: RwLock<HashMap<String, Slot>>,
    parent: Option<Scope>,
    this: Option<Value>,
    home: Option<Arc<ClassValue>>,
}

/// A chain of local variable frames.
///
/// Cloning a `Scope` shares the frame, which is how closures capture their
/// defining scope. A frame created with a `this` value answers `this`
/// lookups for itself and every child that has none; `home` (the class a
/// method belongs to) is inherited the same way and backs `super`.
#[derive(Debug, Clone)]
pub struct Scope(Arc<Frame>);

impl Scope {
    /// A root frame with no parent.
    pub fn root(this: Option<Value>) -> Self {
        Self::frame(None, this, None)
    }

    /// A frame under `parent` (or a root when there is none) with its own
    /// optional `this` and home class.
    pub fn frame(
        parent: Option<&Scope>,
        this: Option<Value>,
        home: Option<Arc<ClassValue>>,
    ) -> Self {
        Self(Arc::new(Frame {
            vars: RwLock::new(HashMap::new()),
            parent: parent.cloned(),
            this,
            home,
        }))
    }

    /// A child frame inheriting `this`.
    pub fn child(&self) -> Self {
        Self::frame(Some(self), None, None)
    }

    /// Declare a variable in this frame, shadowing outer ones.
    pub fn declare(&self, name: impl Into<String>, value: Value, mutable: bool) {
        self.0
            .vars
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), Slot { value, mutable });
    }

    /// Resolve a name through the chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(slot) = scope
                .0
                .vars
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .get(name)
            {
                return Some(slot.value.clone());
            }
            current = scope.0.parent.as_ref();
        }
        None
    }

    /// Assign to an existing variable. Returns `Ok(false)` when no frame
    /// declares the name.
    pub fn assign(&self, name: &str, value: Value) -> Result<bool, EvalError> {
        let mut current = Some(self);
        while let Some(scope) = current {
            let mut vars = scope.0.vars.write().unwrap_or_else(|e| e.into_inner());
            if let Some(slot) = vars.get_mut(name) {
                if !slot.mutable {
                    return Err(EnvironmentError::ImmutableBinding {
                        name: name.to_string(),
                    }
                    .into());
                }
                slot.value = value;
                return Ok(true);
            }
            drop(vars);
            current = scope.0.parent.as_ref();
        }
        Ok(false)
    }

    /// The nearest `this` binding.
    pub fn this(&self) -> Option<Value> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(this) = &scope.0.this {
                return Some(this.clone());
            }
            current = scope.0.parent.as_ref();
        }
        None
    }

    /// The nearest enclosing method's class.
    pub fn home(&self) -> Option<Arc<ClassValue>> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(home) = &scope.0.home {
                return Some(home.clone());
            }
            current = scope.0.parent.as_ref();
        }
        None
    }

    /// Whether this frame itself declares `name`.
    pub fn declares(&self, name: &str) -> bool {
        self.0
            .vars
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_child_shadows_parent() {
        let outer = Scope::root(None);
        outer.declare("x", Value::Number(1.0), true);
        let inner = outer.child();
        inner.declare("x", Value::Number(2.0), true);
        assert_eq!(inner.lookup("x"), Some(Value::Number(2.0)));
        assert_eq!(outer.lookup("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_assign_walks_chain() {
        let outer = Scope::root(None);
        outer.declare("x", Value::Number(1.0), true);
        let inner = outer.child();
        assert!(inner.assign("x", Value::Number(5.0)).unwrap());
        assert_eq!(outer.lookup("x"), Some(Value::Number(5.0)));
        assert!(!inner.assign("missing", Value::Null).unwrap());
    }

    #[test]
    fn test_const_rejects_assignment() {
        let scope = Scope::root(None);
        scope.declare("k", Value::Number(1.0), false);
        assert!(matches!(
            scope.assign("k", Value::Number(2.0)),
            Err(EvalError::Environment(EnvironmentError::ImmutableBinding { .. }))
        ));
    }

    #[test]
    fn test_this_is_inherited() {
        let scope = Scope::root(Some(Value::Number(7.0)));
        let child = scope.child();
        assert_eq!(child.this(), Some(Value::Number(7.0)));
        assert_eq!(Scope::root(None).this(), None);
    }
}
