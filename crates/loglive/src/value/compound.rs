//! Object and class values

use std::sync::Arc;

use indexmap::IndexMap;

use super::{BuiltinFn, Shared, Value};
use crate::environment::Scope;
use crate::syntax::ast;

/// Built-in error kinds that objects can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTag {
    /// `Error`
    Error,
    /// `TypeError`
    TypeError,
    /// `RangeError`
    RangeError,
    /// `ReferenceError`
    ReferenceError,
    /// `SyntaxError`
    SyntaxError,
}

impl ErrorTag {
    /// Constructor name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorTag::Error => "Error",
            ErrorTag::TypeError => "TypeError",
            ErrorTag::RangeError => "RangeError",
            ErrorTag::ReferenceError => "ReferenceError",
            ErrorTag::SyntaxError => "SyntaxError",
        }
    }

    /// Look a tag up by constructor name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Error" => ErrorTag::Error,
            "TypeError" => ErrorTag::TypeError,
            "RangeError" => ErrorTag::RangeError,
            "ReferenceError" => ErrorTag::ReferenceError,
            "SyntaxError" => ErrorTag::SyntaxError,
            _ => return None,
        })
    }
}

/// Contents of a JS object.
#[derive(Debug, Clone, Default)]
pub struct ObjectData {
    /// Own properties in insertion order
    pub properties: IndexMap<String, Value>,

    /// Class this object was constructed from
    pub class: Option<Arc<ClassValue>>,

    /// Set on objects built by the `Error` family of constructors
    pub error: Option<ErrorTag>,
}

impl ObjectData {
    /// A plain object with the given properties.
    pub fn with_properties(properties: IndexMap<String, Value>) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    /// Name shown by the inspector before the braces, if any.
    pub fn class_name(&self) -> Option<&str> {
        match (&self.class, self.error) {
            (Some(class), _) => class.name.as_deref(),
            (None, Some(tag)) => Some(tag.name()),
            (None, None) => None,
        }
    }

    /// Own property, then the class prototype chain.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.properties.get(key) {
            return Some(value.clone());
        }
        self.class.as_ref().and_then(|class| class.method(key))
    }
}

/// A class: its declaration, parent, and materialized members.
pub struct ClassValue {
    /// Declared name
    pub name: Option<String>,

    /// The class body
    pub decl: Arc<ast::Class>,

    /// `extends` target
    pub parent: Option<Arc<ClassValue>>,

    /// `extends` target when it is a built-in such as `Error`
    pub builtin_parent: Option<BuiltinFn>,

    /// Local scope the class was defined in
    pub captured: Option<Scope>,

    /// Environment prefix visible to the class body
    pub visible: usize,

    /// Instance methods
    pub prototype: IndexMap<String, Value>,

    /// Static methods and fields
    pub statics: Shared<IndexMap<String, Value>>,
}

impl ClassValue {
    /// Whether `self` is `other` or inherits from it.
    pub fn is_subclass_of(&self, other: &ClassValue) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if std::ptr::eq(class, other) {
                return true;
            }
            current = class.parent.as_deref();
        }
        false
    }

    /// Static member, searching parent classes.
    pub fn static_member(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.statics.read().get(key) {
            return Some(value.clone());
        }
        match (&self.parent, &self.builtin_parent) {
            (Some(parent), _) => parent.static_member(key),
            (None, Some(builtin)) => builtin.statics.get(key).cloned(),
            (None, None) => None,
        }
    }

    /// Instance method from this class or an ancestor.
    pub fn method(&self, key: &str) -> Option<Value> {
        let mut current = Some(self);
        while let Some(class) = current {
            if let Some(method) = class.prototype.get(key) {
                return Some(method.clone());
            }
            current = class.parent.as_deref();
        }
        None
    }

    /// Name of the `extends` target, if any.
    pub fn parent_name(&self) -> Option<&str> {
        match (&self.parent, &self.builtin_parent) {
            (Some(parent), _) => Some(parent.name.as_deref().unwrap_or("(anonymous)")),
            (None, Some(builtin)) => Some(&builtin.name),
            (None, None) => None,
        }
    }
}

impl std::fmt::Debug for ClassValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClassValue({})", self.name.as_deref().unwrap_or("anonymous"))
    }
}
