//! Runtime values

mod callable;
mod compound;
mod convert;
mod display;
pub mod limits;
mod refs;

pub use callable::{BuiltinFn, BuiltinFnPtr, FunctionValue};
pub use compound::{ClassValue, ErrorTag, ObjectData};
pub use convert::{number_to_string, string_to_number};
pub use display::{inspect, Inspector};
pub use refs::Shared;

use std::sync::Arc;

use indexmap::IndexMap;

/// Runtime value of the evaluated JavaScript subset.
///
/// Values are organized into three tiers:
/// - Tier 1: Primitives, compared by value
/// - Tier 2: Shared containers with reference identity
/// - Tier 3: Callables
#[derive(Clone, Default)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Tier 1: Primitives
    // ═══════════════════════════════════════════════════════════════════
    /// `undefined`, the "no value" result that suppresses annotation
    #[default]
    Undefined,

    /// `null`
    Null,

    /// `true` / `false`
    Bool(bool),

    /// IEEE-754 double, the only numeric type
    Number(f64),

    /// Immutable string
    String(Arc<str>),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 2: Shared Containers
    // ═══════════════════════════════════════════════════════════════════
    /// Array
    Array(Shared<Vec<Value>>),

    /// Object, class instance, or error
    Object(Shared<ObjectData>),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 3: Callables
    // ═══════════════════════════════════════════════════════════════════
    /// User function, arrow, or method
    Function(Arc<FunctionValue>),

    /// User class
    Class(Arc<ClassValue>),

    /// Native built-in
    Builtin(BuiltinFn),
}

impl Value {
    /// A string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    /// A fresh array.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Shared::new(items))
    }

    /// A fresh plain object.
    pub fn object(properties: IndexMap<String, Value>) -> Self {
        Value::Object(Shared::new(ObjectData::with_properties(properties)))
    }

    /// An error object as built by `new Error(message)`.
    pub fn error(tag: ErrorTag, message: impl AsRef<str>) -> Self {
        let mut properties = IndexMap::new();
        properties.insert("name".to_string(), Value::string(tag.name()));
        properties.insert("message".to_string(), Value::string(message));
        Value::Object(Shared::new(ObjectData {
            properties,
            class: None,
            error: Some(tag),
        }))
    }

    /// `undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `null` or `undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Functions, classes, and built-ins.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Class(_) | Value::Builtin(_)
        )
    }

    /// The `typeof` result.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) | Value::Object(_) => "object",
            Value::Function(_) | Value::Class(_) | Value::Builtin(_) => "function",
        }
    }

    /// The number, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Primitives by value (NaN unequal to itself), everything else by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}
