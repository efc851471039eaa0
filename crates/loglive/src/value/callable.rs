//! Callable values: user functions and native built-ins

use std::sync::{Arc, Weak};

use indexmap::IndexMap;

use super::{ClassValue, Value};
use crate::environment::Scope;
use crate::error::EvalError;
use crate::syntax::ast;

/// Signature of a native built-in.
pub type BuiltinFnPtr = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// A user-defined function closed over its defining scope.
pub struct FunctionValue {
    /// Name used for display and self-reference
    pub name: Option<String>,

    /// Parameters and body
    pub function: Arc<ast::Function>,

    /// Local scope the function was defined in; `None` at top level
    pub captured: Option<Scope>,

    /// Number of Environment entries visible to the body
    pub visible: usize,

    /// Class owning this method. Weak, since the class holds its methods.
    pub home: Option<Weak<ClassValue>>,

    /// Object or class method; its name is a key, not a binding
    pub is_method: bool,
}

impl FunctionValue {
    /// A plain function or arrow.
    pub fn new(
        function: Arc<ast::Function>,
        captured: Option<Scope>,
        visible: usize,
    ) -> Self {
        Self {
            name: function.name.clone(),
            function,
            captured,
            visible,
            home: None,
            is_method: false,
        }
    }

    /// The owning class, while it is alive.
    pub fn home_class(&self) -> Option<Arc<ClassValue>> {
        self.home.as_ref().and_then(Weak::upgrade)
    }

    /// Display name, `anonymous` when unnamed.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}

impl std::fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FunctionValue({})", self.display_name())
    }
}

/// A native function from the built-in whitelist.
#[derive(Clone)]
pub struct BuiltinFn {
    /// Name for display and error messages
    pub name: Arc<str>,

    /// Declared parameter count (-1 for variadic)
    pub arity: i32,

    /// The implementation
    pub func: BuiltinFnPtr,

    /// Static members, such as `Object.keys` on `Object`
    pub statics: Arc<IndexMap<String, Value>>,
}

impl BuiltinFn {
    /// Create a built-in with no static members.
    pub fn new(
        name: &str,
        arity: i32,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name),
            arity,
            func: Arc::new(func),
            statics: Arc::new(IndexMap::new()),
        }
    }

    /// Attach static members.
    pub fn with_statics(mut self, statics: IndexMap<String, Value>) -> Self {
        self.statics = Arc::new(statics);
        self
    }

    /// Invoke the built-in.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BuiltinFn({})", self.name)
    }
}
