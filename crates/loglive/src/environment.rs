//! The flat, first-wins Environment of top-level bindings
//!
//! The Scope Builder fills an [`Environment`]; evaluation only reads it.
//! Local variables created while evaluating live in [`Scope`] frames, and
//! host built-ins come from the [`prelude`] whitelist.

mod frame;
mod json;
pub mod prelude;

pub use frame::Scope;

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::value::Value;

/// What kind of declaration produced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingKind {
    /// `function f() {}`
    Function,
    /// `var`/`let`/`const` declarator
    Variable,
    /// `class A {}`
    Class,
}

/// Where a binding came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The document being run
    Local,
    /// A file reached through an import
    Import(PathBuf),
}

/// One Environment entry.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Evaluated value
    pub value: Value,

    /// Declaration kind
    pub kind: BindingKind,

    /// Source file
    pub origin: Origin,
}

/// Insertion-ordered map from top-level name to evaluated value.
///
/// The first binding for a name wins; later ones are ignored. Entry
/// positions matter: a function defined when the map held `n` entries sees
/// only entries `0..n`.
///
/// # Example
///
/// ```
/// use loglive::{BindingKind, Environment, Origin, Value};
///
/// let mut env = Environment::new();
/// assert!(env.bind("x", Value::Number(1.0), BindingKind::Variable, Origin::Local));
/// assert!(!env.bind("x", Value::Number(2.0), BindingKind::Variable, Origin::Local));
/// assert_eq!(env.get("x"), Some(&Value::Number(1.0)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Environment {
    entries: IndexMap<String, Entry>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` unless it is already present. Returns whether it was added.
    pub fn bind(
        &mut self,
        name: impl Into<String>,
        value: Value,
        kind: BindingKind,
        origin: Origin,
    ) -> bool {
        match self.entries.entry(name.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(Entry {
                    value,
                    kind,
                    origin,
                });
                true
            }
        }
    }

    /// Look up a binding's value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|e| &e.value)
    }

    /// Look up a binding, only among the first `visible` entries.
    pub fn get_visible(&self, name: &str, visible: usize) -> Option<&Value> {
        match self.entries.get_full(name) {
            Some((index, _, entry)) if index < visible => Some(&entry.value),
            _ => None,
        }
    }

    /// Full entry for a name.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Whether a name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the environment is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Remove every binding.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
