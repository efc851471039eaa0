//! Error types for LogLive
//!
//! Parse failures are [`SyntaxError`]s. Evaluation failures are
//! [`EvalError`]s, which also carry the non-local `break`/`continue`/`return`
//! signals as [`ControlFlow`]. Binding-table misuse is [`EnvironmentError`].
//! Scope building records [`ScopeError`]s instead of failing.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::eval::ControlFlow;
use crate::syntax::LineIndex;
use crate::value::Value;

/// A file (or expression) that failed to parse.
///
/// `line` and `column` are 1-based for display; `offset` is the byte offset.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("SyntaxError: {message} ({line}:{column})")]
pub struct SyntaxError {
    /// What went wrong
    pub message: String,
    /// Byte offset of the failure
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

impl SyntaxError {
    /// Build an error at `offset` in `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let pos = LineIndex::new(source).position(offset.min(source.len()));
        Self {
            message: message.into(),
            offset,
            line: pos.line + 1,
            column: pos.column + 1,
        }
    }
}

/// Errors from binding-table operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    /// Assignment to a `const` binding
    #[error("Assignment to constant variable '{name}'")]
    ImmutableBinding {
        /// Binding name
        name: String,
    },

    /// Assignment from an evaluation to a name owned by the global environment
    #[error("Cannot assign to '{name}': global bindings are read-only during evaluation")]
    TopLevelAssignment {
        /// Binding name
        name: String,
    },

    /// Call depth exceeded
    #[error("Maximum call stack size exceeded (depth {depth}, max {max})")]
    StackOverflow {
        /// Depth reached
        depth: usize,
        /// Configured limit
        max: usize,
    },
}

/// Errors raised while evaluating an expression or statement.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Reading an unbound name
    #[error("ReferenceError: {name} is not defined")]
    UndefinedVariable {
        /// Name looked up
        name: String,
    },

    /// Operation applied to a value of the wrong kind
    #[error("TypeError: {message}")]
    TypeError {
        /// Description
        message: String,
    },

    /// Numeric argument out of range
    #[error("RangeError: {message}")]
    RangeError {
        /// Description
        message: String,
    },

    /// A built-in function rejected its arguments
    #[error("{name}: {message}")]
    BuiltinError {
        /// Built-in name
        name: String,
        /// Description
        message: String,
    },

    /// A `throw` statement that nobody caught
    #[error("Uncaught {}", .0.to_display_string())]
    Thrown(Value),

    /// Evaluation ran past its time budget
    #[error("Evaluation timed out after {limit_ms}ms")]
    Timeout {
        /// Budget in milliseconds
        limit_ms: u128,
    },

    /// The interrupt flag was raised
    #[error("Evaluation interrupted")]
    Interrupted,

    /// A construct the evaluator does not run
    #[error("Unsupported: {kind}")]
    Unsupported {
        /// Construct name
        kind: String,
    },

    /// Binding-table error
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// Parse failure surfaced during evaluation
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// `break`/`continue`/`return` escaping its construct
    #[error("Illegal {}", .0.describe())]
    ControlFlow(ControlFlow),
}

impl EvalError {
    /// Build a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::TypeError {
            message: message.into(),
        }
    }

    /// Build a `RangeError`.
    pub fn range_error(message: impl Into<String>) -> Self {
        EvalError::RangeError {
            message: message.into(),
        }
    }

    /// Build a timeout error for the given budget.
    pub fn timeout(limit: Duration) -> Self {
        EvalError::Timeout {
            limit_ms: limit.as_millis(),
        }
    }

    /// Whether a `try`/`catch` in evaluated code may observe this error.
    pub fn is_catchable(&self) -> bool {
        !matches!(
            self,
            EvalError::Timeout { .. } | EvalError::Interrupted | EvalError::ControlFlow(_)
        )
    }

    /// Failure category for reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            EvalError::UndefinedVariable { .. } => FailureKind::Reference,
            EvalError::TypeError { .. }
            | EvalError::BuiltinError { .. }
            | EvalError::Environment(EnvironmentError::ImmutableBinding { .. })
            | EvalError::Environment(EnvironmentError::TopLevelAssignment { .. })
            | EvalError::ControlFlow(_) => FailureKind::Type,
            EvalError::RangeError { .. }
            | EvalError::Environment(EnvironmentError::StackOverflow { .. }) => FailureKind::Range,
            EvalError::Thrown(_) => FailureKind::Thrown,
            EvalError::Timeout { .. } => FailureKind::Timeout,
            EvalError::Interrupted => FailureKind::Interrupted,
            EvalError::Unsupported { .. } => FailureKind::Unsupported,
            EvalError::Syntax(_) => FailureKind::Syntax,
        }
    }
}

/// Category of an evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Unbound name
    Reference,
    /// Wrong kind of value
    Type,
    /// Value out of range, including call-depth overflow
    Range,
    /// User `throw`
    Thrown,
    /// Time budget exhausted
    Timeout,
    /// Interrupt flag raised
    Interrupted,
    /// Parse failure
    Syntax,
    /// Construct not supported by the evaluator
    Unsupported,
}

/// A reportable evaluation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvalFailure {
    /// Category
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
}

impl From<&EvalError> for EvalFailure {
    fn from(err: &EvalError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for EvalFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Isolated failures recorded by the Scope Builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// A declaration threw while being evaluated; its name is left unbound
    #[error("{name}: {failure}")]
    Binding {
        /// Declared name
        name: String,
        /// What went wrong
        failure: EvalFailure,
    },

    /// No file matches the specifier
    #[error("Cannot resolve '{specifier}' from {}", .from.display())]
    Unresolved {
        /// Specifier as written
        specifier: String,
        /// Importing file
        from: PathBuf,
    },

    /// File exists but could not be read
    #[error("Cannot read {}: {message}", .path.display())]
    Read {
        /// Resolved file
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// Imported file failed to parse
    #[error("{}: {error}", .path.display())]
    Syntax {
        /// Resolved file
        path: PathBuf,
        /// Parse failure
        error: SyntaxError,
    },

    /// File already on the import stack
    #[error("Import cycle through {}", .path.display())]
    Cycle {
        /// File seen twice
        path: PathBuf,
    },

    /// Import chain longer than the configured limit
    #[error("Import depth limit {max} exceeded at {}", .path.display())]
    TooDeep {
        /// File that would exceed the limit
        path: PathBuf,
        /// Configured limit
        max: usize,
    },
}

/// Errors loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file unreadable
    #[error("Cannot read settings {}: {source}", .path.display())]
    Io {
        /// Settings file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON for the settings schema
    #[error("Invalid settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_syntax_error_position_is_one_based() {
        let err = SyntaxError::at("let a = 1;\nlet = 2;", 15, "expected identifier");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 5);
        assert_eq!(err.to_string(), "SyntaxError: expected identifier (2:5)");
    }

    #[test]
    fn test_catchable_errors() {
        assert!(EvalError::type_error("x").is_catchable());
        assert!(EvalError::UndefinedVariable { name: "x".into() }.is_catchable());
        assert!(!EvalError::Interrupted.is_catchable());
        assert!(!EvalError::timeout(Duration::from_millis(5)).is_catchable());
    }

    #[test]
    fn test_failure_kinds() {
        let overflow = EvalError::from(EnvironmentError::StackOverflow { depth: 5, max: 4 });
        assert_eq!(overflow.kind(), FailureKind::Range);
        assert_eq!(
            EvalFailure::from(&EvalError::UndefinedVariable { name: "q".into() }),
            EvalFailure {
                kind: FailureKind::Reference,
                message: "ReferenceError: q is not defined".to_string(),
            }
        );
    }
}
