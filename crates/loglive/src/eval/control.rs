//! Non-local jumps: `break`, `continue`, `return`, optional chains

use crate::value::Value;

/// Control flow signal for non-local jumps.
///
/// Evaluating `break` does not produce a value. It returns
/// `Err(EvalError::ControlFlow(...))`, which propagates until the enclosing
/// loop, `switch`, function call, or optional chain catches it.
#[derive(Debug, Clone)]
pub enum ControlFlow {
    /// Leave the innermost loop or `switch`
    Break,

    /// Skip to the next iteration of the innermost loop
    Continue,

    /// Leave the current function
    Return {
        /// Value returned
        value: Value,
    },

    /// `a?.b` met a nullish `a`; the whole chain becomes `undefined`
    ShortCircuit,
}

impl ControlFlow {
    /// Create a return.
    pub fn return_value(value: Value) -> Self {
        ControlFlow::Return { value }
    }

    /// Statement name for "Illegal ..." messages.
    pub fn describe(&self) -> &'static str {
        match self {
            ControlFlow::Break => "break statement",
            ControlFlow::Continue => "continue statement",
            ControlFlow::Return { .. } => "return statement",
            ControlFlow::ShortCircuit => "optional chain",
        }
    }
}
