//! Evaluation limits

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Limits and cancellation state for one evaluation.
///
/// Cloning shares the interrupt flag, so a host can keep a clone and call
/// [`EvalContext::interrupt`] from another thread.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Maximum call depth before a RangeError-class failure
    pub max_call_depth: usize,

    /// Clock budget per evaluation; `None` disables the deadline
    pub timeout: Option<Duration>,

    /// Interrupt flag, checked with the deadline
    pub interrupt: Arc<AtomicBool>,

    /// Emit a trace event per evaluated call
    pub trace: bool,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
            timeout: Some(Duration::from_millis(250)),
            interrupt: Arc::new(AtomicBool::new(false)),
            trace: false,
        }
    }
}

impl EvalContext {
    /// Default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default limits with a custom call depth.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            max_call_depth: max_depth,
            ..Default::default()
        }
    }

    /// Replace the time budget.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the host asked evaluation to stop.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Ask evaluation to stop.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// Clear the interrupt flag.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }
}
