//! User settings
//!
//! Settings are plain JSON with camelCase keys, every field optional:
//!
//! ```json
//! {
//!   "showAllExpressions": true,
//!   "scopePolicy": "retain",
//!   "evalTimeoutMs": 500
//! }
//! ```
//!
//! Editor-style files that nest everything under a `"loglive"` key are
//! accepted as well.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::EvalContext;
use crate::error::ConfigError;
use crate::host::ConfigSource;
use crate::value::Inspector;

/// What happens to a document's Environment between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopePolicy {
    /// Rebuild from nothing on every run; deleted declarations disappear
    #[default]
    FreshPerRun,
    /// Keep the previous run's bindings and only add new names
    Retain,
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Evaluate bare expressions and variable initializers, not only
    /// `console.log` calls
    pub show_all_expressions: bool,

    /// Environment lifetime across runs
    pub scope_policy: ScopePolicy,

    /// Per-evaluation time budget in milliseconds; `0` disables it
    pub eval_timeout_ms: u64,

    /// Call depth before a RangeError-class failure
    pub max_call_depth: usize,

    /// Nesting levels the inspector expands
    pub inspect_depth: usize,

    /// Merge bindings from imported files
    pub follow_imports: bool,

    /// Import levels followed below the document; `1` loads only its
    /// direct imports
    pub max_import_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_all_expressions: false,
            scope_policy: ScopePolicy::FreshPerRun,
            eval_timeout_ms: 250,
            max_call_depth: 1000,
            inspect_depth: 2,
            follow_imports: true,
            max_import_depth: 16,
        }
    }
}

#[derive(Deserialize)]
struct Wrapped {
    loglive: Settings,
}

impl Settings {
    /// Parse settings from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: serde_json::Value = serde_json::from_str(text)?;
        if raw.get("loglive").is_some() {
            return Ok(serde_json::from_value::<Wrapped>(raw)?.loglive);
        }
        Ok(serde_json::from_value(raw)?)
    }

    /// Load settings from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Evaluation limits derived from these settings.
    pub fn eval_context(&self) -> EvalContext {
        let timeout = (self.eval_timeout_ms > 0).then(|| Duration::from_millis(self.eval_timeout_ms));
        EvalContext::with_max_call_depth(self.max_call_depth).with_timeout(timeout)
    }

    /// The inspector annotations are rendered with.
    pub fn inspector(&self) -> Inspector {
        Inspector::new(self.inspect_depth)
    }
}

impl ConfigSource for Settings {
    fn settings(&self) -> Settings {
        self.clone()
    }
}
