//! One parse → scope → select → evaluate → annotate pass

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::annotate::{Annotation, AnnotationMapper};
use crate::config::{ScopePolicy, Settings};
use crate::context::EvalContext;
use crate::environment::Environment;
use crate::error::{EvalFailure, ScopeError, SyntaxError};
use crate::eval::{evaluate, EvaluationOutcome};
use crate::scope::ScopeBuilder;
use crate::source::SourceProvider;
use crate::syntax::{self, LineIndex, ParseOptions};
use crate::targets::{select_targets, TargetKind};

/// A target that failed to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    /// 0-based line of the target
    pub line: usize,

    /// Target classification
    pub kind: TargetKind,

    /// Text that was evaluated
    pub source: String,

    /// What went wrong
    pub failure: EvalFailure,
}

/// Everything one run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Annotations in target order
    pub annotations: Vec<Annotation>,

    /// Declarations left unbound
    pub binding_failures: Vec<ScopeError>,

    /// Imports skipped
    pub import_failures: Vec<ScopeError>,

    /// Targets without an annotation because they failed
    pub evaluation_failures: Vec<TargetFailure>,

    /// Set when the document did not parse; nothing else ran
    pub syntax_error: Option<SyntaxError>,
}

impl RunReport {
    /// Whether the run produced neither annotations nor failures.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
            && self.binding_failures.is_empty()
            && self.import_failures.is_empty()
            && self.evaluation_failures.is_empty()
            && self.syntax_error.is_none()
    }
}

/// Run the pipeline over `text`, the document at `path`, with the limits
/// from `settings`.
///
/// Under [`ScopePolicy::FreshPerRun`] `env` is emptied first; under
/// [`ScopePolicy::Retain`] the run only adds names it does not hold yet.
///
/// ```
/// use std::path::Path;
/// use loglive::{pipeline, Environment, MemorySourceProvider, Settings};
///
/// let mut env = Environment::new();
/// let report = pipeline::run(
///     "console.log(2 + 2);",
///     Path::new("main.ts"),
///     &Settings::default(),
///     MemorySourceProvider::new(),
///     &mut env,
/// );
/// assert_eq!(report.annotations[0].text, "4");
/// ```
pub fn run<P: SourceProvider>(
    text: &str,
    path: &Path,
    settings: &Settings,
    provider: P,
    env: &mut Environment,
) -> RunReport {
    run_with(text, path, settings, &settings.eval_context(), provider, env)
}

/// [`run`] with explicit evaluation limits, such as a context whose
/// interrupt flag the host holds.
#[instrument(skip_all, fields(path = %path.display(), len = text.len()))]
pub fn run_with<P: SourceProvider>(
    text: &str,
    path: &Path,
    settings: &Settings,
    ctx: &EvalContext,
    provider: P,
    env: &mut Environment,
) -> RunReport {
    let mut report = RunReport::default();
    if settings.scope_policy == ScopePolicy::FreshPerRun {
        env.clear();
    }

    let program = match syntax::parse(text, ParseOptions::for_path(path)) {
        Ok(program) => program,
        Err(err) => {
            warn!(%err, "document does not parse; run skipped");
            report.syntax_error = Some(err);
            return report;
        }
    };

    let scope = ScopeBuilder::new(provider, settings)
        .with_context(ctx.clone())
        .build(&program, text, path, env);
    report.binding_failures = scope.binding_failures;
    report.import_failures = scope.import_failures;

    let targets = select_targets(&program, text, settings.show_all_expressions);
    let index = LineIndex::new(text);
    let mapper = AnnotationMapper::new(&index, settings.inspector());

    for target in &targets {
        let outcome = evaluate(&target.source, env, ctx);
        match &outcome {
            EvaluationOutcome::Value(_) => {
                if let Some(annotation) = mapper.map(target, &outcome) {
                    debug!(line = annotation.line, text = %annotation.text, "annotated");
                    report.annotations.push(annotation);
                }
            }
            EvaluationOutcome::Failure(failure) => {
                debug!(source = %target.source, %failure, "target failed");
                report.evaluation_failures.push(TargetFailure {
                    line: mapper.line_of(target),
                    kind: target.kind,
                    source: target.source.clone(),
                    failure: failure.clone(),
                });
            }
        }
    }

    debug!(
        bindings = env.len(),
        targets = targets.len(),
        annotations = report.annotations.len(),
        "run complete"
    );
    report
}
