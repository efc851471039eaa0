//! Per-document state and the change-notification protocol
//!
//! A [`Session`] is what a host talks to. It keeps one [`Environment`] per
//! open document, serialises runs for the same document, and ignores
//! changes to anything but the active document.
//!
//! ```text
//!   host change event
//!        │
//!        ▼
//!   handle_change(doc) ── doc inactive ──► ignored
//!        │
//!        ├─ sink.clear_all()
//!        ├─ lock doc's Environment        (run-lock)
//!        ├─ pipeline::run_with(...)
//!        ├─ sink.apply(annotations)
//!        └─ sink.evaluation_failed(...)   per failed target
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::config::Settings;
use crate::context::EvalContext;
use crate::environment::Environment;
use crate::host::{AnnotationSink, ConfigSource, TextAccessor};
use crate::pipeline::{self, RunReport};
use crate::source::SourceProvider;

pub use crate::config::ScopePolicy;

/// Identity of an open document: its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(PathBuf);

impl DocumentId {
    /// The document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Path imports resolve against.
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for DocumentId {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Default)]
struct DocumentState {
    /// Doubles as the document's run-lock
    env: Mutex<Environment>,
}

/// Host-facing entry point holding every open document's state.
pub struct Session<P> {
    provider: P,
    documents: DashMap<DocumentId, Arc<DocumentState>>,
    active: RwLock<Option<DocumentId>>,
    settings: RwLock<Settings>,
    ctx: EvalContext,
}

impl<P: SourceProvider> Session<P> {
    /// A session reading imports through `provider`, with default settings.
    pub fn new(provider: P) -> Self {
        Self::with_settings(provider, Settings::default())
    }

    /// A session with initial settings.
    pub fn with_settings(provider: P, settings: Settings) -> Self {
        Self {
            provider,
            documents: DashMap::new(),
            active: RwLock::new(None),
            ctx: settings.eval_context(),
            settings: RwLock::new(settings),
        }
    }

    /// Make `doc` the document whose changes are run.
    pub fn set_active(&self, doc: Option<DocumentId>) {
        debug!(doc = ?doc, "active document changed");
        *self.active.write().unwrap_or_else(|e| e.into_inner()) = doc;
    }

    /// The active document.
    pub fn active(&self) -> Option<DocumentId> {
        self.active.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Run the pipeline for a change to `doc`.
    ///
    /// Returns `None` without touching `sink` when `doc` is not the active
    /// document. Otherwise the sink is cleared before anything else, then
    /// handed the whole annotation batch.
    pub fn handle_change<T, C, S>(
        &self,
        doc: &DocumentId,
        text: &T,
        config: &C,
        sink: &mut S,
    ) -> Option<RunReport>
    where
        T: TextAccessor + ?Sized,
        C: ConfigSource + ?Sized,
        S: AnnotationSink + ?Sized,
    {
        if self.active().as_ref() != Some(doc) {
            debug!(%doc, "change to inactive document ignored");
            return None;
        }
        sink.clear_all();

        let settings = config.settings();
        let state = self.documents.entry(doc.clone()).or_default().clone();
        let mut env = state.env.lock().unwrap_or_else(|e| e.into_inner());

        let ctx = EvalContext {
            max_call_depth: settings.max_call_depth,
            timeout: settings.eval_context().timeout,
            ..self.ctx.clone()
        };
        ctx.reset_interrupt();
        let report = pipeline::run_with(
            text.full_text(),
            doc.path(),
            &settings,
            &ctx,
            &self.provider,
            &mut env,
        );

        sink.apply(&report.annotations);
        for failed in &report.evaluation_failures {
            sink.evaluation_failed(failed.line, &failed.failure);
        }
        Some(report)
    }

    /// Record new settings. Does not trigger a run.
    pub fn configuration_changed(&self, settings: Settings) {
        let mut current = self.settings.write().unwrap_or_else(|e| e.into_inner());
        info!(
            show_all_expressions = settings.show_all_expressions,
            scope_policy = ?settings.scope_policy,
            changed = *current != settings,
            "configuration changed"
        );
        *current = settings;
    }

    /// Ask a run in progress to stop at its next check.
    pub fn interrupt(&self) {
        self.ctx.interrupt();
    }

    /// Drop a document's state.
    pub fn close_document(&self, doc: &DocumentId) {
        self.documents.remove(doc);
        let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
        if active.as_ref() == Some(doc) {
            *active = None;
        }
        debug!(%doc, "document closed");
    }

    /// Clear annotations and forget every document.
    pub fn deactivate<S: AnnotationSink + ?Sized>(&self, sink: &mut S) {
        sink.clear_all();
        self.documents.clear();
        self.set_active(None);
        info!("session deactivated");
    }

    /// Names bound in a document's Environment, in binding order.
    pub fn binding_names(&self, doc: &DocumentId) -> Option<Vec<String>> {
        let state = self.documents.get(doc)?.clone();
        let env = state.env.lock().unwrap_or_else(|e| e.into_inner());
        Some(env.names().map(str::to_string).collect())
    }

    /// Number of open documents with state.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

impl<P> ConfigSource for Session<P> {
    fn settings(&self) -> Settings {
        self.settings.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{RecordingSink, TextDocument};
    use crate::source::MemorySourceProvider;
    use pretty_assertions::assert_eq;

    fn session() -> (Session<MemorySourceProvider>, DocumentId) {
        let session = Session::new(MemorySourceProvider::new());
        let doc = DocumentId::from("/main.ts");
        session.set_active(Some(doc.clone()));
        (session, doc)
    }

    #[test]
    fn test_inactive_documents_are_ignored() {
        let (session, _) = session();
        let other = DocumentId::from("/other.ts");
        let mut sink = RecordingSink::default();
        let text = TextDocument::new("/other.ts", "console.log(1);");
        assert!(session
            .handle_change(&other, &text, &Settings::default(), &mut sink)
            .is_none());
        assert_eq!(sink.clears, 0);
    }

    #[test]
    fn test_change_clears_then_applies() {
        let (session, doc) = session();
        let mut sink = RecordingSink::default();
        let text = TextDocument::new(doc.path(), "console.log(1);\nconsole.log(nope);");
        session.handle_change(&doc, &text, &Settings::default(), &mut sink);
        assert_eq!(sink.clears, 1);
        assert_eq!(sink.annotations.len(), 1);
        assert_eq!(sink.failures.len(), 1);
        assert_eq!(sink.failures[0].0, 1);
    }

    #[test]
    fn test_syntax_error_leaves_sink_empty() {
        let (session, doc) = session();
        let mut sink = RecordingSink::default();
        let good = TextDocument::new(doc.path(), "console.log(1);");
        session.handle_change(&doc, &good, &Settings::default(), &mut sink);
        let bad = TextDocument::new(doc.path(), "console.log(1;");
        let report = session
            .handle_change(&doc, &bad, &Settings::default(), &mut sink)
            .unwrap();
        assert!(report.syntax_error.is_some());
        assert!(sink.annotations.is_empty());
        assert_eq!(sink.clears, 2);
    }

    #[test]
    fn test_configuration_change_is_stored_not_run() {
        let (session, doc) = session();
        session.configuration_changed(Settings {
            show_all_expressions: true,
            ..Settings::default()
        });
        assert!(session.settings().show_all_expressions);
        assert_eq!(session.document_count(), 0);

        let mut sink = RecordingSink::default();
        let text = TextDocument::new(doc.path(), "1 + 1;");
        session.handle_change(&doc, &text, &session, &mut sink);
        assert_eq!(sink.annotations[0].text, "2");
    }

    #[test]
    fn test_close_and_deactivate() {
        let (session, doc) = session();
        let mut sink = RecordingSink::default();
        let text = TextDocument::new(doc.path(), "const a = 1;");
        session.handle_change(&doc, &text, &Settings::default(), &mut sink);
        assert_eq!(session.binding_names(&doc), Some(vec!["a".to_string()]));

        session.close_document(&doc);
        assert_eq!(session.binding_names(&doc), None);
        assert_eq!(session.active(), None);

        session.deactivate(&mut sink);
        assert_eq!(sink.clears, 2);
    }
}
