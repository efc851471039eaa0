//! Interfaces the host environment implements
//!
//! The core never owns an editor buffer, draws decorations, or stores
//! settings. A host hands it text through [`TextAccessor`], receives
//! results through [`AnnotationSink`], and supplies settings through
//! [`ConfigSource`].

use std::path::{Path, PathBuf};

use crate::annotate::Annotation;
use crate::config::Settings;
use crate::error::EvalFailure;
use crate::syntax::{LineIndex, Position};

/// Read-only access to a document's text.
pub trait TextAccessor {
    /// The whole document.
    fn full_text(&self) -> &str;

    /// One 0-based line without its terminator.
    fn line_text(&self, line: usize) -> Option<&str>;

    /// Byte offset to 0-based line/column.
    fn position_at(&self, offset: usize) -> Position;

    /// 0-based line/column to byte offset.
    fn offset_at(&self, position: Position) -> usize;
}

impl TextAccessor for LineIndex {
    fn full_text(&self) -> &str {
        self.text()
    }

    fn line_text(&self, line: usize) -> Option<&str> {
        LineIndex::line_text(self, line)
    }

    fn position_at(&self, offset: usize) -> Position {
        self.position(offset)
    }

    fn offset_at(&self, position: Position) -> usize {
        self.offset(position)
    }
}

/// A named in-memory document.
#[derive(Debug, Clone)]
pub struct TextDocument {
    path: PathBuf,
    index: LineIndex,
}

impl TextDocument {
    /// A document at `path` holding `text`.
    pub fn new(path: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            path: path.into(),
            index: LineIndex::new(text),
        }
    }

    /// Where the document lives; imports resolve relative to it.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the document's text.
    pub fn set_text(&mut self, text: &str) {
        self.index = LineIndex::new(text);
    }
}

impl TextAccessor for TextDocument {
    fn full_text(&self) -> &str {
        self.index.full_text()
    }

    fn line_text(&self, line: usize) -> Option<&str> {
        self.index.line_text(line)
    }

    fn position_at(&self, offset: usize) -> Position {
        self.index.position(offset)
    }

    fn offset_at(&self, position: Position) -> usize {
        self.index.offset(position)
    }
}

/// Receives annotation batches.
///
/// Every run calls [`clear_all`](Self::clear_all) before anything else, so
/// a run that fails to parse leaves no stale annotations behind.
pub trait AnnotationSink {
    /// Remove every annotation currently shown.
    fn clear_all(&mut self);

    /// Show a run's annotations.
    fn apply(&mut self, annotations: &[Annotation]);

    /// A target on `line` failed to evaluate. Ignored unless overridden.
    fn evaluation_failed(&mut self, line: usize, failure: &EvalFailure) {
        let _ = (line, failure);
    }
}

impl<S: AnnotationSink + ?Sized> AnnotationSink for &mut S {
    fn clear_all(&mut self) {
        (**self).clear_all();
    }

    fn apply(&mut self, annotations: &[Annotation]) {
        (**self).apply(annotations);
    }

    fn evaluation_failed(&mut self, line: usize, failure: &EvalFailure) {
        (**self).evaluation_failed(line, failure);
    }
}

/// A sink that keeps whatever it was last given.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    /// Annotations currently shown
    pub annotations: Vec<Annotation>,

    /// Number of `clear_all` calls
    pub clears: usize,

    /// Failures reported since the last clear
    pub failures: Vec<(usize, EvalFailure)>,
}

impl AnnotationSink for RecordingSink {
    fn clear_all(&mut self) {
        self.annotations.clear();
        self.failures.clear();
        self.clears += 1;
    }

    fn apply(&mut self, annotations: &[Annotation]) {
        self.annotations.extend_from_slice(annotations);
    }

    fn evaluation_failed(&mut self, line: usize, failure: &EvalFailure) {
        self.failures.push((line, failure.clone()));
    }
}

/// Supplies settings at the start of each run.
pub trait ConfigSource {
    /// Current settings.
    fn settings(&self) -> Settings;
}

impl<C: ConfigSource + ?Sized> ConfigSource for &C {
    fn settings(&self) -> Settings {
        (**self).settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_document_positions() {
        let doc = TextDocument::new("/a.ts", "let a = 1;\nconsole.log(a);\n");
        assert_eq!(doc.line_text(1), Some("console.log(a);"));
        let offset = doc.offset_at(Position::new(1, 8));
        assert_eq!(&doc.full_text()[offset..offset + 3], "log");
        assert_eq!(doc.position_at(offset), Position::new(1, 8));
    }

    #[test]
    fn test_set_text_reindexes() {
        let mut doc = TextDocument::new("/a.ts", "one");
        doc.set_text("one\ntwo");
        assert_eq!(doc.line_text(1), Some("two"));
        assert_eq!(doc.path(), Path::new("/a.ts"));
    }

    #[test]
    fn test_recording_sink_clear_resets_batch() {
        let mut sink = RecordingSink::default();
        sink.apply(&[Annotation::new(0, 3, "4")]);
        sink.clear_all();
        assert!(sink.annotations.is_empty());
        assert_eq!(sink.clears, 1);
    }
}
