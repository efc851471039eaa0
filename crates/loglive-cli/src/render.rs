//! Terminal rendering of annotated documents

use std::io::IsTerminal;

use loglive::{Annotation, AnnotationSink, EvalFailure, RunReport};

/// Escape sequences for annotation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    start: &'static str,
    end: &'static str,
}

impl Palette {
    /// No escapes.
    pub const PLAIN: Palette = Palette { start: "", end: "" };

    /// Bright black, which terminals draw as gray.
    pub const GRAY: Palette = Palette {
        start: "\x1b[90m",
        end: "\x1b[0m",
    };

    /// Gray on a terminal unless `NO_COLOR` is set.
    pub fn detect() -> Self {
        if std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
            Self::GRAY
        } else {
            Self::PLAIN
        }
    }

    /// `text` wrapped in this palette's escapes.
    pub fn paint(&self, text: &str) -> String {
        format!("{}{}{}", self.start, text, self.end)
    }
}

/// `text` with each line's annotations appended, in the order given.
pub fn render_annotated(text: &str, annotations: &[Annotation], palette: Palette) -> String {
    let mut out = String::new();
    for (line, content) in text.lines().enumerate() {
        out.push_str(content);
        for annotation in annotations.iter().filter(|a| a.line == line) {
            out.push_str(&palette.paint(&annotation.content()));
        }
        out.push('\n');
    }
    out
}

/// Every recorded failure of a run, on stderr.
pub fn print_failures(report: &RunReport) {
    for err in &report.import_failures {
        eprintln!("import: {}", err);
    }
    for err in &report.binding_failures {
        eprintln!("binding: {}", err);
    }
    for failed in &report.evaluation_failures {
        eprintln!("line {}: {}", failed.line + 1, failed.failure);
    }
}

/// Keeps the latest batch so the host can draw it after the run.
#[derive(Debug, Default)]
pub struct TerminalSink {
    pub annotations: Vec<Annotation>,
    pub failures: Vec<(usize, EvalFailure)>,
}

impl AnnotationSink for TerminalSink {
    fn clear_all(&mut self) {
        self.annotations.clear();
        self.failures.clear();
    }

    fn apply(&mut self, annotations: &[Annotation]) {
        self.annotations.extend_from_slice(annotations);
    }

    fn evaluation_failed(&mut self, line: usize, failure: &EvalFailure) {
        self.failures.push((line, failure.clone()));
    }
}
