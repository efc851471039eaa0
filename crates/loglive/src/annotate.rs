//! Annotation Mapper: evaluation results to line-anchored text

use serde::Serialize;

use crate::eval::EvaluationOutcome;
use crate::syntax::LineIndex;
use crate::targets::EvaluationTarget;
use crate::value::Inspector;

/// Display hint for an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationStyle {
    /// Dimmed text after the code
    #[default]
    Muted,
}

impl AnnotationStyle {
    /// Color name a host should draw the style with.
    pub fn color(self) -> &'static str {
        match self {
            AnnotationStyle::Muted => "gray",
        }
    }
}

/// One value shown at the end of a source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    /// 0-based line
    pub line: usize,

    /// Character column the annotation is anchored at (the end of the line)
    pub column: usize,

    /// Rendered value
    pub text: String,

    /// Display hint
    pub style: AnnotationStyle,
}

impl Annotation {
    /// A muted annotation.
    pub fn new(line: usize, column: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            column,
            text: text.into(),
            style: AnnotationStyle::Muted,
        }
    }

    /// Text as drawn after the code: ` // value`.
    pub fn content(&self) -> String {
        format!(" // {}", self.text)
    }
}

/// Turns (target, outcome) pairs into annotations for one document.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationMapper<'a> {
    index: &'a LineIndex,
    inspector: Inspector,
}

impl<'a> AnnotationMapper<'a> {
    /// A mapper over `index`, rendering values with `inspector`.
    pub fn new(index: &'a LineIndex, inspector: Inspector) -> Self {
        Self { index, inspector }
    }

    /// 0-based line a target is anchored to.
    pub fn line_of(&self, target: &EvaluationTarget) -> usize {
        self.index.position(target.span.start).line
    }

    /// The annotation for a target, or `None` when it failed or produced
    /// `undefined`.
    pub fn map(&self, target: &EvaluationTarget, outcome: &EvaluationOutcome) -> Option<Annotation> {
        let value = outcome.value().filter(|v| !v.is_undefined())?;
        let line = self.line_of(target);
        Some(Annotation::new(
            line,
            self.index.line_len(line),
            self.inspector.render(value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvalFailure, FailureKind};
    use crate::syntax::Span;
    use crate::targets::TargetKind;
    use crate::value::Value;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn target(start: usize) -> EvaluationTarget {
        EvaluationTarget {
            kind: TargetKind::PlainExpression,
            span: Span::new(start, start + 1),
            source: String::new(),
        }
    }

    #[test]
    fn test_anchor_at_end_of_start_line() {
        let index = LineIndex::new("a;\nfoo(x,\n  y);");
        let mapper = AnnotationMapper::new(&index, Inspector::default());
        let ann = mapper
            .map(&target(3), &EvaluationOutcome::Value(Value::Number(4.0)))
            .unwrap();
        assert_eq!(ann, Annotation::new(1, 7, "4"));
        assert_eq!(ann.content(), " // 4");
    }

    #[test]
    fn test_undefined_and_failures_are_suppressed() {
        let index = LineIndex::new("x");
        let mapper = AnnotationMapper::new(&index, Inspector::default());
        assert_eq!(
            mapper.map(&target(0), &EvaluationOutcome::Value(Value::Undefined)),
            None
        );
        let failure = EvalFailure {
            kind: FailureKind::Reference,
            message: "x is not defined".into(),
        };
        assert_eq!(mapper.map(&target(0), &EvaluationOutcome::Failure(failure)), None);
    }

    #[test]
    fn test_null_is_shown() {
        let index = LineIndex::new("x");
        let mapper = AnnotationMapper::new(&index, Inspector::default());
        let ann = mapper.map(&target(0), &EvaluationOutcome::Value(Value::Null));
        assert_eq!(ann.map(|a| a.text), Some("null".to_string()));
    }

    #[test]
    fn test_structures_render_through_inspector() {
        let index = LineIndex::new("x");
        let mapper = AnnotationMapper::new(&index, Inspector::new(0));
        let mut props = IndexMap::new();
        props.insert("a".to_string(), Value::array(vec![Value::Number(1.0)]));
        let ann = mapper
            .map(&target(0), &EvaluationOutcome::Value(Value::object(props)))
            .unwrap();
        assert_eq!(ann.text, "{ a: [Array] }");
        assert_eq!(ann.style.color(), "gray");
    }
}
