//! # LogLive
//!
//! A live-evaluation engine: on every edit it reparses a JavaScript or
//! TypeScript document, rebuilds a scope from the document's top-level
//! declarations (and those of the files it imports), evaluates selected
//! expressions against that scope, and returns the values as line-anchored
//! annotations.
//!
//! ## Architecture
//!
//! ```text
//!  text ──► syntax::parse ──► Program
//!                               │
//!               ┌───────────────┴───────────────┐
//!               ▼                               ▼
//!      scope::ScopeBuilder              targets::select_targets
//!   (imports first, first-wins)      (bare exprs, initializers,
//!               │                      console.log calls)
//!               ▼                               │
//!          Environment ◄──── eval::evaluate ◄───┘
//!                                │
//!                                ▼
//!                    annotate::AnnotationMapper ──► Annotation
//! ```
//!
//! - **Parser** ([`syntax`]): `logos` lexer and a recursive-descent parser
//!   that records TypeScript annotation spans so value-only text can be
//!   recovered.
//! - **Scope Builder** ([`scope`]): evaluates declarations into a flat,
//!   first-wins [`Environment`].
//! - **Evaluator** ([`eval`]): a tree-walking interpreter whose identifier
//!   lookup is a total function over local scopes, the Environment, and an
//!   explicit built-in whitelist.
//! - **Host side** ([`host`], [`session`]): the traits a host implements
//!   and the per-document [`Session`] that drives runs.
//!
//! ## Example
//!
//! ```
//! use loglive::{DocumentId, MemorySourceProvider, RecordingSink, Session, Settings, TextDocument};
//!
//! let session = Session::new(MemorySourceProvider::new());
//! let doc = DocumentId::from("main.ts");
//! session.set_active(Some(doc.clone()));
//!
//! let text = TextDocument::new("main.ts", "const xs = [1, 2, 3];\nconsole.log(xs.length);");
//! let mut sink = RecordingSink::default();
//! session.handle_change(&doc, &text, &Settings::default(), &mut sink);
//!
//! assert_eq!(sink.annotations[0].line, 1);
//! assert_eq!(sink.annotations[0].content(), " // 3");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotate;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod eval;
pub mod host;
pub mod pipeline;
pub mod scope;
pub mod session;
pub mod source;
mod stack;
pub mod syntax;
pub mod targets;
pub mod value;

// Re-export main types
pub use annotate::{Annotation, AnnotationMapper, AnnotationStyle};
pub use config::{ScopePolicy, Settings};
pub use context::EvalContext;
pub use environment::{BindingKind, Entry, Environment, Origin, Scope};
pub use error::{
    ConfigError, EnvironmentError, EvalError, EvalFailure, FailureKind, ScopeError, SyntaxError,
};
pub use eval::{evaluate, evaluate_declaration, ControlFlow, Evaluate, EvaluationOutcome, Interpreter};
pub use host::{AnnotationSink, ConfigSource, RecordingSink, TextAccessor, TextDocument};
pub use pipeline::{RunReport, TargetFailure};
pub use scope::{build_environment, collect_bindings, Binding, ScopeBuilder, ScopeReport};
pub use session::{DocumentId, Session};
pub use source::{FsSourceProvider, MemorySourceProvider, SourceProvider};
pub use syntax::{parse, LineIndex, ParseOptions, Position, Program, Span};
pub use targets::{select_targets, EvaluationTarget, TargetKind};
pub use value::{Inspector, Value};

/// LogLive version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
