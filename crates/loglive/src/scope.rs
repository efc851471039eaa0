//! Scope Builder: top-level declarations to a live Environment
//!
//! For each document the builder:
//!
//! 1. follows every static import (and `export ... from` re-export),
//!    recursively building the imported file into the same Environment;
//! 2. collects a [`Binding`] for each top-level function, class and
//!    plain-identifier variable declarator, in source order;
//! 3. evaluates each binding's value-only text against the Environment
//!    built so far and binds the result, unless the name is already there.
//!
//! Imports are merged before the document's own declarations, and the
//! Environment is first-wins, so an imported name shadows a local
//! declaration of the same name.
//!
//! Every failure is isolated. An import that does not resolve, cannot be
//! read, or does not parse is skipped; a declaration that throws leaves its
//! name unbound. Both are recorded in the [`ScopeReport`].

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::config::Settings;
use crate::context::EvalContext;
use crate::environment::{BindingKind, Environment, Origin};
use crate::error::{EvalFailure, ScopeError};
use crate::eval::{evaluate, evaluate_declaration, EvaluationOutcome};
use crate::source::SourceProvider;
use crate::syntax::ast::{ExportDecl, ExprKind, ImportSpecifier, Pattern, Program, Stmt, StmtKind};
use crate::syntax::{self, ParseOptions, Span};
use crate::value::Value;

/// A declared top-level name and the text that produces its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Declared name
    pub name: String,

    /// Declaration kind
    pub kind: BindingKind,

    /// Value-only declaration text, such as `let x = 1` or `function f() {}`
    pub text: String,

    /// Span of the declaration in its document
    pub span: Span,
}

/// Collect the top-level bindings of `program`, in source order.
///
/// Exported declarations count. Destructuring declarators and anonymous
/// default exports are skipped.
pub fn collect_bindings(program: &Program, text: &str) -> Vec<Binding> {
    let mut out = Vec::new();
    for stmt in &program.body {
        collect_stmt(program, text, unwrap_export(stmt), &mut out);
    }
    out
}

fn unwrap_export(stmt: &Stmt) -> &Stmt {
    match &stmt.kind {
        StmtKind::Export(ExportDecl::Declaration(inner))
        | StmtKind::Export(ExportDecl::DefaultDeclaration(inner)) => inner,
        _ => stmt,
    }
}

fn collect_stmt(program: &Program, text: &str, stmt: &Stmt, out: &mut Vec<Binding>) {
    match &stmt.kind {
        StmtKind::Function(function) => {
            if let Some(name) = &function.name {
                out.push(Binding {
                    name: name.clone(),
                    kind: BindingKind::Function,
                    text: program.value_source(text, stmt.span),
                    span: stmt.span,
                });
            }
        }
        StmtKind::Class(class) => {
            if let Some(name) = &class.name {
                out.push(Binding {
                    name: name.clone(),
                    kind: BindingKind::Class,
                    text: program.value_source(text, stmt.span),
                    span: stmt.span,
                });
            }
        }
        StmtKind::VarDecl(decl) => {
            for declarator in &decl.declarators {
                let Pattern::Ident(name) = &declarator.target else {
                    continue;
                };
                out.push(Binding {
                    name: name.clone(),
                    kind: BindingKind::Variable,
                    text: format!("let {}", program.value_source(text, declarator.span)),
                    span: declarator.span,
                });
            }
        }
        _ => {}
    }
}

/// What a module's `export default` provides.
#[derive(Debug, Clone)]
enum DefaultExport {
    /// A top-level name
    Name(String),
    /// An expression to evaluate
    Source(String),
}

fn default_export(program: &Program, text: &str) -> Option<DefaultExport> {
    program.body.iter().find_map(|stmt| match &stmt.kind {
        StmtKind::Export(ExportDecl::DefaultDeclaration(inner)) => {
            let name = match &inner.kind {
                StmtKind::Function(f) => f.name.clone(),
                StmtKind::Class(c) => c.name.clone(),
                _ => None,
            };
            Some(match name {
                Some(name) => DefaultExport::Name(name),
                None => DefaultExport::Source(program.value_source(text, inner.span)),
            })
        }
        StmtKind::Export(ExportDecl::DefaultExpr(expr)) => Some(match &expr.kind {
            ExprKind::Ident(name) => DefaultExport::Name(name.clone()),
            _ => DefaultExport::Source(program.value_source(text, expr.span)),
        }),
        _ => None,
    })
}

/// A module dependency: an `import`, or an `export ... from` re-export.
struct ImportRequest {
    source: String,
    specifiers: Vec<ImportSpecifier>,
}

fn import_requests(program: &Program) -> Vec<ImportRequest> {
    program
        .body
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::Import(decl) if !decl.type_only => Some(ImportRequest {
                source: decl.source.clone(),
                specifiers: decl.specifiers.clone(),
            }),
            StmtKind::Export(ExportDecl::Named {
                specifiers,
                source: Some(source),
            }) => Some(ImportRequest {
                source: source.clone(),
                specifiers: specifiers
                    .iter()
                    .map(|(local, exported)| ImportSpecifier::Named {
                        imported: local.clone(),
                        local: exported.clone(),
                    })
                    .collect(),
            }),
            StmtKind::Export(ExportDecl::All { source }) => Some(ImportRequest {
                source: source.clone(),
                specifiers: Vec::new(),
            }),
            _ => None,
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// BUILDER
// ═══════════════════════════════════════════════════════════════════════

/// What one build did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeReport {
    /// Names added to the Environment, in order
    pub bound: Vec<String>,

    /// Names skipped because the Environment already held them
    pub skipped: Vec<String>,

    /// Declarations that failed to evaluate
    pub binding_failures: Vec<ScopeError>,

    /// Imports that were skipped
    pub import_failures: Vec<ScopeError>,
}

/// Builds one document, and everything it imports, into an Environment.
pub struct ScopeBuilder<P> {
    provider: P,
    ctx: EvalContext,
    follow_imports: bool,
    max_import_depth: usize,

    /// Files being built, outermost first
    stack: Vec<PathBuf>,

    /// Files already merged in this build, with their default export
    modules: IndexMap<PathBuf, Option<DefaultExport>>,

    report: ScopeReport,
}

impl<P: SourceProvider> ScopeBuilder<P> {
    /// A builder reading imports through `provider`.
    pub fn new(provider: P, settings: &Settings) -> Self {
        Self {
            provider,
            ctx: settings.eval_context(),
            follow_imports: settings.follow_imports,
            max_import_depth: settings.max_import_depth,
            stack: Vec::new(),
            modules: IndexMap::new(),
            report: ScopeReport::default(),
        }
    }

    /// Evaluate declarations under `ctx` instead of the settings' limits.
    pub fn with_context(mut self, ctx: EvalContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Build `program`, the parsed text of the document at `path`, into
    /// `env`. Names already in `env` are left alone.
    pub fn build(
        mut self,
        program: &Program,
        text: &str,
        path: &Path,
        env: &mut Environment,
    ) -> ScopeReport {
        self.stack.push(path.to_path_buf());
        self.build_module(program, text, path, &Origin::Local, env);
        self.report
    }

    fn build_module(
        &mut self,
        program: &Program,
        text: &str,
        path: &Path,
        origin: &Origin,
        env: &mut Environment,
    ) {
        if self.follow_imports {
            for request in import_requests(program) {
                self.merge_import(&request, path, env);
            }
        }
        for binding in collect_bindings(program, text) {
            self.bind(binding, origin, env);
        }
    }

    fn merge_import(&mut self, request: &ImportRequest, from: &Path, env: &mut Environment) {
        let Some(resolved) = self.provider.resolve(&request.source, from) else {
            self.import_failed(ScopeError::Unresolved {
                specifier: request.source.clone(),
                from: from.to_path_buf(),
            });
            return;
        };
        debug!(specifier = %request.source, path = %resolved.display(), "resolved import");
        let Some(default) = self.load(&resolved, env) else {
            return;
        };

        let origin = Origin::Import(resolved.clone());
        for specifier in &request.specifiers {
            match specifier {
                ImportSpecifier::Named { imported, local } if imported != local => {
                    if let Some(entry) = env.entry(imported).cloned() {
                        self.alias(local, entry.value, entry.kind, &origin, env);
                    }
                }
                ImportSpecifier::Named { .. } => {}
                ImportSpecifier::Default(local) => match &default {
                    Some(DefaultExport::Name(name)) => {
                        if let Some(entry) = env.entry(name).cloned() {
                            self.alias(local, entry.value, entry.kind, &origin, env);
                        }
                    }
                    Some(DefaultExport::Source(source)) => {
                        if env.contains(local) {
                            continue;
                        }
                        match evaluate(source, env, &self.ctx) {
                            EvaluationOutcome::Value(value) => {
                                self.alias(local, value, BindingKind::Variable, &origin, env)
                            }
                            EvaluationOutcome::Failure(failure) => {
                                self.binding_failed(local.clone(), failure)
                            }
                        }
                    }
                    None => {}
                },
                ImportSpecifier::Namespace(local) => {
                    let members: IndexMap<String, Value> = env
                        .iter()
                        .filter(|(_, entry)| entry.origin == origin)
                        .map(|(name, entry)| (name.to_string(), entry.value.clone()))
                        .collect();
                    self.alias(local, Value::object(members), BindingKind::Variable, &origin, env);
                }
            }
        }
    }

    /// Build the file at `path` unless it was already merged. `None` when
    /// it was skipped.
    fn load(&mut self, path: &Path, env: &mut Environment) -> Option<Option<DefaultExport>> {
        if let Some(default) = self.modules.get(path) {
            return Some(default.clone());
        }
        if self.stack.iter().any(|p| p == path) {
            self.import_failed(ScopeError::Cycle {
                path: path.to_path_buf(),
            });
            return None;
        }
        // `stack` holds the document and every importer above `path`
        if self.stack.len() > self.max_import_depth {
            self.import_failed(ScopeError::TooDeep {
                path: path.to_path_buf(),
                max: self.max_import_depth,
            });
            return None;
        }

        let text = match self.provider.read_text(path) {
            Ok(text) => text,
            Err(err) => {
                self.import_failed(ScopeError::Read {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
                return None;
            }
        };
        let program = match syntax::parse(&text, ParseOptions::for_path(path)) {
            Ok(program) => program,
            Err(error) => {
                self.import_failed(ScopeError::Syntax {
                    path: path.to_path_buf(),
                    error,
                });
                return None;
            }
        };

        self.stack.push(path.to_path_buf());
        self.build_module(&program, &text, path, &Origin::Import(path.to_path_buf()), env);
        self.stack.pop();

        let default = default_export(&program, &text);
        self.modules.insert(path.to_path_buf(), default.clone());
        Some(default)
    }

    fn bind(&mut self, binding: Binding, origin: &Origin, env: &mut Environment) {
        if env.contains(&binding.name) {
            debug!(name = %binding.name, "already bound, skipped");
            self.report.skipped.push(binding.name);
            return;
        }
        match evaluate_declaration(&binding.text, &binding.name, env, &self.ctx) {
            Ok(value) => {
                debug!(name = %binding.name, kind = ?binding.kind, "bound");
                env.bind(binding.name.clone(), value, binding.kind, origin.clone());
                self.report.bound.push(binding.name);
            }
            Err(err) => self.binding_failed(binding.name, EvalFailure::from(&err)),
        }
    }

    fn alias(
        &mut self,
        name: &str,
        value: Value,
        kind: BindingKind,
        origin: &Origin,
        env: &mut Environment,
    ) {
        if env.bind(name, value, kind, origin.clone()) {
            debug!(%name, "bound import alias");
            self.report.bound.push(name.to_string());
        } else {
            self.report.skipped.push(name.to_string());
        }
    }

    fn binding_failed(&mut self, name: String, failure: EvalFailure) {
        debug!(%name, %failure, "binding failed");
        self.report
            .binding_failures
            .push(ScopeError::Binding { name, failure });
    }

    fn import_failed(&mut self, err: ScopeError) {
        debug!(%err, "import skipped");
        self.report.import_failures.push(err);
    }
}

/// Build `program` into `env` with a fresh [`ScopeBuilder`].
pub fn build_environment<P: SourceProvider>(
    program: &Program,
    text: &str,
    path: &Path,
    provider: P,
    settings: &Settings,
    env: &mut Environment,
) -> ScopeReport {
    ScopeBuilder::new(provider, settings).build(program, text, path, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::source::MemorySourceProvider;
    use crate::syntax::parse;
    use pretty_assertions::assert_eq;

    const MAIN: &str = "/src/main.ts";

    fn build(text: &str, provider: &MemorySourceProvider) -> (Environment, ScopeReport) {
        let program = parse(text, ParseOptions::default()).unwrap();
        let mut env = Environment::new();
        let report = build_environment(
            &program,
            text,
            Path::new(MAIN),
            provider,
            &Settings::default(),
            &mut env,
        );
        (env, report)
    }

    fn show(env: &Environment, snippet: &str) -> String {
        match evaluate(snippet, env, &EvalContext::new()) {
            EvaluationOutcome::Value(v) => v.to_display_string(),
            EvaluationOutcome::Failure(f) => format!("!{}", f.message),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Bindings
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_collect_bindings_strips_types() {
        let text = "export function add(a: number, b: number): number { return a + b; }\n\
                    const xs: string[] = [];\n\
                    let { a } = obj;\n\
                    class P {}";
        let program = parse(text, ParseOptions::default()).unwrap();
        let bindings = collect_bindings(&program, text);
        let summary: Vec<_> = bindings
            .iter()
            .map(|b| (b.name.as_str(), b.kind, b.text.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    "add",
                    BindingKind::Function,
                    "function add(a, b) { return a + b; }"
                ),
                ("xs", BindingKind::Variable, "let xs = []"),
                ("P", BindingKind::Class, "class P {}"),
            ]
        );
    }

    #[test]
    fn test_only_top_level_declarations_bind() {
        let (env, _) = build(
            "function f() { const inner = 1; return inner; }\nconst outer = f();",
            &MemorySourceProvider::new(),
        );
        assert_eq!(env.names().collect::<Vec<_>>(), vec!["f", "outer"]);
        assert_eq!(show(&env, "outer"), "1");
    }

    #[test]
    fn test_declarations_see_earlier_ones_only() {
        let (env, report) = build(
            "const a = 2;\nconst b = a * 3;\nconst c = d + 1;\nconst d = 4;",
            &MemorySourceProvider::new(),
        );
        assert_eq!(show(&env, "b"), "6");
        assert!(!env.contains("c"));
        assert_eq!(report.binding_failures.len(), 1);
        assert!(matches!(
            &report.binding_failures[0],
            ScopeError::Binding { name, failure } if name == "c" && failure.kind == FailureKind::Reference
        ));
    }

    #[test]
    fn test_first_declaration_wins() {
        let (env, report) = build("var x = 1;\nvar x = 2;", &MemorySourceProvider::new());
        assert_eq!(show(&env, "x"), "1");
        assert_eq!(report.skipped, vec!["x".to_string()]);
    }

    #[test]
    fn test_throwing_declaration_is_isolated() {
        let (env, report) = build(
            "const bad = (() => { throw new Error('no') })();\nconst good = 1;",
            &MemorySourceProvider::new(),
        );
        assert!(!env.contains("bad"));
        assert!(env.contains("good"));
        assert_eq!(report.binding_failures.len(), 1);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Imports
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_imports_merge_before_locals() {
        let provider = MemorySourceProvider::new()
            .with("/src/util.ts", "export function f() { return 'imported'; }");
        let (env, _) = build(
            "import { f } from './util';\nfunction f() { return 'local'; }",
            &provider,
        );
        assert_eq!(show(&env, "f()"), "imported");
        assert_eq!(
            env.entry("f").map(|e| e.origin.clone()),
            Some(Origin::Import(PathBuf::from("/src/util.ts")))
        );
    }

    #[test]
    fn test_import_aliases_and_defaults() {
        let provider = MemorySourceProvider::new()
            .with("/src/m.js", "export const a = 1;\nexport default function main() { return a + 1; }")
            .with("/src/n.ts", "export default { k: 'v' };");
        let (env, report) = build(
            "import main, { a as b } from './m';\nimport cfg from './n';\nimport * as ns from './m';",
            &provider,
        );
        assert!(report.import_failures.is_empty());
        assert_eq!(show(&env, "b"), "1");
        assert_eq!(show(&env, "main()"), "2");
        assert_eq!(show(&env, "cfg.k"), "v");
        assert_eq!(show(&env, "ns.a"), "1");
    }

    #[test]
    fn test_transitive_imports_and_reexports() {
        let provider = MemorySourceProvider::new()
            .with("/src/a.ts", "export * from './b';\nexport const fromA = deep * 2;")
            .with("/src/b.ts", "export { deep } from './c';")
            .with("/src/c.ts", "export const deep = 21;");
        let (env, _) = build("import { fromA } from './a';", &provider);
        assert_eq!(show(&env, "fromA"), "42");
    }

    #[test]
    fn test_broken_imports_are_skipped() {
        let provider = MemorySourceProvider::new().with("/src/broken.ts", "export const = ;");
        let (env, report) = build(
            "import { x } from './missing';\nimport { y } from './broken';\nimport _ from 'lodash';\nconst ok = 1;",
            &provider,
        );
        assert!(env.contains("ok"));
        assert_eq!(report.import_failures.len(), 3);
        assert!(matches!(report.import_failures[0], ScopeError::Unresolved { .. }));
        assert!(matches!(report.import_failures[1], ScopeError::Syntax { .. }));
    }

    #[test]
    fn test_import_cycles_terminate() {
        let provider = MemorySourceProvider::new()
            .with("/src/a.ts", "import { b } from './b';\nexport const a = 1;")
            .with("/src/b.ts", "import { a } from './a';\nexport const b = 2;");
        let (env, report) = build("import { a } from './a';", &provider);
        assert!(env.contains("a"));
        assert!(env.contains("b"));
        assert!(matches!(report.import_failures[..], [ScopeError::Cycle { .. }]));
    }

    #[test]
    fn test_import_depth_limit() {
        let provider = MemorySourceProvider::new()
            .with("/src/a.ts", "import './b';\nexport const a = 1;")
            .with("/src/b.ts", "export const b = 2;");
        let text = "import './a';";
        let program = parse(text, ParseOptions::default()).unwrap();
        let settings = Settings {
            max_import_depth: 1,
            ..Settings::default()
        };
        let mut env = Environment::new();
        let report =
            ScopeBuilder::new(&provider, &settings).build(&program, text, Path::new(MAIN), &mut env);
        assert!(env.contains("a"));
        assert!(!env.contains("b"));
        assert!(matches!(report.import_failures[..], [ScopeError::TooDeep { max: 1, .. }]));
    }

    #[test]
    fn test_import_depth_counts_levels_below_the_document() {
        let provider = MemorySourceProvider::new()
            .with("/src/a.ts", "import './b';\nexport const a = 1;")
            .with("/src/b.ts", "export const b = 2;");
        let text = "import './a';";
        let program = parse(text, ParseOptions::default()).unwrap();
        let build = |max_import_depth| {
            let settings = Settings {
                max_import_depth,
                ..Settings::default()
            };
            let mut env = Environment::new();
            let report = ScopeBuilder::new(&provider, &settings).build(
                &program,
                text,
                Path::new(MAIN),
                &mut env,
            );
            (env.contains("a"), env.contains("b"), report.import_failures.len())
        };
        assert_eq!(build(0), (false, false, 1));
        assert_eq!(build(2), (true, true, 0));
    }

    #[test]
    fn test_follow_imports_off() {
        let provider = MemorySourceProvider::new().with("/src/util.ts", "export const u = 1;");
        let text = "import { u } from './util';";
        let program = parse(text, ParseOptions::default()).unwrap();
        let settings = Settings {
            follow_imports: false,
            ..Settings::default()
        };
        let mut env = Environment::new();
        let report =
            ScopeBuilder::new(&provider, &settings).build(&program, text, Path::new(MAIN), &mut env);
        assert!(env.is_empty());
        assert_eq!(report, ScopeReport::default());
    }
}
