//! JavaScript/TypeScript front end
//!
//! [`parse`] turns a document into a [`Program`]. TypeScript annotations are
//! accepted and discarded; their spans are kept on the program so the
//! value-only text of any node can be recovered with
//! [`Program::value_source`].

pub mod ast;
mod depth;
mod lexer;
mod parser;
mod span;
mod token;
pub mod visit;

use std::path::Path;

pub use ast::{Program, SourceType};
pub use depth::MAX_NESTING_DEPTH;
pub use lexer::{tokenize, unescape, LexError};
pub use span::{LineIndex, Position, Span};
pub use token::{Token, TokenKind};

use crate::error::SyntaxError;
use parser::Parser;

/// Dialect and goal to parse with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Script or module goal
    pub source_type: SourceType,

    /// Accept TypeScript annotations
    pub typescript: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            source_type: SourceType::Module,
            typescript: true,
        }
    }
}

impl ParseOptions {
    /// Plain JavaScript module.
    pub fn javascript() -> Self {
        Self {
            source_type: SourceType::Module,
            typescript: false,
        }
    }

    /// Pick options from a file extension. Unknown extensions parse as
    /// TypeScript modules, which accept the widest syntax.
    pub fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("js") | Some("mjs") | Some("jsx") => Self::javascript(),
            Some("cjs") => Self {
                source_type: SourceType::Script,
                typescript: false,
            },
            _ => Self::default(),
        }
    }
}

/// Parse a whole document. Trees nested deeper than
/// [`MAX_NESTING_DEPTH`] are rejected.
pub fn parse(source: &str, options: ParseOptions) -> Result<Program, SyntaxError> {
    let program = Parser::new(source, 0, source.len(), options)?.parse_program()?;
    depth::check_program(source, program)
}

/// Parse a single expression, such as a REPL line.
pub fn parse_expression(source: &str, options: ParseOptions) -> Result<ast::Expr, SyntaxError> {
    let expr = Parser::new(source, 0, source.len(), options)?.parse_standalone_expression()?;
    depth::check_expr(source, expr)
}

#[cfg(test)]
mod tests {
    use super::ast::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn ts(src: &str) -> Program {
        parse(src, ParseOptions::default()).unwrap()
    }

    fn js(src: &str) -> Program {
        parse(src, ParseOptions::javascript()).unwrap()
    }

    fn first_expr(program: &Program) -> &Expr {
        match &program.body[0].kind {
            StmtKind::Expression(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_parse_declarations() {
        let program = js("let a = 1, b;\nconst c = a + 2;\nfunction f(x) { return x; }\nclass A {}");
        assert_eq!(program.body.len(), 4);
        match &program.body[0].kind {
            StmtKind::VarDecl(decl) => {
                assert_eq!(decl.kind, DeclKind::Let);
                assert_eq!(decl.declarators.len(), 2);
                assert!(decl.declarators[1].init.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&program.body[2].kind, StmtKind::Function(f) if f.name.as_deref() == Some("f")));
        assert!(matches!(&program.body[3].kind, StmtKind::Class(c) if c.name.as_deref() == Some("A")));
    }

    #[test]
    fn test_automatic_semicolons() {
        let program = js("let a = 1\nlet b = 2\na + b\n");
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn test_declarator_span_covers_target_and_initializer() {
        let src = "const total = price * qty;";
        let program = js(src);
        let StmtKind::VarDecl(decl) = &program.body[0].kind else {
            panic!("expected declaration");
        };
        assert_eq!(decl.declarators[0].span.slice(src), "total = price * qty");
    }

    #[test]
    fn test_for_loops() {
        let program = js("for (let i = 0; i < 3; i++) {}\nfor (const k in o) {}\nfor (const x of xs) {}");
        assert!(matches!(program.body[0].kind, StmtKind::For { .. }));
        assert!(matches!(
            program.body[1].kind,
            StmtKind::ForInOf { kind: ForInOfKind::In, .. }
        ));
        assert!(matches!(
            program.body[2].kind,
            StmtKind::ForInOf { kind: ForInOfKind::Of, .. }
        ));
    }

    #[test]
    fn test_imports_and_exports() {
        let program = ts(
            "import def, { a as b, type T } from './m';\nimport * as ns from './n';\nexport const x = 1;\nexport { x as y };\nexport default 42;",
        );
        let StmtKind::Import(import) = &program.body[0].kind else {
            panic!("expected import");
        };
        assert_eq!(import.source, "./m");
        assert_eq!(
            import.specifiers,
            vec![
                ImportSpecifier::Default("def".into()),
                ImportSpecifier::Named {
                    imported: "a".into(),
                    local: "b".into()
                },
            ]
        );
        assert!(matches!(
            &program.body[1].kind,
            StmtKind::Import(ImportDecl { specifiers, .. }) if specifiers == &vec![ImportSpecifier::Namespace("ns".into())]
        ));
        assert!(matches!(
            program.body[2].kind,
            StmtKind::Export(ExportDecl::Declaration(_))
        ));
        assert!(matches!(
            program.body[4].kind,
            StmtKind::Export(ExportDecl::DefaultExpr(_))
        ));
    }

    #[test]
    fn test_import_rejected_in_script() {
        let options = ParseOptions {
            source_type: SourceType::Script,
            typescript: false,
        };
        let err = parse("import x from './x';", options).unwrap_err();
        assert!(err.message.contains("outside a module"));
    }

    #[test]
    fn test_illegal_jumps() {
        assert!(parse("return 1;", ParseOptions::default()).is_err());
        assert!(parse("break;", ParseOptions::default()).is_err());
        assert!(parse("while (true) { break; }", ParseOptions::default()).is_ok());
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_precedence() {
        let program = js("1 + 2 * 3;");
        match &first_expr(&program).kind {
            ExprKind::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. })),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let program = js("2 ** 3 ** 2;");
        match &first_expr(&program).kind {
            ExprKind::Binary {
                op: BinaryOp::Exp,
                left,
                right,
            } => {
                assert!(matches!(left.kind, ExprKind::Number(n) if n == 2.0));
                assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Exp, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arrow_functions() {
        let program = js("const f = (a, b = 2) => a + b;\nconst g = x => { return x; };\nconst h = async () => 1;");
        for stmt in &program.body {
            let StmtKind::VarDecl(decl) = &stmt.kind else {
                panic!("expected declaration");
            };
            let init = decl.declarators[0].init.as_ref().unwrap();
            assert!(matches!(&init.kind, ExprKind::Function(f) if f.is_arrow));
        }
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        let program = js("(a, b);");
        assert!(matches!(first_expr(&program).kind, ExprKind::Sequence(_)));
    }

    #[test]
    fn test_nested_groups_find_their_arrow() {
        let program = js("((a)) + ((b) => b)(1);");
        assert!(matches!(first_expr(&program).kind, ExprKind::Binary { .. }));

        let program = js("const f = (a = (b) => b, [c, d] = [1, (2)]) => a;");
        let StmtKind::VarDecl(decl) = &program.body[0].kind else {
            panic!("expected declaration");
        };
        let init = decl.declarators[0].init.as_ref().unwrap();
        assert!(matches!(&init.kind, ExprKind::Function(f) if f.is_arrow && f.params.len() == 2));

        let program = ts("c ? (x) : (y);");
        assert!(matches!(first_expr(&program).kind, ExprKind::Conditional { .. }));
    }

    #[test]
    fn test_optional_chain_wraps_whole_chain() {
        let program = js("a?.b.c();");
        let ExprKind::OptionalChain(inner) = &first_expr(&program).kind else {
            panic!("expected optional chain");
        };
        assert!(matches!(inner.kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_template_literal_parts() {
        let program = js("`a${1 + 2}b${`c${d}`}`;");
        let ExprKind::Template(parts) = &first_expr(&program).kind else {
            panic!("expected template");
        };
        assert_eq!(parts.len(), 4);
        assert!(matches!(&parts[0], TemplatePart::Str(s) if s == "a"));
        assert!(matches!(&parts[3], TemplatePart::Expr(e) if matches!(e.kind, ExprKind::Template(_))));
    }

    #[test]
    fn test_destructuring_assignment() {
        let program = js("[a, b] = [b, a];");
        let ExprKind::Assign { target, .. } = &first_expr(&program).kind else {
            panic!("expected assignment");
        };
        assert!(matches!(**target, Pattern::Array { .. }));
    }

    #[test]
    fn test_console_log_detection() {
        let program = js("console.log(1);");
        let ExprKind::Call { callee, .. } = &first_expr(&program).kind else {
            panic!("expected call");
        };
        assert!(callee.is_console_log());
    }

    // ═══════════════════════════════════════════════════════════════════
    // TypeScript
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_type_annotations_are_stripped_from_value_source() {
        let src = "const total: number = add<number>(price as number, qty!);";
        let program = ts(src);
        let StmtKind::VarDecl(decl) = &program.body[0].kind else {
            panic!("expected declaration");
        };
        assert_eq!(
            program.value_source(src, decl.declarators[0].span),
            "total = add(price , qty)"
        );
    }

    #[test]
    fn test_type_only_statements() {
        let program = ts(
            "type A = { x: number } | null;\ninterface B extends A { y: string }\ndeclare const z: number;\nenum E { One, Two }\nlet a = 1;",
        );
        assert_eq!(program.body.len(), 5);
        for stmt in &program.body[..4] {
            assert!(matches!(stmt.kind, StmtKind::TypeOnly), "{:?}", stmt.kind);
        }
        assert!(matches!(program.body[4].kind, StmtKind::VarDecl(_)));
    }

    #[test]
    fn test_typed_functions_and_overloads() {
        let program = ts(
            "function f(a: string): string;\nfunction f(a: any, b?: number): any { return a; }\nconst g = <T,>(x: T): T => x;",
        );
        assert!(matches!(program.body[0].kind, StmtKind::TypeOnly));
        let StmtKind::Function(f) = &program.body[1].kind else {
            panic!("expected function");
        };
        assert_eq!(f.params.len(), 2);
        let StmtKind::VarDecl(decl) = &program.body[2].kind else {
            panic!("expected declaration");
        };
        assert!(matches!(&decl.declarators[0].init.as_ref().unwrap().kind, ExprKind::Function(f) if f.is_arrow));
    }

    #[test]
    fn test_class_with_modifiers() {
        let program = ts(
            "class P implements Q {\n  private readonly x: number = 1;\n  static count = 0;\n  constructor(public name: string) {}\n  greet(): string { return this.name; }\n}",
        );
        let StmtKind::Class(class) = &program.body[0].kind else {
            panic!("expected class");
        };
        assert_eq!(class.members.len(), 4);
        let ctor = class.constructor().unwrap();
        assert!(ctor.params[0].property);
    }

    #[test]
    fn test_comparison_is_not_type_arguments() {
        let program = ts("a < b && c > (d);");
        assert!(matches!(
            first_expr(&program).kind,
            ExprKind::Logical { op: LogicalOp::And, .. }
        ));
    }

    // ═══════════════════════════════════════════════════════════════════
    // Errors
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_syntax_error_position() {
        let err = parse("let a = 1;\nlet b = ;", ParseOptions::default()).unwrap_err();
        assert_eq!((err.line, err.column), (2, 9));
    }

    #[test]
    fn test_unsupported_constructs_are_syntax_errors() {
        for src in ["/ab+c/.test(s)", "function* g() {}", "outer: for (;;) {}", "<div />"] {
            assert!(parse(src, ParseOptions::default()).is_err(), "{}", src);
        }
    }

    #[test]
    fn test_for_path() {
        assert!(!ParseOptions::for_path(Path::new("a.js")).typescript);
        assert!(ParseOptions::for_path(Path::new("a.ts")).typescript);
        assert_eq!(
            ParseOptions::for_path(Path::new("a.cjs")).source_type,
            SourceType::Script
        );
    }
}
