//! AST for the JavaScript/TypeScript subset
//!
//! Every statement and expression carries a [`Span`]. Function and class
//! bodies sit behind `Arc` so runtime function values can share them with
//! the tree that produced them.

use std::sync::Arc;

use super::Span;
use crate::stack::ensure_sufficient_stack;

/// Script or module goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceType {
    /// Classic script: no `import`/`export`
    Script,
    /// ES module
    #[default]
    Module,
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct Program {
    /// Top-level statements in source order
    pub body: Vec<Stmt>,

    /// Goal the file was parsed with
    pub source_type: SourceType,

    /// Spans of every type-annotation construct, in source order
    pub type_spans: Vec<Span>,

    /// Whole-file span
    pub span: Span,
}

impl Program {
    /// Return `source[span]` with every type-annotation span inside it removed.
    pub fn value_source(&self, source: &str, span: Span) -> String {
        let mut out = String::new();
        let mut cursor = span.start;
        for ty in self.type_spans.iter().filter(|t| span.contains(**t)) {
            if ty.start < cursor {
                continue;
            }
            out.push_str(Span::new(cursor, ty.start).slice(source));
            cursor = ty.end;
        }
        out.push_str(Span::new(cursor, span.end).slice(source));
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════

/// A statement node.
#[derive(Debug, Clone)]
pub struct Stmt {
    /// Node payload
    pub kind: StmtKind,

    /// Source range
    pub span: Span,
}

/// Statement kinds.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `;`
    Empty,
    /// An expression evaluated for effect
    Expression(Expr),
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// `var`/`let`/`const`
    VarDecl(VarDecl),
    /// `function f() {}`
    Function(Arc<Function>),
    /// `class A {}`
    Class(Arc<Class>),
    /// `if (test) consequent else alternate`
    If {
        /// Condition
        test: Expr,
        /// Taken branch
        consequent: Box<Stmt>,
        /// `else` branch
        alternate: Option<Box<Stmt>>,
    },
    /// `for (init; test; update) body`
    For {
        /// Initializer
        init: Option<ForInit>,
        /// Loop condition
        test: Option<Expr>,
        /// Step expression
        update: Option<Expr>,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `for (left of right)` / `for (left in right)`
    ForInOf {
        /// `in` or `of`
        kind: ForInOfKind,
        /// Loop variable
        left: ForHead,
        /// Iterated value
        right: Expr,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `while (test) body`
    While {
        /// Condition
        test: Expr,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `do body while (test)`
    DoWhile {
        /// Loop body
        body: Box<Stmt>,
        /// Condition
        test: Expr,
    },
    /// `switch (discriminant) { cases }`
    Switch {
        /// Switched-on value
        discriminant: Expr,
        /// Case clauses in order
        cases: Vec<SwitchCase>,
    },
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `return [value]`
    Return(Option<Expr>),
    /// `throw value`
    Throw(Expr),
    /// `try {} catch {} finally {}`
    Try {
        /// Protected block
        block: Vec<Stmt>,
        /// `catch` clause
        handler: Option<CatchClause>,
        /// `finally` block
        finalizer: Option<Vec<Stmt>>,
    },
    /// `import ... from '...'`
    Import(ImportDecl),
    /// `export ...`
    Export(ExportDecl),
    /// TypeScript-only declaration with no runtime effect
    TypeOnly,
}

/// Declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// `var`
    Var,
    /// `let`
    Let,
    /// `const`
    Const,
}

/// `let a = 1, b = 2`
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Declaration keyword
    pub kind: DeclKind,

    /// One entry per declared target
    pub declarators: Vec<VarDeclarator>,
}

/// A single `target = init` inside a declaration.
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    /// Binding target
    pub target: Pattern,

    /// Initializer
    pub init: Option<Expr>,

    /// From the start of the target to the end of the initializer
    pub span: Span,
}

/// Initializer slot of a classic `for`.
#[derive(Debug, Clone)]
pub enum ForInit {
    /// `for (let i = 0; ...)`
    VarDecl(VarDecl),
    /// `for (i = 0; ...)`
    Expr(Expr),
}

/// `in` versus `of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForInOfKind {
    /// `for (k in obj)`
    In,
    /// `for (x of xs)`
    Of,
}

/// Left-hand side of `for…in`/`for…of`.
#[derive(Debug, Clone)]
pub enum ForHead {
    /// `for (const x of ...)`
    Decl(DeclKind, Pattern),
    /// `for (x of ...)`
    Target(Pattern),
}

/// `case test: body` or `default: body`
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// `None` for `default`
    pub test: Option<Expr>,

    /// Statements up to the next clause
    pub body: Vec<Stmt>,
}

/// `catch (param) { body }`
#[derive(Debug, Clone)]
pub struct CatchClause {
    /// Optional binding
    pub param: Option<Pattern>,

    /// Handler body
    pub body: Vec<Stmt>,
}

/// `import ... from 'source'`
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// Module specifier as written
    pub source: String,

    /// Imported names
    pub specifiers: Vec<ImportSpecifier>,

    /// `import type ...`
    pub type_only: bool,
}

/// One imported name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpecifier {
    /// `import local from ...`
    Default(String),
    /// `import { imported as local } from ...`
    Named {
        /// Name exported by the module
        imported: String,
        /// Local alias
        local: String,
    },
    /// `import * as local from ...`
    Namespace(String),
}

/// `export ...`
#[derive(Debug, Clone)]
pub enum ExportDecl {
    /// `export const x = 1`, `export function f() {}`
    Declaration(Box<Stmt>),
    /// `export default function () {}` / `export default class {}`
    DefaultDeclaration(Box<Stmt>),
    /// `export default expr`
    DefaultExpr(Expr),
    /// `export { a, b as c } [from '...']`
    Named {
        /// `(local, exported)` pairs
        specifiers: Vec<(String, String)>,
        /// Re-export source
        source: Option<String>,
    },
    /// `export * [as ns] from '...'`
    All {
        /// Re-export source
        source: String,
    },
}

// ═══════════════════════════════════════════════════════════════════════
// Functions and Classes
// ═══════════════════════════════════════════════════════════════════════

/// A function declaration, expression, arrow, or method.
#[derive(Debug, Clone)]
pub struct Function {
    /// Declared name
    pub name: Option<String>,

    /// Parameters in order
    pub params: Vec<Param>,

    /// Body
    pub body: FunctionBody,

    /// Arrow functions capture `this` lexically
    pub is_arrow: bool,

    /// `async` functions parse but cannot `await` at run time
    pub is_async: bool,

    /// Source range of the whole function
    pub span: Span,
}

impl Function {
    /// Number of parameters before the first default or rest parameter.
    pub fn arity(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| p.default.is_none() && !p.rest)
            .count()
    }
}

/// Function body: a block, or a single expression for concise arrows.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// `x => x + 1`
    Expr(Box<Expr>),
}

/// A function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    /// Binding target
    pub pattern: Pattern,

    /// Default value
    pub default: Option<Expr>,

    /// `...rest`
    pub rest: bool,

    /// TypeScript parameter property (`constructor(private x: number)`)
    pub property: bool,
}

/// A class declaration or expression.
#[derive(Debug, Clone)]
pub struct Class {
    /// Declared name
    pub name: Option<String>,

    /// `extends` clause
    pub super_class: Option<Expr>,

    /// Members in source order
    pub members: Vec<ClassMember>,

    /// Source range
    pub span: Span,
}

impl Class {
    /// The explicit constructor, if any.
    pub fn constructor(&self) -> Option<&Arc<Function>> {
        self.members.iter().find_map(|m| match m {
            ClassMember::Constructor(f) => Some(f),
            _ => None,
        })
    }
}

/// A class body element.
#[derive(Debug, Clone)]
pub enum ClassMember {
    /// `constructor(...) {}`
    Constructor(Arc<Function>),
    /// `[static] name(...) {}`
    Method {
        /// Method name
        key: PropKey,
        /// Method body
        function: Arc<Function>,
        /// Defined on the class rather than the prototype
        is_static: bool,
    },
    /// `[static] name = value;`
    Field {
        /// Field name
        key: PropKey,
        /// Initializer
        value: Option<Expr>,
        /// Defined on the class rather than each instance
        is_static: bool,
    },
}

// ═══════════════════════════════════════════════════════════════════════
// Patterns
// ═══════════════════════════════════════════════════════════════════════

/// Binding or assignment target.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// `x`
    Ident(String),
    /// `{ a, b: c = 1, ...rest }`
    Object {
        /// Property targets
        props: Vec<ObjectPatternProp>,
        /// Rest target
        rest: Option<Box<Pattern>>,
    },
    /// `[a, , b = 2, ...rest]`
    Array {
        /// Element targets, `None` for holes
        elements: Vec<Option<PatternElem>>,
        /// Rest target
        rest: Option<Box<Pattern>>,
    },
    /// `obj.x` / `arr[i]` (assignment patterns only)
    Member(Box<Expr>),
}

impl Pattern {
    /// The name of a plain identifier pattern.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Pattern::Ident(name) => Some(name),
            _ => None,
        }
    }
}

/// `key: value = default` inside an object pattern.
#[derive(Debug, Clone)]
pub struct ObjectPatternProp {
    /// Source property
    pub key: PropKey,
    /// Target
    pub value: Pattern,
    /// Default when the property is `undefined`
    pub default: Option<Expr>,
}

/// `target = default` inside an array pattern.
#[derive(Debug, Clone)]
pub struct PatternElem {
    /// Target
    pub pattern: Pattern,
    /// Default when the element is `undefined`
    pub default: Option<Expr>,
}

// ═══════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════

/// An expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    /// Node payload
    pub kind: ExprKind,

    /// Source range
    pub span: Span,
}

impl Expr {
    /// Create an expression node.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Take the payload, leaving `null` behind.
    pub fn into_kind(mut self) -> ExprKind {
        std::mem::replace(&mut self.kind, ExprKind::Null)
    }

    /// Whether this is `console.log`, the recognised debug-print callee.
    pub fn is_console_log(&self) -> bool {
        match &self.kind {
            ExprKind::Member {
                object,
                property: MemberProp::Ident(prop),
                optional: false,
            } => prop == "log" && matches!(&object.kind, ExprKind::Ident(name) if name == "console"),
            _ => false,
        }
    }
}

// Long `a.b.c...` chains drop on a grown stack
impl Drop for Expr {
    fn drop(&mut self) {
        let kind = std::mem::replace(&mut self.kind, ExprKind::Null);
        ensure_sufficient_stack(move || drop(kind));
    }
}

/// Expression kinds.
#[derive(Debug, Clone)]
pub enum ExprKind {
    // Literals
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Template literal
    Template(Vec<TemplatePart>),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,

    // Names
    /// Identifier reference
    Ident(String),
    /// `this`
    This,
    /// `super` (only as `super(...)` or `super.x`)
    Super,

    // Collections
    /// `[a, ...b]`, holes are `None`
    Array(Vec<Option<Argument>>),
    /// `{ a: 1, b, ...c }`
    Object(Vec<Property>),

    // Functions
    /// `function () {}` and arrows
    Function(Arc<Function>),
    /// `class {}`
    Class(Arc<Class>),

    // Operators
    /// Prefix operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// `++x`, `x--`
    Update {
        /// Operator
        op: UpdateOp,
        /// Prefix or postfix
        prefix: bool,
        /// Updated target
        target: Box<Expr>,
    },
    /// Arithmetic, comparison, bitwise, `in`, `instanceof`
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `&&`, `||`, `??`
    Logical {
        /// Operator
        op: LogicalOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `target op= value`
    Assign {
        /// Operator
        op: AssignOp,
        /// Assignment target
        target: Box<Pattern>,
        /// Assigned value
        value: Box<Expr>,
    },
    /// `test ? consequent : alternate`
    Conditional {
        /// Condition
        test: Box<Expr>,
        /// Value when truthy
        consequent: Box<Expr>,
        /// Value when falsy
        alternate: Box<Expr>,
    },
    /// `a, b, c`
    Sequence(Vec<Expr>),

    // Access and calls
    /// `object.prop`, `object[expr]`, `object?.prop`
    Member {
        /// Receiver
        object: Box<Expr>,
        /// Accessed property
        property: MemberProp,
        /// `?.`
        optional: bool,
    },
    /// `callee(args)`
    Call {
        /// Called expression
        callee: Box<Expr>,
        /// Arguments
        args: Vec<Argument>,
        /// `callee?.(args)`
        optional: bool,
    },
    /// `new callee(args)`
    New {
        /// Constructor expression
        callee: Box<Expr>,
        /// Arguments
        args: Vec<Argument>,
    },
    /// Boundary of a chain containing `?.`
    OptionalChain(Box<Expr>),
    /// `await expr`
    Await(Box<Expr>),
}

/// Piece of a template literal.
#[derive(Debug, Clone)]
pub enum TemplatePart {
    /// Cooked string chunk
    Str(String),
    /// `${expr}`
    Expr(Expr),
}

/// Call argument or array element.
#[derive(Debug, Clone)]
pub struct Argument {
    /// Value
    pub expr: Expr,

    /// `...expr`
    pub spread: bool,
}

/// Object literal entry.
#[derive(Debug, Clone)]
pub enum Property {
    /// `key: value`
    KeyValue(PropKey, Expr),
    /// `name`
    Shorthand(String),
    /// `name() {}`
    Method(PropKey, Arc<Function>),
    /// `...expr`
    Spread(Expr),
}

/// Property key.
#[derive(Debug, Clone)]
pub enum PropKey {
    /// Identifier, string, or number key (normalized to a string)
    Static(String),
    /// `[expr]`
    Computed(Box<Expr>),
}

/// Member property.
#[derive(Debug, Clone)]
pub enum MemberProp {
    /// `.name`
    Ident(String),
    /// `[expr]`
    Computed(Box<Expr>),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `~`
    BitNot,
    /// `typeof`
    Typeof,
    /// `void`
    Void,
    /// `delete`
    Delete,
}

/// `++` / `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

/// Binary operators.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Le,
    Gt,
    Ge,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    In,
    InstanceOf,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Nullish,
}

/// Assignment operators; compound ones carry their underlying operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`, `<<=`, ...
    Compound(BinaryOp),
    /// `&&=`, `||=`, `??=`
    Logical(LogicalOp),
}
