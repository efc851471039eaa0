//! Read-only AST traversal
//!
//! Each `visit_*` method defaults to the matching `walk_*` function, which
//! visits children in source order. Override a method to observe a node and
//! call the walker to keep descending.

use super::ast::*;

/// A pre-order AST visitor.
pub trait Visitor<'ast> {
    /// Visit a statement.
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    /// Visit an expression.
    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    /// Visit one declarator of a `var`/`let`/`const`.
    fn visit_var_declarator(&mut self, declarator: &'ast VarDeclarator) {
        walk_var_declarator(self, declarator);
    }

    /// Visit a function of any form.
    fn visit_function(&mut self, function: &'ast Function) {
        walk_function(self, function);
    }

    /// Visit a class declaration or expression.
    fn visit_class(&mut self, class: &'ast Class) {
        walk_class(self, class);
    }

    /// Visit a binding or assignment pattern.
    fn visit_pattern(&mut self, pattern: &'ast Pattern) {
        walk_pattern(self, pattern);
    }
}

/// Visit every top-level statement of `program`.
pub fn walk_program<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, program: &'ast Program) {
    for stmt in &program.body {
        visitor.visit_stmt(stmt);
    }
}

fn walk_block<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, body: &'ast [Stmt]) {
    for stmt in body {
        visitor.visit_stmt(stmt);
    }
}

fn walk_var_decl<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, decl: &'ast VarDecl) {
    for declarator in &decl.declarators {
        visitor.visit_var_declarator(declarator);
    }
}

/// Children of a statement.
pub fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, stmt: &'ast Stmt) {
    match &stmt.kind {
        StmtKind::Empty | StmtKind::Break | StmtKind::Continue | StmtKind::TypeOnly => {}
        StmtKind::Import(_) => {}
        StmtKind::Expression(expr) | StmtKind::Throw(expr) => visitor.visit_expr(expr),
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Block(body) => walk_block(visitor, body),
        StmtKind::VarDecl(decl) => walk_var_decl(visitor, decl),
        StmtKind::Function(function) => visitor.visit_function(function),
        StmtKind::Class(class) => visitor.visit_class(class),
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => {
            visitor.visit_expr(test);
            visitor.visit_stmt(consequent);
            if let Some(alternate) = alternate {
                visitor.visit_stmt(alternate);
            }
        }
        StmtKind::For {
            init,
            test,
            update,
            body,
        } => {
            match init {
                Some(ForInit::VarDecl(decl)) => walk_var_decl(visitor, decl),
                Some(ForInit::Expr(expr)) => visitor.visit_expr(expr),
                None => {}
            }
            if let Some(test) = test {
                visitor.visit_expr(test);
            }
            if let Some(update) = update {
                visitor.visit_expr(update);
            }
            visitor.visit_stmt(body);
        }
        StmtKind::ForInOf {
            left, right, body, ..
        } => {
            match left {
                ForHead::Decl(_, pattern) | ForHead::Target(pattern) => {
                    visitor.visit_pattern(pattern)
                }
            }
            visitor.visit_expr(right);
            visitor.visit_stmt(body);
        }
        StmtKind::While { test, body } => {
            visitor.visit_expr(test);
            visitor.visit_stmt(body);
        }
        StmtKind::DoWhile { body, test } => {
            visitor.visit_stmt(body);
            visitor.visit_expr(test);
        }
        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            visitor.visit_expr(discriminant);
            for case in cases {
                if let Some(test) = &case.test {
                    visitor.visit_expr(test);
                }
                walk_block(visitor, &case.body);
            }
        }
        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            walk_block(visitor, block);
            if let Some(handler) = handler {
                if let Some(param) = &handler.param {
                    visitor.visit_pattern(param);
                }
                walk_block(visitor, &handler.body);
            }
            if let Some(finalizer) = finalizer {
                walk_block(visitor, finalizer);
            }
        }
        StmtKind::Export(export) => match export {
            ExportDecl::Declaration(decl) | ExportDecl::DefaultDeclaration(decl) => {
                visitor.visit_stmt(decl)
            }
            ExportDecl::DefaultExpr(expr) => visitor.visit_expr(expr),
            ExportDecl::Named { .. } | ExportDecl::All { .. } => {}
        },
    }
}

/// Target, then initializer.
pub fn walk_var_declarator<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    declarator: &'ast VarDeclarator,
) {
    visitor.visit_pattern(&declarator.target);
    if let Some(init) = &declarator.init {
        visitor.visit_expr(init);
    }
}

/// Parameters, then body.
pub fn walk_function<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, function: &'ast Function) {
    for param in &function.params {
        visitor.visit_pattern(&param.pattern);
        if let Some(default) = &param.default {
            visitor.visit_expr(default);
        }
    }
    match &function.body {
        FunctionBody::Block(body) => walk_block(visitor, body),
        FunctionBody::Expr(expr) => visitor.visit_expr(expr),
    }
}

fn walk_prop_key<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, key: &'ast PropKey) {
    if let PropKey::Computed(expr) = key {
        visitor.visit_expr(expr);
    }
}

/// Heritage clause, then members in order.
pub fn walk_class<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, class: &'ast Class) {
    if let Some(super_class) = &class.super_class {
        visitor.visit_expr(super_class);
    }
    for member in &class.members {
        match member {
            ClassMember::Constructor(function) => visitor.visit_function(function),
            ClassMember::Method { key, function, .. } => {
                walk_prop_key(visitor, key);
                visitor.visit_function(function);
            }
            ClassMember::Field { key, value, .. } => {
                walk_prop_key(visitor, key);
                if let Some(value) = value {
                    visitor.visit_expr(value);
                }
            }
        }
    }
}

/// Defaults, computed keys, and member targets inside a pattern.
pub fn walk_pattern<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, pattern: &'ast Pattern) {
    match pattern {
        Pattern::Ident(_) => {}
        Pattern::Member(expr) => visitor.visit_expr(expr),
        Pattern::Object { props, rest } => {
            for prop in props {
                walk_prop_key(visitor, &prop.key);
                visitor.visit_pattern(&prop.value);
                if let Some(default) = &prop.default {
                    visitor.visit_expr(default);
                }
            }
            if let Some(rest) = rest {
                visitor.visit_pattern(rest);
            }
        }
        Pattern::Array { elements, rest } => {
            for element in elements.iter().flatten() {
                visitor.visit_pattern(&element.pattern);
                if let Some(default) = &element.default {
                    visitor.visit_expr(default);
                }
            }
            if let Some(rest) = rest {
                visitor.visit_pattern(rest);
            }
        }
    }
}

/// Children of an expression.
pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::Number(_)
        | ExprKind::String(_)
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::Ident(_)
        | ExprKind::This
        | ExprKind::Super => {}
        ExprKind::Template(parts) => {
            for part in parts {
                if let TemplatePart::Expr(expr) = part {
                    visitor.visit_expr(expr);
                }
            }
        }
        ExprKind::Array(elements) => {
            for element in elements.iter().flatten() {
                visitor.visit_expr(&element.expr);
            }
        }
        ExprKind::Object(props) => {
            for prop in props {
                match prop {
                    Property::KeyValue(key, value) => {
                        walk_prop_key(visitor, key);
                        visitor.visit_expr(value);
                    }
                    Property::Shorthand(_) => {}
                    Property::Method(key, function) => {
                        walk_prop_key(visitor, key);
                        visitor.visit_function(function);
                    }
                    Property::Spread(expr) => visitor.visit_expr(expr),
                }
            }
        }
        ExprKind::Function(function) => visitor.visit_function(function),
        ExprKind::Class(class) => visitor.visit_class(class),
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Update { target, .. } => visitor.visit_expr(target),
        ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Assign { target, value, .. } => {
            visitor.visit_pattern(target);
            visitor.visit_expr(value);
        }
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            visitor.visit_expr(test);
            visitor.visit_expr(consequent);
            visitor.visit_expr(alternate);
        }
        ExprKind::Sequence(exprs) => {
            for expr in exprs {
                visitor.visit_expr(expr);
            }
        }
        ExprKind::Member {
            object, property, ..
        } => {
            visitor.visit_expr(object);
            if let MemberProp::Computed(expr) = property {
                visitor.visit_expr(expr);
            }
        }
        ExprKind::Call { callee, args, .. } | ExprKind::New { callee, args } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(&arg.expr);
            }
        }
        ExprKind::OptionalChain(inner) | ExprKind::Await(inner) => visitor.visit_expr(inner),
    }
}
