//! Statement and declaration parsing

use std::sync::Arc;

use super::{Context, PResult, Parser};
use crate::syntax::ast::*;
use crate::syntax::token::TokenKind;

/// Class member modifiers with no runtime meaning.
const TS_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "readonly", "abstract", "override", "declare", "accessor",
];

impl Parser<'_> {
    /// A statement, or an `import`/`export` declaration at module level.
    pub(super) fn parse_module_item(&mut self) -> PResult<Stmt> {
        if self.is_word("import")
            && !matches!(self.peek_nth(1), TokenKind::LParen | TokenKind::Dot)
        {
            return self.parse_import();
        }
        if self.is_word("export") {
            return self.parse_export();
        }
        self.parse_statement()
    }

    pub(super) fn parse_statement(&mut self) -> PResult<Stmt> {
        self.guarded(|p| p.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> PResult<Stmt> {
        let start = self.start_offset();
        let word = match self.peek() {
            TokenKind::LBrace => {
                let body = self.parse_block()?;
                return Ok(Stmt {
                    kind: StmtKind::Block(body),
                    span: self.span_from(start),
                });
            }
            TokenKind::Semi => {
                self.bump();
                return Ok(Stmt {
                    kind: StmtKind::Empty,
                    span: self.span_from(start),
                });
            }
            TokenKind::At => return Err(self.unsupported("decorators")),
            TokenKind::Ident(word) => word.clone(),
            _ => return self.parse_expression_statement(),
        };

        let kind = match word.as_str() {
            "const" if self.options.typescript && self.is_word_at(1, "enum") => self.parse_type_only()?,
            "var" | "const" => StmtKind::VarDecl(self.parse_var_decl_statement()?),
            "let" if self.let_starts_declaration() => {
                StmtKind::VarDecl(self.parse_var_decl_statement()?)
            }
            "function" => return self.parse_function_declaration(start, false),
            "async" if self.is_word_at(1, "function") && !self.newline_before_nth(1) => {
                self.bump();
                return self.parse_function_declaration(start, true);
            }
            "class" => StmtKind::Class(self.parse_class(true)?),
            "abstract" if self.options.typescript && self.is_word_at(1, "class") => {
                self.bump();
                self.record_type_span(start);
                StmtKind::Class(self.parse_class(true)?)
            }
            "if" => self.parse_if()?,
            "for" => self.parse_for()?,
            "while" => {
                self.bump();
                let test = self.parse_paren_expression()?;
                let body = self.parse_loop_body()?;
                StmtKind::While { test, body }
            }
            "do" => {
                self.bump();
                let body = self.parse_loop_body()?;
                self.expect_word("while")?;
                let test = self.parse_paren_expression()?;
                self.eat(&TokenKind::Semi);
                StmtKind::DoWhile { body, test }
            }
            "switch" => self.parse_switch()?,
            "break" => {
                self.bump();
                if !self.ctx.in_loop && !self.ctx.in_switch {
                    return Err(self.error_at(start, "Illegal break statement"));
                }
                self.reject_label()?;
                self.consume_semi()?;
                StmtKind::Break
            }
            "continue" => {
                self.bump();
                if !self.ctx.in_loop {
                    return Err(self.error_at(start, "Illegal continue statement"));
                }
                self.reject_label()?;
                self.consume_semi()?;
                StmtKind::Continue
            }
            "return" => {
                self.bump();
                if !self.ctx.in_function {
                    return Err(self.error_at(start, "Illegal return statement"));
                }
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_semi()?;
                StmtKind::Return(value)
            }
            "throw" => {
                self.bump();
                if self.current().newline_before {
                    return Err(self.error("Illegal newline after throw"));
                }
                let value = self.parse_expression()?;
                self.consume_semi()?;
                StmtKind::Throw(value)
            }
            "try" => self.parse_try()?,
            "debugger" => {
                self.bump();
                self.consume_semi()?;
                StmtKind::Empty
            }
            "with" => return Err(self.error("'with' statements are not supported")),
            "import" | "export"
                if !matches!(self.peek_nth(1), TokenKind::LParen | TokenKind::Dot) =>
            {
                return Err(self.error(format!(
                    "'{}' declarations may only appear at the top level of a module",
                    word
                )))
            }
            "type" | "interface"
                if self.options.typescript
                    && matches!(self.peek_nth(1), TokenKind::Ident(_))
                    && !self.newline_before_nth(1) =>
            {
                self.parse_type_only()?
            }
            "declare" | "enum" | "namespace" | "module"
                if self.options.typescript
                    && matches!(self.peek_nth(1), TokenKind::Ident(_) | TokenKind::String(_))
                    && !self.newline_before_nth(1) =>
            {
                self.parse_type_only()?
            }
            _ if matches!(self.peek_nth(1), TokenKind::Colon) && !super::is_reserved(&word) => {
                return Err(self.unsupported("labeled statements"));
            }
            _ => return self.parse_expression_statement(),
        };

        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_expression_statement(&mut self) -> PResult<Stmt> {
        let start = self.start_offset();
        let expr = self.parse_expression()?;
        self.consume_semi()?;
        Ok(Stmt {
            kind: StmtKind::Expression(expr),
            span: self.span_from(start),
        })
    }

    /// `let` is a declaration keyword only when a binding follows it.
    fn let_starts_declaration(&self) -> bool {
        match self.peek_nth(1) {
            TokenKind::LBrace | TokenKind::LBracket => true,
            TokenKind::Ident(w) => !super::is_reserved(w) || w == "yield",
            _ => false,
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Semi | TokenKind::RBrace | TokenKind::Eof
        ) || self.current().newline_before
    }

    fn reject_label(&self) -> PResult<()> {
        if matches!(self.peek(), TokenKind::Ident(_)) && !self.current().newline_before {
            return Err(self.unsupported("labeled statements"));
        }
        Ok(())
    }

    /// `{ statements }`
    pub(super) fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(self.error("expected '}', found end of input"));
            }
            body.push(self.parse_statement()?);
        }
        self.bump();
        Ok(body)
    }

    /// A TypeScript declaration with no runtime effect.
    fn parse_type_only(&mut self) -> PResult<StmtKind> {
        let start = self.start_offset();
        if self.is_word("type") {
            self.bump();
            self.binding_ident()?;
            self.type_parameters()?;
            self.expect(&TokenKind::Eq)?;
            self.skip_type()?;
            self.consume_semi()?;
        } else if self.is_word("interface") {
            while !self.at(&TokenKind::LBrace) {
                if self.at(&TokenKind::Eof) {
                    return Err(self.error("expected interface body"));
                }
                self.bump();
            }
            self.skip_group(&TokenKind::LBrace, &TokenKind::RBrace)?;
        } else {
            self.skip_declaration()?;
        }
        self.record_type_span(start);
        Ok(StmtKind::TypeOnly)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Variable Declarations
    // ═══════════════════════════════════════════════════════════════════

    fn decl_kind(&mut self) -> PResult<DeclKind> {
        let kind = match self.peek() {
            TokenKind::Ident(w) if w == "var" => DeclKind::Var,
            TokenKind::Ident(w) if w == "let" => DeclKind::Let,
            TokenKind::Ident(w) if w == "const" => DeclKind::Const,
            _ => return Err(self.unexpected()),
        };
        self.bump();
        Ok(kind)
    }

    fn parse_var_decl_statement(&mut self) -> PResult<VarDecl> {
        let kind = self.decl_kind()?;
        let declarators = self.parse_declarators(kind, None)?;
        self.consume_semi()?;
        Ok(VarDecl { kind, declarators })
    }

    /// Declarators after the keyword. `first` is a target already consumed
    /// by a `for` head.
    fn parse_declarators(
        &mut self,
        kind: DeclKind,
        first: Option<(Pattern, usize)>,
    ) -> PResult<Vec<VarDeclarator>> {
        let mut declarators = Vec::new();
        let mut pending = first;
        loop {
            let (target, start) = match pending.take() {
                Some(first) => first,
                None => {
                    let start = self.start_offset();
                    (self.parse_binding_pattern()?, start)
                }
            };
            self.ts_marker(&TokenKind::Bang);
            self.type_annotation()?;
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            if init.is_none() && !self.ctx.no_in {
                if kind == DeclKind::Const {
                    return Err(self.error_at(start, "Missing initializer in const declaration"));
                }
                if !matches!(target, Pattern::Ident(_)) {
                    return Err(self.error_at(
                        start,
                        "Missing initializer in destructuring declaration",
                    ));
                }
            }
            declarators.push(VarDeclarator {
                target,
                init,
                span: self.span_from(start),
            });
            if !self.eat(&TokenKind::Comma) {
                return Ok(declarators);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Patterns
    // ═══════════════════════════════════════════════════════════════════

    pub(super) fn parse_binding_pattern(&mut self) -> PResult<Pattern> {
        self.guarded(|p| match p.peek() {
            TokenKind::LBrace => p.parse_object_pattern(),
            TokenKind::LBracket => p.parse_array_pattern(),
            _ => Ok(Pattern::Ident(p.binding_ident()?)),
        })
    }

    fn parse_object_pattern(&mut self) -> PResult<Pattern> {
        self.expect(&TokenKind::LBrace)?;
        let mut props = Vec::new();
        let mut rest = None;
        while !self.at(&TokenKind::RBrace) {
            if self.eat(&TokenKind::Ellipsis) {
                rest = Some(Box::new(self.parse_binding_pattern()?));
                self.eat(&TokenKind::Comma);
                break;
            }
            let shorthand = matches!(self.peek(), TokenKind::Ident(_))
                && !matches!(self.peek_nth(1), TokenKind::Colon);
            let (key, value) = if shorthand {
                let name = self.binding_ident()?;
                (PropKey::Static(name.clone()), Pattern::Ident(name))
            } else {
                let key = self.parse_prop_key()?;
                self.expect(&TokenKind::Colon)?;
                (key, self.parse_binding_pattern()?)
            };
            let default = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            props.push(ObjectPatternProp {
                key,
                value,
                default,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Pattern::Object { props, rest })
    }

    fn parse_array_pattern(&mut self) -> PResult<Pattern> {
        self.expect(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        let mut rest = None;
        while !self.at(&TokenKind::RBracket) {
            if self.eat(&TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            if self.eat(&TokenKind::Ellipsis) {
                rest = Some(Box::new(self.parse_binding_pattern()?));
                self.eat(&TokenKind::Comma);
                break;
            }
            let pattern = self.parse_binding_pattern()?;
            let default = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            elements.push(Some(PatternElem { pattern, default }));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Pattern::Array { elements, rest })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Control Flow
    // ═══════════════════════════════════════════════════════════════════

    pub(super) fn parse_paren_expression(&mut self) -> PResult<Expr> {
        self.expect(&TokenKind::LParen)?;
        let expr = self.with_context(
            Context {
                no_in: false,
                ..self.ctx
            },
            |p| p.parse_expression(),
        )?;
        self.expect(&TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_loop_body(&mut self) -> PResult<Box<Stmt>> {
        let ctx = Context {
            in_loop: true,
            no_in: false,
            ..self.ctx
        };
        Ok(Box::new(self.with_context(ctx, |p| p.parse_statement())?))
    }

    fn parse_if(&mut self) -> PResult<StmtKind> {
        self.expect_word("if")?;
        let test = self.parse_paren_expression()?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat_word("else") {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            test,
            consequent,
            alternate,
        })
    }

    fn parse_for(&mut self) -> PResult<StmtKind> {
        self.expect_word("for")?;
        if self.is_word("await") {
            return Err(self.error("'for await' is not supported"));
        }
        self.expect(&TokenKind::LParen)?;
        let head_ctx = Context {
            no_in: true,
            ..self.ctx
        };

        let mut init = None;
        if self.at(&TokenKind::Semi) {
            // no initializer
        } else if self.is_word("var")
            || self.is_word("const")
            || (self.is_word("let") && self.let_starts_declaration())
        {
            let kind = self.decl_kind()?;
            let start = self.start_offset();
            let target = self.parse_binding_pattern()?;
            if let Some(loop_kind) = self.for_in_of_keyword() {
                return self.finish_for_in_of(loop_kind, ForHead::Decl(kind, target));
            }
            let declarators =
                self.with_context(head_ctx, |p| p.parse_declarators(kind, Some((target, start))))?;
            if kind == DeclKind::Const && declarators.iter().any(|d| d.init.is_none()) {
                return Err(self.error_at(start, "Missing initializer in const declaration"));
            }
            init = Some(ForInit::VarDecl(VarDecl { kind, declarators }));
        } else {
            let expr = self.with_context(head_ctx, |p| p.parse_expression())?;
            if let Some(loop_kind) = self.for_in_of_keyword() {
                let target = self.expr_to_pattern(expr)?;
                return self.finish_for_in_of(loop_kind, ForHead::Target(target));
            }
            init = Some(ForInit::Expr(expr));
        }

        self.expect(&TokenKind::Semi)?;
        let test = if self.at(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semi)?;
        let update = if self.at(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(StmtKind::For {
            init,
            test,
            update,
            body,
        })
    }

    fn for_in_of_keyword(&mut self) -> Option<ForInOfKind> {
        if self.eat_word("of") {
            Some(ForInOfKind::Of)
        } else if self.eat_word("in") {
            Some(ForInOfKind::In)
        } else {
            None
        }
    }

    fn finish_for_in_of(&mut self, kind: ForInOfKind, left: ForHead) -> PResult<StmtKind> {
        let right = match kind {
            ForInOfKind::Of => self.parse_assignment()?,
            ForInOfKind::In => self.parse_expression()?,
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(StmtKind::ForInOf {
            kind,
            left,
            right,
            body,
        })
    }

    fn parse_switch(&mut self) -> PResult<StmtKind> {
        self.expect_word("switch")?;
        let discriminant = self.parse_paren_expression()?;
        self.expect(&TokenKind::LBrace)?;
        let ctx = Context {
            in_switch: true,
            no_in: false,
            ..self.ctx
        };
        let cases = self.with_context(ctx, |p| {
            let mut cases = Vec::new();
            let mut seen_default = false;
            while !p.eat(&TokenKind::RBrace) {
                let test = if p.eat_word("case") {
                    Some(p.parse_expression()?)
                } else if p.is_word("default") {
                    if seen_default {
                        return Err(p.error("More than one default clause in switch statement"));
                    }
                    seen_default = true;
                    p.bump();
                    None
                } else {
                    return Err(p.unexpected());
                };
                p.expect(&TokenKind::Colon)?;
                let mut body = Vec::new();
                while !p.is_word("case") && !p.is_word("default") && !p.at(&TokenKind::RBrace) {
                    if p.at(&TokenKind::Eof) {
                        return Err(p.error("expected '}', found end of input"));
                    }
                    body.push(p.parse_statement()?);
                }
                cases.push(SwitchCase { test, body });
            }
            Ok(cases)
        })?;
        Ok(StmtKind::Switch {
            discriminant,
            cases,
        })
    }

    fn parse_try(&mut self) -> PResult<StmtKind> {
        let start = self.start_offset();
        self.expect_word("try")?;
        let block = self.parse_block()?;
        let handler = if self.eat_word("catch") {
            let param = if self.eat(&TokenKind::LParen) {
                let pattern = self.parse_binding_pattern()?;
                self.type_annotation()?;
                self.expect(&TokenKind::RParen)?;
                Some(pattern)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.eat_word("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at(start, "Missing catch or finally after try"));
        }
        Ok(StmtKind::Try {
            block,
            handler,
            finalizer,
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════

    fn parse_function_declaration(&mut self, start: usize, is_async: bool) -> PResult<Stmt> {
        let kind = match self.parse_function(start, is_async, true)? {
            Some(function) => StmtKind::Function(Arc::new(function)),
            None => StmtKind::TypeOnly,
        };
        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    /// `function name(params) { body }` starting at the `function` keyword.
    ///
    /// Returns `None` for a TypeScript overload signature without a body.
    pub(super) fn parse_function(
        &mut self,
        start: usize,
        is_async: bool,
        require_name: bool,
    ) -> PResult<Option<Function>> {
        self.expect_word("function")?;
        if self.at(&TokenKind::Star) {
            return Err(self.unsupported("generator functions"));
        }
        let name = if matches!(self.peek(), TokenKind::Ident(_)) {
            Some(self.binding_ident()?)
        } else if require_name {
            return Err(self.error("function declarations require a name"));
        } else {
            None
        };
        self.parse_function_tail(start, name, is_async, false)
    }

    /// Everything after a function's name: type parameters, parameters,
    /// return type, and body.
    pub(super) fn parse_function_tail(
        &mut self,
        start: usize,
        name: Option<String>,
        is_async: bool,
        is_constructor: bool,
    ) -> PResult<Option<Function>> {
        self.type_parameters()?;
        let params = self.parse_params(is_constructor)?;
        self.type_annotation()?;

        if self.options.typescript && !self.at(&TokenKind::LBrace) {
            // Overload signature or abstract member
            self.consume_semi()?;
            self.record_type_span(start);
            return Ok(None);
        }

        let body = self.parse_function_body()?;
        Ok(Some(Function {
            name,
            params,
            body: FunctionBody::Block(body),
            is_arrow: false,
            is_async,
            span: self.span_from(start),
        }))
    }

    pub(super) fn parse_function_body(&mut self) -> PResult<Vec<Stmt>> {
        let ctx = Context {
            in_function: true,
            ..Context::default()
        };
        self.with_context(ctx, |p| p.parse_block())
    }

    /// `( params )`
    pub(super) fn parse_params(&mut self, is_constructor: bool) -> PResult<Vec<Param>> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.at(&TokenKind::RParen) {
            if self.options.typescript
                && self.is_word("this")
                && matches!(self.peek_nth(1), TokenKind::Colon)
            {
                // `this` parameter declares the receiver type only
                let start = self.start_offset();
                self.bump();
                self.type_annotation()?;
                self.eat(&TokenKind::Comma);
                self.record_type_span(start);
                continue;
            }
            let rest = self.eat(&TokenKind::Ellipsis);
            let mut property = false;
            if self.options.typescript && is_constructor {
                while let TokenKind::Ident(word) = self.peek() {
                    if !TS_MODIFIERS.contains(&word.as_str())
                        || !matches!(
                            self.peek_nth(1),
                            TokenKind::Ident(_) | TokenKind::LBrace | TokenKind::LBracket
                        )
                    {
                        break;
                    }
                    let start = self.start_offset();
                    self.bump();
                    self.record_type_span(start);
                    property = true;
                }
            }
            let pattern = self.parse_binding_pattern()?;
            self.ts_marker(&TokenKind::Question);
            self.type_annotation()?;
            let default = if !rest && self.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            params.push(Param {
                pattern,
                default,
                rest,
                property,
            });
            if rest || !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Classes
    // ═══════════════════════════════════════════════════════════════════

    /// `class Name extends Base { members }` starting at `class`.
    pub(super) fn parse_class(&mut self, require_name: bool) -> PResult<Arc<Class>> {
        let start = self.start_offset();
        self.expect_word("class")?;
        let name = match self.peek() {
            TokenKind::Ident(w) if w != "extends" && w != "implements" => {
                Some(self.binding_ident()?)
            }
            _ if require_name => return Err(self.error("class declarations require a name")),
            _ => None,
        };
        self.type_parameters()?;

        let super_class = if self.eat_word("extends") {
            let base = self.parse_lhs_expression(false)?;
            if self.options.typescript && self.at(&TokenKind::Lt) {
                let type_start = self.start_offset();
                self.skip_angle_group()?;
                self.record_type_span(type_start);
            }
            Some(base)
        } else {
            None
        };

        if self.options.typescript && self.is_word("implements") {
            let type_start = self.start_offset();
            self.bump();
            self.skip_type()?;
            while self.eat(&TokenKind::Comma) {
                self.skip_type()?;
            }
            self.record_type_span(type_start);
        }

        self.expect(&TokenKind::LBrace)?;
        let ctx = Context {
            in_function: true,
            ..Context::default()
        };
        let members = self.with_context(ctx, |p| {
            let mut members = Vec::new();
            while !p.eat(&TokenKind::RBrace) {
                if p.at(&TokenKind::Eof) {
                    return Err(p.error("expected '}', found end of input"));
                }
                if p.eat(&TokenKind::Semi) {
                    continue;
                }
                if let Some(member) = p.parse_class_member()? {
                    members.push(member);
                }
            }
            Ok(members)
        })?;

        Ok(Arc::new(Class {
            name,
            super_class,
            members,
            span: self.span_from(start),
        }))
    }

    /// Whether the word at the cursor is a modifier rather than a member name.
    fn at_modifier(&self) -> bool {
        !self.newline_before_nth(1)
            && matches!(
                self.peek_nth(1),
                TokenKind::Ident(_)
                    | TokenKind::String(_)
                    | TokenKind::Number(_)
                    | TokenKind::LBracket
                    | TokenKind::Star
            )
    }

    fn parse_class_member(&mut self) -> PResult<Option<ClassMember>> {
        let start = self.start_offset();
        if self.at(&TokenKind::At) {
            return Err(self.unsupported("decorators"));
        }

        let mut is_static = false;
        let mut is_async = false;
        let mut declare_only = false;
        loop {
            let word = match self.peek() {
                TokenKind::Ident(w) if self.at_modifier() => w.clone(),
                _ => break,
            };
            match word.as_str() {
                "static" => {
                    self.bump();
                    is_static = true;
                }
                "async" => {
                    self.bump();
                    is_async = true;
                }
                "get" | "set" => return Err(self.unsupported("getters and setters")),
                w if self.options.typescript && TS_MODIFIERS.contains(&w) => {
                    let modifier_start = self.start_offset();
                    self.bump();
                    self.record_type_span(modifier_start);
                    if w == "declare" || w == "abstract" {
                        declare_only = true;
                    }
                }
                _ => break,
            }
        }

        if self.at(&TokenKind::Star) {
            return Err(self.unsupported("generator methods"));
        }
        if is_static && self.at(&TokenKind::LBrace) {
            return Err(self.unsupported("static initialization blocks"));
        }

        // Index signature `[key: string]: T;`
        if self.options.typescript
            && self.at(&TokenKind::LBracket)
            && matches!(self.peek_nth(1), TokenKind::Ident(_))
            && matches!(self.peek_nth(2), TokenKind::Colon)
        {
            self.skip_group(&TokenKind::LBracket, &TokenKind::RBracket)?;
            self.type_annotation()?;
            self.consume_semi()?;
            self.record_type_span(start);
            return Ok(None);
        }

        let key = self.parse_prop_key()?;
        self.ts_marker(&TokenKind::Question);
        self.ts_marker(&TokenKind::Bang);

        if self.at(&TokenKind::LParen) || self.at(&TokenKind::Lt) {
            let is_constructor =
                !is_static && matches!(&key, PropKey::Static(name) if name == "constructor");
            let name = match &key {
                PropKey::Static(name) => Some(name.clone()),
                PropKey::Computed(_) => None,
            };
            let function = self.parse_function_tail(start, name, is_async, is_constructor)?;
            return Ok(match function {
                None => None,
                Some(_) if declare_only => {
                    return Err(self.error_at(start, "abstract methods cannot have a body"))
                }
                Some(function) if is_constructor => {
                    Some(ClassMember::Constructor(Arc::new(function)))
                }
                Some(function) => Some(ClassMember::Method {
                    key,
                    function: Arc::new(function),
                    is_static,
                }),
            });
        }

        self.type_annotation()?;
        let value = if self.eat(&TokenKind::Eq) {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        self.consume_semi()?;
        if declare_only {
            self.record_type_span(start);
            return Ok(None);
        }
        Ok(Some(ClassMember::Field {
            key,
            value,
            is_static,
        }))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Modules
    // ═══════════════════════════════════════════════════════════════════

    fn require_module(&self, start: usize, what: &str) -> PResult<()> {
        if self.options.source_type == SourceType::Script {
            return Err(self.error_at(
                start,
                format!("Cannot use {} statement outside a module", what),
            ));
        }
        Ok(())
    }

    fn module_specifier(&mut self) -> PResult<String> {
        match self.peek() {
            TokenKind::String(s) => {
                let s = s.clone();
                self.bump();
                Ok(s)
            }
            _ => Err(self.error(format!(
                "expected module specifier, found {}",
                self.peek().describe()
            ))),
        }
    }

    /// `with { type: 'json' }` / `assert { ... }` after a specifier.
    fn skip_import_attributes(&mut self) -> PResult<()> {
        if (self.is_word("with") || self.is_word("assert"))
            && matches!(self.peek_nth(1), TokenKind::LBrace)
            && !self.current().newline_before
        {
            self.bump();
            self.skip_group(&TokenKind::LBrace, &TokenKind::RBrace)?;
        }
        Ok(())
    }

    /// A name in an import/export list: identifier or string.
    fn module_export_name(&mut self) -> PResult<String> {
        match self.peek() {
            TokenKind::String(s) => {
                let s = s.clone();
                self.bump();
                Ok(s)
            }
            _ => self.property_word(),
        }
    }

    /// Whether the `type` word at the cursor marks a type-only specifier.
    fn at_type_modifier(&self) -> bool {
        self.options.typescript
            && self.is_word("type")
            && matches!(self.peek_nth(1), TokenKind::Ident(_) | TokenKind::String(_))
            && !(self.is_word_at(1, "as")
                && matches!(self.peek_nth(2), TokenKind::Comma | TokenKind::RBrace))
    }

    fn parse_import(&mut self) -> PResult<Stmt> {
        let start = self.start_offset();
        self.expect_word("import")?;
        self.require_module(start, "import")?;

        let mut specifiers = Vec::new();
        let mut type_only = false;

        if let TokenKind::String(_) = self.peek() {
            let source = self.module_specifier()?;
            self.skip_import_attributes()?;
            self.consume_semi()?;
            return Ok(Stmt {
                kind: StmtKind::Import(ImportDecl {
                    source,
                    specifiers,
                    type_only,
                }),
                span: self.span_from(start),
            });
        }

        if self.options.typescript
            && self.is_word("type")
            && !(self.is_word_at(1, "from") && matches!(self.peek_nth(2), TokenKind::String(_)))
            && !matches!(self.peek_nth(1), TokenKind::Comma)
        {
            self.bump();
            type_only = true;
        }

        if matches!(self.peek(), TokenKind::Ident(_)) {
            specifiers.push(ImportSpecifier::Default(self.binding_ident()?));
            if !self.eat(&TokenKind::Comma) {
                return self.finish_import(start, specifiers, type_only);
            }
        }

        if self.eat(&TokenKind::Star) {
            self.expect_word("as")?;
            specifiers.push(ImportSpecifier::Namespace(self.binding_ident()?));
        } else {
            self.expect(&TokenKind::LBrace)?;
            while !self.at(&TokenKind::RBrace) {
                let skip = self.at_type_modifier();
                if skip {
                    self.bump();
                }
                let imported = self.module_export_name()?;
                let local = if self.eat_word("as") {
                    self.binding_ident()?
                } else if super::is_reserved(&imported) {
                    return Err(self.error(format!("unexpected reserved word '{}'", imported)));
                } else {
                    imported.clone()
                };
                if !skip {
                    specifiers.push(ImportSpecifier::Named { imported, local });
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBrace)?;
        }
        self.finish_import(start, specifiers, type_only)
    }

    fn finish_import(
        &mut self,
        start: usize,
        specifiers: Vec<ImportSpecifier>,
        type_only: bool,
    ) -> PResult<Stmt> {
        self.expect_word("from")?;
        let source = self.module_specifier()?;
        self.skip_import_attributes()?;
        self.consume_semi()?;
        if type_only {
            self.record_type_span(start);
        }
        Ok(Stmt {
            kind: StmtKind::Import(ImportDecl {
                source,
                specifiers,
                type_only,
            }),
            span: self.span_from(start),
        })
    }

    fn parse_export(&mut self) -> PResult<Stmt> {
        let start = self.start_offset();
        self.expect_word("export")?;
        self.require_module(start, "export")?;

        let kind = if self.eat_word("default") {
            let decl_start = self.start_offset();
            if self.is_word("function") {
                let function = self.parse_function(decl_start, false, false)?;
                ExportDecl::DefaultDeclaration(Box::new(self.function_stmt(decl_start, function)))
            } else if self.is_word("async")
                && self.is_word_at(1, "function")
                && !self.newline_before_nth(1)
            {
                self.bump();
                let function = self.parse_function(decl_start, true, false)?;
                ExportDecl::DefaultDeclaration(Box::new(self.function_stmt(decl_start, function)))
            } else if self.is_word("class")
                || (self.options.typescript
                    && self.is_word("abstract")
                    && self.is_word_at(1, "class"))
            {
                if self.is_word("abstract") {
                    self.bump();
                    self.record_type_span(decl_start);
                }
                let class = self.parse_class(false)?;
                ExportDecl::DefaultDeclaration(Box::new(Stmt {
                    kind: StmtKind::Class(class),
                    span: self.span_from(decl_start),
                }))
            } else if self.options.typescript && self.is_word("interface") {
                ExportDecl::Declaration(Box::new(self.parse_statement()?))
            } else {
                let expr = self.parse_assignment()?;
                self.consume_semi()?;
                ExportDecl::DefaultExpr(expr)
            }
        } else if self.eat(&TokenKind::Star) {
            if self.eat_word("as") {
                self.module_export_name()?;
            }
            self.expect_word("from")?;
            let source = self.module_specifier()?;
            self.skip_import_attributes()?;
            self.consume_semi()?;
            ExportDecl::All { source }
        } else if self.options.typescript
            && self.is_word("type")
            && matches!(self.peek_nth(1), TokenKind::LBrace | TokenKind::Star)
        {
            self.skip_declaration()?;
            self.record_type_span(start);
            return Ok(Stmt {
                kind: StmtKind::TypeOnly,
                span: self.span_from(start),
            });
        } else if self.at(&TokenKind::LBrace) {
            self.bump();
            let mut specifiers = Vec::new();
            while !self.at(&TokenKind::RBrace) {
                let skip = self.at_type_modifier();
                if skip {
                    self.bump();
                }
                let local = self.module_export_name()?;
                let exported = if self.eat_word("as") {
                    self.module_export_name()?
                } else {
                    local.clone()
                };
                if !skip {
                    specifiers.push((local, exported));
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBrace)?;
            let source = if self.eat_word("from") {
                let source = self.module_specifier()?;
                self.skip_import_attributes()?;
                Some(source)
            } else {
                None
            };
            self.consume_semi()?;
            ExportDecl::Named { specifiers, source }
        } else if self.at(&TokenKind::Eq) {
            return Err(self.error("'export =' is not supported"));
        } else {
            let decl = self.parse_statement()?;
            match decl.kind {
                StmtKind::VarDecl(_)
                | StmtKind::Function(_)
                | StmtKind::Class(_)
                | StmtKind::TypeOnly => {}
                _ => return Err(self.error_at(decl.span.start, "expected declaration after 'export'")),
            }
            ExportDecl::Declaration(Box::new(decl))
        };

        Ok(Stmt {
            kind: StmtKind::Export(kind),
            span: self.span_from(start),
        })
    }

    fn function_stmt(&self, start: usize, function: Option<Function>) -> Stmt {
        let kind = match function {
            Some(function) => StmtKind::Function(Arc::new(function)),
            None => StmtKind::TypeOnly,
        };
        Stmt {
            kind,
            span: self.span_from(start),
        }
    }
}

