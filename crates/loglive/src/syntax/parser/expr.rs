//! Expression parsing by precedence climbing

use std::sync::Arc;

use super::{Context, PResult, Parser};
use crate::syntax::ast::*;
use crate::syntax::lexer::{interpolation_end, unescape};
use crate::syntax::token::TokenKind;
use crate::syntax::Span;
use crate::value::number_to_string;

/// Binding power of a binary operator token, with the node it builds.
#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

impl Parser<'_> {
    /// Comma-separated expression.
    pub(super) fn parse_expression(&mut self) -> PResult<Expr> {
        let start = self.start_offset();
        let first = self.parse_assignment()?;
        if !self.at(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_assignment()?);
        }
        Ok(Expr::new(ExprKind::Sequence(exprs), self.span_from(start)))
    }

    pub(super) fn parse_assignment(&mut self) -> PResult<Expr> {
        self.guarded(|p| p.parse_assignment_inner())
    }

    fn parse_assignment_inner(&mut self) -> PResult<Expr> {
        let start = self.start_offset();

        if self.is_word("yield") {
            return Err(self.unsupported("generators"));
        }
        if let Some(arrow) = self.try_arrow(start)? {
            return Ok(arrow);
        }

        let target = self.parse_conditional()?;
        let op = match assign_op(self.peek()) {
            Some(op) => op,
            None => return Ok(target),
        };
        let op_offset = self.start_offset();
        self.bump();

        let target_span = target.span;
        let pattern = match op {
            AssignOp::Assign => self.expr_to_pattern(target)?,
            _ => match target.into_kind() {
                ExprKind::Ident(name) => Pattern::Ident(name),
                kind @ ExprKind::Member { optional: false, .. } => {
                    Pattern::Member(Box::new(Expr::new(kind, target_span)))
                }
                _ => {
                    return Err(
                        self.error_at(op_offset, "Invalid left-hand side in assignment")
                    )
                }
            },
        };
        let value = self.parse_assignment()?;
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(pattern),
                value: Box::new(value),
            },
            self.span_from(start),
        ))
    }

    fn parse_conditional(&mut self) -> PResult<Expr> {
        let start = self.start_offset();
        let test = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.with_context(
            Context {
                no_in: false,
                ..self.ctx
            },
            |p| p.parse_assignment(),
        )?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            self.span_from(start),
        ))
    }

    fn infix_op(&self) -> Option<(Infix, u8)> {
        use BinaryOp::*;
        let op = match self.peek() {
            TokenKind::QuestionQuestion => (Infix::Logical(LogicalOp::Nullish), 1),
            TokenKind::PipePipe => (Infix::Logical(LogicalOp::Or), 2),
            TokenKind::AmpAmp => (Infix::Logical(LogicalOp::And), 3),
            TokenKind::Pipe => (Infix::Binary(BitOr), 4),
            TokenKind::Caret => (Infix::Binary(BitXor), 5),
            TokenKind::Amp => (Infix::Binary(BitAnd), 6),
            TokenKind::EqEq => (Infix::Binary(LooseEq), 7),
            TokenKind::NotEq => (Infix::Binary(LooseNe), 7),
            TokenKind::EqEqEq => (Infix::Binary(StrictEq), 7),
            TokenKind::NotEqEq => (Infix::Binary(StrictNe), 7),
            TokenKind::Lt => (Infix::Binary(Lt), 8),
            TokenKind::Gt => (Infix::Binary(Gt), 8),
            TokenKind::Le => (Infix::Binary(Le), 8),
            TokenKind::Ge => (Infix::Binary(Ge), 8),
            TokenKind::Ident(w) if w == "instanceof" => (Infix::Binary(InstanceOf), 8),
            TokenKind::Ident(w) if w == "in" && !self.ctx.no_in => (Infix::Binary(In), 8),
            TokenKind::Shl => (Infix::Binary(Shl), 9),
            TokenKind::Shr => (Infix::Binary(Shr), 9),
            TokenKind::UShr => (Infix::Binary(UShr), 9),
            TokenKind::Plus => (Infix::Binary(Add), 10),
            TokenKind::Minus => (Infix::Binary(Sub), 10),
            TokenKind::Star => (Infix::Binary(Mul), 11),
            TokenKind::Slash => (Infix::Binary(Div), 11),
            TokenKind::Percent => (Infix::Binary(Rem), 11),
            TokenKind::StarStar => (Infix::Binary(Exp), 12),
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, min_prec: u8) -> PResult<Expr> {
        let start = self.start_offset();
        let mut left = self.parse_unary()?;

        loop {
            // `expr as T` / `expr satisfies T` bind like relational operators
            if self.options.typescript
                && min_prec <= 8
                && (self.is_word("as") || self.is_word("satisfies"))
                && !self.current().newline_before
            {
                let type_start = self.start_offset();
                self.bump();
                if !self.eat_word("const") {
                    self.skip_type()?;
                }
                self.record_type_span(type_start);
                continue;
            }

            let Some((op, prec)) = self.infix_op() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.bump();
            // `**` is right-associative
            let next_min = if matches!(op, Infix::Binary(BinaryOp::Exp)) {
                prec
            } else {
                prec + 1
            };
            let right = self.guarded(|p| p.parse_binary(next_min))?;
            let span = self.span_from(start);
            left = match op {
                Infix::Binary(op) => Expr::new(
                    ExprKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                ),
                Infix::Logical(op) => Expr::new(
                    ExprKind::Logical {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                ),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        self.guarded(|p| p.parse_unary_inner())
    }

    fn parse_unary_inner(&mut self) -> PResult<Expr> {
        let start = self.start_offset();
        let op = match self.peek() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Ident(w) if w == "typeof" => Some(UnaryOp::Typeof),
            TokenKind::Ident(w) if w == "void" => Some(UnaryOp::Void),
            TokenKind::Ident(w) if w == "delete" => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                self.span_from(start),
            ));
        }

        if self.at(&TokenKind::PlusPlus) || self.at(&TokenKind::MinusMinus) {
            let op = if self.at(&TokenKind::PlusPlus) {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            self.bump();
            let target = self.parse_unary()?;
            self.check_update_target(&target)?;
            return Ok(Expr::new(
                ExprKind::Update {
                    op,
                    prefix: true,
                    target: Box::new(target),
                },
                self.span_from(start),
            ));
        }

        if self.is_word("await") && self.starts_operand(1) {
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Await(Box::new(operand)),
                self.span_from(start),
            ));
        }

        let expr = self.parse_lhs_expression(false)?;
        if (self.at(&TokenKind::PlusPlus) || self.at(&TokenKind::MinusMinus))
            && !self.current().newline_before
        {
            let op = if self.at(&TokenKind::PlusPlus) {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            self.check_update_target(&expr)?;
            self.bump();
            return Ok(Expr::new(
                ExprKind::Update {
                    op,
                    prefix: false,
                    target: Box::new(expr),
                },
                self.span_from(start),
            ));
        }
        Ok(expr)
    }

    /// Whether the token `n` ahead can begin an operand.
    fn starts_operand(&self, n: usize) -> bool {
        !self.newline_before_nth(n)
            && matches!(
                self.peek_nth(n),
                TokenKind::Ident(_)
                    | TokenKind::Number(_)
                    | TokenKind::String(_)
                    | TokenKind::Template(_)
                    | TokenKind::LParen
                    | TokenKind::LBracket
                    | TokenKind::LBrace
                    | TokenKind::Bang
                    | TokenKind::Minus
                    | TokenKind::Plus
                    | TokenKind::Tilde
            )
    }

    fn check_update_target(&self, target: &Expr) -> PResult<()> {
        match &target.kind {
            ExprKind::Ident(_) | ExprKind::Member { optional: false, .. } => Ok(()),
            _ => Err(self.error_at(
                target.span.start,
                "Invalid left-hand side expression in update operation",
            )),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Member and Call Chains
    // ═══════════════════════════════════════════════════════════════════

    /// Primary expression followed by member accesses and calls.
    ///
    /// With `no_call`, stops before an argument list (the callee of `new`).
    pub(super) fn parse_lhs_expression(&mut self, no_call: bool) -> PResult<Expr> {
        let start = self.start_offset();
        let mut expr = if self.is_word("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        let mut optional_chain = false;

        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.bump();
                    let name = self.property_word()?;
                    expr = self.member(start, expr, MemberProp::Ident(name), false);
                }
                TokenKind::QuestionDot => {
                    if no_call {
                        return Err(self.error("Invalid optional chain from new expression"));
                    }
                    self.bump();
                    optional_chain = true;
                    match self.peek() {
                        TokenKind::LParen => {
                            let args = self.parse_arguments()?;
                            expr = self.call(start, expr, args, true);
                        }
                        TokenKind::LBracket => {
                            let prop = self.parse_computed_member()?;
                            expr = self.member(start, expr, prop, true);
                        }
                        _ => {
                            let name = self.property_word()?;
                            expr = self.member(start, expr, MemberProp::Ident(name), true);
                        }
                    }
                }
                TokenKind::LBracket => {
                    let prop = self.parse_computed_member()?;
                    expr = self.member(start, expr, prop, false);
                }
                TokenKind::LParen if !no_call => {
                    let args = self.parse_arguments()?;
                    expr = self.call(start, expr, args, false);
                }
                TokenKind::Template(_) => {
                    return Err(self.unsupported("tagged templates"));
                }
                TokenKind::Bang if self.options.typescript && !self.current().newline_before => {
                    // Non-null assertion
                    let bang = self.start_offset();
                    self.bump();
                    self.record_type_span(bang);
                }
                TokenKind::Lt if !no_call && self.options.typescript => {
                    if !self.try_call_type_arguments() {
                        break;
                    }
                }
                _ => break,
            }
        }

        if optional_chain {
            let span = self.span_from(start);
            expr = Expr::new(ExprKind::OptionalChain(Box::new(expr)), span);
        }
        Ok(expr)
    }

    fn member(&self, start: usize, object: Expr, property: MemberProp, optional: bool) -> Expr {
        Expr::new(
            ExprKind::Member {
                object: Box::new(object),
                property,
                optional,
            },
            self.span_from(start),
        )
    }

    fn call(&self, start: usize, callee: Expr, args: Vec<Argument>, optional: bool) -> Expr {
        Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
                optional,
            },
            self.span_from(start),
        )
    }

    fn parse_computed_member(&mut self) -> PResult<MemberProp> {
        self.expect(&TokenKind::LBracket)?;
        let expr = self.with_context(
            Context {
                no_in: false,
                ..self.ctx
            },
            |p| p.parse_expression(),
        )?;
        self.expect(&TokenKind::RBracket)?;
        Ok(MemberProp::Computed(Box::new(expr)))
    }

    fn parse_new(&mut self) -> PResult<Expr> {
        let start = self.start_offset();
        self.expect_word("new")?;
        if self.at(&TokenKind::Dot) {
            return Err(self.error("'new.target' is not supported"));
        }
        let callee = self.guarded(|p| p.parse_lhs_expression(true))?;
        if self.options.typescript && self.at(&TokenKind::Lt) {
            let type_start = self.start_offset();
            self.skip_angle_group()?;
            self.record_type_span(type_start);
        }
        let args = if self.at(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            self.span_from(start),
        ))
    }

    /// `( args )`
    pub(super) fn parse_arguments(&mut self) -> PResult<Vec<Argument>> {
        self.expect(&TokenKind::LParen)?;
        let ctx = Context {
            no_in: false,
            ..self.ctx
        };
        let args = self.with_context(ctx, |p| {
            let mut args = Vec::new();
            while !p.at(&TokenKind::RParen) {
                let spread = p.eat(&TokenKind::Ellipsis);
                let expr = p.parse_assignment()?;
                args.push(Argument { expr, spread });
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Ok(args)
        })?;
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ═══════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> PResult<Expr> {
        let start = self.start_offset();
        let token = self.current().clone();
        let kind = match token.kind {
            TokenKind::Number(n) => {
                self.bump();
                ExprKind::Number(n)
            }
            TokenKind::String(s) => {
                self.bump();
                ExprKind::String(s)
            }
            TokenKind::Template(raw) => {
                self.bump();
                ExprKind::Template(self.parse_template(&raw, token.span)?)
            }
            TokenKind::LParen => {
                self.bump();
                let ctx = Context {
                    no_in: false,
                    ..self.ctx
                };
                let inner = self.with_context(ctx, |p| p.parse_expression())?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => self.parse_array_literal()?,
            TokenKind::LBrace => self.parse_object_literal()?,
            TokenKind::Slash | TokenKind::SlashEq => {
                return Err(self.unsupported("regular expression literals"))
            }
            TokenKind::Lt => return Err(self.error("JSX and angle-bracket type assertions are not supported")),
            TokenKind::At => return Err(self.unsupported("decorators")),
            TokenKind::Ident(word) => match word.as_str() {
                "function" => {
                    let function = self.parse_function(start, false, false)?;
                    self.function_expr(start, function)?
                }
                "async" if self.is_word_at(1, "function") && !self.newline_before_nth(1) => {
                    self.bump();
                    let function = self.parse_function(start, true, false)?;
                    self.function_expr(start, function)?
                }
                "class" => ExprKind::Class(self.parse_class(false)?),
                "this" => {
                    self.bump();
                    ExprKind::This
                }
                "super" => {
                    self.bump();
                    if !matches!(
                        self.peek(),
                        TokenKind::LParen | TokenKind::Dot | TokenKind::LBracket
                    ) {
                        return Err(self.error_at(start, "'super' keyword unexpected here"));
                    }
                    ExprKind::Super
                }
                "null" => {
                    self.bump();
                    ExprKind::Null
                }
                "true" => {
                    self.bump();
                    ExprKind::Bool(true)
                }
                "false" => {
                    self.bump();
                    ExprKind::Bool(false)
                }
                "import" => return Err(self.error("dynamic import() and import.meta are not supported")),
                w if super::is_reserved(w) => return Err(self.unexpected()),
                _ => {
                    self.bump();
                    ExprKind::Ident(word)
                }
            },
            _ => return Err(self.unexpected()),
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }

    fn function_expr(&self, start: usize, function: Option<Function>) -> PResult<ExprKind> {
        match function {
            Some(function) => Ok(ExprKind::Function(Arc::new(function))),
            None => Err(self.error_at(start, "function expressions require a body")),
        }
    }

    /// Split a template body into string chunks and parsed interpolations.
    fn parse_template(&mut self, raw: &str, span: Span) -> PResult<Vec<TemplatePart>> {
        let body_start = span.start + 1;
        let bytes = raw.as_bytes();
        let mut parts = Vec::new();
        let mut chunk_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    self.push_template_chunk(&mut parts, &raw[chunk_start..i], body_start + chunk_start)?;
                    let inner_start = i + 2;
                    let inner_end = interpolation_end(bytes, inner_start).ok_or_else(|| {
                        self.error_at(body_start + i, "unterminated template interpolation")
                    })?;
                    let mut sub = Parser::new(
                        self.source,
                        body_start + inner_start,
                        body_start + inner_end,
                        self.options,
                    )?;
                    sub.ctx = self.ctx;
                    sub.depth = self.depth;
                    let expr = sub.parse_expression()?;
                    if !sub.at(&TokenKind::Eof) {
                        return Err(sub.unexpected());
                    }
                    self.type_spans.append(&mut sub.type_spans);
                    parts.push(TemplatePart::Expr(expr));
                    i = inner_end + 1;
                    chunk_start = i;
                }
                _ => i += 1,
            }
        }
        self.push_template_chunk(&mut parts, &raw[chunk_start..], body_start + chunk_start)?;
        Ok(parts)
    }

    fn push_template_chunk(
        &self,
        parts: &mut Vec<TemplatePart>,
        raw: &str,
        offset: usize,
    ) -> PResult<()> {
        if raw.is_empty() {
            return Ok(());
        }
        let cooked = unescape(raw)
            .ok_or_else(|| self.error_at(offset, "invalid escape sequence in template"))?;
        parts.push(TemplatePart::Str(cooked));
        Ok(())
    }

    fn parse_array_literal(&mut self) -> PResult<ExprKind> {
        self.expect(&TokenKind::LBracket)?;
        let ctx = Context {
            no_in: false,
            ..self.ctx
        };
        let elements = self.with_context(ctx, |p| {
            let mut elements = Vec::new();
            while !p.at(&TokenKind::RBracket) {
                if p.eat(&TokenKind::Comma) {
                    elements.push(None);
                    continue;
                }
                let spread = p.eat(&TokenKind::Ellipsis);
                let expr = p.parse_assignment()?;
                elements.push(Some(Argument { expr, spread }));
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Ok(elements)
        })?;
        self.expect(&TokenKind::RBracket)?;
        Ok(ExprKind::Array(elements))
    }

    fn parse_object_literal(&mut self) -> PResult<ExprKind> {
        self.expect(&TokenKind::LBrace)?;
        let ctx = Context {
            no_in: false,
            ..self.ctx
        };
        let props = self.with_context(ctx, |p| {
            let mut props = Vec::new();
            while !p.at(&TokenKind::RBrace) {
                props.push(p.parse_property()?);
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Ok(props)
        })?;
        self.expect(&TokenKind::RBrace)?;
        Ok(ExprKind::Object(props))
    }

    fn parse_property(&mut self) -> PResult<Property> {
        let start = self.start_offset();
        if self.eat(&TokenKind::Ellipsis) {
            return Ok(Property::Spread(self.parse_assignment()?));
        }
        if self.at(&TokenKind::Star) {
            return Err(self.unsupported("generator methods"));
        }
        let modifier_follows = !self.newline_before_nth(1)
            && matches!(
                self.peek_nth(1),
                TokenKind::Ident(_) | TokenKind::String(_) | TokenKind::Number(_) | TokenKind::LBracket
            );
        if (self.is_word("get") || self.is_word("set")) && modifier_follows {
            return Err(self.unsupported("getters and setters"));
        }
        let is_async = self.is_word("async") && modifier_follows;
        if is_async {
            self.bump();
        }

        let shorthand_name = match self.peek() {
            TokenKind::Ident(w) => Some(w.clone()),
            _ => None,
        };
        let key = self.parse_prop_key()?;

        if self.at(&TokenKind::LParen) || self.at(&TokenKind::Lt) {
            let name = match &key {
                PropKey::Static(name) => Some(name.clone()),
                PropKey::Computed(_) => None,
            };
            let function = self
                .parse_function_tail(start, name, is_async, false)?
                .ok_or_else(|| self.error_at(start, "object methods require a body"))?;
            return Ok(Property::Method(key, Arc::new(function)));
        }
        if is_async {
            return Err(self.error_at(start, "expected method after 'async'"));
        }
        if self.eat(&TokenKind::Colon) {
            return Ok(Property::KeyValue(key, self.parse_assignment()?));
        }
        match shorthand_name {
            Some(name) if !super::is_reserved(&name) => Ok(Property::Shorthand(name)),
            _ => Err(self.unexpected()),
        }
    }

    /// Property key: identifier, string, number, or `[computed]`.
    pub(super) fn parse_prop_key(&mut self) -> PResult<PropKey> {
        match self.peek().clone() {
            TokenKind::Ident(word) => {
                self.bump();
                Ok(PropKey::Static(word))
            }
            TokenKind::String(s) => {
                self.bump();
                Ok(PropKey::Static(s))
            }
            TokenKind::Number(n) => {
                self.bump();
                Ok(PropKey::Static(number_to_string(n)))
            }
            TokenKind::LBracket => {
                self.bump();
                let ctx = Context {
                    no_in: false,
                    ..self.ctx
                };
                let expr = self.with_context(ctx, |p| p.parse_assignment())?;
                self.expect(&TokenKind::RBracket)?;
                Ok(PropKey::Computed(Box::new(expr)))
            }
            _ => Err(self.error(format!(
                "expected property name, found {}",
                self.peek().describe()
            ))),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Arrow Functions
    // ═══════════════════════════════════════════════════════════════════

    /// Parse an arrow function if one starts at the cursor.
    fn try_arrow(&mut self, start: usize) -> PResult<Option<Expr>> {
        let is_async = self.is_word("async")
            && !self.newline_before_nth(1)
            && match self.peek_nth(1) {
                TokenKind::Ident(_) => matches!(self.peek_nth(2), TokenKind::Arrow),
                TokenKind::LParen | TokenKind::Lt => true,
                _ => false,
            };
        let offset = usize::from(is_async);

        match self.peek_nth(offset) {
            TokenKind::Ident(w)
                if !super::is_reserved(w) && matches!(self.peek_nth(offset + 1), TokenKind::Arrow) =>
            {
                if is_async {
                    self.bump();
                }
                let name = self.binding_ident()?;
                let params = vec![Param {
                    pattern: Pattern::Ident(name),
                    default: None,
                    rest: false,
                    property: false,
                }];
                self.finish_arrow(start, params, is_async).map(Some)
            }
            TokenKind::LParen | TokenKind::Lt if self.arrow_ahead(self.pos + offset) => {
                let checkpoint = self.checkpoint();
                if is_async {
                    self.bump();
                }
                let attempt = (|| -> PResult<Vec<Param>> {
                    self.type_parameters()?;
                    let params = self.parse_params(false)?;
                    self.type_annotation()?;
                    if !self.at(&TokenKind::Arrow) {
                        return Err(self.unexpected());
                    }
                    Ok(params)
                })();
                match attempt {
                    Ok(params) => self.finish_arrow(start, params, is_async).map(Some),
                    Err(_) => {
                        self.rewind(checkpoint);
                        Ok(None)
                    }
                }
            }
            _ => Ok(None),
        }
    }

    /// Does the group at `index` close right before `=>` (or a return-type
    /// colon)? Constant time apart from skipping type parameters.
    fn arrow_ahead(&self, index: usize) -> bool {
        let mut i = index;
        if self.token_at(i).kind == TokenKind::Lt {
            if !self.options.typescript {
                return false;
            }
            // Generic arrow: skip to the parameter list
            let mut depth = 0isize;
            loop {
                match &self.token_at(i).kind {
                    TokenKind::Lt => depth += 1,
                    TokenKind::Gt => depth -= 1,
                    TokenKind::Shr => depth -= 2,
                    TokenKind::Eof => return false,
                    _ => {}
                }
                i += 1;
                if depth <= 0 {
                    break;
                }
            }
            if self.token_at(i).kind != TokenKind::LParen {
                return false;
            }
        }
        let Some(close) = self.closer_of(i) else {
            return false;
        };
        let next = self.token_at(close + 1);
        match next.kind {
            TokenKind::Arrow => !next.newline_before,
            TokenKind::Colon => self.options.typescript,
            _ => false,
        }
    }

    fn finish_arrow(&mut self, start: usize, params: Vec<Param>, is_async: bool) -> PResult<Expr> {
        if self.current().newline_before {
            return Err(self.error("Line terminator not permitted before arrow"));
        }
        self.expect(&TokenKind::Arrow)?;
        let body = if self.at(&TokenKind::LBrace) {
            FunctionBody::Block(self.parse_function_body()?)
        } else {
            let ctx = Context {
                in_function: true,
                in_loop: false,
                in_switch: false,
                no_in: self.ctx.no_in,
            };
            FunctionBody::Expr(Box::new(self.with_context(ctx, |p| p.parse_assignment())?))
        };
        let span = self.span_from(start);
        Ok(Expr::new(
            ExprKind::Function(Arc::new(Function {
                name: None,
                params,
                body,
                is_arrow: true,
                is_async,
                span,
            })),
            span,
        ))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Assignment Targets
    // ═══════════════════════════════════════════════════════════════════

    /// Reinterpret a parsed expression as an assignment target.
    pub(super) fn expr_to_pattern(&self, expr: Expr) -> PResult<Pattern> {
        let invalid = |p: &Self, span: Span| {
            Err(p.error_at(span.start, "Invalid left-hand side in assignment"))
        };
        let span = expr.span;
        match expr.into_kind() {
            ExprKind::Ident(name) => Ok(Pattern::Ident(name)),
            kind @ ExprKind::Member { optional: false, .. } => {
                Ok(Pattern::Member(Box::new(Expr::new(kind, span))))
            }
            ExprKind::Array(items) => {
                let mut elements = Vec::new();
                let mut rest = None;
                let count = items.len();
                for (index, item) in items.into_iter().enumerate() {
                    match item {
                        None => elements.push(None),
                        Some(Argument { expr, spread: true }) => {
                            if index + 1 != count {
                                return invalid(self, expr.span);
                            }
                            rest = Some(Box::new(self.expr_to_pattern(expr)?));
                        }
                        Some(Argument { expr, .. }) => {
                            elements.push(Some(self.pattern_elem(expr)?));
                        }
                    }
                }
                Ok(Pattern::Array { elements, rest })
            }
            ExprKind::Object(items) => {
                let mut props = Vec::new();
                let mut rest = None;
                let count = items.len();
                for (index, item) in items.into_iter().enumerate() {
                    match item {
                        Property::KeyValue(key, value) => {
                            let PatternElem { pattern, default } = self.pattern_elem(value)?;
                            props.push(ObjectPatternProp {
                                key,
                                value: pattern,
                                default,
                            });
                        }
                        Property::Shorthand(name) => props.push(ObjectPatternProp {
                            key: PropKey::Static(name.clone()),
                            value: Pattern::Ident(name),
                            default: None,
                        }),
                        Property::Spread(inner) if index + 1 == count => {
                            rest = Some(Box::new(self.expr_to_pattern(inner)?));
                        }
                        Property::Spread(_) | Property::Method(..) => return invalid(self, span),
                    }
                }
                Ok(Pattern::Object { props, rest })
            }
            _ => invalid(self, span),
        }
    }

    fn pattern_elem(&self, expr: Expr) -> PResult<PatternElem> {
        let span = expr.span;
        match expr.into_kind() {
            ExprKind::Assign {
                op: AssignOp::Assign,
                target,
                value,
            } => Ok(PatternElem {
                pattern: *target,
                default: Some(*value),
            }),
            kind => Ok(PatternElem {
                pattern: self.expr_to_pattern(Expr::new(kind, span))?,
                default: None,
            }),
        }
    }
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    use BinaryOp::*;
    let op = match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::Compound(Add),
        TokenKind::MinusEq => AssignOp::Compound(Sub),
        TokenKind::StarEq => AssignOp::Compound(Mul),
        TokenKind::SlashEq => AssignOp::Compound(Div),
        TokenKind::PercentEq => AssignOp::Compound(Rem),
        TokenKind::StarStarEq => AssignOp::Compound(Exp),
        TokenKind::ShlEq => AssignOp::Compound(Shl),
        TokenKind::ShrEq => AssignOp::Compound(Shr),
        TokenKind::UShrEq => AssignOp::Compound(UShr),
        TokenKind::AmpEq => AssignOp::Compound(BitAnd),
        TokenKind::PipeEq => AssignOp::Compound(BitOr),
        TokenKind::CaretEq => AssignOp::Compound(BitXor),
        TokenKind::AmpAmpEq => AssignOp::Logical(LogicalOp::And),
        TokenKind::PipePipeEq => AssignOp::Logical(LogicalOp::Or),
        TokenKind::QuestionQuestionEq => AssignOp::Logical(LogicalOp::Nullish),
        _ => return None,
    };
    Some(op)
}
