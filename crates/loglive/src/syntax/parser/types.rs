//! TypeScript annotation skipping
//!
//! Types carry no runtime meaning here, so they are consumed token-wise and
//! their spans recorded rather than parsed into the AST.

use super::{PResult, Parser};
use crate::syntax::token::TokenKind;

/// Words that act as type operators before an operand.
const TYPE_PREFIXES: &[&str] = &["keyof", "typeof", "unique", "readonly", "infer"];

impl Parser<'_> {
    /// `: Type` after a binding, recorded as a type span. No-op in JavaScript.
    pub(super) fn type_annotation(&mut self) -> PResult<()> {
        if !self.options.typescript || !self.at(&TokenKind::Colon) {
            return Ok(());
        }
        let start = self.start_offset();
        self.bump();
        self.skip_type()?;
        self.record_type_span(start);
        Ok(())
    }

    /// `<T, U extends X = Y>` on a declaration.
    pub(super) fn type_parameters(&mut self) -> PResult<()> {
        if !self.options.typescript || !self.at(&TokenKind::Lt) {
            return Ok(());
        }
        let start = self.start_offset();
        self.skip_angle_group()?;
        self.record_type_span(start);
        Ok(())
    }

    /// A single optional marker (`?` or `!`) that only exists in TypeScript.
    pub(super) fn ts_marker(&mut self, kind: &TokenKind) {
        if self.options.typescript && self.at(kind) {
            let start = self.start_offset();
            self.bump();
            self.record_type_span(start);
        }
    }

    /// Skip a full type expression.
    pub(super) fn skip_type(&mut self) -> PResult<()> {
        self.guarded(|p| {
            // Leading `|` / `&` in multi-line unions
            if p.at(&TokenKind::Pipe) || p.at(&TokenKind::Amp) {
                p.bump();
            }
            p.skip_type_operand()?;
            while p.at(&TokenKind::Pipe) || p.at(&TokenKind::Amp) {
                p.bump();
                p.skip_type_operand()?;
            }
            if p.is_word("extends") && !p.current().newline_before {
                p.bump();
                p.skip_type()?;
                p.expect(&TokenKind::Question)?;
                p.skip_type()?;
                p.expect(&TokenKind::Colon)?;
                p.skip_type()?;
            }
            Ok(())
        })
    }

    fn skip_type_operand(&mut self) -> PResult<()> {
        match self.peek().clone() {
            TokenKind::Ident(word) if TYPE_PREFIXES.contains(&word.as_str()) => {
                self.bump();
                if matches!(self.peek(), TokenKind::Ident(_) | TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace) {
                    self.skip_type_operand()?;
                }
            }
            TokenKind::Ident(word) if word == "asserts" && matches!(self.peek_nth(1), TokenKind::Ident(_)) => {
                self.bump();
                self.skip_type_operand()?;
            }
            TokenKind::Ident(word) if word == "new" => {
                self.bump();
                self.skip_function_type()?;
            }
            TokenKind::Ident(_) => {
                self.bump();
                while self.at(&TokenKind::Dot) {
                    self.bump();
                    self.property_word()?;
                }
                if self.at(&TokenKind::Lt) {
                    self.skip_angle_group()?;
                }
                if self.is_word("is") && !self.current().newline_before {
                    self.bump();
                    self.skip_type()?;
                }
            }
            TokenKind::String(_) | TokenKind::Number(_) | TokenKind::Template(_) => {
                self.bump();
            }
            TokenKind::Minus => {
                self.bump();
                match self.peek() {
                    TokenKind::Number(_) => {
                        self.bump();
                    }
                    _ => return Err(self.unexpected()),
                }
            }
            TokenKind::LBrace => self.skip_group(&TokenKind::LBrace, &TokenKind::RBrace)?,
            TokenKind::LBracket => self.skip_group(&TokenKind::LBracket, &TokenKind::RBracket)?,
            TokenKind::LParen | TokenKind::Lt => self.skip_function_type()?,
            _ => {
                return Err(self.error(format!(
                    "expected type, found {}",
                    self.peek().describe()
                )))
            }
        }

        // `T[]`, `T["key"]`
        while self.at(&TokenKind::LBracket) && !self.current().newline_before {
            self.skip_group(&TokenKind::LBracket, &TokenKind::RBracket)?;
        }
        Ok(())
    }

    /// `(a: A) => R`, `<T>(a: T) => R`, or a parenthesized type.
    fn skip_function_type(&mut self) -> PResult<()> {
        if self.at(&TokenKind::Lt) {
            self.skip_angle_group()?;
        }
        self.skip_group(&TokenKind::LParen, &TokenKind::RParen)?;
        if self.eat(&TokenKind::Arrow) {
            self.skip_type()?;
        }
        Ok(())
    }

    /// Skip a balanced `open ... close` group starting at the current token.
    pub(super) fn skip_group(&mut self, open: &TokenKind, close: &TokenKind) -> PResult<()> {
        let start = self.start_offset();
        self.expect(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            let kind = self.peek();
            if kind == &TokenKind::Eof {
                return Err(self.error_at(start, format!("unclosed {}", open.describe())));
            }
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
            }
            self.bump();
        }
        Ok(())
    }

    /// Skip `<...>`, treating `>>` and `>>>` as several closers.
    pub(super) fn skip_angle_group(&mut self) -> PResult<()> {
        let start = self.start_offset();
        self.expect(&TokenKind::Lt)?;
        let mut depth = 1isize;
        while depth > 0 {
            match self.peek() {
                TokenKind::Eof => return Err(self.error_at(start, "unclosed '<'")),
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => depth -= 1,
                TokenKind::Shr => depth -= 2,
                TokenKind::UShr => depth -= 3,
                _ => {}
            }
            self.bump();
        }
        if depth < 0 {
            return Err(self.error_at(start, "mismatched '>' in type arguments"));
        }
        Ok(())
    }

    /// Try to skip `<...>` type arguments before a call's `(`.
    ///
    /// Rewinds and returns `false` when the angle brackets turn out to be
    /// comparison operators.
    pub(super) fn try_call_type_arguments(&mut self) -> bool {
        if !self.options.typescript || !self.at(&TokenKind::Lt) {
            return false;
        }
        let checkpoint = self.checkpoint();
        let start = self.start_offset();
        let mut depth = 0isize;
        loop {
            match self.peek() {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => depth -= 1,
                TokenKind::Shr => depth -= 2,
                TokenKind::Ident(_)
                | TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::Comma
                | TokenKind::Dot
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::Pipe
                | TokenKind::Amp
                | TokenKind::Arrow
                | TokenKind::Colon
                | TokenKind::Semi
                | TokenKind::Question => {}
                _ => {
                    self.rewind(checkpoint);
                    return false;
                }
            }
            self.bump();
            if depth <= 0 {
                break;
            }
        }
        if depth == 0 && self.at(&TokenKind::LParen) {
            self.record_type_span(start);
            true
        } else {
            self.rewind(checkpoint);
            false
        }
    }

    /// Skip a TypeScript-only declaration (`declare ...`, `enum`, `namespace`).
    ///
    /// Stops after a top-level `;`, after the brace group closing the
    /// declaration, or at a line break that cannot continue it.
    pub(super) fn skip_declaration(&mut self) -> PResult<()> {
        let mut depth = 0usize;
        let mut consumed = false;
        loop {
            let token = self.current().clone();
            match token.kind {
                TokenKind::Eof => {
                    if depth > 0 {
                        return Err(self.error("unexpected end of input in declaration"));
                    }
                    return Ok(());
                }
                TokenKind::Semi if depth == 0 => {
                    self.bump();
                    return Ok(());
                }
                _ if depth == 0 && consumed && token.newline_before && !self.continues_line() => {
                    return Ok(());
                }
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                    if depth == 0 && token.kind == TokenKind::RBrace {
                        self.bump();
                        self.eat(&TokenKind::Semi);
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.bump();
            consumed = true;
        }
    }

    /// Whether the previous token leaves the declaration open across a newline.
    fn continues_line(&self) -> bool {
        if self.pos == 0 {
            return false;
        }
        matches!(
            self.tokens[self.pos - 1].kind,
            TokenKind::Colon
                | TokenKind::Eq
                | TokenKind::Pipe
                | TokenKind::Amp
                | TokenKind::Comma
                | TokenKind::Arrow
                | TokenKind::Lt
                | TokenKind::Dot
        ) || matches!(&self.tokens[self.pos - 1].kind, TokenKind::Ident(w) if w == "extends" || w == "implements")
    }
}
