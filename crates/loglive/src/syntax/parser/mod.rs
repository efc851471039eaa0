//! Recursive-descent parser
//!
//! Statements live in [`stmt`], expressions in [`expr`], and the
//! TypeScript annotation skipper in [`types`]. Every skipped annotation is
//! recorded in `type_spans` so callers can recover value-only source text.

mod expr;
mod stmt;
mod types;

use crate::error::SyntaxError;
use crate::stack::ensure_sufficient_stack;

use super::ast::Program;
use super::lexer::tokenize;
use super::token::{Token, TokenKind};
use super::{ParseOptions, Span};

pub(crate) type PResult<T> = Result<T, SyntaxError>;

/// Recursive parse calls allowed to be active at once. Each level of
/// bracket nesting costs about two.
const MAX_ACTIVE_CALLS: usize = 2 * super::depth::MAX_NESTING_DEPTH + 500;

/// Words that can never be used as binding or reference names.
const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield",
];

pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

/// Pair every `(`, `[` and `{` with the next unmatched closer of any kind.
fn match_brackets(tokens: &[Token]) -> Vec<Option<usize>> {
    let mut closers = vec![None; tokens.len()];
    let mut open = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => open.push(index),
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                if let Some(opener) = open.pop() {
                    closers[opener] = Some(index);
                }
            }
            _ => {}
        }
    }
    closers
}

/// Which jump statements are legal at the current position.
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    in_function: bool,
    in_loop: bool,
    in_switch: bool,
    /// `in` is not a binary operator inside a `for (...;` head
    no_in: bool,
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    pos: usize,
    type_spans: usize,
}

pub(crate) struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    start: usize,
    options: ParseOptions,
    type_spans: Vec<Span>,
    ctx: Context,
    /// Index of the matching close bracket for every open bracket token
    closers: Vec<Option<usize>>,
    depth: usize,
}

impl<'src> Parser<'src> {
    /// Tokenize `source[start..end]` and position the parser at its first token.
    pub(crate) fn new(
        source: &'src str,
        start: usize,
        end: usize,
        options: ParseOptions,
    ) -> PResult<Self> {
        let tokens = tokenize(source, start, end)
            .map_err(|e| SyntaxError::at(source, e.offset, e.message))?;
        let closers = match_brackets(&tokens);
        Ok(Self {
            source,
            tokens,
            pos: 0,
            start,
            options,
            type_spans: Vec::new(),
            ctx: Context::default(),
            closers,
            depth: 0,
        })
    }

    pub(crate) fn parse_program(mut self) -> PResult<Program> {
        let mut body = Vec::new();
        while !self.at(&TokenKind::Eof) {
            body.push(self.parse_module_item()?);
        }
        self.type_spans.sort_by_key(|s| (s.start, s.end));
        Ok(Program {
            body,
            source_type: self.options.source_type,
            type_spans: self.type_spans,
            span: Span::new(self.start, self.source.len()),
        })
    }

    /// Parse a lone expression spanning all remaining input.
    pub(crate) fn parse_standalone_expression(mut self) -> PResult<super::ast::Expr> {
        let expr = self.parse_expression()?;
        if !self.at(&TokenKind::Eof) {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Cursor
    // ═══════════════════════════════════════════════════════════════════

    fn token_at(&self, index: usize) -> &Token {
        // The vector always ends with Eof
        let last = self.tokens.len() - 1;
        &self.tokens[index.min(last)]
    }

    fn current(&self) -> &Token {
        self.token_at(self.pos)
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        &self.token_at(self.pos + n).kind
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            self.start
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn start_offset(&self) -> usize {
        self.current().span.start
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end().max(start))
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<Span> {
        if self.at(kind) {
            Ok(self.bump().span)
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                kind.describe(),
                self.peek().describe()
            )))
        }
    }

    fn is_word(&self, word: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(w) if w == word)
    }

    fn is_word_at(&self, n: usize, word: &str) -> bool {
        matches!(self.peek_nth(n), TokenKind::Ident(w) if w == word)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.is_word(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, word: &str) -> PResult<Span> {
        if self.is_word(word) {
            Ok(self.bump().span)
        } else {
            Err(self.error(format!(
                "expected '{}', found {}",
                word,
                self.peek().describe()
            )))
        }
    }

    /// Whether the token `n` ahead is on a new line.
    fn newline_before_nth(&self, n: usize) -> bool {
        self.token_at(self.pos + n).newline_before
    }

    /// A non-reserved identifier.
    fn binding_ident(&mut self) -> PResult<String> {
        match self.peek() {
            TokenKind::Ident(word) if !is_reserved(word) => {
                let word = word.clone();
                self.bump();
                Ok(word)
            }
            _ => Err(self.error(format!(
                "expected identifier, found {}",
                self.peek().describe()
            ))),
        }
    }

    /// Any word, reserved or not, as used after `.` or as a property key.
    fn property_word(&mut self) -> PResult<String> {
        match self.peek() {
            TokenKind::Ident(word) => {
                let word = word.clone();
                self.bump();
                Ok(word)
            }
            _ => Err(self.error(format!(
                "expected property name, found {}",
                self.peek().describe()
            ))),
        }
    }

    /// Statement terminator, with automatic semicolon insertion.
    fn consume_semi(&mut self) -> PResult<()> {
        if self.eat(&TokenKind::Semi) {
            return Ok(());
        }
        if self.at(&TokenKind::RBrace) || self.at(&TokenKind::Eof) || self.current().newline_before
        {
            return Ok(());
        }
        Err(self.unexpected())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            type_spans: self.type_spans.len(),
        }
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.type_spans.truncate(checkpoint.type_spans);
    }

    /// Run `f` with a different jump context, restoring the old one after.
    fn with_context<T>(
        &mut self,
        ctx: Context,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let saved = std::mem::replace(&mut self.ctx, ctx);
        let result = f(self);
        self.ctx = saved;
        result
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_ACTIVE_CALLS {
            return Err(self.error(super::depth::TOO_DEEP));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }

    /// Token index of the bracket closing the one at `index`.
    fn closer_of(&self, index: usize) -> Option<usize> {
        self.closers.get(index).copied().flatten()
    }

    fn record_type_span(&mut self, start: usize) {
        let span = self.span_from(start);
        if !span.is_empty() {
            self.type_spans.push(span);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Errors
    // ═══════════════════════════════════════════════════════════════════

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at(self.source, self.start_offset(), message)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at(self.source, offset, message)
    }

    fn unexpected(&self) -> SyntaxError {
        self.error(format!("unexpected {}", self.peek().describe()))
    }

    fn unsupported(&self, what: &str) -> SyntaxError {
        self.error(format!("{} are not supported", what))
    }
}
