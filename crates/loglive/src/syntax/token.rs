//! Token definitions produced by the lexer

use super::Span;

/// A lexed token with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// What was lexed
    pub kind: TokenKind,

    /// Byte range in the source text
    pub span: Span,

    /// Whether a line terminator separates this token from the previous one
    pub newline_before: bool,
}

/// Token kinds.
///
/// Every word (keywords included) is an `Ident`; the parser decides which
/// words are reserved in which position.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals / identifiers
    Ident(String),
    Number(f64),
    String(String),
    /// Raw body of a template literal, between the backticks
    Template(String),

    // Grouping
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,

    // Punctuation
    Semi,
    Comma,
    Ellipsis,
    Dot,
    QuestionDot,
    Question,
    Colon,
    Arrow,
    At,

    // Comparison
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Gt,
    Le,
    Ge,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    PlusPlus,
    MinusMinus,

    // Bitwise
    Shl,
    Shr,
    UShr,
    Amp,
    Pipe,
    Caret,
    Tilde,

    // Logical
    Bang,
    AmpAmp,
    PipePipe,
    QuestionQuestion,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    StarStarEq,
    ShlEq,
    ShrEq,
    UShrEq,
    AmpEq,
    PipeEq,
    CaretEq,
    AmpAmpEq,
    PipePipeEq,
    QuestionQuestionEq,

    Eof,
}

impl TokenKind {
    /// Short human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("'{}'", name),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Template(_) => "template literal".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other.punct_text()),
        }
    }

    fn punct_text(&self) -> &'static str {
        match self {
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Semi => ";",
            TokenKind::Comma => ",",
            TokenKind::Ellipsis => "...",
            TokenKind::Dot => ".",
            TokenKind::QuestionDot => "?.",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Arrow => "=>",
            TokenKind::At => "@",
            TokenKind::EqEq => "==",
            TokenKind::EqEqEq => "===",
            TokenKind::NotEq => "!=",
            TokenKind::NotEqEq => "!==",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::StarStar => "**",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::UShr => ">>>",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Bang => "!",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::QuestionQuestion => "??",
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::StarStarEq => "**=",
            TokenKind::ShlEq => "<<=",
            TokenKind::ShrEq => ">>=",
            TokenKind::UShrEq => ">>>=",
            TokenKind::AmpEq => "&=",
            TokenKind::PipeEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::AmpAmpEq => "&&=",
            TokenKind::PipePipeEq => "||=",
            TokenKind::QuestionQuestionEq => "??=",
            TokenKind::Ident(_)
            | TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::Template(_)
            | TokenKind::Eof => "",
        }
    }
}
