//! Lexer built on `logos`
//!
//! Produces a flat token vector with absolute byte spans and the
//! "line break before" flag the parser needs for semicolon insertion.

use logos::Logos;

use super::token::{Token, TokenKind};
use super::Span;

/// Lexing failure, positioned by byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// What went wrong
    pub message: String,

    /// Byte offset of the offending input
    pub offset: usize,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
enum RawToken {
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9][0-9_]*)?", |lex| parse_decimal(lex.slice()))]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9][0-9_]*)?", |lex| parse_decimal(lex.slice()))]
    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*", |lex| parse_radix(&lex.slice()[2..], 16))]
    #[regex(r"0[oO][0-7][0-7_]*", |lex| parse_radix(&lex.slice()[2..], 8))]
    #[regex(r"0[bB][01][01_]*", |lex| parse_radix(&lex.slice()[2..], 2))]
    Number(f64),

    #[regex(r#""([^"\\\n]|\\(.|\n))*""#, |lex| unescape(strip_quotes(lex.slice())))]
    #[regex(r#"'([^'\\\n]|\\(.|\n))*'"#, |lex| unescape(strip_quotes(lex.slice())))]
    String(String),

    #[token("`", lex_template)]
    Template(String),

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("...")]
    Ellipsis,
    #[token(".")]
    Dot,
    #[token("?.")]
    QuestionDot,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("=>")]
    Arrow,
    #[token("@")]
    At,

    #[token("==")]
    EqEq,
    #[token("===")]
    EqEqEq,
    #[token("!=")]
    NotEq,
    #[token("!==")]
    NotEqEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token(">>>")]
    UShr,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,

    #[token("!")]
    Bang,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("??")]
    QuestionQuestion,

    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("**=")]
    StarStarEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token(">>>=")]
    UShrEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("&&=")]
    AmpAmpEq,
    #[token("||=")]
    PipePipeEq,
    #[token("??=")]
    QuestionQuestionEq,
}

impl RawToken {
    fn into_kind(self) -> TokenKind {
        match self {
            RawToken::Ident(s) => TokenKind::Ident(s),
            RawToken::Number(n) => TokenKind::Number(n),
            RawToken::String(s) => TokenKind::String(s),
            RawToken::Template(s) => TokenKind::Template(s),
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Semi => TokenKind::Semi,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Ellipsis => TokenKind::Ellipsis,
            RawToken::Dot => TokenKind::Dot,
            RawToken::QuestionDot => TokenKind::QuestionDot,
            RawToken::Question => TokenKind::Question,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::At => TokenKind::At,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::EqEqEq => TokenKind::EqEqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::NotEqEq => TokenKind::NotEqEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Le => TokenKind::Le,
            RawToken::Ge => TokenKind::Ge,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::StarStar => TokenKind::StarStar,
            RawToken::PlusPlus => TokenKind::PlusPlus,
            RawToken::MinusMinus => TokenKind::MinusMinus,
            RawToken::Shl => TokenKind::Shl,
            RawToken::Shr => TokenKind::Shr,
            RawToken::UShr => TokenKind::UShr,
            RawToken::Amp => TokenKind::Amp,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::Caret => TokenKind::Caret,
            RawToken::Tilde => TokenKind::Tilde,
            RawToken::Bang => TokenKind::Bang,
            RawToken::AmpAmp => TokenKind::AmpAmp,
            RawToken::PipePipe => TokenKind::PipePipe,
            RawToken::QuestionQuestion => TokenKind::QuestionQuestion,
            RawToken::Eq => TokenKind::Eq,
            RawToken::PlusEq => TokenKind::PlusEq,
            RawToken::MinusEq => TokenKind::MinusEq,
            RawToken::StarEq => TokenKind::StarEq,
            RawToken::SlashEq => TokenKind::SlashEq,
            RawToken::PercentEq => TokenKind::PercentEq,
            RawToken::StarStarEq => TokenKind::StarStarEq,
            RawToken::ShlEq => TokenKind::ShlEq,
            RawToken::ShrEq => TokenKind::ShrEq,
            RawToken::UShrEq => TokenKind::UShrEq,
            RawToken::AmpEq => TokenKind::AmpEq,
            RawToken::PipeEq => TokenKind::PipeEq,
            RawToken::CaretEq => TokenKind::CaretEq,
            RawToken::AmpAmpEq => TokenKind::AmpAmpEq,
            RawToken::PipePipeEq => TokenKind::PipePipeEq,
            RawToken::QuestionQuestionEq => TokenKind::QuestionQuestionEq,
        }
    }
}

/// Lex `source[start..end]`, producing tokens with spans absolute to `source`.
///
/// The returned vector always ends with an `Eof` token.
pub fn tokenize(source: &str, start: usize, end: usize) -> Result<Vec<Token>, LexError> {
    let mut start = start;
    if start == 0 && source.starts_with("#!") {
        // Hashbang line
        start = source.find('\n').unwrap_or(source.len());
    }
    let input = &source[start..end];

    let mut tokens = Vec::new();
    let mut prev_end = start;
    let mut lexer = RawToken::lexer(input);

    while let Some(raw) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(start + range.start, start + range.end);
        let kind = match raw {
            Ok(raw) => raw.into_kind(),
            Err(()) => {
                return Err(LexError {
                    message: describe_bad_input(lexer.slice()),
                    offset: span.start,
                })
            }
        };
        let newline_before = source[prev_end..span.start].contains('\n');
        prev_end = span.end;
        tokens.push(Token {
            kind,
            span,
            newline_before,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
        newline_before: source[prev_end..end].contains('\n'),
    });
    Ok(tokens)
}

fn describe_bad_input(slice: &str) -> String {
    match slice.chars().next() {
        Some('"') | Some('\'') => "unterminated string literal".to_string(),
        Some('`') => "unterminated template literal".to_string(),
        Some('/') => "unterminated comment or unsupported regular expression".to_string(),
        Some('#') => "private names are not supported".to_string(),
        Some(c) => format!("unexpected character '{}'", c),
        None => "unexpected end of input".to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Literal Decoding
// ═══════════════════════════════════════════════════════════════════════

fn parse_decimal(slice: &str) -> Option<f64> {
    let cleaned: String = slice.chars().filter(|c| *c != '_').collect();
    cleaned.parse::<f64>().ok()
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    let mut value = 0f64;
    for c in digits.chars().filter(|c| *c != '_') {
        value = value * radix as f64 + c.to_digit(radix)? as f64;
    }
    Some(value)
}

fn strip_quotes(slice: &str) -> &str {
    &slice[1..slice.len() - 1]
}

/// Decode the escape sequences of a string or template chunk.
///
/// Returns `None` on a malformed `\x`/`\u` escape.
pub fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            '0' => out.push('\0'),
            'x' => {
                let hex: String = (0..2).filter_map(|_| chars.next()).collect();
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            'u' => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut hex = String::new();
                    loop {
                        match chars.next()? {
                            '}' => break,
                            h => hex.push(h),
                        }
                    }
                    u32::from_str_radix(&hex, 16).ok()?
                } else {
                    let hex: String = (0..4).filter_map(|_| chars.next()).collect();
                    u32::from_str_radix(&hex, 16).ok()?
                };
                // Lone surrogates have no `char`; substitute the replacement character
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' => {}
            other => out.push(other),
        }
    }
    Some(out)
}

fn lex_template(lex: &mut logos::Lexer<RawToken>) -> Option<String> {
    let rest = lex.remainder();
    let end = template_end(rest.as_bytes(), 0)?;
    lex.bump(end + 1);
    Some(rest[..end].to_string())
}

/// Index of the backtick closing a template whose body starts at `from`.
fn template_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i),
            b'$' if bytes.get(i + 1) == Some(&b'{') => i = interpolation_end(bytes, i + 2)? + 1,
            _ => i += 1,
        }
    }
    None
}

/// Index of the `}` closing an interpolation whose body starts at `from`.
pub(crate) fn interpolation_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            b'`' => i = template_end(bytes, i + 1)?,
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src, 0, src.len())
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_lex_numbers_in_all_bases() {
        assert_eq!(
            kinds("1_000 0x1F 0o17 0b101 .5 2e3"),
            vec![
                TokenKind::Number(1000.0),
                TokenKind::Number(31.0),
                TokenKind::Number(15.0),
                TokenKind::Number(5.0),
                TokenKind::Number(0.5),
                TokenKind::Number(2000.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_string_escapes() {
        assert_eq!(
            kinds(r#""a\n\"b" 'cA\u{1F600}'"#),
            vec![
                TokenKind::String("a\n\"b".to_string()),
                TokenKind::String("cA\u{1F600}".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_template_keeps_raw_body() {
        assert_eq!(
            kinds("`a ${ {x: `in`}.x } b`"),
            vec![
                TokenKind::Template("a ${ {x: `in`}.x } b".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_lex_longest_punctuator_wins() {
        assert_eq!(
            kinds("a >>>= b ?? c?.d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::UShrEq,
                TokenKind::Ident("b".into()),
                TokenKind::QuestionQuestion,
                TokenKind::Ident("c".into()),
                TokenKind::QuestionDot,
                TokenKind::Ident("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_skips_comments_and_tracks_newlines() {
        let tokens = tokenize("a /* x\n */ b // c\nd", 0, 19).unwrap();
        let flags: Vec<bool> = tokens.iter().map(|t| t.newline_before).collect();
        assert_eq!(flags, vec![false, true, true, false]);
    }

    #[test]
    fn test_lex_reports_unterminated_string() {
        let err = tokenize("x = 'abc", 0, 8).unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_lex_subrange_has_absolute_spans() {
        let src = "`${a + b}`";
        let tokens = tokenize(src, 3, 8).unwrap();
        assert_eq!(tokens[0].span, Span::new(3, 4));
        assert_eq!(tokens[2].span, Span::new(7, 8));
    }
}
