//! # TA Lexer
//!
//! Turns one line of Tuple-Attribute text into a flat token stream with
//! position metadata. Comment state is carried across lines, so the same
//! `Lexer` must see every line of a section in order.
//!
//! - `//` drops the rest of the line.
//! - `/* ... */` is elided and may span lines; it separates tokens.
//! - `"..."` quotes a token. Inside quotes `\"`, `\\`, `\n` and `\r` are
//!   escapes; comment markers are literal.
//! - In attribute mode `{ } ( ) =` are tokens of their own. In tuple mode
//!   they are ordinary word characters.

use crate::primitives::{BLOCK_COMMENT_END, BLOCK_COMMENT_START, LINE_COMMENT};
use crate::types::FactError;
use std::fmt;

/// What a token is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Equals,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Word(w) => write!(f, "`{}`", w),
            TokenKind::LBrace => f.write_str("`{`"),
            TokenKind::RBrace => f.write_str("`}`"),
            TokenKind::LParen => f.write_str("`(`"),
            TokenKind::RParen => f.write_str("`)`"),
            TokenKind::Equals => f.write_str("`=`"),
        }
    }
}

/// A token and where it started (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Which characters are punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// Relation lines: whitespace-separated words only.
    Tuple,
    /// Attribute lines: words plus `{ } ( ) =`.
    Attribute,
}

/// Line tokenizer with block-comment state.
#[derive(Debug, Default)]
pub struct Lexer {
    in_block_comment: bool,
}

impl Lexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the previous line left a block comment open.
    #[must_use]
    pub fn in_block_comment(&self) -> bool {
        self.in_block_comment
    }

    /// Tokenize one line. An empty result means the line carried nothing
    /// but whitespace and comments.
    pub fn tokenize(
        &mut self,
        line: &str,
        line_no: usize,
        mode: LexMode,
    ) -> Result<Vec<Token>, FactError> {
        let mut tokens = Vec::new();
        let mut word: Option<(String, usize)> = None;
        let mut chars = line.chars().enumerate().peekable();

        while let Some((idx, c)) = chars.next() {
            let column = idx + 1;
            let next = chars.peek().map(|&(_, n)| n);

            if self.in_block_comment {
                if starts_marker(c, next, BLOCK_COMMENT_END) {
                    chars.next();
                    self.in_block_comment = false;
                }
                continue;
            }

            if starts_marker(c, next, LINE_COMMENT) {
                break;
            }
            if starts_marker(c, next, BLOCK_COMMENT_START) {
                chars.next();
                flush(&mut word, &mut tokens, line_no);
                self.in_block_comment = true;
                continue;
            }

            if c == '"' {
                let (text, _) = word.get_or_insert_with(|| (String::new(), column));
                read_quoted(&mut chars, text, line_no, column)?;
                continue;
            }

            if c.is_whitespace() {
                flush(&mut word, &mut tokens, line_no);
                continue;
            }

            if mode == LexMode::Attribute {
                if let Some(kind) = punctuation(c) {
                    flush(&mut word, &mut tokens, line_no);
                    tokens.push(Token {
                        kind,
                        line: line_no,
                        column,
                    });
                    continue;
                }
            }

            word.get_or_insert_with(|| (String::new(), column)).0.push(c);
        }

        flush(&mut word, &mut tokens, line_no);
        Ok(tokens)
    }
}

fn starts_marker(c: char, next: Option<char>, marker: &str) -> bool {
    let mut m = marker.chars();
    m.next() == Some(c) && m.next() == next && next.is_some()
}

fn punctuation(c: char) -> Option<TokenKind> {
    match c {
        '{' => Some(TokenKind::LBrace),
        '}' => Some(TokenKind::RBrace),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '=' => Some(TokenKind::Equals),
        _ => None,
    }
}

fn flush(word: &mut Option<(String, usize)>, tokens: &mut Vec<Token>, line_no: usize) {
    if let Some((text, column)) = word.take() {
        tokens.push(Token {
            kind: TokenKind::Word(text),
            line: line_no,
            column,
        });
    }
}

fn read_quoted<I>(
    chars: &mut std::iter::Peekable<I>,
    out: &mut String,
    line_no: usize,
    column: usize,
) -> Result<(), FactError>
where
    I: Iterator<Item = (usize, char)>,
{
    while let Some((_, c)) = chars.next() {
        match c {
            '"' => return Ok(()),
            '\\' => {
                let escaped = match chars.peek() {
                    Some(&(_, c @ ('"' | '\\'))) => Some(c),
                    Some(&(_, 'n')) => Some('\n'),
                    Some(&(_, 'r')) => Some('\r'),
                    _ => None,
                };
                match escaped {
                    Some(c) => {
                        chars.next();
                        out.push(c);
                    }
                    None => out.push('\\'),
                }
            }
            other => out.push(other),
        }
    }
    Err(FactError::format(
        line_no,
        format!("unterminated string starting at column {}", column),
    ))
}

// =============================================================================
// QUOTING (writer side)
// =============================================================================

/// Whether `token` must be quoted to survive tokenization in either mode.
#[must_use]
pub fn needs_quoting(token: &str) -> bool {
    token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '(' | ')' | '=' | '"'))
        || token.contains(LINE_COMMENT)
        || token.contains(BLOCK_COMMENT_START)
}

/// Render a token so the lexer reads back exactly `token`.
#[must_use]
pub fn quote(token: &str) -> String {
    if !needs_quoting(token) {
        return token.to_string();
    }
    let mut out = String::with_capacity(token.len() + 2);
    out.push('"');
    for c in token.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

// =============================================================================
// TESTS
// =============================================================================
