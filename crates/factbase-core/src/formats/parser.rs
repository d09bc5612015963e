//! # TA Parser
//!
//! Section-driven reader for Tuple-Attribute text. Produces a
//! [`TaDocument`]; nothing here touches a store.
//!
//! ## Sections
//!
//! | Header           | Body                                   |
//! |------------------|----------------------------------------|
//! | `SCHEME TUPLE`   | skipped verbatim                       |
//! | `FACT TUPLE`     | `relation first second` per line       |
//! | `FACT ATTRIBUTE` | `target { key = value ... }` per line  |
//!
//! Headers are recognized by line prefix, except inside a block comment.
//! A `FACT ATTRIBUTE` header before any `FACT TUPLE` header is an error,
//! as is text with no `FACT TUPLE` section at all.

use super::document::{BlockTarget, TaDocument};
use super::lexer::{LexMode, Lexer, Token, TokenKind};
use crate::config::FactConfig;
use crate::primitives::{ATTRIBUTE_HEADER, SCHEME_HEADER, TUPLE_HEADER};
use crate::types::{AttributeMap, EdgeKind, FactError, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Scheme,
    Tuple,
    Attribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    Scheme,
    Tuple,
    Attribute,
}

impl Header {
    /// The header a line opens, with the text following the header word.
    fn detect(line: &str) -> Option<(Self, &str)> {
        let line = line.trim_start();
        [
            (Self::Scheme, SCHEME_HEADER),
            (Self::Tuple, TUPLE_HEADER),
            (Self::Attribute, ATTRIBUTE_HEADER),
        ]
        .into_iter()
        .find_map(|(header, prefix)| line.strip_prefix(prefix).map(|rest| (header, rest)))
    }
}

/// Parse TA text into a document.
///
/// Every relation tag and node kind tag is checked against `config` as it
/// is read, so errors carry the line of the offending tuple.
pub fn parse_document(text: &str, config: &FactConfig) -> Result<TaDocument, FactError> {
    let mut doc = TaDocument::new();
    let mut lexer = Lexer::new();
    let mut section = Section::Preamble;
    let mut seen_tuples = false;
    let mut last_line = 0usize;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;

        if !lexer.in_block_comment() {
            if let Some((header, rest)) = Header::detect(raw) {
                section = match header {
                    Header::Scheme if section == Section::Scheme => {
                        return Err(FactError::format(
                            line_no,
                            "SCHEME TUPLE header repeated inside the scheme section",
                        ));
                    }
                    Header::Scheme => Section::Scheme,
                    Header::Tuple => {
                        seen_tuples = true;
                        Section::Tuple
                    }
                    Header::Attribute if !seen_tuples => {
                        return Err(FactError::format(
                            line_no,
                            "FACT ATTRIBUTE section before any FACT TUPLE section",
                        ));
                    }
                    Header::Attribute => Section::Attribute,
                };
                // Only comment state matters after the header word.
                let trailing = lexer.tokenize(rest, line_no, LexMode::Tuple)?;
                if trailing.iter().any(|t| !matches!(&t.kind, TokenKind::Word(w) if w == ":")) {
                    tracing::debug!(line = line_no, "ignoring text after section header");
                }
                continue;
            }
        }

        match section {
            Section::Scheme => {
                if let Err(e) = lexer.tokenize(raw, line_no, LexMode::Tuple) {
                    tracing::debug!(line = line_no, error = %e, "unreadable scheme line skipped");
                }
            }
            Section::Preamble => {
                if !lexer.tokenize(raw, line_no, LexMode::Tuple)?.is_empty() {
                    tracing::debug!(line = line_no, "ignoring text before the first section");
                }
            }
            Section::Tuple => {
                let tokens = lexer.tokenize(raw, line_no, LexMode::Tuple)?;
                if !tokens.is_empty() {
                    parse_tuple(&tokens, line_no, config, &mut doc)?;
                }
            }
            Section::Attribute => {
                let tokens = lexer.tokenize(raw, line_no, LexMode::Attribute)?;
                if !tokens.is_empty() {
                    parse_attribute_line(&tokens, line_no, &mut doc)?;
                }
            }
        }
    }

    if !seen_tuples {
        return Err(FactError::format(last_line, "missing FACT TUPLE section"));
    }

    tracing::debug!(
        relations = doc.relations().len(),
        tuples = doc.tuple_count(),
        blocks = doc.blocks().len(),
        "TA text parsed"
    );
    Ok(doc)
}

// =============================================================================
// TUPLE LINES
// =============================================================================

fn parse_tuple(
    tokens: &[Token],
    line_no: usize,
    config: &FactConfig,
    doc: &mut TaDocument,
) -> Result<(), FactError> {
    let [relation, first, second] = tokens else {
        return Err(FactError::format(
            line_no,
            format!(
                "expected `relation first second`, found {} token(s)",
                tokens.len()
            ),
        ));
    };
    let (relation, first, second) = (word(relation)?, word(first)?, word(second)?);

    if relation == config.entity_relation {
        if NodeKind::from_tag(second).is_none() {
            return Err(FactError::format(
                line_no,
                format!("unknown node kind `{}`", second),
            ));
        }
    } else if EdgeKind::from_tag(relation).is_none() {
        return Err(FactError::format(
            line_no,
            format!("unknown relation `{}`", relation),
        ));
    }

    doc.add_tuple(relation, first, second, line_no);
    Ok(())
}

fn word(token: &Token) -> Result<&str, FactError> {
    match &token.kind {
        TokenKind::Word(w) => Ok(w),
        other => Err(FactError::format(
            token.line,
            format!("expected a word at column {}, found {}", token.column, other),
        )),
    }
}

// =============================================================================
// ATTRIBUTE LINES
// =============================================================================
//
// line   := target '{' entry* '}'
// target := WORD | '(' WORD WORD ')'
// entry  := WORD '=' value
// value  := WORD | '(' WORD* ')'

struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    line: usize,
}

impl<'t> Cursor<'t> {
    fn peek(&self) -> Option<&'t TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn bump(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn error(&self, message: impl Into<String>) -> FactError {
        FactError::format(self.line, message)
    }

    fn unexpected(&self, wanted: &str, found: Option<&Token>) -> FactError {
        match found {
            Some(token) => self.error(format!(
                "expected {} at column {}, found {}",
                wanted, token.column, token.kind
            )),
            None => self.error(format!("expected {}, found end of line", wanted)),
        }
    }

    fn expect_word(&mut self, wanted: &str) -> Result<String, FactError> {
        match self.bump() {
            Some(Token {
                kind: TokenKind::Word(w),
                ..
            }) => Ok(w.clone()),
            other => Err(self.unexpected(wanted, other)),
        }
    }

    fn expect(&mut self, kind: &TokenKind, wanted: &str) -> Result<(), FactError> {
        match self.bump() {
            Some(token) if &token.kind == kind => Ok(()),
            other => Err(self.unexpected(wanted, other)),
        }
    }
}

fn parse_attribute_line(
    tokens: &[Token],
    line_no: usize,
    doc: &mut TaDocument,
) -> Result<(), FactError> {
    let mut cursor = Cursor {
        tokens,
        pos: 0,
        line: line_no,
    };

    let target = match cursor.peek() {
        Some(TokenKind::LParen) => {
            cursor.bump();
            let first = cursor.expect_word("the first id of an edge target")?;
            let second = cursor.expect_word("the second id of an edge target")?;
            cursor.expect(&TokenKind::RParen, "`)` closing the edge target")?;
            BlockTarget::Pair(first, second)
        }
        Some(TokenKind::Word(_)) => BlockTarget::Entity(cursor.expect_word("an entity id")?),
        _ => {
            let found = cursor.bump();
            return Err(cursor.unexpected("an entity id or `(`", found));
        }
    };

    cursor.expect(&TokenKind::LBrace, "`{`")?;
    let mut attributes = AttributeMap::new();

    loop {
        match cursor.peek() {
            Some(TokenKind::RBrace) => {
                cursor.bump();
                break;
            }
            Some(TokenKind::Word(_)) => {
                let key = cursor.expect_word("an attribute key")?;
                cursor.expect(
                    &TokenKind::Equals,
                    &format!("`=` after attribute key `{}`", key),
                )?;
                for value in parse_value(&mut cursor, &key)? {
                    attributes.insert(key.as_str(), value);
                }
            }
            None => return Err(cursor.error("unterminated `{`")),
            Some(_) => {
                let found = cursor.bump();
                return Err(cursor.unexpected("an attribute key or `}`", found));
            }
        }
    }

    if let Some(extra) = cursor.bump() {
        return Err(cursor.error(format!(
            "unexpected {} at column {} after `}}`",
            extra.kind, extra.column
        )));
    }

    doc.add_block(target, attributes, line_no);
    Ok(())
}

fn parse_value(cursor: &mut Cursor<'_>, key: &str) -> Result<Vec<String>, FactError> {
    match cursor.bump() {
        Some(Token {
            kind: TokenKind::Word(w),
            ..
        }) => Ok(vec![w.clone()]),
        Some(Token {
            kind: TokenKind::LParen,
            ..
        }) => {
            let mut values = Vec::new();
            loop {
                match cursor.bump() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => return Ok(values),
                    Some(Token {
                        kind: TokenKind::Word(w),
                        ..
                    }) => values.push(w.clone()),
                    None => {
                        return Err(cursor.error(format!("unterminated `(` in value of `{}`", key)));
                    }
                    other => return Err(cursor.unexpected("a value or `)`", other)),
                }
            }
        }
        other => Err(cursor.unexpected(&format!("a value for `{}`", key), other)),
    }
}

// =============================================================================
// TESTS
// =============================================================================
