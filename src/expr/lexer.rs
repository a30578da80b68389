// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tokenizer for the expression language.

use crate::error::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Int(i64),
    Str(String),
    Ident(String),
    Dot,
    Comma,
    LParen,
    RParen,
    Question,
    Colon,
    Plus,
    Minus,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Eof,
}

/// A token with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) offset: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let token = match c {
            b'0'..=b'9' => {
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                let digits = &source[start..pos];
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| SyntaxError::new(start, format!("integer {digits} is too large")))?;
                tokens.push(Spanned {
                    token: Token::Int(value),
                    offset: start,
                });
                continue;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                    pos += 1;
                }
                tokens.push(Spanned {
                    token: Token::Ident(source[start..pos].to_string()),
                    offset: start,
                });
                continue;
            }
            b'"' | b'\'' => {
                let (text, end) = string_literal(source, start)?;
                pos = end;
                tokens.push(Spanned {
                    token: Token::Str(text),
                    offset: start,
                });
                continue;
            }
            b'.' => Token::Dot,
            b',' => Token::Comma,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'?' => Token::Question,
            b':' => Token::Colon,
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'=' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 1;
                Token::EqEq
            }
            b'!' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 1;
                Token::NotEq
            }
            b'!' => Token::Bang,
            b'<' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 1;
                Token::Le
            }
            b'<' => Token::Lt,
            b'>' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 1;
                Token::Ge
            }
            b'>' => Token::Gt,
            b'&' if bytes.get(pos + 1) == Some(&b'&') => {
                pos += 1;
                Token::AndAnd
            }
            b'|' if bytes.get(pos + 1) == Some(&b'|') => {
                pos += 1;
                Token::OrOr
            }
            _ => {
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(SyntaxError::new(start, format!("unexpected character {ch:?}")));
            }
        };

        pos += 1;
        tokens.push(Spanned {
            token,
            offset: start,
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: source.len(),
    });
    Ok(tokens)
}

/// Reads a quoted literal starting at `start`; returns the text and the
/// offset just past the closing quote.
fn string_literal(source: &str, start: usize) -> Result<(String, usize), SyntaxError> {
    let mut chars = source[start..].char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(SyntaxError::new(start, "expected string literal"));
    };

    let mut text = String::new();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, escaped @ ('\\' | '"' | '\''))) => text.push(escaped),
                Some((_, 'r')) => text.push('\r'),
                Some((_, 'n')) => text.push('\n'),
                Some((j, other)) => {
                    return Err(SyntaxError::new(
                        start + j,
                        format!("unknown escape \\{other}"),
                    ));
                }
                None => break,
            },
            c if c == quote => return Ok((text, start + i + c.len_utf8())),
            c => text.push(c),
        }
    }
    Err(SyntaxError::new(start, "unterminated string literal"))
}
