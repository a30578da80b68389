// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command format templates.
//!
//! A template is either literal text with `{namespace.name}` placeholders, or
//! an expression producing the whole line. Placeholders are substituted in a
//! single left-to-right pass: replacement text is never scanned again, so a
//! parameter value containing `{state.volume}` is sent verbatim.
//!
//! Literal braces are written `{{` and `}}`.

use std::fmt::Write;

use crate::error::{CompileError, SyntaxError};
use crate::expr::{Expr, Namespace, Scope, parse};

/// One piece of a literal template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    /// Text copied to the line as is.
    Text(String),
    /// A `{namespace.name}` placeholder.
    Field(Namespace, String),
}

/// How a command's protocol line is produced.
///
/// # Examples
///
/// ```
/// use niles_lib::command::FormatTemplate;
/// use niles_lib::expr::{Bindings, Scope, Value};
///
/// let template = FormatTemplate::literal("zsc,{state.zone},{params.source}").unwrap();
///
/// let params = Bindings::from([("source".to_string(), Value::Int(3))]);
/// let state = Bindings::from([("zone".to_string(), Value::Int(2))]);
/// let props = Bindings::new();
///
/// let line = template.render(&Scope::new(&params, &state, &props)).unwrap();
/// assert_eq!(line, "zsc,2,3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatTemplate {
    /// Literal text with placeholders.
    Literal(Vec<TemplateSegment>),
    /// An expression evaluated to the line text.
    Expression(Expr),
}

impl FormatTemplate {
    /// Parses a literal template.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] for unbalanced braces or a placeholder that
    /// is not `namespace.name`.
    pub fn literal(source: &str) -> Result<Self, SyntaxError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                    chars.next();
                    text.push('}');
                }
                '}' => return Err(SyntaxError::new(offset, "unmatched '}'")),
                '{' => {
                    let close = source[offset..]
                        .find('}')
                        .map(|i| offset + i)
                        .ok_or_else(|| SyntaxError::new(offset, "unclosed placeholder"))?;
                    let field = placeholder(&source[offset + 1..close], offset + 1)?;
                    if !text.is_empty() {
                        segments.push(TemplateSegment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(field);
                    while chars.peek().is_some_and(|&(i, _)| i <= close) {
                        chars.next();
                    }
                }
                c => text.push(c),
            }
        }

        if !text.is_empty() {
            segments.push(TemplateSegment::Text(text));
        }
        Ok(Self::Literal(segments))
    }

    /// Parses an expression template.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] if the expression does not parse.
    pub fn expression(source: &str) -> Result<Self, SyntaxError> {
        parse(source).map(Self::Expression)
    }

    /// Returns `true` if this template is an expression.
    #[must_use]
    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression(_))
    }

    /// Renders the protocol line.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if a placeholder is unbound or the
    /// expression fails to evaluate.
    pub fn render(&self, scope: &Scope<'_>) -> Result<String, CompileError> {
        match self {
            Self::Expression(expr) => Ok(expr.eval(scope)?.to_string()),
            Self::Literal(segments) => {
                let mut line = String::new();
                for segment in segments {
                    match segment {
                        TemplateSegment::Text(text) => line.push_str(text),
                        TemplateSegment::Field(namespace, name) => {
                            // Writing to a String cannot fail.
                            let _ = write!(line, "{}", scope.lookup(*namespace, name)?);
                        }
                    }
                }
                Ok(line)
            }
        }
    }
}

fn placeholder(body: &str, offset: usize) -> Result<TemplateSegment, SyntaxError> {
    let trimmed = body.trim();
    let (namespace, name) = trimmed
        .split_once('.')
        .ok_or_else(|| SyntaxError::new(offset, format!("placeholder {trimmed:?} needs namespace.name")))?;
    let namespace = Namespace::from_keyword(namespace).ok_or_else(|| {
        SyntaxError::new(offset, format!("unknown namespace {namespace:?} in placeholder"))
    })?;
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name {
        return Err(SyntaxError::new(offset, format!("invalid field name {name:?}")));
    }
    Ok(TemplateSegment::Field(namespace, name.to_string()))
}
