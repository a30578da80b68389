// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recursive-descent parser producing [`Expr`] trees.

use crate::error::SyntaxError;

use super::lexer::{Spanned, Token, tokenize};
use super::{Namespace, Value};

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `int(x)`: parse text as an integer.
    Int,
    /// `abs(x)`: absolute value of an integer.
    Abs,
    /// `str(x)`: render any value as text.
    Str,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "abs" => Some(Self::Abs),
            "str" => Some(Self::Str),
            _ => None,
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Boolean negation.
    Not,
    /// Integer negation.
    Neg,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Integer addition, or concatenation when either side is text.
    Add,
    /// Integer subtraction.
    Sub,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Short-circuit AND.
    And,
    /// Short-circuit OR.
    Or,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A constant.
    Literal(Value),
    /// A `namespace.name` reference.
    Field(Namespace, String),
    /// A built-in function call.
    Call(Function, Box<Expr>),
    /// A prefix operation.
    Unary(UnaryOp, Box<Expr>),
    /// An infix operation.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `condition ? then : otherwise`.
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// Parses an expression.
///
/// # Errors
///
/// Returns a [`SyntaxError`] pointing at the offending offset.
///
/// # Examples
///
/// ```
/// use niles_lib::expr::parse;
///
/// assert!(parse("abs(params.steps)").is_ok());
/// assert!(parse("eval(params.steps)").is_err());
/// assert!(parse("globals.x").is_err());
/// ```
pub fn parse(source: &str) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(SyntaxError::new(
            parser.offset(),
            format!("unexpected {} after expression", describe(other)),
        )),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token list always ends with Eof and `advance` never moves past it.
        &self.tokens[self.pos].token
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].offset
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), SyntaxError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(SyntaxError::new(
                self.offset(),
                format!("expected {what}, found {}", describe(self.peek())),
            ))
        }
    }

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        let condition = self.or()?;
        if *self.peek() != Token::Question {
            return Ok(condition);
        }
        self.advance();
        let then = self.expression()?;
        self.expect(&Token::Colon, "':'")?;
        let otherwise = self.expression()?;
        Ok(Expr::Conditional(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.and()?;
        while *self.peek() == Token::OrOr {
            self.advance();
            let right = self.and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.equality()?;
        while *self.peek() == Token::AndAnd {
            self.advance();
            let right = self.equality()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.compare()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.compare()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn compare(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek() {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.primary(),
        };
        self.advance();
        let operand = self.unary()?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let offset = self.offset();
        match self.advance() {
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => self.identifier(&name, offset),
            other => Err(SyntaxError::new(
                offset,
                format!("expected a value, found {}", describe(&other)),
            )),
        }
    }

    fn identifier(&mut self, name: &str, offset: usize) -> Result<Expr, SyntaxError> {
        match name {
            "true" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" => return Ok(Expr::Literal(Value::Bool(false))),
            _ => {}
        }

        if *self.peek() == Token::LParen {
            let function = Function::from_name(name)
                .ok_or_else(|| SyntaxError::new(offset, format!("unknown function {name}")))?;
            self.advance();
            let argument = self.expression()?;
            if *self.peek() == Token::Comma {
                return Err(SyntaxError::new(
                    self.offset(),
                    format!("function {name} takes one argument"),
                ));
            }
            self.expect(&Token::RParen, "')'")?;
            return Ok(Expr::Call(function, Box::new(argument)));
        }

        let namespace = Namespace::from_keyword(name).ok_or_else(|| {
            SyntaxError::new(
                offset,
                format!("unknown name {name}; expected params, state or props"),
            )
        })?;
        self.expect(&Token::Dot, "'.' after namespace")?;
        let field_offset = self.offset();
        match self.advance() {
            Token::Ident(field) => Ok(Expr::Field(namespace, field)),
            other => Err(SyntaxError::new(
                field_offset,
                format!("expected field name, found {}", describe(&other)),
            )),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Int(n) => format!("integer {n}"),
        Token::Str(s) => format!("string {s:?}"),
        Token::Ident(name) => format!("name {name}"),
        Token::Eof => "end of input".to_string(),
        other => format!("{other:?}"),
    }
}
