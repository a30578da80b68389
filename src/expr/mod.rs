// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small closed expression language for command templates.
//!
//! Command formats, repeat counts and execution conditions may be written
//! as expressions evaluated against three read-only namespaces:
//!
//! | Namespace | Bound to |
//! |-----------|----------|
//! | `params`  | Parameters supplied with the action |
//! | `state`   | Snapshot of the target zone (or receiver) state |
//! | `props`   | Device configuration properties |
//!
//! # Grammar
//!
//! ```text
//! expr     := or ( "?" expr ":" expr )?
//! or       := and ( "||" and )*
//! and      := equality ( "&&" equality )*
//! equality := compare ( ( "==" | "!=" ) compare )*
//! compare  := additive ( ( "<" | "<=" | ">" | ">=" ) additive )*
//! additive := unary ( ( "+" | "-" ) unary )*
//! unary    := ( "!" | "-" ) unary | primary
//! primary  := INTEGER | STRING | "true" | "false"
//!           | NAMESPACE "." NAME
//!           | ( "int" | "abs" | "str" ) "(" expr ")"
//!           | "(" expr ")"
//! ```
//!
//! `+` adds two integers and concatenates when either side is text. There is
//! no general-purpose evaluation: unknown functions and namespaces are
//! rejected when the expression is parsed.
//!
//! # Examples
//!
//! ```
//! use niles_lib::expr::{Bindings, Scope, Value, parse};
//!
//! let expr = parse(r#"params.target - state.volume > 0 ? "12" : "13""#).unwrap();
//!
//! let params = Bindings::from([("target".to_string(), Value::Int(65))]);
//! let state = Bindings::from([("volume".to_string(), Value::Int(40))]);
//! let props = Bindings::new();
//!
//! let value = expr.eval(&Scope::new(&params, &state, &props)).unwrap();
//! assert_eq!(value, Value::from("12"));
//! ```

mod eval;
mod lexer;
mod parser;

use std::collections::HashMap;
use std::fmt;

pub use parser::{BinaryOp, Expr, Function, UnaryOp, parse};

use crate::error::CompileError;

/// One of the three namespaces an expression can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Parameters supplied with the action.
    Params,
    /// Current state of the target.
    State,
    /// Device configuration properties.
    Props,
}

impl Namespace {
    /// Returns the namespace keyword as written in expressions.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::State => "state",
            Self::Props => "props",
        }
    }

    /// Looks up a namespace by keyword.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "params" => Some(Self::Params),
            "state" => Some(Self::State),
            "props" => Some(Self::Props),
            _ => None,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value produced or consumed by an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Text.
    Str(String),
    /// Boolean.
    Bool(bool),
}

impl Value {
    /// Returns the name of this value's type, for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Str(_) => "text",
            Self::Bool(_) => "boolean",
        }
    }

    /// Returns the integer, or a type error.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::TypeMismatch` if the value is not an integer.
    pub fn as_int(&self) -> Result<i64, CompileError> {
        match self {
            Self::Int(n) => Ok(*n),
            other => Err(CompileError::TypeMismatch {
                expected: "integer",
                found: other.type_name(),
            }),
        }
    }

    /// Returns the boolean, or a type error.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::TypeMismatch` if the value is not a boolean.
    pub fn as_bool(&self) -> Result<bool, CompileError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(CompileError::TypeMismatch {
                expected: "boolean",
                found: other.type_name(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Name-to-value bindings for one namespace.
pub type Bindings = HashMap<String, Value>;

/// The three namespaces visible to an expression.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    params: &'a Bindings,
    state: &'a Bindings,
    props: &'a Bindings,
}

impl<'a> Scope<'a> {
    /// Creates a scope over the given bindings.
    #[must_use]
    pub fn new(params: &'a Bindings, state: &'a Bindings, props: &'a Bindings) -> Self {
        Self {
            params,
            state,
            props,
        }
    }

    /// Resolves `namespace.name`.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::UnknownField` if the name is not bound.
    pub fn lookup(&self, namespace: Namespace, name: &str) -> Result<&'a Value, CompileError> {
        let bindings = match namespace {
            Namespace::Params => self.params,
            Namespace::State => self.state,
            Namespace::Props => self.props,
        };
        bindings
            .get(name)
            .ok_or_else(|| CompileError::UnknownField {
                namespace,
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_keywords_round_trip() {
        for ns in [Namespace::Params, Namespace::State, Namespace::Props] {
            assert_eq!(Namespace::from_keyword(ns.as_str()), Some(ns));
        }
        assert_eq!(Namespace::from_keyword("globals"), None);
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::from("zsc").to_string(), "zsc");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn scope_lookup_reports_missing_field() {
        let empty = Bindings::new();
        let scope = Scope::new(&empty, &empty, &empty);
        let err = scope.lookup(Namespace::Props, "source1Label").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownField {
                namespace: Namespace::Props,
                name: "source1Label".to_string()
            }
        );
    }
}
