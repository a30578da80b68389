// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Expression evaluation.

use std::cmp::Ordering;

use crate::error::CompileError;

use super::{BinaryOp, Expr, Function, Scope, UnaryOp, Value};

impl Expr {
    /// Evaluates the expression against `scope`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] for unbound names, type mismatches,
    /// unparsable `int(...)` arguments and integer overflow.
    pub fn eval(&self, scope: &Scope<'_>) -> Result<Value, CompileError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Field(namespace, name) => scope.lookup(*namespace, name).cloned(),
            Self::Call(function, argument) => call(*function, argument.eval(scope)?),
            Self::Unary(op, operand) => {
                let value = operand.eval(scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.as_bool()?)),
                    UnaryOp::Neg => value
                        .as_int()?
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or(CompileError::Overflow),
                }
            }
            Self::Binary(BinaryOp::And, left, right) => {
                if left.eval(scope)?.as_bool()? {
                    Ok(Value::Bool(right.eval(scope)?.as_bool()?))
                } else {
                    Ok(Value::Bool(false))
                }
            }
            Self::Binary(BinaryOp::Or, left, right) => {
                if left.eval(scope)?.as_bool()? {
                    Ok(Value::Bool(true))
                } else {
                    Ok(Value::Bool(right.eval(scope)?.as_bool()?))
                }
            }
            Self::Binary(op, left, right) => binary(*op, left.eval(scope)?, right.eval(scope)?),
            Self::Conditional(condition, then, otherwise) => {
                if condition.eval(scope)?.as_bool()? {
                    then.eval(scope)
                } else {
                    otherwise.eval(scope)
                }
            }
        }
    }
}

fn call(function: Function, argument: Value) -> Result<Value, CompileError> {
    match function {
        Function::Int => match argument {
            Value::Int(n) => Ok(Value::Int(n)),
            Value::Bool(b) => Ok(Value::Int(i64::from(b))),
            Value::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| CompileError::NotAnInteger(s)),
        },
        Function::Abs => argument
            .as_int()?
            .checked_abs()
            .map(Value::Int)
            .ok_or(CompileError::Overflow),
        Function::Str => Ok(Value::Str(argument.to_string())),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, CompileError> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_add(b).map(Value::Int).ok_or(CompileError::Overflow)
            }
            (l @ Value::Str(_), r) | (l, r @ Value::Str(_)) => {
                Ok(Value::Str(format!("{l}{r}")))
            }
            (l, r) => Err(mismatch("integer or text", &l, &r)),
        },
        BinaryOp::Sub => left
            .as_int()?
            .checked_sub(right.as_int()?)
            .map(Value::Int)
            .ok_or(CompileError::Overflow),
        BinaryOp::Eq => equals(&left, &right).map(Value::Bool),
        BinaryOp::Ne => equals(&left, &right).map(|eq| Value::Bool(!eq)),
        BinaryOp::Lt => Ok(Value::Bool(order(&left, &right)? == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(order(&left, &right)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(order(&left, &right)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(order(&left, &right)? != Ordering::Less)),
        BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(left.as_bool()? && right.as_bool()?)),
    }
}

/// Equality across integer and text compares numerically when the text
/// holds an integer, so `params.muteState == 1` works for text parameters.
fn equals(left: &Value, right: &Value) -> Result<bool, CompileError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Int(n), Value::Str(s)) | (Value::Str(s), Value::Int(n)) => {
            Ok(s.trim().parse::<i64>().is_ok_and(|parsed| parsed == *n))
        }
        (l, r) => Err(mismatch("matching types", l, r)),
    }
}

fn order(left: &Value, right: &Value) -> Result<Ordering, CompileError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (l, r) => Err(mismatch("two integers or two texts", l, r)),
    }
}

fn mismatch(expected: &'static str, left: &Value, right: &Value) -> CompileError {
    let found = match left {
        Value::Bool(_) => left.type_name(),
        _ => right.type_name(),
    };
    CompileError::TypeMismatch { expected, found }
}
