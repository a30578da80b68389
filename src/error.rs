// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Niles receiver library.
//!
//! Errors are grouped by the stage at which they occur:
//!
//! - [`ConfigError`]: the profile (actions, commands, patterns) is malformed.
//!   Raised once at load time and fatal to receiver startup.
//! - [`CompileError`]: an action could not be turned into protocol lines.
//!   Nothing has been written when this is returned.
//! - [`TransportError`]: a write failed mid-dispatch, or a line was not a
//!   single ASCII protocol line. Lines already written stay written.
//! - [`DecodeError`]: a response line matched a pattern but a captured field
//!   could not be converted. Only that line is dropped.
//!
//! Lines that match no pattern at all are not errors; they are reported as
//! [`ReceiverEvent::UnmatchedLine`](crate::event::ReceiverEvent::UnmatchedLine).

use thiserror::Error;

use crate::expr::Namespace;
use crate::types::ZoneId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The receiver profile is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An action could not be compiled into protocol commands.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// Writing to the transport failed part way through a dispatch.
    #[error("dispatch failed after {sent} write(s): {source}")]
    Dispatch {
        /// Number of lines written before the failure.
        sent: usize,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The link to the receiver could not be opened.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response line could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The zone is not registered with this receiver.
    #[error("zone {0} is not registered")]
    UnknownZone(ZoneId),

    /// The zone is already registered with this receiver.
    #[error("zone {0} is already registered")]
    DuplicateZone(ZoneId),

    /// The receiver has been shut down or its worker has stopped.
    #[error("receiver is not running")]
    NotRunning,

    /// The dispatch was abandoned because the receiver is shutting down.
    #[error("dispatch cancelled")]
    Cancelled,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// Text that should hold a number does not.
    #[error("not a number: {0:?}")]
    NotANumber(String),
}

/// A syntax error in a command template or expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} at offset {offset}")]
pub struct SyntaxError {
    /// Byte offset into the source text.
    pub offset: usize,
    /// What went wrong.
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Errors raised while loading a receiver profile.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The profile document is not valid JSON or does not match the schema.
    #[error("invalid profile document: {0}")]
    Json(#[from] serde_json::Error),

    /// A command template or expression failed to parse.
    #[error("invalid {what} in {context}: {source}")]
    Syntax {
        /// Which part was being parsed (`format`, `repeat`, `condition`).
        what: &'static str,
        /// The action and command being loaded.
        context: String,
        /// The parse failure.
        #[source]
        source: SyntaxError,
    },

    /// A response pattern is not a valid regular expression.
    #[error("invalid pattern {id}: {source}")]
    Pattern {
        /// The pattern identifier.
        id: String,
        /// The regex compilation failure.
        #[source]
        source: regex::Error,
    },

    /// A response pattern lacks a capture group its update routine needs.
    #[error("pattern {pattern} is missing capture group {group}")]
    MissingCaptureGroup {
        /// The pattern identifier.
        pattern: String,
        /// The required group name.
        group: &'static str,
    },

    /// Two actions share an identifier.
    #[error("duplicate action id: {0}")]
    DuplicateAction(String),

    /// Two response patterns share an identifier.
    #[error("duplicate pattern id: {0}")]
    DuplicatePattern(String),

    /// An action declares no commands.
    #[error("action {0} has no commands")]
    EmptyAction(String),

    /// An action names a follow-up action that does not exist.
    #[error("action {action} names unknown follow-up {follow_up}")]
    UnknownFollowUp {
        /// The declaring action.
        action: String,
        /// The missing follow-up identifier.
        follow_up: String,
    },

    /// A parameter declaration is inconsistent.
    #[error("invalid parameter {param} on action {action}: {message}")]
    InvalidParam {
        /// The declaring action.
        action: String,
        /// The parameter identifier.
        param: String,
        /// Description of the problem.
        message: String,
    },

    /// A numeric setting is negative, not finite, or otherwise unusable.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Description of the problem.
        message: String,
    },
}

/// Errors raised while compiling an action into protocol lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// No action with this identifier exists in the profile.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The action targets a different kind of device.
    #[error("action {action} applies to a {expected} device")]
    TargetMismatch {
        /// The action identifier.
        action: String,
        /// The device kind the action applies to.
        expected: &'static str,
    },

    /// A required parameter was not supplied and has no default.
    #[error("action {action} requires parameter {param}")]
    MissingParameter {
        /// The action identifier.
        action: String,
        /// The missing parameter.
        param: String,
    },

    /// A supplied parameter does not satisfy its declaration.
    #[error("invalid value {value:?} for parameter {param}")]
    InvalidParameter {
        /// The parameter identifier.
        param: String,
        /// The supplied value.
        value: String,
    },

    /// An expression or placeholder referenced a name that is not bound.
    #[error("unknown field {namespace}.{name}")]
    UnknownField {
        /// The namespace that was searched.
        namespace: Namespace,
        /// The missing name.
        name: String,
    },

    /// An operator was applied to a value of the wrong type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The type the operator needs.
        expected: &'static str,
        /// The type it was given.
        found: &'static str,
    },

    /// `int(...)` was applied to text that is not an integer.
    #[error("not an integer: {0:?}")]
    NotAnInteger(String),

    /// Integer arithmetic overflowed.
    #[error("integer overflow")]
    Overflow,

    /// A repeat count evaluated to a negative or non-integer value.
    #[error("invalid repeat count {value:?} for command {command}")]
    InvalidRepeatCount {
        /// The command name.
        command: String,
        /// The evaluated value.
        value: String,
    },
}

/// Errors related to the byte transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream has been closed.
    #[error("transport closed")]
    Closed,

    /// The line cannot be sent as a single protocol line.
    #[error("cannot send {line:?}: {reason}")]
    InvalidLine {
        /// The rejected line.
        line: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Errors raised while decoding a matched response line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A capture group the update routine needs did not participate.
    #[error("missing field in response: {0}")]
    MissingField(&'static str),

    /// A numeric field is not an integer.
    #[error("field {field} is not an integer: {value:?}")]
    InvalidInteger {
        /// The field name.
        field: &'static str,
        /// The captured text.
        value: String,
    },

    /// A flag field is neither `0` nor `1`.
    #[error("field {field} is not a 0/1 flag: {value:?}")]
    InvalidFlag {
        /// The field name.
        field: &'static str,
        /// The captured text.
        value: String,
    },

    /// A numeric field is outside its allowed range.
    #[error("field {field}: {source}")]
    OutOfRange {
        /// The field name.
        field: &'static str,
        /// The range violation.
        #[source]
        source: ValueError,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 150,
        };
        assert_eq!(err.to_string(), "value 150 is out of range [0, 100]");
    }

    #[test]
    fn error_from_compile_error() {
        let err: Error = CompileError::UnknownAction("nope".to_string()).into();
        assert!(matches!(err, Error::Compile(CompileError::UnknownAction(ref id)) if id == "nope"));
    }

    #[test]
    fn dispatch_error_display() {
        let err = Error::Dispatch {
            sent: 3,
            source: TransportError::Closed,
        };
        assert_eq!(err.to_string(), "dispatch failed after 3 write(s): transport closed");
    }

    #[test]
    fn decode_error_display() {
        let err = DecodeError::InvalidInteger {
            field: "volume",
            value: "4x".to_string(),
        };
        assert_eq!(err.to_string(), "field volume is not an integer: \"4x\"");
    }

    #[test]
    fn unknown_field_display() {
        let err = CompileError::UnknownField {
            namespace: Namespace::State,
            name: "volume".to_string(),
        };
        assert_eq!(err.to_string(), "unknown field state.volume");
    }
}
