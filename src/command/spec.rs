// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Action and command specifications.
//!
//! These are the immutable tables a [`Profile`](crate::profile::Profile) is
//! made of. They are built once at load time and never modified.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::expr::{Expr, Value};

use super::FormatTemplate;

/// The kind of device an action is invoked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// The receiver itself (receiver-wide actions).
    Receiver,
    /// A single zone of the receiver.
    Zone,
}

impl DeviceKind {
    /// Returns the lowercase name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Receiver => "receiver",
            Self::Zone => "zone",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type a parameter is converted to before compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Bound as text, with surrounding whitespace removed.
    #[default]
    Text,
    /// Parsed as a signed integer and optionally clamped.
    Integer,
}

/// Declaration of one action parameter.
///
/// # Examples
///
/// ```
/// use niles_lib::command::ParamSpec;
/// use niles_lib::expr::Value;
///
/// let target = ParamSpec::integer("volumeTarget").with_range(0, 100);
/// assert_eq!(target.resolve("setZoneVolume", Some("140")).unwrap(), Some(Value::Int(100)));
/// assert!(target.resolve("setZoneVolume", Some("loud")).is_err());
/// assert!(target.resolve("setZoneVolume", None).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter identifier, bound as `params.<id>`.
    pub id: String,
    /// Value type.
    pub kind: ParamKind,
    /// Whether the parameter must be supplied when there is no default.
    pub required: bool,
    /// Value used when the parameter is not supplied.
    pub default: Option<String>,
    /// Inclusive bounds integer values are clamped to.
    pub range: Option<(i64, i64)>,
}

impl ParamSpec {
    /// Declares a required text parameter.
    #[must_use]
    pub fn text(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ParamKind::Text,
            required: true,
            default: None,
            range: None,
        }
    }

    /// Declares a required integer parameter.
    #[must_use]
    pub fn integer(id: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::Integer,
            ..Self::text(id)
        }
    }

    /// Sets the clamping range for an integer parameter.
    #[must_use]
    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Sets a default value, making the parameter optional.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the parameter optional; it is left unbound when absent.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Converts a supplied value into its bound [`Value`].
    ///
    /// Returns `Ok(None)` for an absent optional parameter without default.
    /// Empty or whitespace-only text counts as absent.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::MissingParameter` if a required parameter is
    /// absent, or `CompileError::InvalidParameter` if an integer parameter
    /// does not parse or text holds control characters (such as a line
    /// terminator) or non-ASCII characters.
    pub fn resolve(&self, action: &str, supplied: Option<&str>) -> Result<Option<Value>, CompileError> {
        let raw = supplied
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(self.default.as_deref());

        let Some(raw) = raw else {
            if self.required {
                return Err(CompileError::MissingParameter {
                    action: action.to_string(),
                    param: self.id.clone(),
                });
            }
            return Ok(None);
        };

        match self.kind {
            ParamKind::Text => {
                // One parameter must never become two protocol lines.
                if raw.chars().any(|c| c.is_ascii_control() || !c.is_ascii()) {
                    return Err(CompileError::InvalidParameter {
                        param: self.id.clone(),
                        value: raw.to_string(),
                    });
                }
                Ok(Some(Value::from(raw)))
            }
            ParamKind::Integer => {
                let parsed: i64 = raw.parse().map_err(|_| CompileError::InvalidParameter {
                    param: self.id.clone(),
                    value: raw.to_string(),
                })?;
                let value = match self.range {
                    Some((min, max)) => parsed.clamp(min, max),
                    None => parsed,
                };
                Ok(Some(Value::Int(value)))
            }
        }
    }
}

/// A single protocol command within an action.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use niles_lib::command::{CommandSpec, FormatTemplate};
/// use niles_lib::expr::parse;
///
/// let pulse = CommandSpec::new("volumeStep", FormatTemplate::literal("zsc,{state.zone},12").unwrap())
///     .with_repeat(parse("abs(params.steps)").unwrap())
///     .with_repeat_delay(Duration::from_millis(100));
/// assert!(pulse.repeat.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Command name used in logs and errors.
    pub name: String,
    /// How the line is produced.
    pub format: FormatTemplate,
    /// How many times the line is written; once when absent.
    pub repeat: Option<Expr>,
    /// Pause between repeated writes of this line.
    pub repeat_delay: Duration,
    /// Predicate that must hold for the command to be sent at all.
    pub condition: Option<Expr>,
}

impl CommandSpec {
    /// Creates a command sent once, unconditionally.
    #[must_use]
    pub fn new(name: impl Into<String>, format: FormatTemplate) -> Self {
        Self {
            name: name.into(),
            format,
            repeat: None,
            repeat_delay: Duration::ZERO,
            condition: None,
        }
    }

    /// Sets the repeat count expression.
    #[must_use]
    pub fn with_repeat(mut self, repeat: Expr) -> Self {
        self.repeat = Some(repeat);
        self
    }

    /// Sets the delay between repeated writes.
    #[must_use]
    pub fn with_repeat_delay(mut self, delay: Duration) -> Self {
        self.repeat_delay = delay;
        self
    }

    /// Sets the execution condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Expr) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// A user-level action: parameters plus the commands it compiles to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    /// Action identifier.
    pub id: String,
    /// The device kind the action is invoked on.
    pub applies_to: DeviceKind,
    /// For receiver actions: compile the commands once per registered zone.
    pub for_each_zone: bool,
    /// Declared parameters, in order.
    pub params: Vec<ParamSpec>,
    /// Commands, in send order.
    pub commands: Vec<CommandSpec>,
    /// Action enqueued after this one dispatches successfully.
    pub follow_up: Option<String>,
}

impl ActionSpec {
    /// Creates an action with no parameters or commands.
    #[must_use]
    pub fn new(id: impl Into<String>, applies_to: DeviceKind) -> Self {
        Self {
            id: id.into(),
            applies_to,
            for_each_zone: false,
            params: Vec::new(),
            commands: Vec::new(),
            follow_up: None,
        }
    }

    /// Adds a parameter declaration.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Appends a command.
    #[must_use]
    pub fn with_command(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
        self
    }

    /// Names the follow-up action.
    #[must_use]
    pub fn with_follow_up(mut self, follow_up: impl Into<String>) -> Self {
        self.follow_up = Some(follow_up.into());
        self
    }

    /// Compiles the commands once per registered zone.
    #[must_use]
    pub fn for_each_zone(mut self) -> Self {
        self.for_each_zone = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_param_trims_and_defaults() {
        let param = ParamSpec::text("station").with_default("101.1");
        assert_eq!(param.resolve("tune", Some(" 98.7 ")).unwrap(), Some(Value::from("98.7")));
        assert_eq!(param.resolve("tune", Some("  ")).unwrap(), Some(Value::from("101.1")));
        assert_eq!(param.resolve("tune", None).unwrap(), Some(Value::from("101.1")));
    }

    #[test]
    fn text_param_rejects_embedded_line_breaks() {
        let param = ParamSpec::text("command");
        for raw in ["znc,5\rznt,10,h", "znc,5\nznt,10,h", "src,11,\t1", "src,11,caf\u{e9}"] {
            let err = param.resolve("sendRawCommand", Some(raw)).unwrap_err();
            assert!(matches!(err, CompileError::InvalidParameter { ref param, .. } if param == "command"), "{raw:?}");
        }
        // Surrounding terminators are trimmed away.
        assert_eq!(param.resolve("sendRawCommand", Some("znc,5\r\n")).unwrap(), Some(Value::from("znc,5")));
    }

    #[test]
    fn optional_param_may_be_absent() {
        let param = ParamSpec::text("note").optional();
        assert_eq!(param.resolve("a", None).unwrap(), None);
    }

    #[test]
    fn missing_required_param() {
        let err = ParamSpec::text("station").resolve("tuneToStation", None).unwrap_err();
        assert_eq!(
            err,
            CompileError::MissingParameter {
                action: "tuneToStation".to_string(),
                param: "station".to_string()
            }
        );
    }

    #[test]
    fn integer_param_clamps() {
        let param = ParamSpec::integer("zoneSource").with_range(1, 6);
        assert_eq!(param.resolve("a", Some("0")).unwrap(), Some(Value::Int(1)));
        assert_eq!(param.resolve("a", Some("4")).unwrap(), Some(Value::Int(4)));
        assert_eq!(param.resolve("a", Some("9")).unwrap(), Some(Value::Int(6)));
    }

    #[test]
    fn integer_param_keeps_sign_without_range() {
        let param = ParamSpec::integer("volumeAdjustment");
        assert_eq!(param.resolve("a", Some("-5")).unwrap(), Some(Value::Int(-5)));
    }

    #[test]
    fn device_kind_display() {
        assert_eq!(DeviceKind::Zone.to_string(), "zone");
        assert_eq!(DeviceKind::Receiver.to_string(), "receiver");
    }
}
