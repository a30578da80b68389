// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Action compilation.
//!
//! Compilation is a pure function of the action, the supplied parameters and
//! a state snapshot. It either produces the full ordered command list or
//! fails before anything is written.

use std::collections::HashMap;
use std::time::Duration;

use tracing::trace;

use crate::error::CompileError;
use crate::expr::{Bindings, Scope, Value};

use super::{ActionSpec, CommandSpec};

/// Raw parameters supplied by the caller, keyed by parameter id.
pub type ActionParams = HashMap<String, String>;

/// A protocol line ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCommand {
    /// Name of the command it was compiled from.
    pub name: String,
    /// Line text, without terminator.
    pub text: String,
    /// Number of times the line is written. Zero writes nothing.
    pub repeat_count: u32,
    /// Pause between repeated writes.
    pub repeat_delay: Duration,
}

impl CompiledCommand {
    /// Creates a command written once.
    #[must_use]
    pub fn once(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            repeat_count: 1,
            repeat_delay: Duration::ZERO,
        }
    }
}

/// Binds the supplied parameters according to the action's declarations.
///
/// Undeclared parameters are ignored.
///
/// # Errors
///
/// Returns the first parameter error in declaration order.
pub fn bind_params(action: &ActionSpec, supplied: &ActionParams) -> Result<Bindings, CompileError> {
    let mut bound = Bindings::new();
    for param in &action.params {
        let raw = supplied.get(&param.id).map(String::as_str);
        if let Some(value) = param.resolve(&action.id, raw)? {
            bound.insert(param.id.clone(), value);
        }
    }
    Ok(bound)
}

/// Compiles an action against one state snapshot.
///
/// Commands whose condition is false are left out. The format and repeat
/// expressions of each remaining command are evaluated exactly once.
///
/// # Errors
///
/// Returns a [`CompileError`] if a parameter is missing or invalid, an
/// expression references an unbound name or mixes types, or a repeat count
/// is negative.
///
/// # Examples
///
/// ```
/// use niles_lib::command::{compile, ActionParams};
/// use niles_lib::expr::{Bindings, Value};
/// use niles_lib::profile::Profile;
///
/// let profile = Profile::niles_zr6().unwrap();
/// let action = profile.action("changeZoneSource").unwrap();
///
/// let params = ActionParams::from([("zoneSource".to_string(), "4".to_string())]);
/// let state = Bindings::from([
///     ("zone".to_string(), Value::Int(2)),
///     ("activeZone".to_string(), Value::Int(2)),
/// ]);
///
/// let commands = compile(action, &params, &state, &Bindings::new()).unwrap();
/// assert_eq!(commands.len(), 1);
/// assert_eq!(commands[0].text, "zsc,2,4");
/// ```
pub fn compile(
    action: &ActionSpec,
    params: &ActionParams,
    state: &Bindings,
    props: &Bindings,
) -> Result<Vec<CompiledCommand>, CompileError> {
    let params = bind_params(action, params)?;
    let scope = Scope::new(&params, state, props);

    let mut compiled = Vec::with_capacity(action.commands.len());
    for command in &action.commands {
        if let Some(condition) = &command.condition
            && !condition.eval(&scope)?.as_bool()?
        {
            trace!(action = %action.id, command = %command.name, "Condition false, skipping");
            continue;
        }
        compiled.push(compile_command(command, &scope)?);
    }
    Ok(compiled)
}

fn compile_command(command: &CommandSpec, scope: &Scope<'_>) -> Result<CompiledCommand, CompileError> {
    let text = command.format.render(scope)?;
    let repeat_count = match &command.repeat {
        None => 1,
        Some(expr) => repeat_count(&command.name, &expr.eval(scope)?)?,
    };
    Ok(CompiledCommand {
        name: command.name.clone(),
        text,
        repeat_count,
        repeat_delay: command.repeat_delay,
    })
}

fn repeat_count(command: &str, value: &Value) -> Result<u32, CompileError> {
    let invalid = || CompileError::InvalidRepeatCount {
        command: command.to_string(),
        value: value.to_string(),
    };
    let count = match value {
        Value::Int(n) => *n,
        Value::Str(s) => s.trim().parse().map_err(|_| invalid())?,
        Value::Bool(_) => return Err(invalid()),
    };
    u32::try_from(count).map_err(|_| invalid())
}
