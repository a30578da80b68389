// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Receiver profiles: the action and response tables for a receiver model.
//!
//! A profile is loaded once from a JSON document, validated, and is then
//! read-only. Templates and expressions are parsed and regexes compiled at
//! load time, so a profile that loads cannot fail later on syntax.
//!
//! # Document Format
//!
//! ```json
//! {
//!   "name": "Niles ZR-6",
//!   "actions": [{
//!     "id": "changeZoneSource",
//!     "appliesTo": "zone",
//!     "params": [{ "id": "zoneSource", "kind": "integer", "range": [1, 6] }],
//!     "commands": [{ "name": "selectSource", "format": "zsc,{state.zone},{params.zoneSource}" }],
//!     "followUp": "pollZone"
//!   }],
//!   "patterns": [{ "id": "activeZone", "match": "rznc,4,(?P<zone>\\d+)", "routine": "activeZoneChanged" }]
//! }
//! ```
//!
//! A command has either `format` (literal with placeholders) or `eval` (an
//! expression), and optionally `repeat`, `repeatDelay` (seconds) and
//! `condition`.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::command::{ActionSpec, CommandSpec, DeviceKind, FormatTemplate, ParamKind, ParamSpec};
use crate::error::{ConfigError, SyntaxError};
use crate::expr::{Expr, parse};
use crate::response::{ResponseMatcher, ResponsePattern, UpdateRoutine};

const NILES_ZR6: &str = include_str!("niles_zr6.json");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawProfile {
    name: String,
    actions: Vec<RawAction>,
    #[serde(default)]
    patterns: Vec<RawPattern>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawAction {
    id: String,
    applies_to: DeviceKind,
    #[serde(default)]
    for_each_zone: bool,
    #[serde(default)]
    params: Vec<RawParam>,
    commands: Vec<RawCommand>,
    follow_up: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawParam {
    id: String,
    #[serde(default)]
    kind: ParamKind,
    #[serde(default = "default_required")]
    required: bool,
    default: Option<String>,
    range: Option<(i64, i64)>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawCommand {
    name: String,
    format: Option<String>,
    eval: Option<String>,
    repeat: Option<String>,
    #[serde(default)]
    repeat_delay: f64,
    condition: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPattern {
    id: String,
    #[serde(rename = "match")]
    expression: String,
    routine: UpdateRoutine,
}

/// Validated action and response tables for one receiver model.
///
/// # Examples
///
/// ```
/// use niles_lib::command::DeviceKind;
/// use niles_lib::profile::Profile;
///
/// let profile = Profile::niles_zr6().unwrap();
/// let action = profile.action("setZoneVolume").unwrap();
/// assert_eq!(action.applies_to, DeviceKind::Zone);
/// assert_eq!(action.follow_up.as_deref(), Some("pollZone"));
/// ```
#[derive(Debug, Clone)]
pub struct Profile {
    name: String,
    actions: Vec<ActionSpec>,
    index: HashMap<String, usize>,
    matcher: ResponseMatcher,
}

impl Profile {
    /// Builds a profile from already constructed tables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for duplicate ids, actions without
    /// commands, inconsistent parameter declarations, or follow-ups that do
    /// not name an action of the same device kind.
    pub fn new(
        name: impl Into<String>,
        actions: Vec<ActionSpec>,
        patterns: Vec<ResponsePattern>,
    ) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(actions.len());
        for (position, action) in actions.iter().enumerate() {
            if index.insert(action.id.clone(), position).is_some() {
                return Err(ConfigError::DuplicateAction(action.id.clone()));
            }
            if action.commands.is_empty() {
                return Err(ConfigError::EmptyAction(action.id.clone()));
            }
            validate_params(action)?;
        }

        for action in &actions {
            let Some(follow_up) = &action.follow_up else {
                continue;
            };
            let target = index.get(follow_up).map(|&i| &actions[i]);
            match target {
                None => {
                    return Err(ConfigError::UnknownFollowUp {
                        action: action.id.clone(),
                        follow_up: follow_up.clone(),
                    });
                }
                Some(target) if target.applies_to != action.applies_to => {
                    return Err(ConfigError::InvalidValue {
                        field: format!("{}.followUp", action.id),
                        message: format!("{follow_up} applies to a {} device", target.applies_to),
                    });
                }
                Some(_) => {}
            }
        }

        let mut seen = HashSet::new();
        for pattern in &patterns {
            if !seen.insert(pattern.id()) {
                return Err(ConfigError::DuplicatePattern(pattern.id().to_string()));
            }
        }

        let name = name.into();
        debug!(profile = %name, actions = actions.len(), patterns = patterns.len(), "Loaded profile");
        Ok(Self {
            name,
            actions,
            index,
            matcher: ResponseMatcher::new(patterns),
        })
    }

    /// Loads a profile from its JSON document.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the document does not parse, a template,
    /// expression or pattern is malformed, or validation fails.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let raw: RawProfile = serde_json::from_str(document)?;

        let actions = raw
            .actions
            .into_iter()
            .map(build_action)
            .collect::<Result<Vec<_>, _>>()?;
        let patterns = raw
            .patterns
            .into_iter()
            .map(|p| ResponsePattern::new(p.id, &p.expression, p.routine))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(raw.name, actions, patterns)
    }

    /// Returns the built-in profile for Niles ZR-4 and ZR-6 receivers.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the error is kept so the embedded document
    /// goes through the same validation as any other.
    pub fn niles_zr6() -> Result<Self, ConfigError> {
        Self::from_json(NILES_ZR6)
    }

    /// Returns the profile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up an action.
    #[must_use]
    pub fn action(&self, id: &str) -> Option<&ActionSpec> {
        self.index.get(id).map(|&i| &self.actions[i])
    }

    /// Returns all actions in declaration order.
    #[must_use]
    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    /// Returns the response matcher.
    #[must_use]
    pub fn matcher(&self) -> &ResponseMatcher {
        &self.matcher
    }
}

fn validate_params(action: &ActionSpec) -> Result<(), ConfigError> {
    let invalid = |param: &ParamSpec, message: &str| ConfigError::InvalidParam {
        action: action.id.clone(),
        param: param.id.clone(),
        message: message.to_string(),
    };

    let mut seen = HashSet::new();
    for param in &action.params {
        if !seen.insert(param.id.as_str()) {
            return Err(invalid(param, "declared twice"));
        }
        match (param.kind, param.range) {
            (ParamKind::Text, Some(_)) => return Err(invalid(param, "range on a text parameter")),
            (ParamKind::Integer, Some((min, max))) if min > max => {
                return Err(invalid(param, "range minimum exceeds maximum"));
            }
            _ => {}
        }
        if let Some(default) = &param.default
            && param.kind == ParamKind::Integer
            && default.trim().parse::<i64>().is_err()
        {
            return Err(invalid(param, "default is not an integer"));
        }
    }
    Ok(())
}

fn build_action(raw: RawAction) -> Result<ActionSpec, ConfigError> {
    let params = raw
        .params
        .into_iter()
        .map(|p| ParamSpec {
            id: p.id,
            kind: p.kind,
            required: p.required,
            default: p.default,
            range: p.range,
        })
        .collect();

    let commands = raw
        .commands
        .into_iter()
        .map(|c| build_command(&raw.id, c))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ActionSpec {
        id: raw.id,
        applies_to: raw.applies_to,
        for_each_zone: raw.for_each_zone,
        params,
        commands,
        follow_up: raw.follow_up,
    })
}

fn build_command(action: &str, raw: RawCommand) -> Result<CommandSpec, ConfigError> {
    let context = format!("{action}.{}", raw.name);
    let syntax = |what: &'static str| {
        let context = context.clone();
        move |source: SyntaxError| ConfigError::Syntax { what, context, source }
    };

    let format = match (raw.format, raw.eval) {
        (Some(literal), None) => FormatTemplate::literal(&literal).map_err(syntax("format"))?,
        (None, Some(expression)) => FormatTemplate::expression(&expression).map_err(syntax("eval"))?,
        _ => {
            return Err(ConfigError::InvalidValue {
                field: context.clone(),
                message: "exactly one of format and eval is required".to_string(),
            });
        }
    };

    let expression = |source: Option<String>, what: &'static str| -> Result<Option<Expr>, ConfigError> {
        source.map(|s| parse(&s).map_err(syntax(what))).transpose()
    };
    let repeat = expression(raw.repeat, "repeat")?;
    let condition = expression(raw.condition, "condition")?;

    if !raw.repeat_delay.is_finite() || raw.repeat_delay < 0.0 {
        return Err(ConfigError::InvalidValue {
            field: format!("{context}.repeatDelay"),
            message: format!("{} is not a non-negative number of seconds", raw.repeat_delay),
        });
    }

    Ok(CommandSpec {
        name: raw.name,
        format,
        repeat,
        repeat_delay: Duration::from_secs_f64(raw.repeat_delay),
        condition,
    })
}
