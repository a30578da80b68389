// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-receiver context shared by the handle, the worker and the read loop.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::command::{ActionParams, CompiledCommand, DeviceKind, compile};
use crate::error::{CompileError, Error};
use crate::event::{EventBus, ReceiverEvent, ReceiverId};
use crate::expr::{Bindings, Value};
use crate::profile::Profile;
use crate::response::apply_update;
use crate::state::{ApplyOutcome, StateChange, StateStore, ZoneState};
use crate::types::ZoneId;

use super::Target;

/// Name under which the active control zone is bound in `state`.
const ACTIVE_ZONE: &str = "activeZone";

pub(crate) struct Context {
    pub(crate) id: ReceiverId,
    pub(crate) name: String,
    pub(crate) profile: Profile,
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) events: EventBus,
    pub(crate) props: Bindings,
}

impl Context {
    fn active_zone_value(&self) -> Value {
        self.store
            .active_zone()
            .map_or(Value::Int(0), |zone| Value::from(zone.value()))
    }

    fn zone_bindings(&self, state: &ZoneState) -> Bindings {
        let mut bindings = state.bindings();
        bindings.insert(ACTIVE_ZONE.to_string(), self.active_zone_value());
        bindings
    }

    fn zone_snapshot(&self, zone: ZoneId) -> Result<ZoneState, Error> {
        self.store.get(zone).ok_or(Error::UnknownZone(zone))
    }

    /// Compiles an action against the current state.
    pub(crate) fn compile(
        &self,
        action_id: &str,
        target: Target,
        params: &ActionParams,
    ) -> Result<Vec<CompiledCommand>, Error> {
        let action = self
            .profile
            .action(action_id)
            .ok_or_else(|| CompileError::UnknownAction(action_id.to_string()))?;

        let commands = match (action.applies_to, target) {
            (DeviceKind::Zone, Target::Zone(zone)) => {
                let state = self.zone_snapshot(zone)?;
                compile(action, params, &self.zone_bindings(&state), &self.props)?
            }
            (DeviceKind::Receiver, Target::Receiver) if action.for_each_zone => {
                let mut commands = Vec::new();
                for zone in self.store.zones() {
                    // Unregistered while compiling; nothing to send for it.
                    let Some(state) = self.store.get(zone) else {
                        continue;
                    };
                    commands.extend(compile(action, params, &self.zone_bindings(&state), &self.props)?);
                }
                commands
            }
            (DeviceKind::Receiver, Target::Receiver) => {
                let state = Bindings::from([(ACTIVE_ZONE.to_string(), self.active_zone_value())]);
                compile(action, params, &state, &self.props)?
            }
            (kind, _) => {
                return Err(CompileError::TargetMismatch {
                    action: action.id.clone(),
                    expected: kind.as_str(),
                }
                .into());
            }
        };

        debug!(receiver = %self.name, action = action_id, ?target, count = commands.len(), "Compiled action");
        Ok(commands)
    }

    /// Returns the follow-up action of `action_id`, if it declares one.
    pub(crate) fn follow_up(&self, action_id: &str) -> Option<&str> {
        self.profile.action(action_id)?.follow_up.as_deref()
    }

    /// Matches, decodes and applies one inbound line.
    pub(crate) fn handle_line(&self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }
        debug!(receiver = %self.name, line, "Received");

        let Some(found) = self.profile.matcher().match_line(line) else {
            debug!(receiver = %self.name, line, "No pattern matches line, dropping");
            self.events.publish(ReceiverEvent::UnmatchedLine {
                receiver_id: self.id,
                line: line.to_string(),
            });
            return;
        };

        match apply_update(found.routine, &found.fields, self.store.as_ref()) {
            Ok((change, ApplyOutcome::Changed)) => self.publish_change(change),
            Ok((_, ApplyOutcome::Unchanged)) => {}
            Ok((change, ApplyOutcome::UnknownZone)) => {
                debug!(receiver = %self.name, zone = %change.zone(), "Status for unregistered zone ignored");
            }
            Err(error) => {
                warn!(receiver = %self.name, pattern = found.pattern, line, %error, "Failed to decode response");
                self.events.publish(ReceiverEvent::DecodeFailed {
                    receiver_id: self.id,
                    pattern: found.pattern.to_string(),
                    line: line.to_string(),
                    error,
                });
            }
        }
    }

    fn publish_change(&self, change: StateChange) {
        let event = match change {
            StateChange::Zone(new_state) => {
                debug!(receiver = %self.name, zone = %new_state.zone, display = %new_state.display_value(), "Zone updated");
                ReceiverEvent::ZoneChanged {
                    receiver_id: self.id,
                    new_state,
                }
            }
            StateChange::ActiveZone(zone) => {
                debug!(receiver = %self.name, %zone, "Active zone changed");
                ReceiverEvent::ActiveZoneChanged {
                    receiver_id: self.id,
                    zone,
                }
            }
        };
        self.events.publish(event);
    }
}
