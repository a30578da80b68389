// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Action definitions and the command template compiler.
//!
//! An [`ActionSpec`] is what a host invokes ("set zone volume to 65"). It
//! holds an ordered list of [`CommandSpec`]s, each producing one protocol
//! line from a [`FormatTemplate`], optionally repeated and optionally gated
//! by a condition.
//!
//! [`compile`] turns an action, caller parameters and a state snapshot into
//! [`CompiledCommand`]s for the dispatcher.
//!
//! # Command Structure
//!
//! | Field | Purpose | Example |
//! |-------|---------|---------|
//! | format | Line text | `zsc,{state.zone},11` |
//! | repeat | Write count | `abs(params.volumeTarget - state.volume)` |
//! | repeat delay | Pause between repeats | 100 ms |
//! | condition | Send only if true | `state.activeZone != state.zone` |
//!
//! # Examples
//!
//! ```
//! use niles_lib::command::{compile, ActionParams, ActionSpec, CommandSpec, DeviceKind, FormatTemplate};
//! use niles_lib::expr::{parse, Bindings, Value};
//!
//! let select = ActionSpec::new("selectZone", DeviceKind::Zone).with_command(
//!     CommandSpec::new("activate", FormatTemplate::literal("znc,4,{state.zone}").unwrap())
//!         .with_condition(parse("state.activeZone != state.zone").unwrap()),
//! );
//!
//! let state = Bindings::from([
//!     ("zone".to_string(), Value::Int(5)),
//!     ("activeZone".to_string(), Value::Int(5)),
//! ]);
//! let commands = compile(&select, &ActionParams::new(), &state, &Bindings::new()).unwrap();
//! assert!(commands.is_empty());
//! ```

mod compiler;
mod spec;
mod template;

pub use compiler::{ActionParams, CompiledCommand, bind_params, compile};
pub use spec::{ActionSpec, CommandSpec, DeviceKind, ParamKind, ParamSpec};
pub use template::{FormatTemplate, TemplateSegment};
