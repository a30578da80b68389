// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `niles_lib` - A Rust library to control Niles Audio multi-zone receivers.
//!
//! Niles ZR-4 and ZR-6 receivers speak a terse, CR-terminated line protocol
//! over RS-232 (or a serial-to-IP bridge). This library translates
//! high-level zone actions into that protocol and turns the receiver's
//! status lines back into typed zone state.
//!
//! # Supported Features
//!
//! - **Zone control**: power, source selection, volume, mute
//! - **Receiver control**: all zones off, mute all, tuner stations, raw commands
//! - **Status tracking**: full zone status reports and active zone changes
//! - **Pacing**: repeated volume pulses, inter-command gaps, serialized dispatch
//! - **Profiles**: actions and response patterns loaded from JSON
//!
//! # How It Works
//!
//! The receiver has no absolute volume command, only up and down pulses.
//! Setting zone 3 from 40 to 65 therefore compiles to the line `zsc,3,12`
//! repeated 25 times, 100 ms apart:
//!
//! ```
//! use niles_lib::command::{compile, ActionParams};
//! use niles_lib::expr::{Bindings, Value};
//! use niles_lib::profile::Profile;
//! use niles_lib::state::ZoneState;
//! use niles_lib::types::{Volume, ZoneId};
//!
//! let profile = Profile::niles_zr6()?;
//! let mut zone = ZoneState::new(ZoneId::new(3)?);
//! zone.volume = Volume::new(40)?;
//!
//! let mut state = zone.bindings();
//! state.insert("activeZone".to_string(), Value::Int(3));
//! let params = ActionParams::from([("volumeTarget".to_string(), "65".to_string())]);
//!
//! let commands = compile(profile.action("setZoneVolume").unwrap(), &params, &state, &Bindings::new())?;
//! assert_eq!(commands[0].text, "zsc,3,12");
//! assert_eq!(commands[0].repeat_count, 25);
//! # Ok::<(), niles_lib::Error>(())
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use niles_lib::{Profile, Receiver, ReceiverConfig, ReceiverEvent, Volume, ZoneId};
//!
//! #[tokio::main]
//! async fn main() -> niles_lib::Result<()> {
//!     let config = ReceiverConfig::new("House").with_property("source1Label", "Tuner");
//!     let receiver = Receiver::connect_tcp("192.168.1.40:4999", Profile::niles_zr6()?, config).await?;
//!
//!     let mut events = receiver.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let ReceiverEvent::ZoneChanged { new_state, .. } = event {
//!                 println!("zone {}: {}", new_state.zone, new_state.display_value());
//!             }
//!         }
//!     });
//!
//!     for zone in 1..=6 {
//!         receiver.register_zone(ZoneId::new(zone)?)?;
//!     }
//!     receiver.poll_all_zones().await?;
//!
//!     let patio = ZoneId::new(5)?;
//!     receiver.set_zone_power(patio, true).await?;
//!     receiver.set_zone_volume(patio, Volume::new(30)?).await?;
//!
//!     receiver.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;
pub mod event;
pub mod expr;
pub mod profile;
pub mod protocol;
pub mod receiver;
pub mod response;
pub mod state;
pub mod types;

pub use command::{ActionParams, ActionSpec, CommandSpec, CompiledCommand, DeviceKind, FormatTemplate, compile};
pub use error::{CompileError, ConfigError, DecodeError, Error, Result, TransportError, ValueError};
pub use event::{EventBus, ReceiverEvent, ReceiverId};
pub use profile::Profile;
pub use receiver::{Receiver, ReceiverConfig, Target};
pub use response::{ResponseMatcher, ResponsePattern, UpdateRoutine};
pub use state::{MemoryStateStore, StateChange, StateStore, ZoneState};
pub use types::{Volume, ZoneId};
