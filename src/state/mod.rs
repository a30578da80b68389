// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone state management types.
//!
//! [`ZoneState`] holds the tracked state of one zone, [`StateChange`]
//! represents a decoded update, and [`StateStore`] is the storage seam
//! shared between the dispatch worker, the read loop and the host.
//!
//! # Examples
//!
//! ```
//! use niles_lib::state::{MemoryStateStore, StateChange, StateStore, ZoneState};
//! use niles_lib::types::ZoneId;
//!
//! let store = MemoryStateStore::new();
//! let zone = ZoneId::new(1).unwrap();
//! store.insert(ZoneState::new(zone));
//!
//! store.apply(&StateChange::ActiveZone(zone));
//! assert_eq!(store.active_zone(), Some(zone));
//! ```

mod state_change;
mod store;
mod zone_state;

pub use state_change::StateChange;
pub use store::{ApplyOutcome, MemoryStateStore, StateStore};
pub use zone_state::ZoneState;
