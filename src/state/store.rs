// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone state storage.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::types::ZoneId;

use super::{StateChange, ZoneState};

/// Result of applying a [`StateChange`] to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The stored state was modified.
    Changed,
    /// The stored state already matched.
    Unchanged,
    /// The change refers to a zone that is not registered.
    UnknownZone,
}

/// Storage for zone state, shared between the dispatch worker, the read
/// loop and the host application.
///
/// The library never keeps its own authoritative copy: the compiler reads a
/// snapshot through [`get`](Self::get) and the read loop writes decoded
/// status through [`apply`](Self::apply).
pub trait StateStore: Send + Sync {
    /// Returns a snapshot of a zone's state.
    fn get(&self, zone: ZoneId) -> Option<ZoneState>;

    /// Applies a decoded change.
    fn apply(&self, change: &StateChange) -> ApplyOutcome;

    /// Creates state for a newly registered zone.
    ///
    /// Returns `false` if the zone already exists.
    fn insert(&self, state: ZoneState) -> bool;

    /// Drops a zone's state on deregistration.
    fn remove(&self, zone: ZoneId) -> Option<ZoneState>;

    /// Returns all registered zones in ascending order.
    fn zones(&self) -> Vec<ZoneId>;

    /// Returns the receiver's current active control zone, if known.
    fn active_zone(&self) -> Option<ZoneId>;
}

#[derive(Debug, Default)]
struct Inner {
    zones: BTreeMap<ZoneId, ZoneState>,
    active_zone: Option<ZoneId>,
}

/// In-memory [`StateStore`].
///
/// # Examples
///
/// ```
/// use niles_lib::state::{ApplyOutcome, MemoryStateStore, StateChange, StateStore, ZoneState};
/// use niles_lib::types::ZoneId;
///
/// let store = MemoryStateStore::new();
/// let zone = ZoneId::new(1).unwrap();
/// store.insert(ZoneState::new(zone));
///
/// let mut reported = ZoneState::new(zone);
/// reported.power_on = true;
/// assert_eq!(store.apply(&StateChange::Zone(reported.clone())), ApplyOutcome::Changed);
/// assert_eq!(store.apply(&StateChange::Zone(reported)), ApplyOutcome::Unchanged);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    inner: RwLock<Inner>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, zone: ZoneId) -> Option<ZoneState> {
        self.inner.read().zones.get(&zone).cloned()
    }

    fn apply(&self, change: &StateChange) -> ApplyOutcome {
        let mut inner = self.inner.write();
        match change {
            StateChange::Zone(reported) => match inner.zones.get_mut(&reported.zone) {
                None => ApplyOutcome::UnknownZone,
                Some(current) if current == reported => ApplyOutcome::Unchanged,
                Some(current) => {
                    *current = reported.clone();
                    ApplyOutcome::Changed
                }
            },
            StateChange::ActiveZone(zone) => {
                if inner.active_zone == Some(*zone) {
                    ApplyOutcome::Unchanged
                } else {
                    inner.active_zone = Some(*zone);
                    ApplyOutcome::Changed
                }
            }
        }
    }

    fn insert(&self, state: ZoneState) -> bool {
        let mut inner = self.inner.write();
        if inner.zones.contains_key(&state.zone) {
            return false;
        }
        inner.zones.insert(state.zone, state);
        true
    }

    fn remove(&self, zone: ZoneId) -> Option<ZoneState> {
        self.inner.write().zones.remove(&zone)
    }

    fn zones(&self) -> Vec<ZoneId> {
        self.inner.read().zones.keys().copied().collect()
    }

    fn active_zone(&self) -> Option<ZoneId> {
        self.inner.read().active_zone
    }
}
