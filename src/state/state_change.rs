// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! State changes are produced by decoding receiver status lines and are
//! applied to a [`StateStore`](super::StateStore).
//!
//! # Change Types
//!
//! - [`StateChange::Zone`] - A full status report for one zone
//! - [`StateChange::ActiveZone`] - The receiver switched its active control zone

use serde::{Deserialize, Serialize};

use crate::types::ZoneId;

use super::ZoneState;

/// Represents a change in receiver or zone state.
///
/// # Examples
///
/// ```
/// use niles_lib::state::{StateChange, ZoneState};
/// use niles_lib::types::ZoneId;
///
/// let zone = ZoneId::new(7).unwrap();
/// let change = StateChange::ActiveZone(zone);
/// assert_eq!(change.zone(), zone);
/// assert!(!change.is_zone_status());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    /// Complete status for one zone, applied atomically.
    Zone(ZoneState),

    /// The receiver's active control zone changed.
    ///
    /// This is receiver-level state; the named zone's own fields are not
    /// touched.
    ActiveZone(ZoneId),
}

impl StateChange {
    /// Returns the zone this change refers to.
    #[must_use]
    pub fn zone(&self) -> ZoneId {
        match self {
            Self::Zone(state) => state.zone,
            Self::ActiveZone(zone) => *zone,
        }
    }

    /// Returns `true` if this is a zone status report.
    #[must_use]
    pub fn is_zone_status(&self) -> bool {
        matches!(self, Self::Zone(_))
    }
}
