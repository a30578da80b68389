// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone state tracking.

use serde::{Deserialize, Serialize};

use crate::expr::{Bindings, Value};
use crate::types::{Volume, ZoneId};

/// Tracked state of one receiver zone.
///
/// One instance exists per registered zone. It is replaced as a whole when
/// the receiver reports a full zone status line, so fields never mix values
/// from two different reports.
///
/// # Examples
///
/// ```
/// use niles_lib::state::ZoneState;
/// use niles_lib::types::{Volume, ZoneId};
///
/// let mut state = ZoneState::new(ZoneId::new(2).unwrap());
/// assert!(!state.power_on);
/// assert_eq!(state.display_value(), "off");
///
/// state.power_on = true;
/// state.volume = Volume::new(30).unwrap();
/// assert_eq!(state.display_value(), "30");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneState {
    /// Zone number.
    pub zone: ZoneId,
    /// Whether the zone amplifier is on.
    pub power_on: bool,
    /// Selected source (1-6 on a ZR-6).
    pub source: u8,
    /// Volume level.
    pub volume: Volume,
    /// Whether the zone is muted.
    pub muted: bool,
    /// Bass level as reported by the receiver.
    pub bass: i16,
    /// Treble level as reported by the receiver.
    pub treble: i16,
}

impl ZoneState {
    /// Creates the initial state for a newly registered zone.
    ///
    /// The zone starts powered off on source 1 until the first status
    /// report arrives.
    #[must_use]
    pub fn new(zone: ZoneId) -> Self {
        Self {
            zone,
            power_on: false,
            source: 1,
            volume: Volume::MIN,
            muted: false,
            bass: 0,
            treble: 0,
        }
    }

    /// Returns the short status text shown for the zone.
    ///
    /// `"off"` when powered off, `"muted"` when muted or at volume zero,
    /// otherwise the volume level.
    #[must_use]
    pub fn display_value(&self) -> String {
        if !self.power_on {
            "off".to_string()
        } else if self.muted || self.volume == Volume::MIN {
            "muted".to_string()
        } else {
            self.volume.to_string()
        }
    }

    /// Returns the zone's volume as a 0-100 brightness relative to the
    /// receiver's volume `ceiling`; a powered-off zone reads 0.
    #[must_use]
    pub fn brightness(&self, ceiling: Volume) -> u8 {
        if self.power_on {
            self.volume.brightness(ceiling)
        } else {
            0
        }
    }

    /// Encodes the state as the receiver's full status line.
    ///
    /// ```
    /// use niles_lib::state::ZoneState;
    /// use niles_lib::types::{Volume, ZoneId};
    ///
    /// let state = ZoneState {
    ///     zone: ZoneId::new(3).unwrap(),
    ///     power_on: true,
    ///     source: 2,
    ///     volume: Volume::new(45).unwrap(),
    ///     muted: false,
    ///     bass: 6,
    ///     treble: 7,
    /// };
    /// assert_eq!(state.to_status_line(), "usc,2,3,2,1,45,0,6,7");
    /// ```
    #[must_use]
    pub fn to_status_line(&self) -> String {
        format!(
            "usc,2,{},{},{},{},{},{},{}",
            self.zone,
            self.source,
            u8::from(self.power_on),
            self.volume,
            u8::from(self.muted),
            self.bass,
            self.treble
        )
    }

    /// Returns the state as expression bindings for the `state` namespace.
    ///
    /// Bound names: `zone`, `isPoweredOn`, `source`, `volume`, `isMuted`,
    /// `bass`, `treble`.
    #[must_use]
    pub fn bindings(&self) -> Bindings {
        Bindings::from([
            ("zone".to_string(), Value::from(self.zone.value())),
            ("isPoweredOn".to_string(), Value::Bool(self.power_on)),
            ("source".to_string(), Value::from(self.source)),
            ("volume".to_string(), Value::from(self.volume.value())),
            ("isMuted".to_string(), Value::Bool(self.muted)),
            ("bass".to_string(), Value::Int(i64::from(self.bass))),
            ("treble".to_string(), Value::Int(i64::from(self.treble))),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(n: u8) -> ZoneId {
        ZoneId::new(n).unwrap()
    }

    #[test]
    fn new_zone_defaults() {
        let state = ZoneState::new(zone(4));
        assert_eq!(state.zone, zone(4));
        assert_eq!(state.source, 1);
        assert_eq!(state.volume, Volume::MIN);
        assert!(!state.muted);
    }

    #[test]
    fn display_value_muted_when_volume_zero() {
        let mut state = ZoneState::new(zone(1));
        state.power_on = true;
        assert_eq!(state.display_value(), "muted");

        state.volume = Volume::new(12).unwrap();
        state.muted = true;
        assert_eq!(state.display_value(), "muted");

        state.muted = false;
        assert_eq!(state.display_value(), "12");
    }

    #[test]
    fn bindings_expose_typed_values() {
        let mut state = ZoneState::new(zone(5));
        state.muted = true;
        let bindings = state.bindings();
        assert_eq!(bindings["zone"], Value::Int(5));
        assert_eq!(bindings["isMuted"], Value::Bool(true));
        assert_eq!(bindings["source"], Value::Int(1));
    }

    #[test]
    fn brightness_follows_power() {
        let mut state = ZoneState::new(zone(2));
        state.volume = Volume::new(19).unwrap();
        let ceiling = Volume::new(38).unwrap();
        assert_eq!(state.brightness(ceiling), 0);

        state.power_on = true;
        assert_eq!(state.brightness(ceiling), 50);
        assert_eq!(state.brightness(Volume::MAX), 19);
    }
}
