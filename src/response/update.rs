// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Update routines: typed decoding of matched response fields.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DecodeError, ValueError};
use crate::state::{ApplyOutcome, StateChange, StateStore, ZoneState};
use crate::types::{Volume, ZoneId};

/// Captured fields of a matched line, keyed by capture group name.
pub type FieldMap = HashMap<String, String>;

/// The routine a response pattern is bound to.
///
/// Deserializes from `"fullZoneStatus"` and `"activeZoneChanged"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateRoutine {
    /// A complete zone report, replacing that zone's state.
    ///
    /// Groups: `zone`, `source`, `onOff`, `volume`, `mute`, `bass`, `treble`.
    FullZoneStatus,
    /// The receiver's active control zone changed.
    ///
    /// Groups: `zone`.
    ActiveZoneChanged,
}

impl UpdateRoutine {
    /// Returns the capture groups the routine reads.
    #[must_use]
    pub const fn required_groups(&self) -> &'static [&'static str] {
        match self {
            Self::FullZoneStatus => &["zone", "source", "onOff", "volume", "mute", "bass", "treble"],
            Self::ActiveZoneChanged => &["zone"],
        }
    }

    /// Converts captured fields into a state change.
    ///
    /// All fields are checked before anything is returned, so a failure on
    /// any field yields no partial update.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if a field is missing, not an integer, not
    /// a `0`/`1` flag, or out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use niles_lib::response::{FieldMap, UpdateRoutine};
    /// use niles_lib::state::StateChange;
    ///
    /// let fields = FieldMap::from([("zone".to_string(), "7".to_string())]);
    /// let change = UpdateRoutine::ActiveZoneChanged.decode(&fields).unwrap();
    /// assert!(matches!(change, StateChange::ActiveZone(zone) if zone.value() == 7));
    /// ```
    pub fn decode(&self, fields: &FieldMap) -> Result<StateChange, DecodeError> {
        match self {
            Self::FullZoneStatus => {
                let volume = integer(fields, "volume")?;
                Ok(StateChange::Zone(ZoneState {
                    zone: zone(fields)?,
                    power_on: flag(fields, "onOff")?,
                    source: narrow(fields, "source", U8_RANGE)?,
                    volume: Volume::try_from(volume).map_err(|source| DecodeError::OutOfRange {
                        field: "volume",
                        source,
                    })?,
                    muted: flag(fields, "mute")?,
                    bass: narrow(fields, "bass", I16_RANGE)?,
                    treble: narrow(fields, "treble", I16_RANGE)?,
                }))
            }
            Self::ActiveZoneChanged => Ok(StateChange::ActiveZone(zone(fields)?)),
        }
    }
}

impl fmt::Display for UpdateRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullZoneStatus => f.write_str("fullZoneStatus"),
            Self::ActiveZoneChanged => f.write_str("activeZoneChanged"),
        }
    }
}

/// Decodes the fields and applies the result to the store.
///
/// The store is left untouched when decoding fails.
///
/// # Errors
///
/// Returns the [`DecodeError`] from [`UpdateRoutine::decode`].
pub fn apply_update(
    routine: UpdateRoutine,
    fields: &FieldMap,
    store: &dyn StateStore,
) -> Result<(StateChange, ApplyOutcome), DecodeError> {
    let change = routine.decode(fields)?;
    let outcome = store.apply(&change);
    debug!(zone = %change.zone(), ?outcome, %routine, "Applied response update");
    Ok((change, outcome))
}

fn field<'a>(fields: &'a FieldMap, name: &'static str) -> Result<&'a str, DecodeError> {
    fields
        .get(name)
        .map(|s| s.trim())
        .ok_or(DecodeError::MissingField(name))
}

fn integer(fields: &FieldMap, name: &'static str) -> Result<i64, DecodeError> {
    let raw = field(fields, name)?;
    raw.parse().map_err(|_| DecodeError::InvalidInteger {
        field: name,
        value: raw.to_string(),
    })
}

fn narrow<T: TryFrom<i64>>(fields: &FieldMap, name: &'static str, (min, max): (i64, i64)) -> Result<T, DecodeError> {
    let value = integer(fields, name)?;
    T::try_from(value).map_err(|_| DecodeError::OutOfRange {
        field: name,
        source: ValueError::OutOfRange { min, max, actual: value },
    })
}

fn flag(fields: &FieldMap, name: &'static str) -> Result<bool, DecodeError> {
    match field(fields, name)? {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(DecodeError::InvalidFlag {
            field: name,
            value: other.to_string(),
        }),
    }
}

fn zone(fields: &FieldMap) -> Result<ZoneId, DecodeError> {
    let value = integer(fields, "zone")?;
    ZoneId::try_from(value).map_err(|source| DecodeError::OutOfRange { field: "zone", source })
}

const U8_RANGE: (i64, i64) = (0, 255);
const I16_RANGE: (i64, i64) = (-32_768, 32_767);
