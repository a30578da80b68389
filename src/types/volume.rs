// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Volume type.
//!
//! The receiver has no absolute volume command, only single-step pulses.
//! This type keeps the tracked level within 0-100 so step arithmetic never
//! runs away.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Zone volume level (0-100).
///
/// # Examples
///
/// ```
/// use niles_lib::types::Volume;
///
/// let vol = Volume::new(45).unwrap();
/// assert_eq!(vol.value(), 45);
///
/// assert!(Volume::new(101).is_err());
/// assert_eq!(Volume::clamped(-4).value(), 0);
/// assert_eq!(Volume::clamped(250).value(), 100);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Volume(u8);

impl Volume {
    /// Silent.
    pub const MIN: Self = Self(0);

    /// Loudest level.
    pub const MAX: Self = Self(100);

    /// Creates a volume level.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `value` exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > Self::MAX.0 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: i64::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a volume level, clamping to 0-100.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        // Safe: clamped into 0..=100 before narrowing.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let level = value.clamp(0, 100) as u8;
        Self(level)
    }

    /// Returns the volume level.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Converts a 0-100 brightness into a volume scaled to `ceiling`.
    ///
    /// Brightness above 100 counts as 100; the result is rounded down.
    ///
    /// ```
    /// use niles_lib::types::Volume;
    ///
    /// let ceiling = Volume::new(38).unwrap();
    /// assert_eq!(Volume::from_brightness(50, ceiling).value(), 19);
    /// assert_eq!(Volume::from_brightness(100, ceiling), ceiling);
    /// ```
    #[must_use]
    pub fn from_brightness(brightness: u8, ceiling: Self) -> Self {
        let scaled = u16::from(brightness.min(100)) * u16::from(ceiling.0) / 100;
        Self::clamped(i64::from(scaled))
    }

    /// Returns the volume as a 0-100 brightness relative to `ceiling`.
    ///
    /// Levels at or above the ceiling read as 100. A zero ceiling reads
    /// as 0.
    #[must_use]
    pub fn brightness(&self, ceiling: Self) -> u8 {
        if ceiling.0 == 0 {
            return 0;
        }
        let scaled = (u16::from(self.0) * 100 / u16::from(ceiling.0)).min(100);
        u8::try_from(scaled).unwrap_or(100)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Volume {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Volume {
    type Error = ValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if !(0..=100).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: value,
            });
        }
        Ok(Self::clamped(value))
    }
}

impl From<Volume> for u8 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}
