// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Number of a zone on a receiver chain (1-18).
///
/// A ZR-6 drives six zones on its own and up to eighteen with linked
/// slave units. Zone numbers are unique across the master and all slaves,
/// so a single `ZoneId` identifies a zone on the whole chain.
///
/// # Examples
///
/// ```
/// use niles_lib::types::ZoneId;
///
/// let zone = ZoneId::new(3).unwrap();
/// assert_eq!(zone.value(), 3);
/// assert_eq!(zone.to_string(), "3");
///
/// assert!(ZoneId::new(0).is_err());
/// assert!(ZoneId::new(19).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ZoneId(u8);

impl ZoneId {
    /// Lowest zone number.
    pub const MIN: u8 = 1;

    /// Highest zone number across master and slave units.
    pub const MAX: u8 = 18;

    /// Creates a zone identifier.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `value` is not in 1-18.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
                actual: i64::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Returns the zone number.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for ZoneId {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for ZoneId {
    type Error = ValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let narrowed = u8::try_from(value).map_err(|_| ValueError::OutOfRange {
            min: i64::from(Self::MIN),
            max: i64::from(Self::MAX),
            actual: value,
        })?;
        Self::new(narrowed)
    }
}

impl From<ZoneId> for u8 {
    fn from(zone: ZoneId) -> Self {
        zone.0
    }
}

impl FromStr for ZoneId {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| ValueError::NotANumber(s.to_string()))?;
        Self::try_from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range() {
        assert!(ZoneId::new(1).is_ok());
        assert!(ZoneId::new(18).is_ok());
        assert!(ZoneId::new(0).is_err());
        assert!(ZoneId::new(19).is_err());
    }

    #[test]
    fn from_wide_integer() {
        assert_eq!(ZoneId::try_from(7_i64).unwrap().value(), 7);
        assert!(ZoneId::try_from(-3_i64).is_err());
        assert!(ZoneId::try_from(300_i64).is_err());
    }

    #[test]
    fn parse_from_str() {
        assert_eq!(" 4".parse::<ZoneId>().unwrap().value(), 4);
        assert!("four".parse::<ZoneId>().is_err());
    }

    #[test]
    fn ordering_follows_number() {
        let mut zones = vec![ZoneId::new(5).unwrap(), ZoneId::new(2).unwrap()];
        zones.sort();
        assert_eq!(zones[0].value(), 2);
    }

    #[test]
    fn serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<ZoneId>("0").is_err());
        assert_eq!(serde_json::from_str::<ZoneId>("6").unwrap().value(), 6);
    }
}
