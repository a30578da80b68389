// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Receiver identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a running receiver.
///
/// Lets a host that drives several receivers (a main unit and slaves, or
/// separate installations) tell their events apart on a shared subscriber.
///
/// # Examples
///
/// ```
/// use niles_lib::event::ReceiverId;
///
/// let id = ReceiverId::new();
/// assert_ne!(id, ReceiverId::new());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiverId(Uuid);

impl ReceiverId {
    /// Creates a new unique identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReceiverId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReceiverId({})", self.0)
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ReceiverId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_round_trip() {
        let uuid = Uuid::new_v4();
        let id = ReceiverId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
        assert_eq!(ReceiverId::from(uuid), id);
    }

    #[test]
    fn display_is_hyphenated_uuid() {
        let id = ReceiverId::new();
        assert_eq!(id.to_string(), id.as_uuid().hyphenated().to_string());
        assert!(format!("{id:?}").starts_with("ReceiverId("));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ReceiverId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: ReceiverId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
