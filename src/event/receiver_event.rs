// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Receiver event types.

use crate::error::DecodeError;
use crate::state::ZoneState;
use crate::types::ZoneId;

use super::ReceiverId;

/// Events emitted by a running receiver.
///
/// # Examples
///
/// ```
/// use niles_lib::event::{ReceiverEvent, ReceiverId};
///
/// let receiver_id = ReceiverId::new();
/// let event = ReceiverEvent::UnmatchedLine {
///     receiver_id,
///     line: "garbage".to_string(),
/// };
/// assert_eq!(event.receiver_id(), receiver_id);
/// assert_eq!(event.zone(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverEvent {
    /// A zone was registered.
    ZoneRegistered {
        /// The receiver.
        receiver_id: ReceiverId,
        /// The new zone.
        zone: ZoneId,
    },

    /// A zone was unregistered and its state dropped.
    ZoneUnregistered {
        /// The receiver.
        receiver_id: ReceiverId,
        /// The removed zone.
        zone: ZoneId,
    },

    /// A status report changed a zone's state.
    ZoneChanged {
        /// The receiver.
        receiver_id: ReceiverId,
        /// The complete new state.
        new_state: ZoneState,
    },

    /// The receiver's active control zone changed.
    ActiveZoneChanged {
        /// The receiver.
        receiver_id: ReceiverId,
        /// The zone now active.
        zone: ZoneId,
    },

    /// An inbound line matched no response pattern.
    UnmatchedLine {
        /// The receiver.
        receiver_id: ReceiverId,
        /// The trimmed line.
        line: String,
    },

    /// An inbound line matched a pattern but could not be decoded.
    DecodeFailed {
        /// The receiver.
        receiver_id: ReceiverId,
        /// The matching pattern.
        pattern: String,
        /// The trimmed line.
        line: String,
        /// What was wrong with it.
        error: DecodeError,
    },

    /// A queued action failed to compile or dispatch.
    ///
    /// Only emitted for work without a waiting caller, such as follow-ups
    /// and periodic polls; direct requests get the error returned instead.
    ActionFailed {
        /// The receiver.
        receiver_id: ReceiverId,
        /// The action identifier.
        action: String,
        /// The target zone, for zone actions.
        zone: Option<ZoneId>,
        /// Description of the failure.
        error: String,
    },

    /// The receiver stopped; no further events follow.
    Stopped {
        /// The receiver.
        receiver_id: ReceiverId,
    },
}

impl ReceiverEvent {
    /// Returns the receiver the event came from.
    #[must_use]
    pub fn receiver_id(&self) -> ReceiverId {
        match self {
            Self::ZoneRegistered { receiver_id, .. }
            | Self::ZoneUnregistered { receiver_id, .. }
            | Self::ZoneChanged { receiver_id, .. }
            | Self::ActiveZoneChanged { receiver_id, .. }
            | Self::UnmatchedLine { receiver_id, .. }
            | Self::DecodeFailed { receiver_id, .. }
            | Self::ActionFailed { receiver_id, .. }
            | Self::Stopped { receiver_id } => *receiver_id,
        }
    }

    /// Returns the zone the event concerns, if any.
    #[must_use]
    pub fn zone(&self) -> Option<ZoneId> {
        match self {
            Self::ZoneRegistered { zone, .. }
            | Self::ZoneUnregistered { zone, .. }
            | Self::ActiveZoneChanged { zone, .. } => Some(*zone),
            Self::ZoneChanged { new_state, .. } => Some(new_state.zone),
            Self::ActionFailed { zone, .. } => *zone,
            Self::UnmatchedLine { .. } | Self::DecodeFailed { .. } | Self::Stopped { .. } => None,
        }
    }

    /// Returns `true` for [`ReceiverEvent::ZoneChanged`].
    #[must_use]
    pub fn is_zone_change(&self) -> bool {
        matches!(self, Self::ZoneChanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_of_each_event() {
        let receiver_id = ReceiverId::new();
        let zone = ZoneId::new(4).unwrap();

        assert_eq!(ReceiverEvent::ZoneRegistered { receiver_id, zone }.zone(), Some(zone));
        assert_eq!(
            ReceiverEvent::ZoneChanged {
                receiver_id,
                new_state: ZoneState::new(zone)
            }
            .zone(),
            Some(zone)
        );
        assert_eq!(
            ReceiverEvent::ActionFailed {
                receiver_id,
                action: "pollAllZones".to_string(),
                zone: None,
                error: "transport closed".to_string()
            }
            .zone(),
            None
        );
        assert_eq!(ReceiverEvent::Stopped { receiver_id }.zone(), None);
    }

    #[test]
    fn zone_change_predicate() {
        let receiver_id = ReceiverId::new();
        let zone = ZoneId::new(1).unwrap();
        assert!(
            ReceiverEvent::ZoneChanged {
                receiver_id,
                new_state: ZoneState::new(zone)
            }
            .is_zone_change()
        );
        assert!(!ReceiverEvent::ActiveZoneChanged { receiver_id, zone }.is_zone_change());
    }
}
