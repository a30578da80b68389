// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting receiver events.

use tokio::sync::broadcast;

use super::ReceiverEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcasts receiver events to any number of subscribers.
///
/// Every subscriber gets its own copy of each event published after it
/// subscribed.
///
/// # Capacity
///
/// The event bus has a fixed capacity (default 256). If the channel fills
/// up because a subscriber is slow, that subscriber misses the oldest events
/// and its next `recv` returns `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use niles_lib::event::{EventBus, ReceiverEvent, ReceiverId};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ReceiverEvent::Stopped {
///     receiver_id: ReceiverId::new(),
/// });
/// assert!(matches!(rx.try_recv(), Ok(ReceiverEvent::Stopped { .. })));
/// ```
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ReceiverEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus buffering up to `capacity` events.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReceiverEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event; it is dropped if nobody is subscribed.
    pub fn publish(&self, event: ReceiverEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ReceiverId;
    use crate::types::ZoneId;

    fn registered(receiver_id: ReceiverId) -> ReceiverEvent {
        ReceiverEvent::ZoneRegistered {
            receiver_id,
            zone: ZoneId::new(2).unwrap(),
        }
    }

    #[test]
    fn subscriber_count_tracks_receivers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn publish_delivers_to_every_subscriber() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let receiver_id = ReceiverId::new();
        bus.publish(registered(receiver_id));

        assert_eq!(rx1.recv().await.unwrap().receiver_id(), receiver_id);
        assert_eq!(rx2.recv().await.unwrap().receiver_id(), receiver_id);
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = EventBus::new();
        bus.publish(registered(ReceiverId::new()));
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn clone_shares_channel() {
        let bus1 = EventBus::with_capacity(0);
        let bus2 = bus1.clone();
        let _rx = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
