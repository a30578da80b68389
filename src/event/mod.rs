// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Receiver events.
//!
//! A running [`Receiver`](crate::receiver::Receiver) publishes a
//! [`ReceiverEvent`] on its [`EventBus`] for every zone registration, state
//! change, unmatched or undecodable line, and background action failure.
//!
//! # Examples
//!
//! ```
//! use niles_lib::event::{EventBus, ReceiverEvent, ReceiverId};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let receiver_id = ReceiverId::new();
//! bus.publish(ReceiverEvent::Stopped { receiver_id });
//! assert_eq!(rx.try_recv().unwrap().receiver_id(), receiver_id);
//! ```

mod event_bus;
mod receiver_event;
mod receiver_id;

pub use event_bus::EventBus;
pub use receiver_event::ReceiverEvent;
pub use receiver_id::ReceiverId;
