// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line protocol plumbing between the receiver and the byte link.
//!
//! The receiver speaks a CR-terminated ASCII line protocol over a serial
//! link or a serial-to-IP bridge. This module provides:
//!
//! - [`Transport`]: writes whole lines; [`StreamTransport`] adapts any
//!   `AsyncWrite`
//! - [`LineFramer`]: splits inbound bytes into lines
//! - [`Pacer`]: writes compiled commands with repeat delays and the minimum
//!   inter-command gap the hardware needs
//!
//! The receiver drops commands that arrive too close together, so all
//! writes for one device go through a single [`Pacer`].

mod framer;
mod pacer;
mod transport;

pub use framer::{DEFAULT_MAX_LINE_LENGTH, LineFramer};
pub use pacer::{DEFAULT_MIN_COMMAND_GAP, Pacer};
pub use transport::{LINE_TERMINATOR, StreamTransport, Transport, check_line};
