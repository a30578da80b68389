// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for receiver control.
//!
//! Each type ensures values are within their valid ranges at construction
//! time.
//!
//! # Types
//!
//! - [`ZoneId`] - Zone number on the receiver chain (1-18)
//! - [`Volume`] - Volume level (0-100)

mod volume;
mod zone;

pub use volume::Volume;
pub use zone::ZoneId;
