// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response line matching and decoding.
//!
//! Inbound lines go through two steps. The [`ResponseMatcher`] tries each
//! [`ResponsePattern`] in order and returns the named captures of the first
//! one that matches the whole line. The pattern's [`UpdateRoutine`] then
//! turns those strings into a typed [`StateChange`](crate::state::StateChange).
//!
//! # Line Grammar
//!
//! | Line | Routine |
//! |------|---------|
//! | `usc,2,<zone>,<source>,<on 0/1>,<volume>,<mute 0/1>,<bass>,<treble>` | [`UpdateRoutine::FullZoneStatus`] |
//! | `rznc,4,<zone>` | [`UpdateRoutine::ActiveZoneChanged`] |

mod matcher;
mod update;

pub use matcher::{LineMatch, ResponseMatcher, ResponsePattern};
pub use update::{FieldMap, UpdateRoutine, apply_update};
