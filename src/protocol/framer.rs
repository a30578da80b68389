// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound line framing.

use tracing::warn;

/// Default maximum inbound line length in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 256;

/// Splits an inbound byte stream into lines.
///
/// Lines end at CR, LF, or both. Empty lines are skipped and invalid UTF-8
/// is replaced rather than rejected, so serial noise never stalls the
/// stream. A line longer than the limit is discarded up to its terminator.
///
/// # Examples
///
/// ```
/// use niles_lib::protocol::LineFramer;
///
/// let mut framer = LineFramer::new(64);
/// assert_eq!(framer.push(b"usc,2,1,"), Vec::<String>::new());
/// assert_eq!(framer.push(b"1,0,20,0,0,0\r\nrznc,4,1\r"), vec!["usc,2,1,1,0,20,0,0,0", "rznc,4,1"]);
/// ```
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    max_len: usize,
    discarding: bool,
}

impl LineFramer {
    /// Creates a framer accepting lines up to `max_len` bytes.
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_len: max_len.max(1),
            discarding: false,
        }
    }

    /// Feeds bytes and returns the lines they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\r' || byte == b'\n' {
                if self.discarding {
                    self.discarding = false;
                } else if !self.buffer.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.buffer).into_owned());
                }
                self.buffer.clear();
            } else if !self.discarding {
                if self.buffer.len() >= self.max_len {
                    warn!(limit = self.max_len, "Inbound line too long, discarding");
                    self.buffer.clear();
                    self.discarding = true;
                } else {
                    self.buffer.push(byte);
                }
            }
        }
        lines
    }

    /// Returns any unterminated trailing text, e.g. at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        let discarding = std::mem::take(&mut self.discarding);
        if self.buffer.is_empty() || discarding {
            self.buffer.clear();
            return None;
        }
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        Some(line)
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}
