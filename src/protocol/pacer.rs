// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Paced command dispatch.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};

use crate::command::CompiledCommand;
use crate::error::Error;

use super::Transport;

/// Default minimum pause between two command entries.
pub const DEFAULT_MIN_COMMAND_GAP: Duration = Duration::from_millis(100);

/// Writes compiled commands with the timing the receiver needs.
///
/// - each entry is written `repeat_count` times, `repeat_delay` apart
/// - consecutive entries are at least `min_gap` apart, also across
///   dispatches, since the pacer remembers its last write
///
/// Waits end early when the shutdown signal turns `true`; a line is never
/// interrupted part way.
#[derive(Debug)]
pub struct Pacer {
    min_gap: Duration,
    last_write: Option<Instant>,
}

impl Pacer {
    /// Creates a pacer with the given inter-command gap.
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_write: None,
        }
    }

    /// Returns the configured inter-command gap.
    #[must_use]
    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }

    /// Writes `commands` in order and returns the number of lines written.
    ///
    /// # Errors
    ///
    /// Returns `Error::Dispatch` with the count of successful writes if the
    /// transport fails; later writes are not attempted. Returns
    /// `Error::Cancelled` if shutdown is signalled during a wait.
    pub async fn dispatch<T: Transport>(
        &mut self,
        commands: &[CompiledCommand],
        transport: &mut T,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<usize, Error> {
        let mut sent = 0;
        for command in commands {
            if command.repeat_count == 0 {
                trace!(command = %command.name, "Zero repeat count, nothing to send");
                continue;
            }
            if let Some(last) = self.last_write {
                pause_until(last + self.min_gap, shutdown).await?;
            }
            for repeat in 0..command.repeat_count {
                if repeat > 0 {
                    pause_until(Instant::now() + command.repeat_delay, shutdown).await?;
                }
                debug!(line = %command.text, command = %command.name, "Sending");
                transport
                    .write_line(&command.text)
                    .await
                    .map_err(|source| Error::Dispatch { sent, source })?;
                self.last_write = Some(Instant::now());
                sent += 1;
            }
        }
        Ok(sent)
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_COMMAND_GAP)
    }
}

async fn pause_until(deadline: Instant, shutdown: &mut watch::Receiver<bool>) -> Result<(), Error> {
    if *shutdown.borrow() {
        return Err(Error::Cancelled);
    }
    if deadline <= Instant::now() {
        return Ok(());
    }
    tokio::select! {
        () = sleep_until(deadline) => Ok(()),
        _ = shutdown.wait_for(|stop| *stop) => Err(Error::Cancelled),
    }
}
