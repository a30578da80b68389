// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background tasks: the dispatch worker, the read loop and the poller.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::command::ActionParams;
use crate::error::Error;
use crate::event::ReceiverEvent;
use crate::protocol::{LineFramer, Pacer, Transport};

use super::Target;
use super::context::Context;

/// Action run by the periodic poller.
pub(crate) const POLL_ALL_ZONES: &str = "pollAllZones";

/// One queued action.
pub(crate) struct Job {
    pub(crate) action: String,
    pub(crate) target: Target,
    pub(crate) params: ActionParams,
    /// Present when a caller waits for the outcome.
    pub(crate) reply: Option<oneshot::Sender<Result<usize, Error>>>,
}

impl Job {
    pub(crate) fn background(action: impl Into<String>, target: Target) -> Self {
        Self {
            action: action.into(),
            target,
            params: ActionParams::new(),
            reply: None,
        }
    }
}

/// Runs queued actions one at a time so writes never interleave.
///
/// Each action is compiled when it reaches the front of the queue, which
/// keeps the state snapshot as fresh as possible.
pub(crate) async fn run_dispatcher<T: Transport>(
    ctx: Arc<Context>,
    mut transport: T,
    mut pacer: Pacer,
    mut jobs: mpsc::Receiver<Job>,
    queue: mpsc::WeakSender<Job>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let job = tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break,
            job = jobs.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let result = match ctx.compile(&job.action, job.target, &job.params) {
            Ok(commands) => pacer.dispatch(&commands, &mut transport, &mut shutdown).await,
            Err(error) => Err(error),
        };
        let cancelled = matches!(result, Err(Error::Cancelled));

        // Nothing written means nothing changed; skip the refresh.
        if matches!(result, Ok(sent) if sent > 0)
            && let Some(follow_up) = ctx.follow_up(&job.action)
        {
            enqueue_follow_up(&ctx, &queue, follow_up, job.target);
        }

        match (job.reply, result) {
            (Some(reply), result) => {
                if let Err(error) = &result {
                    warn!(receiver = %ctx.name, action = %job.action, %error, "Action failed");
                }
                let _ = reply.send(result);
            }
            (None, Ok(sent)) => debug!(receiver = %ctx.name, action = %job.action, sent, "Background action done"),
            (None, Err(error)) => report_failure(&ctx, &job.action, job.target, &error),
        }

        if cancelled {
            break;
        }
    }
    debug!(receiver = %ctx.name, "Dispatcher stopped");
}

fn enqueue_follow_up(ctx: &Context, queue: &mpsc::WeakSender<Job>, action: &str, target: Target) {
    let Some(queue) = queue.upgrade() else {
        return;
    };
    debug!(receiver = %ctx.name, action, ?target, "Queueing follow-up");
    if let Err(error) = queue.try_send(Job::background(action, target)) {
        warn!(receiver = %ctx.name, action, %error, "Could not queue follow-up");
        ctx.events.publish(ReceiverEvent::ActionFailed {
            receiver_id: ctx.id,
            action: action.to_string(),
            zone: target.zone(),
            error: error.to_string(),
        });
    }
}

fn report_failure(ctx: &Context, action: &str, target: Target, error: &Error) {
    warn!(receiver = %ctx.name, action, %error, "Background action failed");
    ctx.events.publish(ReceiverEvent::ActionFailed {
        receiver_id: ctx.id,
        action: action.to_string(),
        zone: target.zone(),
        error: error.to_string(),
    });
}

/// Reads inbound bytes, frames them and applies each line.
///
/// Runs independently of the dispatcher, so pacing waits never delay
/// response handling.
pub(crate) async fn run_reader<R: AsyncRead + Unpin>(
    ctx: Arc<Context>,
    mut reader: R,
    mut framer: LineFramer,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buffer = [0_u8; 512];
    loop {
        let read = tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break,
            read = reader.read(&mut buffer) => read,
        };
        match read {
            Ok(0) => {
                if let Some(line) = framer.finish() {
                    ctx.handle_line(&line);
                }
                info!(receiver = %ctx.name, "Receiver link closed");
                break;
            }
            Ok(n) => {
                for line in framer.push(&buffer[..n]) {
                    ctx.handle_line(&line);
                }
            }
            Err(error) => {
                warn!(receiver = %ctx.name, %error, "Read failed, stopping read loop");
                break;
            }
        }
    }
    debug!(receiver = %ctx.name, "Read loop stopped");
}

/// Queues `pollAllZones` every `period` through the dispatch queue.
///
/// A tick is skipped when the queue is full; the next one retries.
pub(crate) async fn run_poller(
    ctx: Arc<Context>,
    queue: mpsc::Sender<Job>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break,
            _ = ticks.tick() => {
                match queue.try_send(Job::background(POLL_ALL_ZONES, Target::Receiver)) {
                    Ok(()) => debug!(receiver = %ctx.name, "Queued periodic poll"),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!(receiver = %ctx.name, "Queue full, skipping periodic poll");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        }
    }
    debug!(receiver = %ctx.name, "Poller stopped");
}
