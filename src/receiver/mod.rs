// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Running receivers.
//!
//! A [`Receiver`] owns one link to one physical receiver. Starting it spawns
//! three tasks:
//!
//! - the dispatcher, which takes queued actions one at a time, compiles
//!   each against the current state and writes it through a [`Pacer`]
//! - the read loop, which frames inbound bytes and applies matched
//!   responses to the state store
//! - optionally a poller, which queues `pollAllZones` periodically
//!
//! All writes go through the single dispatch queue, so concurrent requests
//! and polls never interleave on the wire.
//!
//! # Examples
//!
//! ```no_run
//! use niles_lib::profile::Profile;
//! use niles_lib::receiver::{Receiver, ReceiverConfig};
//! use niles_lib::types::{Volume, ZoneId};
//!
//! # async fn example() -> niles_lib::Result<()> {
//! let profile = Profile::niles_zr6()?;
//! let receiver = Receiver::connect_tcp("192.168.1.40:4999", profile, ReceiverConfig::new("Den")).await?;
//!
//! let kitchen = ZoneId::new(2)?;
//! receiver.register_zone(kitchen)?;
//! receiver.poll_zone(kitchen).await?;
//! receiver.set_zone_volume(kitchen, Volume::new(30)?).await?;
//!
//! receiver.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod context;
mod worker;

pub use config::{DEFAULT_EVENT_CAPACITY, DEFAULT_QUEUE_CAPACITY, MAX_VOLUME_PROPERTY, ReceiverConfig, SOURCE_COUNT};

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::command::{ActionParams, CompiledCommand};
use crate::error::{Error, Result};
use crate::event::{EventBus, ReceiverEvent, ReceiverId};
use crate::profile::Profile;
use crate::protocol::{LineFramer, Pacer, StreamTransport, Transport};
use crate::state::{MemoryStateStore, StateStore, ZoneState};
use crate::types::{Volume, ZoneId};

use context::Context;
use worker::{Job, POLL_ALL_ZONES};

/// What an action is invoked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The receiver as a whole.
    Receiver,
    /// One registered zone.
    Zone(ZoneId),
}

impl Target {
    /// Returns the zone, for zone targets.
    #[must_use]
    pub fn zone(&self) -> Option<ZoneId> {
        match self {
            Self::Receiver => None,
            Self::Zone(zone) => Some(*zone),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receiver => f.write_str("receiver"),
            Self::Zone(zone) => write!(f, "zone {zone}"),
        }
    }
}

/// Handle to a running receiver.
///
/// Dropping the handle signals the background tasks to stop; call
/// [`shutdown`](Self::shutdown) to also wait for them.
pub struct Receiver {
    ctx: Arc<Context>,
    queue: mpsc::Sender<Job>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    sources: Vec<(u8, String)>,
    max_volume: Volume,
}

impl Receiver {
    /// Starts a receiver over a duplex byte stream, with in-memory state.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start<S>(io: S, profile: Profile, config: ReceiverConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::start_with_store(io, profile, config, Arc::new(MemoryStateStore::new()))
    }

    /// Starts a receiver over a duplex byte stream with a host-provided
    /// state store.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start_with_store<S>(io: S, profile: Profile, config: ReceiverConfig, store: Arc<dyn StateStore>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(io);
        Self::start_with_transport(reader, StreamTransport::new(writer), profile, config, store)
    }

    /// Starts a receiver from a separate reader and transport.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start_with_transport<R, T>(
        reader: R,
        transport: T,
        profile: Profile,
        config: ReceiverConfig,
        store: Arc<dyn StateStore>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        T: Transport + Send + 'static,
    {
        let ctx = Arc::new(Context {
            id: ReceiverId::new(),
            name: config.name.clone(),
            props: config.bindings(),
            profile,
            store,
            events: EventBus::with_capacity(config.event_capacity),
        });
        let (queue, jobs) = mpsc::channel(config.queue_capacity);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let mut tasks = vec![
            tokio::spawn(worker::run_dispatcher(
                Arc::clone(&ctx),
                transport,
                Pacer::new(config.min_command_gap),
                jobs,
                queue.downgrade(),
                shutdown_rx.clone(),
            )),
            tokio::spawn(worker::run_reader(
                Arc::clone(&ctx),
                reader,
                LineFramer::new(config.max_line_length),
                shutdown_rx.clone(),
            )),
        ];
        if let Some(period) = config.poll_interval {
            tasks.push(tokio::spawn(worker::run_poller(
                Arc::clone(&ctx),
                queue.clone(),
                period,
                shutdown_rx,
            )));
        }

        info!(
            receiver = %ctx.name,
            id = %ctx.id,
            profile = ctx.profile.name(),
            gap_ms = config.min_command_gap.as_millis(),
            "Receiver started"
        );

        Self {
            ctx,
            queue,
            shutdown,
            tasks: Mutex::new(tasks),
            sources: config.source_options(),
            max_volume: config.max_volume(),
        }
    }

    /// Connects to a serial-to-IP bridge and starts a receiver on it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the connection cannot be opened.
    #[cfg(feature = "tcp")]
    pub async fn connect_tcp(
        addr: impl tokio::net::ToSocketAddrs,
        profile: Profile,
        config: ReceiverConfig,
    ) -> Result<Self> {
        let stream = tokio::net::TcpStream::connect(addr)
            .await
            .map_err(crate::error::TransportError::from)?;
        stream.set_nodelay(true).map_err(crate::error::TransportError::from)?;
        Ok(Self::start(stream, profile, config))
    }

    /// Returns the receiver identifier.
    #[must_use]
    pub fn id(&self) -> ReceiverId {
        self.ctx.id
    }

    /// Returns the configured display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    /// Returns the loaded profile.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.ctx.profile
    }

    /// Subscribes to receiver events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReceiverEvent> {
        self.ctx.events.subscribe()
    }

    /// Returns `true` until shutdown has been requested or the dispatcher
    /// has stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !*self.shutdown.borrow() && !self.queue.is_closed()
    }

    // =========================================================================
    // Zones
    // =========================================================================

    /// Registers a zone, creating its state.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateZone` if the zone is already registered.
    pub fn register_zone(&self, zone: ZoneId) -> Result<()> {
        if !self.ctx.store.insert(ZoneState::new(zone)) {
            return Err(Error::DuplicateZone(zone));
        }
        info!(receiver = %self.ctx.name, %zone, "Zone registered");
        self.ctx.events.publish(ReceiverEvent::ZoneRegistered {
            receiver_id: self.ctx.id,
            zone,
        });
        Ok(())
    }

    /// Unregisters a zone and returns its last state.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownZone` if the zone is not registered.
    pub fn unregister_zone(&self, zone: ZoneId) -> Result<ZoneState> {
        let state = self.ctx.store.remove(zone).ok_or(Error::UnknownZone(zone))?;
        info!(receiver = %self.ctx.name, %zone, "Zone unregistered");
        self.ctx.events.publish(ReceiverEvent::ZoneUnregistered {
            receiver_id: self.ctx.id,
            zone,
        });
        Ok(state)
    }

    /// Returns the registered zones in ascending order.
    #[must_use]
    pub fn zones(&self) -> Vec<ZoneId> {
        self.ctx.store.zones()
    }

    /// Returns a snapshot of a zone's state.
    #[must_use]
    pub fn zone_state(&self, zone: ZoneId) -> Option<ZoneState> {
        self.ctx.store.get(zone)
    }

    /// Returns the receiver's active control zone, if reported.
    #[must_use]
    pub fn active_zone(&self) -> Option<ZoneId> {
        self.ctx.store.active_zone()
    }

    /// Lists labelled sources as `(number, "Source n: label")`.
    #[must_use]
    pub fn source_options(&self) -> &[(u8, String)] {
        &self.sources
    }

    /// Returns the configured volume ceiling.
    #[must_use]
    pub fn max_volume(&self) -> Volume {
        self.max_volume
    }

    /// Returns a zone's volume as a 0-100 brightness relative to the
    /// volume ceiling; 0 when the zone is off.
    #[must_use]
    pub fn zone_brightness(&self, zone: ZoneId) -> Option<u8> {
        self.zone_state(zone).map(|state| state.brightness(self.max_volume))
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Compiles an action against the current state without sending it.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`execute`](Self::execute) would before
    /// writing anything.
    pub fn preview(&self, action: &str, target: Target, params: &ActionParams) -> Result<Vec<CompiledCommand>> {
        self.ctx.compile(action, target, params)
    }

    /// Queues an action and waits until it has been written.
    ///
    /// Returns the number of lines written. When at least one line was
    /// written, the action's follow-up, if any, is queued afterwards and
    /// not waited for.
    ///
    /// # Errors
    ///
    /// Returns `Error::Compile` or `Error::UnknownZone` if the action could
    /// not be compiled (nothing is written), `Error::Dispatch` if a write
    /// failed, or `Error::NotRunning`/`Error::Cancelled` on shutdown.
    pub async fn execute(&self, action: &str, target: Target, params: ActionParams) -> Result<usize> {
        let (reply, outcome) = oneshot::channel();
        let job = Job {
            action: action.to_string(),
            target,
            params,
            reply: Some(reply),
        };
        self.queue.send(job).await.map_err(|_| Error::NotRunning)?;
        outcome.await.map_err(|_| Error::NotRunning)?
    }

    /// Runs a zone action with `(name, value)` parameters.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn zone_action(&self, zone: ZoneId, action: &str, params: &[(&str, String)]) -> Result<usize> {
        let params = params
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();
        self.execute(action, Target::Zone(zone), params).await
    }

    /// Powers a zone on (selecting its current source) or off.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn set_zone_power(&self, zone: ZoneId, on: bool) -> Result<usize> {
        self.zone_action(zone, "changeZonePower", &[("powerState", u8::from(on).to_string())])
            .await
    }

    /// Selects a zone's source (clamped to 1-6).
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn set_zone_source(&self, zone: ZoneId, source: u8) -> Result<usize> {
        self.zone_action(zone, "changeZoneSource", &[("zoneSource", source.to_string())])
            .await
    }

    /// Steps a zone's volume to `target`.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn set_zone_volume(&self, zone: ZoneId, target: Volume) -> Result<usize> {
        self.zone_action(zone, "setZoneVolume", &[("volumeTarget", target.to_string())])
            .await
    }

    /// Sets a zone's volume from a 0-100 brightness scaled to the volume
    /// ceiling.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn set_zone_brightness(&self, zone: ZoneId, brightness: u8) -> Result<usize> {
        let target = Volume::from_brightness(brightness, self.max_volume);
        debug!(receiver = %self.ctx.name, %zone, brightness, volume = %target, "Brightness to volume");
        self.set_zone_volume(zone, target).await
    }

    /// Raises a zone's brightness by `amount`, capped at 100.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownZone` for an unregistered zone, otherwise see
    /// [`execute`](Self::execute).
    pub async fn brighten_zone_by(&self, zone: ZoneId, amount: u8) -> Result<usize> {
        let current = self.zone_brightness(zone).ok_or(Error::UnknownZone(zone))?;
        self.set_zone_brightness(zone, current.saturating_add(amount).min(100)).await
    }

    /// Lowers a zone's brightness by `amount`, stopping at 0.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownZone` for an unregistered zone, otherwise see
    /// [`execute`](Self::execute).
    pub async fn dim_zone_by(&self, zone: ZoneId, amount: u8) -> Result<usize> {
        let current = self.zone_brightness(zone).ok_or(Error::UnknownZone(zone))?;
        self.set_zone_brightness(zone, current.saturating_sub(amount)).await
    }

    /// Mutes or unmutes a zone; nothing is toggled if it already matches.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn set_zone_mute(&self, zone: ZoneId, muted: bool) -> Result<usize> {
        self.zone_action(zone, "setZoneMute", &[("muteState", u8::from(muted).to_string())])
            .await
    }

    /// Requests a status report for one zone.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn poll_zone(&self, zone: ZoneId) -> Result<usize> {
        self.execute("pollZone", Target::Zone(zone), ActionParams::new())
            .await
    }

    /// Requests a status report for every registered zone.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn poll_all_zones(&self) -> Result<usize> {
        self.execute(POLL_ALL_ZONES, Target::Receiver, ActionParams::new())
            .await
    }

    /// Stops the background tasks and waits for them.
    ///
    /// A dispatch in progress is abandoned at its next wait; no line is
    /// left half written.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let tasks = std::mem::take(&mut *self.tasks.lock());
        if tasks.is_empty() {
            return;
        }
        for task in tasks {
            let _ = task.await;
        }
        info!(receiver = %self.ctx.name, "Receiver stopped");
        self.ctx.events.publish(ReceiverEvent::Stopped {
            receiver_id: self.ctx.id,
        });
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("id", &self.ctx.id)
            .field("name", &self.ctx.name)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
