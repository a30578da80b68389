// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests driving a full receiver over in-memory links.

use std::sync::Arc;
use std::time::Duration;

use niles_lib::command::ActionParams;
use niles_lib::error::{CompileError, Error, TransportError};
use niles_lib::event::ReceiverEvent;
use niles_lib::protocol::Transport;
use niles_lib::state::MemoryStateStore;
use niles_lib::{Profile, Receiver, ReceiverConfig, Target, Volume, ZoneId};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep, timeout};

// ============================================================================
// Harness
// ============================================================================

/// Transport that records every line with its write time.
#[derive(Clone, Default)]
struct Recorder {
    writes: Arc<Mutex<Vec<(String, Instant)>>>,
    fail_on: Option<usize>,
}

impl Recorder {
    fn failing_on(write: usize) -> Self {
        Self {
            fail_on: Some(write),
            ..Self::default()
        }
    }

    fn lines(&self) -> Vec<String> {
        self.writes.lock().iter().map(|(line, _)| line.clone()).collect()
    }

    fn times(&self) -> Vec<Instant> {
        self.writes.lock().iter().map(|(_, at)| *at).collect()
    }
}

impl Transport for Recorder {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut writes = self.writes.lock();
        if self.fail_on == Some(writes.len() + 1) {
            return Err(TransportError::Closed);
        }
        writes.push((line.to_string(), Instant::now()));
        Ok(())
    }
}

struct Harness {
    receiver: Arc<Receiver>,
    recorder: Recorder,
    /// Far end of the inbound link; bytes written here reach the read loop.
    link: DuplexStream,
    events: broadcast::Receiver<ReceiverEvent>,
}

fn harness_with(recorder: Recorder, config: ReceiverConfig) -> Harness {
    let (inbound, link) = tokio::io::duplex(4096);
    let receiver = Receiver::start_with_transport(
        inbound,
        recorder.clone(),
        Profile::niles_zr6().unwrap(),
        config,
        Arc::new(MemoryStateStore::new()),
    );
    let events = receiver.subscribe();
    Harness {
        receiver: Arc::new(receiver),
        recorder,
        link,
        events,
    }
}

fn harness() -> Harness {
    harness_with(Recorder::default(), ReceiverConfig::new("test"))
}

fn zone(n: u8) -> ZoneId {
    ZoneId::new(n).unwrap()
}

async fn wait_for(
    events: &mut broadcast::Receiver<ReceiverEvent>,
    mut predicate: impl FnMut(&ReceiverEvent) -> bool,
) -> ReceiverEvent {
    timeout(Duration::from_secs(30), async {
        loop {
            let event = events.recv().await.unwrap();
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event not received")
}

async fn report(h: &mut Harness, line: &str) {
    h.link.write_all(line.as_bytes()).await.unwrap();
    h.link.write_all(b"\r\n").await.unwrap();
}

// ============================================================================
// Dispatch
// ============================================================================

mod dispatch {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn volume_set_pulses_then_polls() {
        let mut h = harness();
        h.receiver.register_zone(zone(3)).unwrap();
        report(&mut h, "usc,2,3,2,1,40,0,6,7").await;
        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;

        let sent = h.receiver.set_zone_volume(zone(3), Volume::new(65).unwrap()).await.unwrap();
        assert_eq!(sent, 25);

        sleep(Duration::from_secs(1)).await;
        let lines = h.recorder.lines();
        assert_eq!(lines.len(), 27);
        assert!(lines[..25].iter().all(|l| l == "zsc,3,12"));
        assert_eq!(lines[25..], ["znc,4,3", "znc,5"]);

        let times = h.recorder.times();
        assert!(times[1] - times[0] >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn volume_at_target_writes_nothing() {
        let mut h = harness();
        h.receiver.register_zone(zone(2)).unwrap();
        report(&mut h, "usc,2,2,1,1,30,0,0,0").await;
        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;

        let sent = h.receiver.set_zone_volume(zone(2), Volume::new(30).unwrap()).await.unwrap();
        assert_eq!(sent, 0);

        sleep(Duration::from_secs(1)).await;
        assert!(h.recorder.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_adjustment_writes_nothing() {
        let h = harness();
        h.receiver.register_zone(zone(4)).unwrap();

        let sent = h
            .receiver
            .zone_action(zone(4), "adjustZoneVolume", &[("volumeAdjustment", "0".to_string())])
            .await
            .unwrap();
        assert_eq!(sent, 0);

        sleep(Duration::from_secs(1)).await;
        assert!(h.recorder.lines().is_empty());

        h.receiver
            .zone_action(zone(4), "adjustZoneVolume", &[("volumeAdjustment", "-2".to_string())])
            .await
            .unwrap();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(h.recorder.lines(), ["zsc,4,13", "zsc,4,13", "znc,4,4", "znc,5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn mute_already_set_still_refreshes() {
        let mut h = harness();
        h.receiver.register_zone(zone(2)).unwrap();
        report(&mut h, "rznc,4,2").await;
        report(&mut h, "usc,2,2,1,1,30,1,0,0").await;
        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;

        h.receiver.set_zone_mute(zone(2), true).await.unwrap();
        assert_eq!(h.recorder.lines(), ["znc,5"]);

        h.receiver.set_zone_mute(zone(2), false).await.unwrap();
        assert_eq!(h.recorder.lines(), ["znc,5", "zsc,2,11", "znc,5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_requests_never_interleave() {
        let h = harness();
        h.receiver.register_zone(zone(1)).unwrap();
        h.receiver.register_zone(zone(2)).unwrap();

        let first = {
            let receiver = Arc::clone(&h.receiver);
            tokio::spawn(async move { receiver.set_zone_volume(zone(1), Volume::new(6).unwrap()).await })
        };
        let second = {
            let receiver = Arc::clone(&h.receiver);
            tokio::spawn(async move { receiver.set_zone_volume(zone(2), Volume::new(4).unwrap()).await })
        };
        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        sleep(Duration::from_secs(2)).await;

        let lines = h.recorder.lines();
        let pulses: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| l.starts_with("zsc,"))
            .collect();
        assert_eq!(pulses.len(), 10);

        // Each request's pulses form one contiguous run.
        let runs = pulses.windows(2).filter(|w| w[0] != w[1]).count() + 1;
        assert_eq!(runs, 2);
        let first_pulse = lines.iter().position(|l| l.starts_with("zsc,")).unwrap();
        let last_pulse = lines.iter().rposition(|l| l.starts_with("zsc,")).unwrap();
        assert_eq!(last_pulse - first_pulse, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_respect_minimum_gap() {
        let h = harness_with(
            Recorder::default(),
            ReceiverConfig::new("test").with_min_command_gap(Duration::from_millis(300)),
        );
        h.receiver.register_zone(zone(4)).unwrap();

        h.receiver.poll_zone(zone(4)).await.unwrap();
        h.receiver.execute("allZonesOff", Target::Receiver, ActionParams::new()).await.unwrap();
        sleep(Duration::from_secs(5)).await;

        assert_eq!(h.recorder.lines(), ["znc,4,4", "znc,5", "znt,10,h", "znc,4,4", "znc,5"]);
        let times = h.recorder.times();
        assert!(times.windows(2).all(|w| w[1] - w[0] >= Duration::from_millis(300)));
    }

    #[tokio::test(start_paused = true)]
    async fn broadcast_follow_up_polls_every_zone() {
        let h = harness();
        h.receiver.register_zone(zone(3)).unwrap();
        h.receiver.register_zone(zone(1)).unwrap();

        h.receiver.execute("allZonesOff", Target::Receiver, ActionParams::new()).await.unwrap();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(h.recorder.lines(), ["znt,10,h", "znc,4,1", "znc,5", "znc,4,3", "znc,5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn write_failure_stops_dispatch() {
        let h = harness_with(Recorder::failing_on(4), ReceiverConfig::new("test"));
        h.receiver.register_zone(zone(1)).unwrap();

        let err = h
            .receiver
            .set_zone_volume(zone(1), Volume::new(10).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Dispatch { sent: 3, .. }));

        // No follow-up after a failed dispatch.
        sleep(Duration::from_secs(2)).await;
        assert_eq!(h.recorder.lines().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn compile_errors_write_nothing() {
        let h = harness();

        let err = h.receiver.poll_zone(zone(9)).await.unwrap_err();
        assert!(matches!(err, Error::UnknownZone(z) if z == zone(9)));

        let err = h
            .receiver
            .execute("tuneToStation", Target::Receiver, ActionParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::MissingParameter { .. })));

        let err = h
            .receiver
            .execute("launchRocket", Target::Receiver, ActionParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::UnknownAction(_))));

        assert!(h.recorder.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn text_parameters_cannot_smuggle_lines() {
        let h = harness();

        let raw = ActionParams::from([("command".to_string(), "znc,5\rznt,10,h".to_string())]);
        let err = h.receiver.execute("sendRawCommand", Target::Receiver, raw).await.unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::InvalidParameter { .. })));

        let station = ActionParams::from([("stationNumber".to_string(), "101.1\rzsc,1,10".to_string())]);
        let err = h.receiver.execute("tuneToStation", Target::Receiver, station).await.unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::InvalidParameter { .. })));

        sleep(Duration::from_secs(1)).await;
        assert!(h.recorder.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn raw_and_tuner_commands() {
        let h = harness();
        let station = ActionParams::from([("stationNumber".to_string(), "98.5".to_string())]);
        h.receiver.execute("tuneToStation", Target::Receiver, station).await.unwrap();
        let raw = ActionParams::from([("command".to_string(), "znc,5".to_string())]);
        h.receiver.execute("sendRawCommand", Target::Receiver, raw).await.unwrap();

        assert_eq!(h.recorder.lines(), ["src,11,98.5", "znc,5"]);
    }
}

// ============================================================================
// Volume ceiling and brightness
// ============================================================================

mod brightness {
    use super::*;

    fn ceiling_harness() -> Harness {
        harness_with(
            Recorder::default(),
            ReceiverConfig::new("test").with_max_volume(Volume::new(38).unwrap()),
        )
    }

    fn pulses(lines: &[String], code: &str) -> usize {
        lines.iter().filter(|l| l.ends_with(code) && l.starts_with("zsc,")).count()
    }

    #[tokio::test(start_paused = true)]
    async fn volume_target_stops_at_ceiling() {
        let mut h = ceiling_harness();
        h.receiver.register_zone(zone(1)).unwrap();
        report(&mut h, "usc,2,1,1,1,38,0,0,0").await;
        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;

        let sent = h.receiver.set_zone_volume(zone(1), Volume::new(65).unwrap()).await.unwrap();
        assert_eq!(sent, 0);
        sleep(Duration::from_secs(1)).await;
        assert!(h.recorder.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn brightness_maps_onto_volume_steps() {
        let mut h = ceiling_harness();
        h.receiver.register_zone(zone(1)).unwrap();
        report(&mut h, "usc,2,1,1,1,0,0,0,0").await;
        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;
        assert_eq!(h.receiver.zone_brightness(zone(1)), Some(0));

        // 50% of a 38 ceiling is volume 19.
        assert_eq!(h.receiver.set_zone_brightness(zone(1), 50).await.unwrap(), 19);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(pulses(&h.recorder.lines(), ",12"), 19);

        report(&mut h, "usc,2,1,1,1,19,0,0,0").await;
        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;
        assert_eq!(h.receiver.zone_brightness(zone(1)), Some(50));

        // 50 + 25 = 75% is volume 28.
        assert_eq!(h.receiver.brighten_zone_by(zone(1), 25).await.unwrap(), 9);

        report(&mut h, "usc,2,1,1,1,28,0,0,0").await;
        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;
        assert_eq!(h.receiver.dim_zone_by(zone(1), 200).await.unwrap(), 28);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(pulses(&h.recorder.lines(), ",13"), 28);
    }

    #[tokio::test(start_paused = true)]
    async fn powered_off_zone_brightens_from_zero() {
        let mut h = ceiling_harness();
        h.receiver.register_zone(zone(3)).unwrap();
        report(&mut h, "usc,2,3,1,0,10,0,0,0").await;
        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;
        assert_eq!(h.receiver.zone_brightness(zone(3)), Some(0));

        // Brightness 10 is volume 3, down from the stored 10.
        assert_eq!(h.receiver.brighten_zone_by(zone(3), 10).await.unwrap(), 7);
        let lines = h.recorder.lines();
        assert_eq!(pulses(&lines, ",13"), 7);
        assert_eq!(pulses(&lines, ",12"), 0);
    }
}

// ============================================================================
// Responses
// ============================================================================

mod responses {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn status_report_updates_zone() {
        let mut h = harness();
        h.receiver.register_zone(zone(3)).unwrap();

        report(&mut h, "usc,2,3,2,1,45,0,6,7").await;
        let event = wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;

        let ReceiverEvent::ZoneChanged { new_state, .. } = event else {
            unreachable!();
        };
        assert_eq!(new_state.zone, zone(3));
        assert_eq!(new_state.source, 2);
        assert!(new_state.power_on);
        assert_eq!(new_state.volume.value(), 45);
        assert!(!new_state.muted);
        assert_eq!((new_state.bass, new_state.treble), (6, 7));
        assert_eq!(h.receiver.zone_state(zone(3)), Some(new_state));
    }

    #[tokio::test(start_paused = true)]
    async fn active_zone_report_leaves_zone_state() {
        let mut h = harness();
        h.receiver.register_zone(zone(7)).unwrap();
        let before = h.receiver.zone_state(zone(7));

        report(&mut h, "rznc,4,7").await;
        wait_for(&mut h.events, |e| matches!(e, ReceiverEvent::ActiveZoneChanged { .. })).await;

        assert_eq!(h.receiver.active_zone(), Some(zone(7)));
        assert_eq!(h.receiver.zone_state(zone(7)), before);
    }

    #[tokio::test(start_paused = true)]
    async fn garbage_produces_one_unmatched_event() {
        let mut h = harness();
        h.receiver.register_zone(zone(1)).unwrap();
        let before = h.receiver.zone_state(zone(1));

        report(&mut h, "garbage").await;
        report(&mut h, "rznc,4,1").await;

        let mut unmatched = 0;
        loop {
            match wait_for(&mut h.events, |_| true).await {
                ReceiverEvent::UnmatchedLine { line, .. } => {
                    assert_eq!(line, "garbage");
                    unmatched += 1;
                }
                ReceiverEvent::ActiveZoneChanged { .. } => break,
                _ => {}
            }
        }
        assert_eq!(unmatched, 1);
        assert_eq!(h.receiver.zone_state(zone(1)), before);
    }

    #[tokio::test(start_paused = true)]
    async fn reads_continue_during_paced_dispatch() {
        let mut h = harness();
        h.receiver.register_zone(zone(5)).unwrap();

        let dispatch = {
            let receiver = Arc::clone(&h.receiver);
            tokio::spawn(async move { receiver.set_zone_volume(zone(5), Volume::new(30).unwrap()).await })
        };
        sleep(Duration::from_millis(450)).await;

        report(&mut h, "usc,2,5,1,1,4,0,0,0").await;
        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;
        assert!(h.recorder.lines().len() < 30);

        assert_eq!(dispatch.await.unwrap().unwrap(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn split_and_noisy_input() {
        let mut h = harness();
        h.receiver.register_zone(zone(2)).unwrap();

        h.link.write_all(b"\xff\xfe\r\nusc,2,2,3,").await.unwrap();
        sleep(Duration::from_millis(10)).await;
        h.link.write_all(b"1,12,0,0,0   \r").await.unwrap();

        wait_for(&mut h.events, ReceiverEvent::is_zone_change).await;
        let state = h.receiver.zone_state(zone(2)).unwrap();
        assert_eq!(state.source, 3);
        assert_eq!(state.volume.value(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_volume_reported() {
        let mut h = harness();
        h.receiver.register_zone(zone(1)).unwrap();

        report(&mut h, "usc,2,1,2,1,140,0,0,0").await;
        let event = wait_for(&mut h.events, |e| matches!(e, ReceiverEvent::DecodeFailed { .. })).await;

        assert!(matches!(event, ReceiverEvent::DecodeFailed { ref pattern, .. } if pattern == "zoneStatus"));
        assert_eq!(h.receiver.zone_state(zone(1)).unwrap().volume, Volume::MIN);
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn periodic_poll_goes_through_queue() {
        let h = harness_with(
            Recorder::default(),
            ReceiverConfig::new("test").with_poll_interval(Duration::from_secs(60)),
        );
        h.receiver.register_zone(zone(1)).unwrap();

        sleep(Duration::from_secs(59)).await;
        assert!(h.recorder.lines().is_empty());

        sleep(Duration::from_secs(2)).await;
        assert_eq!(h.recorder.lines(), ["znc,4,1", "znc,5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_abandons_dispatch_between_writes() {
        let mut h = harness();
        h.receiver.register_zone(zone(1)).unwrap();

        let dispatch = {
            let receiver = Arc::clone(&h.receiver);
            tokio::spawn(async move { receiver.set_zone_volume(zone(1), Volume::new(50).unwrap()).await })
        };
        sleep(Duration::from_millis(250)).await;
        h.receiver.shutdown().await;

        assert!(matches!(dispatch.await.unwrap(), Err(Error::Cancelled)));
        assert_eq!(h.recorder.lines().len(), 3);
        wait_for(&mut h.events, |e| matches!(e, ReceiverEvent::Stopped { .. })).await;
        assert!(!h.receiver.is_running());
    }

    #[tokio::test]
    async fn stream_transport_writes_terminated_lines() {
        let (io, mut peer) = tokio::io::duplex(1024);
        let receiver = Receiver::start(io, Profile::niles_zr6().unwrap(), ReceiverConfig::new("test"));
        let mut events = receiver.subscribe();
        receiver.register_zone(zone(6)).unwrap();

        receiver.poll_zone(zone(6)).await.unwrap();

        let mut buffer = vec![0_u8; b"znc,4,6\rznc,5\r".len()];
        peer.read_exact(&mut buffer).await.unwrap();
        assert_eq!(buffer, b"znc,4,6\rznc,5\r");

        peer.write_all(b"usc,2,6,1,1,20,0,0,0\r").await.unwrap();
        wait_for(&mut events, ReceiverEvent::is_zone_change).await;
        assert_eq!(receiver.zone_state(zone(6)).unwrap().volume.value(), 20);

        receiver.shutdown().await;
    }
}
