// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Receiver configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::expr::{Bindings, Value};
use crate::protocol::{DEFAULT_MAX_LINE_LENGTH, DEFAULT_MIN_COMMAND_GAP};
use crate::types::Volume;

/// Default number of queued actions per receiver.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default event bus capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Number of selectable sources on a ZR-6.
pub const SOURCE_COUNT: u8 = 6;

/// Property holding the receiver's volume ceiling.
pub const MAX_VOLUME_PROPERTY: &str = "maxVolume";

/// Configuration for one receiver.
///
/// Properties are free-form strings visible to command templates as the
/// `props` namespace. Source labels are stored as `source1Label` through
/// `source6Label`. The volume ceiling is `maxVolume`; it is always bound
/// as an integer, defaulting to 100.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use niles_lib::receiver::ReceiverConfig;
///
/// let config = ReceiverConfig::new("Living Room ZR-6")
///     .with_property("source1Label", "Tuner")
///     .with_property("source3Label", "Turntable")
///     .with_poll_interval(Duration::from_secs(60));
///
/// assert_eq!(
///     config.source_options(),
///     vec![(1, "Source 1: Tuner".to_string()), (3, "Source 3: Turntable".to_string())]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Display name used in logs.
    pub name: String,
    /// Device properties, bound as `props.<name>`.
    pub properties: HashMap<String, String>,
    /// Minimum pause between two command entries.
    pub min_command_gap: Duration,
    /// Interval for automatic `pollAllZones`; `None` disables polling.
    pub poll_interval: Option<Duration>,
    /// Maximum number of queued actions.
    pub queue_capacity: usize,
    /// Event bus capacity.
    pub event_capacity: usize,
    /// Maximum accepted inbound line length in bytes.
    pub max_line_length: usize,
}

impl ReceiverConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
            min_command_gap: DEFAULT_MIN_COMMAND_GAP,
            poll_interval: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Sets one device property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Sets several device properties.
    #[must_use]
    pub fn with_properties<K, V>(mut self, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the hardware volume ceiling (a ZR-6 tops out at 38).
    ///
    /// Volume targets are clamped to it and brightness is scaled by it.
    #[must_use]
    pub fn with_max_volume(self, ceiling: Volume) -> Self {
        self.with_property(MAX_VOLUME_PROPERTY, ceiling.to_string())
    }

    /// Returns the volume ceiling, or [`Volume::MAX`] when `maxVolume` is
    /// unset or not a valid level.
    #[must_use]
    pub fn max_volume(&self) -> Volume {
        self.properties
            .get(MAX_VOLUME_PROPERTY)
            .and_then(|raw| raw.trim().parse::<u8>().ok())
            .and_then(|level| Volume::new(level).ok())
            .unwrap_or(Volume::MAX)
    }

    /// Sets the minimum inter-command gap.
    #[must_use]
    pub fn with_min_command_gap(mut self, gap: Duration) -> Self {
        self.min_command_gap = gap;
        self
    }

    /// Enables periodic polling. A zero interval disables it.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Sets the action queue capacity (at least 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sets the maximum inbound line length.
    #[must_use]
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    /// Returns the properties as `props` bindings.
    ///
    /// Every property is text except `maxVolume`, which is the integer
    /// [`max_volume`](Self::max_volume).
    #[must_use]
    pub fn bindings(&self) -> Bindings {
        let mut bindings: Bindings = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        bindings.insert(
            MAX_VOLUME_PROPERTY.to_string(),
            Value::from(self.max_volume().value()),
        );
        bindings
    }

    /// Lists the labelled sources as `(number, "Source n: label")`.
    ///
    /// Sources without a label, or with a blank one, are left out.
    #[must_use]
    pub fn source_options(&self) -> Vec<(u8, String)> {
        (1..=SOURCE_COUNT)
            .filter_map(|n| {
                let label = self.properties.get(&format!("source{n}Label"))?.trim();
                (!label.is_empty()).then(|| (n, format!("Source {n}: {label}")))
            })
            .collect()
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self::new("Niles receiver")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReceiverConfig::default();
        assert_eq!(config.min_command_gap, Duration::from_millis(100));
        assert_eq!(config.poll_interval, None);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn zero_poll_interval_disables() {
        let config = ReceiverConfig::default()
            .with_poll_interval(Duration::from_secs(5))
            .with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval, None);
    }

    #[test]
    fn queue_capacity_floor() {
        assert_eq!(ReceiverConfig::default().with_queue_capacity(0).queue_capacity, 1);
    }

    #[test]
    fn properties_become_text_bindings() {
        let config = ReceiverConfig::default().with_properties([("source1Label", "Tuner"), ("room", "Den")]);
        let bindings = config.bindings();
        assert_eq!(bindings["source1Label"], Value::from("Tuner"));
        assert_eq!(bindings["room"], Value::from("Den"));
    }

    #[test]
    fn max_volume_defaults_to_full_scale() {
        let config = ReceiverConfig::default();
        assert_eq!(config.max_volume(), Volume::MAX);
        assert_eq!(config.bindings()[MAX_VOLUME_PROPERTY], Value::Int(100));
    }

    #[test]
    fn max_volume_bound_as_integer() {
        let config = ReceiverConfig::default().with_property(MAX_VOLUME_PROPERTY, " 38 ");
        assert_eq!(config.max_volume().value(), 38);
        assert_eq!(config.bindings()[MAX_VOLUME_PROPERTY], Value::Int(38));

        let typed = ReceiverConfig::default().with_max_volume(Volume::new(20).unwrap());
        assert_eq!(typed.bindings()[MAX_VOLUME_PROPERTY], Value::Int(20));
    }

    #[test]
    fn invalid_max_volume_ignored() {
        for raw in ["loud", "101", "-5"] {
            let config = ReceiverConfig::default().with_property(MAX_VOLUME_PROPERTY, raw);
            assert_eq!(config.max_volume(), Volume::MAX, "{raw}");
        }
    }

    #[test]
    fn blank_source_labels_skipped() {
        let config = ReceiverConfig::default()
            .with_property("source2Label", "  ")
            .with_property("source6Label", "Streamer")
            .with_property("source7Label", "Ignored");
        assert_eq!(config.source_options(), vec![(6, "Source 6: Streamer".to_string())]);
    }
}
