use serde::{Deserialize, Serialize};
use sesame_core::{
    CommandArgs, Error,
    constants::{DEFAULT_HISTORY_NAME, DEFAULT_LOW_BATTERY_THRESHOLD},
};
use std::time::Duration;

/// Per-manager device configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// History tag sent with every issued command
    pub history_name: String,

    /// Seconds between background status polls; `None` relies on pushes only
    pub poll_interval_secs: Option<u64>,

    /// Battery percentage at or below which a device counts as low
    pub low_battery_threshold: f64,

    /// Capacity of each push subscription channel
    pub event_buffer: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            history_name: DEFAULT_HISTORY_NAME.to_string(),
            poll_interval_secs: None,
            low_battery_threshold: DEFAULT_LOW_BATTERY_THRESHOLD,
            event_buffer: 32,
        }
    }
}

impl DeviceConfig {
    /// Create a configuration with the given history tag
    pub fn new(history_name: impl Into<String>) -> Self {
        Self {
            history_name: history_name.into(),
            ..Default::default()
        }
    }

    /// Enable background polling at the given interval
    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = Some(secs);
        self
    }

    /// Set the low battery threshold
    pub fn low_battery_threshold(mut self, threshold: f64) -> Self {
        self.low_battery_threshold = threshold;
        self
    }

    /// Set the push channel capacity
    pub fn event_buffer(mut self, buffer: usize) -> Self {
        self.event_buffer = buffer;
        self
    }

    /// Polling interval, if background polling is enabled.
    ///
    /// A zero interval disables polling.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Arguments sent with commands that don't specify their own.
    pub fn command_args(&self) -> CommandArgs {
        CommandArgs::new(self.history_name.clone())
    }

    /// Check values that would otherwise fail at runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty history tag, a threshold outside
    /// `0..=100`, or a zero event buffer.
    pub fn validate(&self) -> sesame_core::Result<()> {
        if self.history_name.trim().is_empty() {
            return Err(Error::Config("history_name must not be empty".to_string()));
        }
        if !(0.0..=100.0).contains(&self.low_battery_threshold) {
            return Err(Error::Config(format!(
                "low_battery_threshold must be within 0..=100, got {}",
                self.low_battery_threshold
            )));
        }
        if self.event_buffer == 0 {
            return Err(Error::Config("event_buffer must be at least 1".to_string()));
        }
        Ok(())
    }
}
