//! TOML configuration for the `simulate` command.
//!
//! ```toml
//! [device]
//! history_name = "front-hall"
//! poll_interval_secs = 0
//! low_battery_threshold = 25.0
//!
//! [[devices]]
//! id = "3f2b8c1e-6a4d-4f0e-9c7b-2d5e8a1f4b60"
//! name = "Front Door"
//! variant = "lock"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sesame_core::{Device, DeviceId, DeviceVariant};
use sesame_device::config::DeviceConfig;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Engine settings shared by every simulated device.
    pub device: DeviceConfig,
    /// Devices to simulate. Empty means a sample lock and bot.
    pub devices: Vec<Device>,
}

impl CliConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.device.validate()?;
        Ok(config)
    }

    /// Configured devices, or one sample lock and one sample bot.
    pub fn simulated_devices(&self) -> Vec<Device> {
        if !self.devices.is_empty() {
            return self.devices.clone();
        }
        vec![
            Device::new(DeviceId::random(), DeviceVariant::Lock).with_name("Front Door"),
            Device::new(DeviceId::random(), DeviceVariant::Bot).with_name("Light Switch"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CliConfig::from_toml("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.simulated_devices().len(), 2);
    }

    #[test]
    fn test_parses_devices_and_engine_settings() {
        let config = CliConfig::from_toml(
            r#"
            [device]
            history_name = "front-hall"
            low_battery_threshold = 25.0

            [[devices]]
            id = "3f2b8c1e-6a4d-4f0e-9c7b-2d5e8a1f4b60"
            name = "Front Door"
            variant = "lock"

            [[devices]]
            id = "9a1c2d3e-4f50-4a6b-8c7d-0e1f2a3b4c5d"
            variant = "bot"
            "#,
        )
        .unwrap();

        assert_eq!(config.device.history_name, "front-hall");
        assert_eq!(config.device.low_battery_threshold, 25.0);
        assert_eq!(config.device.event_buffer, DeviceConfig::default().event_buffer);

        let devices = config.simulated_devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name.as_deref(), Some("Front Door"));
        assert_eq!(devices[0].variant, DeviceVariant::Lock);
        assert_eq!(devices[1].name, None);
        assert_eq!(devices[1].variant, DeviceVariant::Bot);
    }

    #[test]
    fn test_rejects_invalid_engine_settings() {
        let result = CliConfig::from_toml(
            r#"
            [device]
            low_battery_threshold = 150.0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = CliConfig::load(Path::new("/nonexistent/sesame.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }
}
