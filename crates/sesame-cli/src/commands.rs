//! Subcommand implementations. Each returns the text `main` prints.

use crate::config::CliConfig;
use anyhow::Result;
use serde::Serialize;
use sesame_core::constants::{FLAG_LOCKED, FLAG_UNLOCKED};
use sesame_core::{Command, Device, DeviceVariant};
use sesame_device::manager::DeviceManager;
use sesame_device::mock::MockTransport;
use sesame_device::{CommandAck, StatusSnapshot};
use sesame_protocol::{CalibrationCurve, RawStatusReport, StatusDecoder};
use std::time::Duration;
use tracing::{info, warn};

pub fn decode(variant: DeviceVariant, hex: &str) -> Result<String> {
    let status = StatusDecoder::decode_hex(hex, variant)?;
    Ok(serde_json::to_string_pretty(&status)?)
}

pub fn estimate(variant: DeviceVariant, voltage: f64) -> String {
    let percentage = CalibrationCurve::for_variant(variant).estimate(voltage);
    format!("{percentage:.2}")
}

/// Outcome for one simulated device.
#[derive(Debug, Serialize)]
pub struct SimulatedDevice {
    pub device: Device,
    pub command: CommandAck,
    pub snapshot: Option<StatusSnapshot>,
    pub battery_low: Option<bool>,
}

/// Attach every configured device to an in-memory transport, issue one
/// command each and report where they ended up.
pub async fn simulate(config: &CliConfig) -> Result<Vec<SimulatedDevice>> {
    let (transport, handle) = MockTransport::with_buffer(config.device.event_buffer);
    let manager = DeviceManager::new(transport, config.device.clone());
    let devices = config.simulated_devices();

    for device in &devices {
        handle.set_report(device.id, sample_report(device.variant, FLAG_LOCKED));
        let outcome = manager.attach(device.clone()).await?;
        if let Some(warning) = outcome.warning() {
            warn!("{} attached degraded: {}", device.display_name(), warning);
        }

        let name = device.display_name();
        manager.on_status_changed(&device.id, move |status| {
            info!(
                "{} status: locked={} unlocked={} battery={:.1}%",
                name,
                status.is_locked(),
                status.is_unlocked(),
                status.battery_percentage()
            );
        });
    }

    let args = manager.command_args();
    let mut acks = Vec::with_capacity(devices.len());
    for device in &devices {
        let (command, flags) = match device.variant {
            DeviceVariant::Lock => (Command::Unlock, FLAG_UNLOCKED),
            DeviceVariant::Bot => (Command::Click, FLAG_LOCKED),
        };
        acks.push(manager.issue_command(&device.id, command, &args).await?);
        handle
            .push(device.id, sample_report(device.variant, flags))
            .await;
    }

    // Forwarding tasks drain the pushes asynchronously.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let results = devices
        .into_iter()
        .zip(acks)
        .map(|(device, command)| SimulatedDevice {
            snapshot: manager.snapshot(&device.id),
            battery_low: manager.is_battery_low(&device.id),
            device,
            command,
        })
        .collect();

    let summary = manager.shutdown().await;
    if summary.issues() > 0 {
        warn!("{} status tasks ended abnormally", summary.issues());
    }
    Ok(results)
}

fn sample_report(variant: DeviceVariant, flags: u8) -> RawStatusReport {
    // About 5.7V on a lock and 2.9V on a bot.
    let adc: u16 = match variant {
        DeviceVariant::Lock => 810,
        DeviceVariant::Bot => 825,
    };
    let position: u16 = if flags & FLAG_LOCKED != 0 { 0 } else { 512 };
    let [a0, a1] = adc.to_le_bytes();
    let [p0, p1] = position.to_le_bytes();
    RawStatusReport::new(vec![a0, a1, 0, 0, p0, p1, 0, flags])
}
