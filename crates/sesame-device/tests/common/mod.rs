//! Common test utilities for device integration tests.
//!
//! Builders for status reports and devices, plus a manager wired to a
//! [`MockTransport`] whose handle the test keeps for scripting.

#![allow(dead_code)]

use sesame_core::{Device, DeviceId, DeviceVariant};
use sesame_device::config::DeviceConfig;
use sesame_device::manager::DeviceManager;
use sesame_device::mock::{MockTransport, MockTransportHandle};
use sesame_protocol::RawStatusReport;
use std::sync::Arc;

/// Flag byte bit for `locked`.
pub const LOCKED: u8 = 0x02;

/// Flag byte bit for `unlocked`.
pub const UNLOCKED: u8 = 0x04;

/// Build an 8-byte status report.
pub fn report(adc: u16, position: u16, flags: u8) -> RawStatusReport {
    let [a0, a1] = adc.to_le_bytes();
    let [p0, p1] = position.to_le_bytes();
    RawStatusReport::new(vec![a0, a1, 0, 0, p0, p1, 0, flags])
}

/// A named lock with a random id.
pub fn lock_device(name: &str) -> Device {
    Device::new(DeviceId::random(), DeviceVariant::Lock).with_name(name)
}

/// A named bot with a random id.
pub fn bot_device(name: &str) -> Device {
    Device::new(DeviceId::random(), DeviceVariant::Bot).with_name(name)
}

/// Manager over a fresh mock transport.
pub fn setup(config: DeviceConfig) -> (Arc<DeviceManager>, MockTransportHandle) {
    let (transport, handle) = MockTransport::new();
    (Arc::new(DeviceManager::new(transport, config)), handle)
}

/// Manager with `device` attached and a full battery, locked status cached.
pub async fn setup_attached(device: &Device) -> (Arc<DeviceManager>, MockTransportHandle) {
    let (manager, handle) = setup(DeviceConfig::default());
    handle.set_report(device.id, report(1023, 0, LOCKED));
    manager
        .attach(device.clone())
        .await
        .expect("attach should succeed");
    (manager, handle)
}

/// Let spawned forwarding tasks drain their channels.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
