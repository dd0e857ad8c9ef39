//! Transport abstraction consumed by the status and command paths.
//!
//! The transport is whatever actually reaches the device: a cloud API
//! client, a local link, or [`MockTransport`](crate::mock::MockTransport) in
//! tests. This crate never talks to a device directly.
//!
//! All methods are native `async fn` (Rust 1.90 + Edition 2024 RPITIT).

#![allow(async_fn_in_trait)]

use crate::{CommandAck, Result};
use sesame_core::{Command, CommandArgs, DeviceId};
use sesame_protocol::RawStatusReport;
use tokio::sync::mpsc;

/// Link to a set of devices.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic parameters where no task is spawned, and the
/// [`AnyTransport`](crate::devices::AnyTransport) enum where a concrete,
/// `Send` future is needed:
///
/// ```
/// use sesame_device::devices::AnyTransport;
/// use sesame_device::mock::MockTransport;
/// use sesame_device::traits::Transport;
/// use sesame_core::DeviceId;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (transport, handle) = MockTransport::new();
/// let transport = AnyTransport::Mock(transport);
///
/// let device = DeviceId::random();
/// handle.set_report(device, "ff03000010000002".parse().unwrap());
/// let report = transport.fetch_status(&device).await.unwrap();
/// assert_eq!(report.len(), 8);
/// # }
/// ```
///
/// # Delivery
///
/// Pushes are delivered at least once. Duplicates and reordering are
/// tolerated because the cache discards stale sequence numbers.
pub trait Transport: Send + Sync {
    /// Fetch the current status report for a device.
    ///
    /// # Errors
    ///
    /// Any [`TransportError`](crate::TransportError); the bridge treats a
    /// failure here as a warning.
    async fn fetch_status(&self, device: &DeviceId) -> Result<RawStatusReport>;

    /// Subscribe to pushed status reports for a device.
    ///
    /// The returned channel closes when the transport ends the subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be registered.
    async fn subscribe_status(&self, device: &DeviceId)
    -> Result<mpsc::Receiver<RawStatusReport>>;

    /// Deliver a command to a device.
    ///
    /// Callers are expected to serialize calls per device; see
    /// [`CommandSerializer`](crate::serializer::CommandSerializer).
    ///
    /// # Errors
    ///
    /// Returns the transport's failure for this attempt. It is not retried.
    async fn send_command(
        &self,
        device: &DeviceId,
        command: Command,
        args: &CommandArgs,
    ) -> Result<CommandAck>;
}
