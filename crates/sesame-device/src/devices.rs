//! Enum wrapper for transport dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn Transport>`
//! is not available. [`AnyTransport`] gives the manager a single concrete
//! type whose futures are `Send` and can run on spawned tasks.

use crate::mock::MockTransport;
use crate::traits::Transport;
use crate::{CommandAck, Result};
use sesame_core::{Command, CommandArgs, DeviceId};
use sesame_protocol::RawStatusReport;
use tokio::sync::mpsc;

/// Enum wrapper for transport dispatch.
///
/// # Examples
///
/// ```
/// use sesame_device::devices::AnyTransport;
/// use sesame_device::mock::MockTransport;
///
/// let (transport, _handle) = MockTransport::new();
/// let transport = AnyTransport::Mock(transport);
/// assert_eq!(transport.name(), "Mock Transport");
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransport {
    /// In-memory transport for development and testing.
    Mock(MockTransport),
}

impl AnyTransport {
    /// Human readable transport name, used in logs.
    pub fn name(&self) -> &str {
        match self {
            Self::Mock(transport) => transport.name(),
        }
    }
}

impl From<MockTransport> for AnyTransport {
    fn from(transport: MockTransport) -> Self {
        Self::Mock(transport)
    }
}

impl Transport for AnyTransport {
    async fn fetch_status(&self, device: &DeviceId) -> Result<RawStatusReport> {
        match self {
            Self::Mock(transport) => transport.fetch_status(device).await,
        }
    }

    async fn subscribe_status(
        &self,
        device: &DeviceId,
    ) -> Result<mpsc::Receiver<RawStatusReport>> {
        match self {
            Self::Mock(transport) => transport.subscribe_status(device).await,
        }
    }

    async fn send_command(
        &self,
        device: &DeviceId,
        command: Command,
        args: &CommandArgs,
    ) -> Result<CommandAck> {
        match self {
            Self::Mock(transport) => transport.send_command(device, command, args).await,
        }
    }
}
