//! Error types for transport, command and subscription failures.
//!
//! [`TransportError`] is what a [`Transport`](crate::traits::Transport)
//! reports. [`CommandError`] wraps a transport failure with the device and
//! command it belongs to, and is what callers of
//! [`DeviceManager::issue_command`](crate::manager::DeviceManager::issue_command)
//! see. [`BridgeError`] describes non-fatal problems on the status path:
//! a failed initial poll or a push that could not be decoded.

use sesame_core::{Command, DeviceId};

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors reported by a transport.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Device is not reachable or was never attached.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Operation is not supported by this device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Link-level communication failure.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Device answered but refused the command.
    #[error("Command rejected: {status}")]
    Rejected { status: String },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new rejected command error.
    pub fn rejected(status: impl Into<String>) -> Self {
        Self::Rejected {
            status: status.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Returns `true` if the device is gone and polling should stop.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}

/// A command that could not be delivered.
///
/// Carries the underlying [`TransportError`] as its source. A failed command
/// is never retried and does not block later commands for the same device.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Command {command} for {device} failed: {source}")]
pub struct CommandError {
    /// Target device.
    pub device: DeviceId,

    /// Command that failed.
    pub command: Command,

    /// Underlying transport failure.
    #[source]
    pub source: TransportError,
}

impl CommandError {
    /// Create a new command error.
    pub fn new(device: DeviceId, command: Command, source: TransportError) -> Self {
        Self {
            device,
            command,
            source,
        }
    }

    /// Command targeted a device that is not attached.
    pub fn not_attached(device: DeviceId, command: Command) -> Self {
        Self::new(
            device,
            command,
            TransportError::disconnected(device.to_string()),
        )
    }

    /// Command is not supported by the device variant.
    pub fn unsupported(device: DeviceId, command: Command) -> Self {
        Self::new(
            device,
            command,
            TransportError::unsupported(command.to_string()),
        )
    }
}

/// Non-fatal failures on the status path.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Polling or subscribing through the transport failed.
    #[error("Status transport failed: {0}")]
    Transport(#[from] TransportError),

    /// A report arrived but could not be decoded.
    #[error("Status report rejected: {0}")]
    Decode(#[from] sesame_core::Error),
}
