//! Common types shared by the cache, the command path and the manager.

use crate::error::BridgeError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sesame_core::{Command, CommandArgs, DeviceId, MechanicalStatus};

/// Acknowledgement returned by a transport for a delivered command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandAck {
    /// Device that accepted the command.
    pub device: DeviceId,

    /// Command that was delivered.
    pub command: Command,

    /// History tag sent with the command.
    pub history: String,

    /// When the transport reported completion.
    pub completed_at: DateTime<Utc>,
}

impl CommandAck {
    /// Create an acknowledgement stamped with the current time.
    pub fn new(device: DeviceId, command: Command, args: &CommandArgs) -> Self {
        Self {
            device,
            command,
            history: args.history.clone(),
            completed_at: Utc::now(),
        }
    }
}

/// A cached status together with its ordering metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Decoded status.
    pub status: MechanicalStatus,

    /// Sequence number the status was applied with.
    pub sequence: u64,

    /// When the cache accepted the status.
    pub updated_at: DateTime<Utc>,
}

/// Result of attaching a device.
///
/// Attaching only fails when the push subscription cannot be registered.
/// A failed initial poll leaves the device attached without a cached
/// status and is reported as [`AttachOutcome::Degraded`].
#[derive(Debug)]
pub enum AttachOutcome {
    /// Initial status was fetched and cached.
    Ready,

    /// Device is subscribed but the initial status could not be cached.
    Degraded(BridgeError),
}

impl AttachOutcome {
    /// Returns `true` if the initial status was cached.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Warning attached to a degraded outcome.
    pub fn warning(&self) -> Option<&BridgeError> {
        match self {
            Self::Ready => None,
            Self::Degraded(error) => Some(error),
        }
    }
}

/// How background tasks ended during detach or shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    /// Tasks that returned `Ok`.
    pub completed: usize,

    /// Tasks that returned an error.
    pub failed: usize,

    /// Tasks that were aborted.
    pub cancelled: usize,

    /// Tasks that panicked.
    pub panicked: usize,
}

impl TaskSummary {
    /// Total number of tasks that ended.
    pub fn total(&self) -> usize {
        self.completed + self.failed + self.cancelled + self.panicked
    }

    /// Number of tasks that ended abnormally.
    pub fn issues(&self) -> usize {
        self.failed + self.panicked
    }

    /// Add another summary to this one.
    pub fn merge(&mut self, other: TaskSummary) {
        self.completed += other.completed;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self.panicked += other.panicked;
    }
}
