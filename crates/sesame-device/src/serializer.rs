//! One command in flight per device.
//!
//! Each device gets its own `tokio::sync::Mutex<()>`, held for exactly one
//! transport call. Tokio's mutex queues waiters fairly, so callers for the
//! same device are served in the order they started waiting, and a waiter
//! whose future is dropped (cancelled, timed out) leaves the queue without
//! disturbing the others. The guard is released on every exit path, and a
//! failed call leaves nothing behind, so the next command proceeds normally.
//!
//! Devices never share a lock.

use crate::sync::lock;
use crate::traits::Transport;
use crate::{CommandAck, CommandError};
use sesame_core::{Command, CommandArgs, DeviceId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

type CommandLock = Arc<tokio::sync::Mutex<()>>;

/// Per-device command serializer.
#[derive(Debug, Default)]
pub struct CommandSerializer {
    locks: Mutex<HashMap<DeviceId, CommandLock>>,
}

impl CommandSerializer {
    /// Create a serializer with no device locks.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, device: DeviceId) -> CommandLock {
        Arc::clone(lock(&self.locks).entry(device).or_default())
    }

    /// Send `command` through `transport`, waiting for any earlier command
    /// to the same device to finish first.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] wrapping the transport's failure. The
    /// failure is not retried.
    pub async fn send<T: Transport>(
        &self,
        transport: &T,
        device: &DeviceId,
        command: Command,
        args: &CommandArgs,
    ) -> Result<CommandAck, CommandError> {
        let command_lock = self.lock_for(*device);
        let _guard = command_lock.lock().await;

        info!("Sending {} to {}", command, device);
        match transport.send_command(device, command, args).await {
            Ok(ack) => {
                debug!("{} acknowledged by {}", command, device);
                Ok(ack)
            }
            Err(source) => {
                error!("{} failed for {}: {}", command, device, source);
                Err(CommandError::new(*device, command, source))
            }
        }
    }

    /// Forget the lock for `device` if no command holds or waits on it.
    ///
    /// A lock still in use stays registered, so a command issued after a
    /// re-attach queues behind the one already running. Returns `true` if
    /// the lock was dropped.
    pub fn remove(&self, device: &DeviceId) -> bool {
        let mut locks = lock(&self.locks);
        let idle = locks
            .get(device)
            .is_some_and(|command_lock| Arc::strong_count(command_lock) == 1);
        if idle {
            locks.remove(device);
        }
        idle
    }

    /// Returns `true` if a command for `device` is currently running.
    pub fn is_busy(&self, device: &DeviceId) -> bool {
        lock(&self.locks)
            .get(device)
            .is_some_and(|command_lock| command_lock.try_lock().is_err())
    }
}
