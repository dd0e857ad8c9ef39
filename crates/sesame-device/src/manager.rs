//! Device manager.
//!
//! This module provides the [`DeviceManager`], the surface a host
//! integration talks to. It owns the status cache, the command serializer
//! and the subscription bridge, and wires attached devices through all
//! three.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────── DeviceManager ───────────────────────┐
//!                 │                                                              │
//! issue_command ──┼──► CommandSerializer ──(one per device)──► Transport::send   │
//!                 │                                                              │
//!                 │    StatusSubscriptionBridge ◄── fetch / push ── Transport    │
//!                 │              │                                               │
//!                 │              ▼                                               │
//! get_current_ ◄──┼──── DeviceStateCache ──► on_status_changed observers         │
//! status          │                                                              │
//!                 └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```
//! use sesame_core::{Command, Device, DeviceId, DeviceVariant};
//! use sesame_device::config::DeviceConfig;
//! use sesame_device::manager::DeviceManager;
//! use sesame_device::mock::MockTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (transport, handle) = MockTransport::new();
//!     let manager = DeviceManager::new(transport, DeviceConfig::default());
//!
//!     let device = Device::new(DeviceId::random(), DeviceVariant::Lock);
//!     handle.set_report(device.id, "ff03000010000002".parse()?);
//!
//!     let outcome = manager.attach(device.clone()).await?;
//!     assert!(outcome.is_ready());
//!
//!     let status = manager.get_current_status(&device.id).unwrap();
//!     assert!(status.is_locked());
//!
//!     let args = manager.command_args();
//!     manager.issue_command(&device.id, Command::Unlock, &args).await?;
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

use crate::bridge::{Attachment, StatusSubscriptionBridge};
use crate::cache::DeviceStateCache;
use crate::config::DeviceConfig;
use crate::devices::AnyTransport;
use crate::serializer::CommandSerializer;
use crate::sync::lock;
use crate::{AttachOutcome, CommandAck, CommandError, Result, StatusSnapshot, TaskSummary};
use sesame_core::{Command, CommandArgs, Device, DeviceId, MechanicalStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug)]
struct Registered {
    device: Device,
    attachment: Attachment,
}

/// Coordinates status and commands for a set of devices on one transport.
///
/// # Lifecycle
///
/// 1. Create the manager with a transport and configuration
/// 2. [`attach`](Self::attach) each device
/// 3. Read status, register observers and issue commands
/// 4. [`detach`](Self::detach) devices or [`shutdown`](Self::shutdown) all
///
/// All methods take `&self`; wrap the manager in an `Arc` to share it
/// between tasks.
#[derive(Debug)]
pub struct DeviceManager {
    transport: Arc<AnyTransport>,
    config: DeviceConfig,
    cache: Arc<DeviceStateCache>,
    serializer: CommandSerializer,
    bridge: StatusSubscriptionBridge,
    devices: Mutex<HashMap<DeviceId, Registered>>,
    // Serializes attach and detach of the same device.
    lifecycle: Mutex<HashMap<DeviceId, Arc<tokio::sync::Mutex<()>>>>,
}

impl DeviceManager {
    /// Create a manager with no attached devices.
    pub fn new(transport: impl Into<AnyTransport>, config: DeviceConfig) -> Self {
        let cache = Arc::new(DeviceStateCache::new());

        Self {
            transport: Arc::new(transport.into()),
            config,
            bridge: StatusSubscriptionBridge::new(Arc::clone(&cache)),
            cache,
            serializer: CommandSerializer::new(),
            devices: Mutex::new(HashMap::new()),
            lifecycle: Mutex::new(HashMap::new()),
        }
    }

    /// Configuration this manager was created with.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Shared status cache.
    pub fn cache(&self) -> &Arc<DeviceStateCache> {
        &self.cache
    }

    /// Arguments built from the configured history tag.
    pub fn command_args(&self) -> CommandArgs {
        self.config.command_args()
    }

    fn lifecycle_lock(&self, id: DeviceId) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(lock(&self.lifecycle).entry(id).or_default())
    }

    fn release_lifecycle(&self, id: &DeviceId) {
        let mut locks = lock(&self.lifecycle);
        if locks
            .get(id)
            .is_some_and(|lifecycle| Arc::strong_count(lifecycle) == 1)
        {
            locks.remove(id);
        }
    }

    /// Attach a device: poll it once and subscribe to its pushes.
    ///
    /// Re-attaching an attached device detaches it first, dropping its
    /// cached state and observers. Attach and detach of the same device
    /// never interleave.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the push subscription cannot be
    /// registered. A failed initial poll is not an error; it is returned as
    /// [`AttachOutcome::Degraded`].
    pub async fn attach(&self, device: Device) -> Result<AttachOutcome> {
        let lifecycle = self.lifecycle_lock(device.id);
        let _guard = lifecycle.lock().await;

        if self.is_attached(&device.id) {
            info!("Re-attaching {}", device.display_name());
            self.detach_locked(&device.id).await;
        }

        let attached = self
            .bridge
            .attach(&device, Arc::clone(&self.transport), &self.config)
            .await;

        let (attachment, outcome) = match attached {
            Ok(attached) => attached,
            Err(e) => {
                warn!("Failed to attach {}: {}", device.display_name(), e);
                // Observers registered ahead of the attach stay in place.
                self.cache.clear_state(&device.id);
                self.bridge.forget(&device.id);
                return Err(e);
            }
        };

        info!("Attached {} ({})", device.display_name(), device.id);
        lock(&self.devices).insert(device.id, Registered { device, attachment });

        Ok(outcome)
    }

    /// Detach a device, stopping its background tasks and dropping its
    /// cached state and observers. The command lock is kept if a command is
    /// still using it.
    ///
    /// Returns `None` if the device was not attached.
    pub async fn detach(&self, id: &DeviceId) -> Option<TaskSummary> {
        let lifecycle = self.lifecycle_lock(*id);
        let summary = {
            let _guard = lifecycle.lock().await;
            self.detach_locked(id).await
        };
        drop(lifecycle);
        self.release_lifecycle(id);
        summary
    }

    // Caller holds the device's lifecycle lock.
    async fn detach_locked(&self, id: &DeviceId) -> Option<TaskSummary> {
        let registered = lock(&self.devices).remove(id);
        let Registered { device, attachment } = registered?;

        let summary = attachment.shutdown().await;
        self.cache.remove(id);
        self.serializer.remove(id);
        self.bridge.forget(id);

        info!("Detached {}", device.display_name());
        Some(summary)
    }

    /// Returns `true` if `id` is attached.
    pub fn is_attached(&self, id: &DeviceId) -> bool {
        lock(&self.devices).contains_key(id)
    }

    /// Attached device by id.
    pub fn device(&self, id: &DeviceId) -> Option<Device> {
        lock(&self.devices).get(id).map(|r| r.device.clone())
    }

    /// All attached devices, ordered by id.
    pub fn devices(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = lock(&self.devices)
            .values()
            .map(|r| r.device.clone())
            .collect();
        devices.sort_by_key(|d| d.id);
        devices
    }

    /// Latest known status for a device.
    pub fn get_current_status(&self, id: &DeviceId) -> Option<MechanicalStatus> {
        self.cache.current(id)
    }

    /// Latest known status with its sequence number and update time.
    pub fn snapshot(&self, id: &DeviceId) -> Option<StatusSnapshot> {
        self.cache.snapshot(id)
    }

    /// Register a callback for every accepted status update of a device.
    ///
    /// Callbacks run on the task that delivered the update and must not
    /// block. They are dropped when the device is detached.
    pub fn on_status_changed<F>(&self, id: &DeviceId, callback: F)
    where
        F: Fn(&MechanicalStatus) + Send + Sync + 'static,
    {
        self.cache.observe(*id, callback);
    }

    /// Whether the device's battery is at or below the configured threshold.
    ///
    /// `None` until a status has been cached.
    pub fn is_battery_low(&self, id: &DeviceId) -> Option<bool> {
        self.cache
            .current(id)
            .map(|status| status.is_battery_low(self.config.low_battery_threshold))
    }

    /// Send a command, after any earlier command to the same device.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if the device is not attached, does not
    /// support `command` (the transport is not called in either case), or
    /// the transport fails.
    pub async fn issue_command(
        &self,
        id: &DeviceId,
        command: Command,
        args: &CommandArgs,
    ) -> std::result::Result<CommandAck, CommandError> {
        let variant = lock(&self.devices).get(id).map(|r| r.device.variant);

        let Some(variant) = variant else {
            warn!("Rejecting {} for {}: not attached", command, id);
            return Err(CommandError::not_attached(*id, command));
        };
        if !variant.supports(command) {
            warn!("Rejecting {} for {}: not supported by {}", command, id, variant);
            return Err(CommandError::unsupported(*id, command));
        }

        self.serializer
            .send(&*self.transport, id, command, args)
            .await
    }

    /// Detach every device and wait for all background tasks to end.
    pub async fn shutdown(&self) -> TaskSummary {
        let ids: Vec<DeviceId> = lock(&self.devices).keys().copied().collect();

        let mut summary = TaskSummary::default();
        for id in ids {
            if let Some(detached) = self.detach(&id).await {
                summary.merge(detached);
            }
        }

        info!(
            "Device manager shut down: {} tasks stopped, {} failed, {} panicked",
            summary.total(),
            summary.failed,
            summary.panicked
        );
        summary
    }
}
