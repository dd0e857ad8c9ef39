//! Feeds transport status reports into the cache.
//!
//! Attaching a device polls it once, then subscribes to its pushes and
//! drains them on a background task. With a configured poll interval a
//! second task re-polls periodically. Every report, whatever its source,
//! takes the next number from a per-device counter the moment it arrives,
//! so polls and pushes are totally ordered by arrival.
//!
//! ```text
//! ┌───────────┐  fetch_status   ┌────────┐  decode  ┌──────────────┐
//! │ Transport │────────────────►│        │─────────►│              │
//! │           │  push channel   │ Bridge │  + seq   │ DeviceState- │──► observers
//! │           │────────────────►│        │─────────►│ Cache        │
//! └───────────┘                 └────────┘          └──────────────┘
//! ```
//!
//! A failed initial poll does not fail the attach: the device stays
//! subscribed with no cached status and the failure comes back as
//! [`AttachOutcome::Degraded`]. Only a failed subscription is fatal.

use crate::cache::DeviceStateCache;
use crate::config::DeviceConfig;
use crate::devices::AnyTransport;
use crate::sync::lock;
use crate::traits::Transport;
use crate::{AttachOutcome, BridgeError, Result, TaskSummary};
use sesame_core::{Device, DeviceId, DeviceVariant};
use sesame_protocol::{RawStatusReport, StatusDecoder};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

type TaskResult = std::result::Result<(), BridgeError>;

/// Subscribes devices and forwards their decoded status into the cache.
#[derive(Debug)]
pub struct StatusSubscriptionBridge {
    cache: Arc<DeviceStateCache>,
    sequences: Mutex<HashMap<DeviceId, Arc<AtomicU64>>>,
}

impl StatusSubscriptionBridge {
    /// Create a bridge writing into `cache`.
    pub fn new(cache: Arc<DeviceStateCache>) -> Self {
        Self {
            cache,
            sequences: Mutex::new(HashMap::new()),
        }
    }

    /// Cache this bridge writes into.
    pub fn cache(&self) -> &Arc<DeviceStateCache> {
        &self.cache
    }

    fn sequence_for(&self, device: DeviceId) -> Arc<AtomicU64> {
        Arc::clone(lock(&self.sequences).entry(device).or_default())
    }

    /// Drop the sequence counter for `device`.
    pub fn forget(&self, device: &DeviceId) {
        lock(&self.sequences).remove(device);
    }

    /// Poll `device` once, subscribe to its pushes and start forwarding.
    ///
    /// The returned [`Attachment`] owns the background tasks; dropping it
    /// stops them.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the push subscription cannot be
    /// registered. Poll failures are reported through the outcome instead.
    pub async fn attach(
        &self,
        device: &Device,
        transport: Arc<AnyTransport>,
        config: &DeviceConfig,
    ) -> Result<(Attachment, AttachOutcome)> {
        info!(
            "Attaching {} {} via {}",
            device.variant,
            device.display_name(),
            transport.name()
        );

        let sink = StatusSink {
            cache: Arc::clone(&self.cache),
            device: device.id,
            variant: device.variant,
            sequence: self.sequence_for(device.id),
        };

        let outcome = match transport.fetch_status(&device.id).await {
            Ok(report) => match sink.apply(&report) {
                Ok(_) => AttachOutcome::Ready,
                Err(e) => {
                    warn!("Initial status for {} could not be decoded: {}", device.id, e);
                    AttachOutcome::Degraded(BridgeError::Decode(e))
                }
            },
            Err(e) => {
                warn!("Initial status poll for {} failed: {}", device.id, e);
                AttachOutcome::Degraded(BridgeError::Transport(e))
            }
        };

        let pushes = transport.subscribe_status(&device.id).await?;

        let mut tasks = JoinSet::new();
        tasks.spawn(forward_pushes(pushes, sink.clone()));

        if let Some(period) = config.poll_interval() {
            debug!("Polling {} every {:?}", device.id, period);
            tasks.spawn(poll_status(Arc::clone(&transport), sink, period));
        }

        Ok((
            Attachment {
                device: device.id,
                tasks,
            },
            outcome,
        ))
    }
}

/// Background tasks belonging to one attached device.
#[derive(Debug)]
pub struct Attachment {
    device: DeviceId,
    tasks: JoinSet<TaskResult>,
}

impl Attachment {
    /// Device these tasks serve.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Number of tasks still tracked.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Abort all tasks and wait for them to end.
    pub async fn shutdown(mut self) -> TaskSummary {
        self.tasks.abort_all();

        let mut summary = TaskSummary::default();
        while let Some(result) = self.tasks.join_next().await {
            match classify_task_result(result) {
                TaskTermination::Success => summary.completed += 1,
                TaskTermination::Error(e) => {
                    warn!("Status task for {} ended with error: {}", self.device, e);
                    summary.failed += 1;
                }
                TaskTermination::Cancelled => summary.cancelled += 1,
                TaskTermination::Panic => {
                    error!("Status task for {} panicked", self.device);
                    summary.panicked += 1;
                }
            }
        }

        summary
    }
}

/// Task termination classification for shutdown handling.
#[derive(Debug)]
enum TaskTermination {
    /// Task completed successfully.
    Success,
    /// Task returned an error.
    Error(BridgeError),
    /// Task was cancelled (expected during shutdown).
    Cancelled,
    /// Task panicked.
    Panic,
}

fn classify_task_result(result: std::result::Result<TaskResult, JoinError>) -> TaskTermination {
    match result {
        Ok(Ok(())) => TaskTermination::Success,
        Ok(Err(e)) => TaskTermination::Error(e),
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(_) => TaskTermination::Panic,
    }
}

/// Decodes reports for one device and applies them in arrival order.
#[derive(Debug, Clone)]
struct StatusSink {
    cache: Arc<DeviceStateCache>,
    device: DeviceId,
    variant: DeviceVariant,
    sequence: Arc<AtomicU64>,
}

impl StatusSink {
    fn apply(&self, report: &RawStatusReport) -> sesame_core::Result<bool> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let status = StatusDecoder::decode(report, self.variant)?;
        Ok(self.cache.update(self.device, status, sequence))
    }
}

async fn forward_pushes(
    mut pushes: mpsc::Receiver<RawStatusReport>,
    sink: StatusSink,
) -> TaskResult {
    while let Some(report) = pushes.recv().await {
        if let Err(e) = sink.apply(&report) {
            warn!("Dropping status push for {}: {}", sink.device, e);
        }
    }

    debug!("Status subscription for {} closed", sink.device);
    Ok(())
}

async fn poll_status(
    transport: Arc<AnyTransport>,
    sink: StatusSink,
    period: Duration,
) -> TaskResult {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match transport.fetch_status(&sink.device).await {
            Ok(report) => {
                if let Err(e) = sink.apply(&report) {
                    warn!("Dropping polled status for {}: {}", sink.device, e);
                }
            }
            Err(e) if e.is_disconnected() => {
                warn!("Stopping status polling for {}: {}", sink.device, e);
                return Err(e.into());
            }
            Err(e) => warn!("Status poll for {} failed: {}", sink.device, e),
        }
    }
}
