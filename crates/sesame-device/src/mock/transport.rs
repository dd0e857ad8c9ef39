//! Mock transport implementation for testing and development.
//!
//! [`MockTransport`] keeps per-device state in memory: the report returned
//! by a poll, queued failures, and the push subscribers. Tests drive it
//! through a cloned [`MockTransportHandle`].

use crate::sync::lock;
use crate::traits::Transport;
use crate::{CommandAck, Result, TransportError};
use sesame_core::{Command, CommandArgs, DeviceId};
use sesame_protocol::RawStatusReport;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

const DEFAULT_BUFFER: usize = 32;

/// One recorded `send_command` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandCall {
    /// Target device.
    pub device: DeviceId,

    /// Delivered command.
    pub command: Command,

    /// History tag sent with the command.
    pub history: String,

    /// When the transport began handling the call.
    pub started: Instant,

    /// When the transport finished handling the call.
    pub finished: Instant,

    /// Whether the call returned an acknowledgement.
    pub succeeded: bool,
}

#[derive(Debug, Default)]
struct MockDevice {
    report: Option<RawStatusReport>,
    fetch_failure: Option<TransportError>,
    subscribe_failure: Option<TransportError>,
    command_failures: VecDeque<TransportError>,
    subscribers: Vec<mpsc::Sender<RawStatusReport>>,
}

#[derive(Debug)]
struct MockState {
    devices: Mutex<HashMap<DeviceId, MockDevice>>,
    command_delay: Mutex<Duration>,
    calls: Mutex<Vec<CommandCall>>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    buffer: usize,
}

impl MockState {
    fn new(buffer: usize) -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            command_delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            buffer: buffer.max(1),
        }
    }
}

/// Mock transport for testing and development.
///
/// # Examples
///
/// ```
/// use sesame_core::{Command, CommandArgs, DeviceId};
/// use sesame_device::mock::MockTransport;
/// use sesame_device::traits::Transport;
///
/// #[tokio::main]
/// async fn main() -> sesame_device::Result<()> {
///     let (transport, handle) = MockTransport::new();
///     let device = DeviceId::random();
///
///     let mut pushes = transport.subscribe_status(&device).await?;
///     handle.push(device, "ff03000010000002".parse().unwrap()).await;
///     assert!(pushes.recv().await.is_some());
///
///     transport
///         .send_command(&device, Command::Lock, &CommandArgs::default())
///         .await?;
///     assert_eq!(handle.command_calls().len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<MockState>,
    name: String,
}

impl MockTransport {
    /// Create a new mock transport with the default name.
    ///
    /// Returns a tuple of (MockTransport, MockTransportHandle) where the
    /// handle scripts the transport's behavior.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("Mock Transport".to_string())
    }

    /// Create a new mock transport with a custom name.
    pub fn with_name(name: String) -> (Self, MockTransportHandle) {
        Self::build(name, DEFAULT_BUFFER)
    }

    /// Create a new mock transport whose push channels hold `buffer` reports.
    ///
    /// A zero buffer is raised to one.
    pub fn with_buffer(buffer: usize) -> (Self, MockTransportHandle) {
        Self::build("Mock Transport".to_string(), buffer)
    }

    fn build(name: String, buffer: usize) -> (Self, MockTransportHandle) {
        let state = Arc::new(MockState::new(buffer));

        let transport = Self {
            state: Arc::clone(&state),
            name,
        };
        let handle = MockTransportHandle { state };

        (transport, handle)
    }

    /// Transport name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new().0
    }
}

/// Decrements the in-flight counter when a command call ends or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Transport for MockTransport {
    async fn fetch_status(&self, device: &DeviceId) -> Result<RawStatusReport> {
        self.state.fetches.fetch_add(1, Ordering::SeqCst);

        let devices = lock(&self.state.devices);
        let entry = devices
            .get(device)
            .ok_or_else(|| TransportError::disconnected(device.to_string()))?;

        if let Some(error) = &entry.fetch_failure {
            return Err(error.clone());
        }

        entry
            .report
            .clone()
            .ok_or_else(|| TransportError::other(format!("No status recorded for {device}")))
    }

    async fn subscribe_status(
        &self,
        device: &DeviceId,
    ) -> Result<mpsc::Receiver<RawStatusReport>> {
        let mut devices = lock(&self.state.devices);
        let entry = devices.entry(*device).or_default();

        if let Some(error) = &entry.subscribe_failure {
            return Err(error.clone());
        }

        let (tx, rx) = mpsc::channel(self.state.buffer);
        entry.subscribers.push(tx);
        Ok(rx)
    }

    async fn send_command(
        &self,
        device: &DeviceId,
        command: Command,
        args: &CommandArgs,
    ) -> Result<CommandAck> {
        let _in_flight = InFlight::enter(&self.state.in_flight, &self.state.max_in_flight);
        let started = Instant::now();

        let delay = *lock(&self.state.command_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = lock(&self.state.devices)
            .get_mut(device)
            .and_then(|entry| entry.command_failures.pop_front());

        lock(&self.state.calls).push(CommandCall {
            device: *device,
            command,
            history: args.history.clone(),
            started,
            finished: Instant::now(),
            succeeded: failure.is_none(),
        });

        match failure {
            Some(error) => Err(error),
            None => Ok(CommandAck::new(*device, command, args)),
        }
    }
}

/// Handle for scripting a mock transport.
///
/// Cloneable; all clones control the same transport.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    state: Arc<MockState>,
}

impl MockTransportHandle {
    /// Set the report returned by polls for `device`.
    ///
    /// Also registers the device, so polls stop reporting it disconnected.
    pub fn set_report(&self, device: DeviceId, report: RawStatusReport) {
        lock(&self.state.devices).entry(device).or_default().report = Some(report);
    }

    /// Make every poll for `device` fail with `error` until cleared.
    pub fn fail_fetch(&self, device: DeviceId, error: TransportError) {
        lock(&self.state.devices)
            .entry(device)
            .or_default()
            .fetch_failure = Some(error);
    }

    /// Let polls for `device` succeed again.
    pub fn clear_fetch_failure(&self, device: DeviceId) {
        if let Some(entry) = lock(&self.state.devices).get_mut(&device) {
            entry.fetch_failure = None;
        }
    }

    /// Make subscriptions for `device` fail with `error`.
    pub fn fail_subscribe(&self, device: DeviceId, error: TransportError) {
        lock(&self.state.devices)
            .entry(device)
            .or_default()
            .subscribe_failure = Some(error);
    }

    /// Queue a failure for the next command sent to `device`.
    ///
    /// Failures are consumed one per command, in the order queued.
    pub fn fail_next_command(&self, device: DeviceId, error: TransportError) {
        lock(&self.state.devices)
            .entry(device)
            .or_default()
            .command_failures
            .push_back(error);
    }

    /// Make every command take `delay` before completing.
    pub fn set_command_delay(&self, delay: Duration) {
        *lock(&self.state.command_delay) = delay;
    }

    /// Push a report to every live subscriber of `device`.
    ///
    /// Returns the number of subscribers that received it. Closed
    /// subscriptions are pruned.
    pub async fn push(&self, device: DeviceId, report: RawStatusReport) -> usize {
        let subscribers = lock(&self.state.devices)
            .get(&device)
            .map(|entry| entry.subscribers.clone())
            .unwrap_or_default();

        let mut delivered = 0;
        for tx in &subscribers {
            if tx.send(report.clone()).await.is_ok() {
                delivered += 1;
            }
        }

        if let Some(entry) = lock(&self.state.devices).get_mut(&device) {
            entry.subscribers.retain(|tx| !tx.is_closed());
        }

        delivered
    }

    /// End every push subscription for `device`.
    pub fn close_subscriptions(&self, device: DeviceId) {
        if let Some(entry) = lock(&self.state.devices).get_mut(&device) {
            entry.subscribers.clear();
        }
    }

    /// Number of live push subscriptions for `device`.
    pub fn subscriber_count(&self, device: DeviceId) -> usize {
        lock(&self.state.devices)
            .get(&device)
            .map(|entry| entry.subscribers.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// All completed `send_command` calls, in completion order.
    pub fn command_calls(&self) -> Vec<CommandCall> {
        lock(&self.state.calls).clone()
    }

    /// Number of `fetch_status` calls made so far.
    pub fn fetch_count(&self) -> usize {
        self.state.fetches.load(Ordering::SeqCst)
    }

    /// Highest number of `send_command` calls ever running at once.
    pub fn max_concurrent_commands(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}
