//! Status and command engine for Sesame locks and bots.
//!
//! This crate sits between a host automation platform and a transport that
//! reaches the devices. It keeps the last decoded status per device, fans
//! status changes out to observers, and makes sure only one command is in
//! flight per device at any time.
//!
//! # Components
//!
//! - [`DeviceStateCache`](cache::DeviceStateCache): last known status per
//!   device, ordered by sequence number, with synchronous observers.
//! - [`CommandSerializer`](serializer::CommandSerializer): per-device
//!   mutual exclusion around [`Transport::send_command`].
//! - [`StatusSubscriptionBridge`](bridge::StatusSubscriptionBridge): initial
//!   poll, push subscription and optional periodic polling, feeding the
//!   cache.
//! - [`DeviceManager`](manager::DeviceManager): the façade combining all
//!   three.
//!
//! # Transports
//!
//! [`Transport`] uses native `async fn` (Rust 1.90 + Edition 2024 RPITIT)
//! and is therefore not object-safe. The manager works with the
//! [`AnyTransport`](devices::AnyTransport) enum instead. A scriptable
//! in-memory [`MockTransport`](mock::MockTransport) is included for tests
//! and simulations.
//!
//! # Error Handling
//!
//! Transport operations return [`Result<T>`](error::Result) with a
//! [`TransportError`]. Commands fail with a [`CommandError`] that carries the
//! transport error as its source. Problems on the status path never fail a
//! caller; they are logged and, for attach, reported as
//! [`AttachOutcome::Degraded`].
//!
//! # Thread Safety
//!
//! Every component takes `&self` and is `Send + Sync`. Status updates and
//! commands may arrive from any task.

pub mod bridge;
pub mod cache;
pub mod config;
pub mod devices;
pub mod error;
pub mod manager;
pub mod mock;
pub mod serializer;
pub mod traits;
pub mod types;

mod sync;

// Re-export commonly used types for convenience
pub use error::{BridgeError, CommandError, Result, TransportError};
pub use traits::Transport;
pub use types::{AttachOutcome, CommandAck, StatusSnapshot, TaskSummary};
