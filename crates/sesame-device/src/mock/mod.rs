//! Mock implementations for testing and development.
//!
//! These run entirely in memory and can be scripted programmatically, so the
//! status and command paths can be exercised without a real device.

pub mod transport;

pub use transport::{CommandCall, MockTransport, MockTransportHandle};
