//! Status report decoding and battery estimation for Sesame devices.
//!
//! Everything in this crate is synchronous and side-effect free:
//!
//! - [`RawStatusReport`] wraps the bytes received from a transport.
//! - [`VariantLayout`] holds the per-variant byte offsets and ADC reference.
//! - [`StatusDecoder`] turns a report into a [`MechanicalStatus`].
//! - [`CalibrationCurve`] maps battery voltage to a charge percentage.
//!
//! [`MechanicalStatus`]: sesame_core::MechanicalStatus

pub mod battery;
pub mod decoder;
pub mod layout;
pub mod report;

pub use battery::{BOT_CURVE, Breakpoint, CalibrationCurve, LOCK_CURVE};
pub use decoder::{StatusDecoder, adc_to_voltage};
pub use layout::{BOT_LAYOUT, LOCK_LAYOUT, VariantLayout};
pub use report::RawStatusReport;
