//! Core types shared by the Sesame status decoding and command engine.
//!
//! This crate holds the vocabulary every other crate speaks: device identity,
//! the closed set of device variants, the decoded [`MechanicalStatus`]
//! snapshot, the command set, and the wire-layout constants.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
