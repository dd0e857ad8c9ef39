use thiserror::Error;

use crate::types::DeviceVariant;

#[derive(Error, Debug)]
pub enum Error {
    // Report errors
    #[error("Malformed {variant} report: expected at least {expected} bytes, got {actual}")]
    MalformedReport {
        variant: DeviceVariant,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid hex report: {0}")]
    InvalidHex(String),

    // Calibration errors
    #[error("Invalid calibration curve: {0}")]
    InvalidCurve(String),

    // Identity errors
    #[error("Invalid device ID: {0}")]
    InvalidDeviceId(String),

    #[error("Unknown device variant: {0}")]
    UnknownVariant(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a malformed report error for a report that is too short.
    pub fn malformed_report(variant: DeviceVariant, expected: usize, actual: usize) -> Self {
        Self::MalformedReport {
            variant,
            expected,
            actual,
        }
    }

    /// Create an invalid calibration curve error.
    pub fn invalid_curve(message: impl Into<String>) -> Self {
        Self::InvalidCurve(message.into())
    }

    /// Returns `true` for errors caused by report contents rather than configuration.
    #[must_use]
    pub fn is_report_error(&self) -> bool {
        matches!(self, Self::MalformedReport { .. } | Self::InvalidHex(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
