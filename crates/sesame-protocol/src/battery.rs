//! Battery charge estimation from a voltage reading.
//!
//! Cell voltage is mapped to a percentage through a piecewise-linear
//! discharge curve: an ordered list of `(voltage, percentage)` breakpoints,
//! strictly descending in voltage, starting at 100% and ending at 0%.
//!
//! ```text
//!  %
//! 100 ┤●
//!     │ ╲
//!  50 ┤  ●
//!  40 ┤   ●─●
//!     │      ╲
//!   0 ┤       ●──●──●──●
//!     └─┬──┬──┬──┬──┬──┬── V (descending)
//! ```
//!
//! Above the top breakpoint the battery is full (exactly 100.0); at or below
//! the bottom breakpoint it is empty (exactly 0.0). In between, the
//! percentage is interpolated between the two bracketing breakpoints.
//!
//! # Examples
//!
//! ```
//! use sesame_protocol::battery::CalibrationCurve;
//! use sesame_core::DeviceVariant;
//!
//! let curve = CalibrationCurve::for_variant(DeviceVariant::Lock);
//! assert!((curve.estimate(5.75) - 45.0).abs() < 1e-9);
//! assert_eq!(curve.estimate(6.5), 100.0);
//! assert_eq!(curve.estimate(4.6), 0.0);
//! ```

use serde::{Deserialize, Serialize};
use sesame_core::{
    DeviceVariant, Error, Result,
    constants::{BOT_CALIBRATION, LOCK_CALIBRATION},
};
use std::borrow::Cow;

/// A single `(voltage, percentage)` point of a discharge curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub voltage: f64,
    pub percentage: f64,
}

impl Breakpoint {
    #[must_use]
    pub const fn new(voltage: f64, percentage: f64) -> Self {
        Self {
            voltage,
            percentage,
        }
    }
}

const fn breakpoints<const N: usize>(pairs: [(f64, f64); N]) -> [Breakpoint; N] {
    let mut out = [Breakpoint::new(0.0, 0.0); N];
    let mut i = 0;
    while i < N {
        out[i] = Breakpoint::new(pairs[i].0, pairs[i].1);
        i += 1;
    }
    out
}

static LOCK_POINTS: [Breakpoint; LOCK_CALIBRATION.len()] = breakpoints(LOCK_CALIBRATION);
static BOT_POINTS: [Breakpoint; BOT_CALIBRATION.len()] = breakpoints(BOT_CALIBRATION);

/// Built-in lock discharge curve.
pub static LOCK_CURVE: CalibrationCurve = CalibrationCurve {
    points: Cow::Borrowed(&LOCK_POINTS),
};

/// Built-in bot discharge curve.
pub static BOT_CURVE: CalibrationCurve = CalibrationCurve {
    points: Cow::Borrowed(&BOT_POINTS),
};

/// Validated voltage → percentage discharge curve.
///
/// A curve can only be obtained through [`CalibrationCurve::new`] (which
/// validates) or as one of the built-in constants (which are covered by
/// tests), so estimation itself cannot fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationCurve {
    points: Cow<'static, [Breakpoint]>,
}

impl CalibrationCurve {
    /// Build a curve from breakpoints.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCurve` if [`validate`] rejects the breakpoints.
    pub fn new(points: Vec<Breakpoint>) -> Result<Self> {
        validate(&points)?;
        Ok(Self {
            points: Cow::Owned(points),
        })
    }

    /// The built-in curve for a device variant.
    #[must_use]
    pub fn for_variant(variant: DeviceVariant) -> &'static CalibrationCurve {
        match variant {
            DeviceVariant::Lock => &LOCK_CURVE,
            DeviceVariant::Bot => &BOT_CURVE,
        }
    }

    /// Breakpoints in descending voltage order.
    #[must_use]
    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }

    /// Estimate the charge percentage for `voltage`.
    ///
    /// Returns exactly 100.0 above the top breakpoint and exactly 0.0 at or
    /// below the bottom one. A NaN voltage brackets nothing and yields 0.0.
    #[must_use]
    pub fn estimate(&self, voltage: f64) -> f64 {
        interpolate(&self.points, voltage)
    }
}

fn interpolate(points: &[Breakpoint], voltage: f64) -> f64 {
    let (Some(top), Some(bottom)) = (points.first(), points.last()) else {
        return 0.0;
    };

    if voltage > top.voltage {
        return 100.0;
    }
    if voltage <= bottom.voltage {
        return 0.0;
    }

    for pair in points.windows(2) {
        let (upper, lower) = (pair[0], pair[1]);
        if voltage <= upper.voltage && voltage > lower.voltage {
            let f = (voltage - lower.voltage) / (upper.voltage - lower.voltage);
            return lower.percentage + f * (upper.percentage - lower.percentage);
        }
    }

    0.0
}

/// Check that breakpoints form a usable discharge curve.
///
/// A valid curve has at least two points, strictly descending finite
/// voltages, percentages that never rise as voltage falls, and starts at
/// 100% and ends at 0%.
///
/// # Errors
///
/// Returns `Error::InvalidCurve` describing the first violated rule.
pub fn validate(points: &[Breakpoint]) -> Result<()> {
    if points.len() < 2 {
        return Err(Error::invalid_curve(format!(
            "needs at least two breakpoints, got {}",
            points.len()
        )));
    }

    if let Some(bad) = points
        .iter()
        .find(|p| !p.voltage.is_finite() || !p.percentage.is_finite())
    {
        return Err(Error::invalid_curve(format!(
            "non-finite breakpoint ({}, {})",
            bad.voltage, bad.percentage
        )));
    }

    for (i, pair) in points.windows(2).enumerate() {
        if pair[0].voltage <= pair[1].voltage {
            return Err(Error::invalid_curve(format!(
                "voltage not strictly descending at index {}: {} then {}",
                i + 1,
                pair[0].voltage,
                pair[1].voltage
            )));
        }
        if pair[0].percentage < pair[1].percentage {
            return Err(Error::invalid_curve(format!(
                "percentage rises at index {}: {} then {}",
                i + 1,
                pair[0].percentage,
                pair[1].percentage
            )));
        }
    }

    let first = points[0].percentage;
    let last = points[points.len() - 1].percentage;
    if first != 100.0 {
        return Err(Error::invalid_curve(format!(
            "first breakpoint must be 100%, got {first}"
        )));
    }
    if last != 0.0 {
        return Err(Error::invalid_curve(format!(
            "last breakpoint must be 0%, got {last}"
        )));
    }

    Ok(())
}

/// Estimate a percentage against raw breakpoints, validating them first.
///
/// Prefer [`CalibrationCurve::estimate`] when the curve is reused.
///
/// # Errors
///
/// Returns `Error::InvalidCurve` if the breakpoints are not a valid curve.
pub fn estimate(voltage: f64, points: &[Breakpoint]) -> Result<f64> {
    validate(points)?;
    Ok(interpolate(points, voltage))
}
