//! Mechanical status decoder.
//!
//! Turns a [`RawStatusReport`] into a [`MechanicalStatus`] using the
//! variant's [`VariantLayout`] and [`CalibrationCurve`]. Decoding is a pure
//! function: the same bytes and variant always produce the same snapshot.
//!
//! # Report Format
//!
//! ```text
//! byte  0   1   2   3   4   5   6   7   8..
//!       ADC LE  --  --  POS LE  --  FLG (reserved, ignored)
//! ```
//!
//! - Voltage is `adc * reference_voltage / 1023` (3.6 V bot, 7.2 V lock),
//!   with no clamping.
//! - Position is read only for locks; bots report 0.
//! - Flag bit `0x02` sets `locked`, bit `0x04` sets `unlocked`; the two are
//!   read independently.
//!
//! # Examples
//!
//! ```
//! use sesame_core::DeviceVariant;
//! use sesame_protocol::StatusDecoder;
//!
//! let status = StatusDecoder::decode_hex("2b03000020000006", DeviceVariant::Lock).unwrap();
//! assert_eq!(status.position(), 32);
//! assert!(status.is_locked());
//! assert!(status.is_unlocked());
//! ```
//!
//! ## Error Handling
//!
//! ```
//! use sesame_core::{DeviceVariant, Error};
//! use sesame_protocol::{RawStatusReport, StatusDecoder};
//!
//! let short = RawStatusReport::new(vec![0u8; 7]);
//! let result = StatusDecoder::decode(&short, DeviceVariant::Bot);
//! assert!(matches!(result, Err(Error::MalformedReport { expected: 8, actual: 7, .. })));
//! ```

use crate::battery::CalibrationCurve;
use crate::layout::VariantLayout;
use crate::report::RawStatusReport;
use sesame_core::{
    DeviceVariant, Error, MechanicalStatus, Result,
    constants::{ADC_FULL_SCALE, FLAG_LOCKED, FLAG_UNLOCKED},
};

/// Stateless status decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusDecoder;

impl StatusDecoder {
    /// Decode a report for the given variant.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedReport` if the report is shorter than the
    /// variant's minimum length. Extra trailing bytes are ignored.
    pub fn decode(report: &RawStatusReport, variant: DeviceVariant) -> Result<MechanicalStatus> {
        Self::decode_with(
            report,
            variant,
            VariantLayout::for_variant(variant),
            CalibrationCurve::for_variant(variant),
        )
    }

    /// Decode the hex wire form of a report.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHex` for bad hex and `Error::MalformedReport`
    /// for reports that are too short.
    pub fn decode_hex(input: &str, variant: DeviceVariant) -> Result<MechanicalStatus> {
        let report = RawStatusReport::from_hex(input)?;
        Self::decode(&report, variant)
    }

    /// Decode against an explicit layout and curve.
    ///
    /// `variant` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedReport` if the report is shorter than
    /// `layout.min_length` or does not cover one of the layout's fields.
    pub fn decode_with(
        report: &RawStatusReport,
        variant: DeviceVariant,
        layout: &VariantLayout,
        curve: &CalibrationCurve,
    ) -> Result<MechanicalStatus> {
        if report.len() < layout.min_length {
            return Err(Error::malformed_report(
                variant,
                layout.min_length,
                report.len(),
            ));
        }

        let too_short = || Error::malformed_report(variant, layout.min_length, report.len());

        let raw_adc = report.u16_le(layout.battery_offset).ok_or_else(too_short)?;
        let position = match layout.position_offset {
            Some(offset) => report.u16_le(offset).ok_or_else(too_short)?,
            None => 0,
        };
        let flags = report.byte(layout.flags_offset).ok_or_else(too_short)?;

        let voltage = adc_to_voltage(raw_adc, layout.reference_voltage);
        let percentage = curve.estimate(voltage);

        Ok(MechanicalStatus::new(
            voltage,
            percentage,
            position,
            flags & FLAG_LOCKED != 0,
            flags & FLAG_UNLOCKED != 0,
        ))
    }
}

/// Scale a raw ADC reading to volts.
#[inline]
#[must_use]
pub fn adc_to_voltage(raw: u16, reference_voltage: f64) -> f64 {
    f64::from(raw) * reference_voltage / ADC_FULL_SCALE
}
