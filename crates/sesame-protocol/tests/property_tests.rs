//! Property-based tests for status decoding and battery estimation.
//!
//! These tests use proptest to generate arbitrary reports, ADC readings and
//! calibration curves and verify that decoder and estimator invariants hold
//! across the whole input space.

use proptest::prelude::*;
use sesame_core::{DeviceVariant, Error};
use sesame_protocol::{Breakpoint, CalibrationCurve, RawStatusReport, StatusDecoder};

/// Strategy for generating device variants.
fn variant() -> impl Strategy<Value = DeviceVariant> {
    prop_oneof![Just(DeviceVariant::Lock), Just(DeviceVariant::Bot)]
}

/// Strategy for generating raw 10-bit ADC readings.
fn adc_reading() -> impl Strategy<Value = u16> {
    0u16..=1023u16
}

/// Strategy for generating well-formed reports (8 to 32 bytes).
fn report_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 8..=32)
}

/// Strategy for generating valid calibration curves.
///
/// Voltages are built by accumulating positive steps downward from a start
/// voltage; percentages are a sorted interior set bracketed by 100 and 0.
fn valid_curve() -> impl Strategy<Value = CalibrationCurve> {
    (1usize..8)
        .prop_flat_map(|interior| {
            (
                1.0f64..10.0,
                prop::collection::vec(0.01f64..1.0, interior + 1),
                prop::collection::vec(0.0f64..=100.0, interior),
            )
        })
        .prop_map(|(top, steps, mut interior)| {
            interior.sort_by(|a, b| b.total_cmp(a));
            let mut voltage = top;
            let mut points = vec![Breakpoint::new(voltage, 100.0)];
            for (step, pct) in steps.iter().zip(interior.iter()) {
                voltage -= step;
                points.push(Breakpoint::new(voltage, *pct));
            }
            voltage -= steps[steps.len() - 1];
            points.push(Breakpoint::new(voltage, 0.0));
            CalibrationCurve::new(points).expect("generated curve should be valid")
        })
}

fn report_with_adc(adc: u16) -> RawStatusReport {
    let [lo, hi] = adc.to_le_bytes();
    RawStatusReport::new(vec![lo, hi, 0, 0, 0, 0, 0, 0])
}

proptest! {
    /// Property: voltage is exactly `adc * reference / 1023` for every reading.
    #[test]
    fn prop_voltage_formula(adc in adc_reading()) {
        let report = report_with_adc(adc);

        let bot = StatusDecoder::decode(&report, DeviceVariant::Bot).unwrap();
        prop_assert_eq!(bot.battery_voltage(), f64::from(adc) * 3.6 / 1023.0);

        let lock = StatusDecoder::decode(&report, DeviceVariant::Lock).unwrap();
        prop_assert_eq!(lock.battery_voltage(), f64::from(adc) * 7.2 / 1023.0);
    }

    /// Property: decoded percentage always lies in [0, 100].
    #[test]
    fn prop_percentage_in_range(bytes in report_bytes(), variant in variant()) {
        let status = StatusDecoder::decode(&RawStatusReport::new(bytes), variant).unwrap();
        prop_assert!((0.0..=100.0).contains(&status.battery_percentage()));
    }

    /// Property: decoding is deterministic.
    #[test]
    fn prop_decode_idempotent(bytes in report_bytes(), variant in variant()) {
        let report = RawStatusReport::new(bytes);
        let first = StatusDecoder::decode(&report, variant).unwrap();
        let second = StatusDecoder::decode(&report, variant).unwrap();
        prop_assert_eq!(first.battery_voltage().to_bits(), second.battery_voltage().to_bits());
        prop_assert_eq!(first.battery_percentage().to_bits(), second.battery_percentage().to_bits());
        prop_assert_eq!(first, second);
    }

    /// Property: reserved bytes and bits never influence the result.
    #[test]
    fn prop_reserved_bytes_ignored(
        bytes in report_bytes(),
        noise in prop::collection::vec(any::<u8>(), 32),
        variant in variant(),
    ) {
        let mut noisy = bytes.clone();
        for offset in [2usize, 3, 6] {
            noisy[offset] = noise[offset];
        }
        for offset in 8..noisy.len() {
            noisy[offset] = noise[offset];
        }
        // Keep flag bits 0x02 and 0x04, scramble the rest
        noisy[7] = (bytes[7] & 0x06) | (noise[7] & !0x06);

        let clean = StatusDecoder::decode(&RawStatusReport::new(bytes), variant).unwrap();
        let dirty = StatusDecoder::decode(&RawStatusReport::new(noisy), variant).unwrap();
        prop_assert_eq!(clean, dirty);
    }

    /// Property: bots never report a position.
    #[test]
    fn prop_bot_position_zero(bytes in report_bytes()) {
        let status = StatusDecoder::decode(&RawStatusReport::new(bytes), DeviceVariant::Bot).unwrap();
        prop_assert_eq!(status.position(), 0);
    }

    /// Property: reports shorter than 8 bytes are always rejected.
    #[test]
    fn prop_short_reports_rejected(
        bytes in prop::collection::vec(any::<u8>(), 0..8),
        variant in variant(),
    ) {
        let len = bytes.len();
        let result = StatusDecoder::decode(&RawStatusReport::new(bytes), variant);
        prop_assert!(
            matches!(result, Err(Error::MalformedReport { actual, .. }) if actual == len),
            "expected MalformedReport"
        );
    }

    /// Property: above the top breakpoint the estimate is exactly 100.
    #[test]
    fn prop_above_top_is_full(curve in valid_curve(), excess in 0.0001f64..100.0) {
        let top = curve.points()[0].voltage;
        prop_assert_eq!(curve.estimate(top + excess), 100.0);
    }

    /// Property: at or below the bottom breakpoint the estimate is exactly 0.
    #[test]
    fn prop_at_or_below_bottom_is_empty(curve in valid_curve(), deficit in 0.0f64..100.0) {
        let bottom = curve.points()[curve.points().len() - 1].voltage;
        prop_assert_eq!(curve.estimate(bottom - deficit), 0.0);
    }

    /// Property: the estimate never increases as voltage decreases.
    #[test]
    fn prop_monotonic_non_increasing(
        curve in valid_curve(),
        a in -1.0f64..12.0,
        b in -1.0f64..12.0,
    ) {
        let (high, low) = if a >= b { (a, b) } else { (b, a) };
        let upper = curve.estimate(high);
        let lower = curve.estimate(low);
        prop_assert!(
            lower <= upper + 1e-9,
            "estimate({}) = {} exceeds estimate({}) = {}",
            low, lower, high, upper
        );
    }

    /// Property: the built-in curves are monotonic over the full ADC range.
    #[test]
    fn prop_builtin_curves_monotonic(variant in variant(), adc in 1u16..=1023u16) {
        let higher = StatusDecoder::decode(&report_with_adc(adc), variant).unwrap();
        let lower = StatusDecoder::decode(&report_with_adc(adc - 1), variant).unwrap();
        prop_assert!(lower.battery_percentage() <= higher.battery_percentage() + 1e-9);
    }

    /// Property: the hex wire form decodes exactly like the raw bytes.
    #[test]
    fn prop_hex_matches_bytes(bytes in report_bytes(), variant in variant(), upper in any::<bool>()) {
        let mut wire = hex::encode(&bytes);
        if upper {
            wire = wire.to_uppercase();
        }
        let from_hex = StatusDecoder::decode_hex(&wire, variant).unwrap();
        let from_bytes = StatusDecoder::decode(&RawStatusReport::new(bytes), variant).unwrap();
        prop_assert_eq!(from_hex, from_bytes);
    }
}

#[cfg(test)]
mod standard_tests {
    use super::*;

    #[test]
    fn test_lock_concrete_case() {
        // 5.75 V sits halfway between (5.8, 50) and (5.7, 40)
        let curve = CalibrationCurve::for_variant(DeviceVariant::Lock);
        let pct = curve.estimate(5.75);
        assert!((pct - 45.0).abs() < 1e-9, "got {pct}");
    }

    #[test]
    fn test_both_flags_set() {
        let report = RawStatusReport::new(vec![0, 0, 0, 0, 0, 0, 0, 0x06]);
        let status = StatusDecoder::decode(&report, DeviceVariant::Lock).unwrap();
        assert!(status.is_locked());
        assert!(status.is_unlocked());
    }

    #[test]
    fn test_length_boundary() {
        let seven = RawStatusReport::new(vec![0u8; 7]);
        let eight = RawStatusReport::new(vec![0u8; 8]);
        assert!(matches!(
            StatusDecoder::decode(&seven, DeviceVariant::Lock),
            Err(Error::MalformedReport { .. })
        ));
        assert!(StatusDecoder::decode(&eight, DeviceVariant::Lock).is_ok());
    }
}
