//! Wire-layout and calibration constants for Sesame status reports.
//!
//! A mechanical status report is a little-endian byte sequence of at least
//! [`MIN_REPORT_LENGTH`] bytes. Only the fields below are interpreted; every
//! other byte and bit is reserved and must be ignored so that firmware
//! revisions appending trailing fields keep decoding.
//!
//! ```text
//! offset  0      2      4      6      7
//!         ├──────┼──────┼──────┼──────┤
//!         │ ADC  │ rsvd │ pos  │ rsvd │ flags
//!         └──────┴──────┴──────┴──────┘
//!          u16 LE        u16 LE        bit 0x02 locked, bit 0x04 unlocked
//! ```
//!
//! # Usage
//!
//! ```
//! use sesame_core::constants::*;
//!
//! let report = [0xFF, 0x03, 0, 0, 0x10, 0x00, 0, FLAG_LOCKED];
//! assert!(report.len() >= MIN_REPORT_LENGTH);
//! assert_eq!(report[STATUS_FLAGS_OFFSET] & FLAG_LOCKED, FLAG_LOCKED);
//! ```

// ============================================================================
// Report Layout
// ============================================================================

/// Minimum report length accepted for every device variant.
pub const MIN_REPORT_LENGTH: usize = 8;

/// Offset of the raw battery ADC reading (u16, little-endian).
pub const BATTERY_ADC_OFFSET: usize = 0;

/// Offset of the raw position reading (u16, little-endian).
///
/// Only meaningful for full locks; bots report position as 0.
pub const POSITION_OFFSET: usize = 4;

/// Offset of the status flag byte.
pub const STATUS_FLAGS_OFFSET: usize = 7;

/// Status flag bit set when the lock reports itself locked.
pub const FLAG_LOCKED: u8 = 0x02;

/// Status flag bit set when the lock reports itself unlocked.
pub const FLAG_UNLOCKED: u8 = 0x04;

// ============================================================================
// Battery
// ============================================================================

/// Full-scale value of the battery ADC (10-bit converter).
pub const ADC_FULL_SCALE: f64 = 1023.0;

/// Reference voltage of the bot's battery ADC.
pub const BOT_REFERENCE_VOLTAGE: f64 = 3.6;

/// Reference voltage of the lock's battery ADC.
pub const LOCK_REFERENCE_VOLTAGE: f64 = 7.2;

/// Default percentage at or below which a battery is reported as low.
pub const DEFAULT_LOW_BATTERY_THRESHOLD: f64 = 20.0;

/// Lock discharge curve as `(voltage, percentage)` pairs, strictly
/// descending in voltage.
pub const LOCK_CALIBRATION: [(f64, f64); 10] = [
    (6.0, 100.0),
    (5.8, 50.0),
    (5.7, 40.0),
    (5.6, 32.0),
    (5.4, 21.0),
    (5.2, 13.0),
    (5.1, 10.0),
    (5.0, 7.0),
    (4.8, 3.0),
    (4.6, 0.0),
];

/// Bot discharge curve: the lock curve at half the cell voltage.
pub const BOT_CALIBRATION: [(f64, f64); 10] = [
    (3.0, 100.0),
    (2.9, 50.0),
    (2.85, 40.0),
    (2.8, 32.0),
    (2.7, 21.0),
    (2.6, 13.0),
    (2.55, 10.0),
    (2.5, 7.0),
    (2.4, 3.0),
    (2.3, 0.0),
];

// ============================================================================
// Commands
// ============================================================================

/// Command code: engage the bolt.
pub const CMD_LOCK: u8 = 82;

/// Command code: retract the bolt.
pub const CMD_UNLOCK: u8 = 83;

/// Command code: flip between locked and unlocked.
pub const CMD_TOGGLE: u8 = 88;

/// Command code: single actuation of a bot.
pub const CMD_CLICK: u8 = 89;

/// History tag attached to commands when none is configured.
pub const DEFAULT_HISTORY_NAME: &str = "sesame";

#[cfg(test)]
mod tests {
    use super::*;

    fn strictly_descending(curve: &[(f64, f64)]) -> bool {
        curve.windows(2).all(|w| w[0].0 > w[1].0)
    }

    #[test]
    fn test_layout_fits_minimum_length() {
        assert!(BATTERY_ADC_OFFSET + 2 <= MIN_REPORT_LENGTH);
        assert!(POSITION_OFFSET + 2 <= MIN_REPORT_LENGTH);
        assert!(STATUS_FLAGS_OFFSET < MIN_REPORT_LENGTH);
    }

    #[test]
    fn test_flags_are_distinct_bits() {
        assert_eq!(FLAG_LOCKED & FLAG_UNLOCKED, 0);
        assert_eq!(FLAG_LOCKED.count_ones(), 1);
        assert_eq!(FLAG_UNLOCKED.count_ones(), 1);
    }

    #[test]
    fn test_calibration_curves_shape() {
        for curve in [&LOCK_CALIBRATION, &BOT_CALIBRATION] {
            assert!(strictly_descending(curve));
            assert_eq!(curve[0].1, 100.0);
            assert_eq!(curve[curve.len() - 1].1, 0.0);
        }
    }

    #[test]
    fn test_command_values() {
        assert_eq!(CMD_LOCK, 82);
        assert_eq!(CMD_UNLOCK, 83);
        assert_eq!(CMD_TOGGLE, 88);
        assert_eq!(CMD_CLICK, 89);
    }
}
