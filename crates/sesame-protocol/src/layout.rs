//! Per-variant report layouts.
//!
//! Each [`DeviceVariant`] maps to a fixed [`VariantLayout`]. The decoder is
//! driven entirely by this table, so adding a device kind means adding a row
//! rather than another branch in the decoder.

use sesame_core::{
    DeviceVariant,
    constants::{
        BATTERY_ADC_OFFSET, BOT_REFERENCE_VOLTAGE, LOCK_REFERENCE_VOLTAGE, MIN_REPORT_LENGTH,
        POSITION_OFFSET, STATUS_FLAGS_OFFSET,
    },
};

/// Byte offsets and electrical constants for one device variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantLayout {
    /// Shortest report this variant can decode.
    pub min_length: usize,
    /// Offset of the u16 LE battery ADC reading.
    pub battery_offset: usize,
    /// Offset of the u16 LE position reading, if the variant reports one.
    pub position_offset: Option<usize>,
    /// Offset of the status flag byte.
    pub flags_offset: usize,
    /// ADC reference voltage used to scale the raw battery reading.
    pub reference_voltage: f64,
}

/// Full lock layout.
pub const LOCK_LAYOUT: VariantLayout = VariantLayout {
    min_length: MIN_REPORT_LENGTH,
    battery_offset: BATTERY_ADC_OFFSET,
    position_offset: Some(POSITION_OFFSET),
    flags_offset: STATUS_FLAGS_OFFSET,
    reference_voltage: LOCK_REFERENCE_VOLTAGE,
};

/// Bot layout. Position bytes are present on the wire but ignored.
pub const BOT_LAYOUT: VariantLayout = VariantLayout {
    min_length: MIN_REPORT_LENGTH,
    battery_offset: BATTERY_ADC_OFFSET,
    position_offset: None,
    flags_offset: STATUS_FLAGS_OFFSET,
    reference_voltage: BOT_REFERENCE_VOLTAGE,
};

impl VariantLayout {
    /// Layout for a device variant.
    #[must_use]
    pub fn for_variant(variant: DeviceVariant) -> &'static VariantLayout {
        match variant {
            DeviceVariant::Lock => &LOCK_LAYOUT,
            DeviceVariant::Bot => &BOT_LAYOUT,
        }
    }
}
