//! Raw mechanical status reports.
//!
//! Reports travel hex-encoded on the wire (for example `"ff03000010000002"`)
//! and are turned into bytes before decoding. [`RawStatusReport`] owns those
//! bytes in a cheaply clonable [`Bytes`] buffer so that a single report can be
//! fanned out across tasks without copying.
//!
//! # Examples
//!
//! ```
//! use sesame_protocol::RawStatusReport;
//!
//! let report = RawStatusReport::from_hex("FF03000010000002").unwrap();
//! assert_eq!(report.len(), 8);
//! assert_eq!(report.u16_le(0), Some(1023));
//! assert_eq!(report.byte(7), Some(0x02));
//! ```

use bytes::Bytes;
use sesame_core::{Error, Result};
use std::fmt;

/// Opaque status bytes as received from a transport.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RawStatusReport(Bytes);

impl RawStatusReport {
    /// Wrap already-decoded report bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Decode the hex wire form of a report.
    ///
    /// Surrounding whitespace is ignored and both cases are accepted.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidHex` for odd-length input or non-hex characters.
    pub fn from_hex(input: &str) -> Result<Self> {
        let bytes = hex::decode(input.trim())
            .map_err(|e| Error::InvalidHex(format!("'{}': {e}", input.trim())))?;
        Ok(Self(Bytes::from(bytes)))
    }

    /// Report bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes in the report.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the report carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a little-endian u16 at `offset`, if the report is long enough.
    #[must_use]
    pub fn u16_le(&self, offset: usize) -> Option<u16> {
        let end = offset.checked_add(2)?;
        let bytes = self.0.get(offset..end)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a single byte at `offset`.
    #[must_use]
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.0.get(offset).copied()
    }

    /// Lowercase hex wire form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for RawStatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawStatusReport({})", self.to_hex())
    }
}

impl From<Vec<u8>> for RawStatusReport {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for RawStatusReport {
    fn from(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }
}

impl std::str::FromStr for RawStatusReport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}
