//! Canonical GUID handling.
//!
//! Attached controllers are keyed by an instance GUID. The textual form is
//! the hyphenated layout `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`; [`Guid`]'s
//! `Display` and `FromStr` implementations are exact inverses over that form
//! (lowercase hex), so an identifier survives a round-trip through log lines
//! and registry keys unchanged.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// 16-byte identifier in the classic Windows `GUID` field layout.
///
/// Ordering is lexicographic over the fields; any total order works for the
/// attach-set difference, this one keeps related instances adjacent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }
}

/// Rejected textual GUID form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuidParseError {
    #[error("expected 36 characters, got {0}")]
    Length(usize),
    #[error("expected '-' at offset {0}")]
    Hyphen(usize),
    #[error("invalid hex digit at offset {0}")]
    HexDigit(usize),
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

impl FromStr for Guid {
    type Err = GuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 36 {
            return Err(GuidParseError::Length(bytes.len()));
        }
        for offset in [8, 13, 18, 23] {
            if bytes[offset] != b'-' {
                return Err(GuidParseError::Hyphen(offset));
            }
        }

        let data1 = hex_field(bytes, 0, 8)? as u32;
        let data2 = hex_field(bytes, 9, 4)? as u16;
        let data3 = hex_field(bytes, 14, 4)? as u16;
        let mut data4 = [0u8; 8];
        for (i, byte) in data4.iter_mut().take(2).enumerate() {
            *byte = hex_field(bytes, 19 + 2 * i, 2)? as u8;
        }
        for (i, byte) in data4.iter_mut().skip(2).enumerate() {
            *byte = hex_field(bytes, 24 + 2 * i, 2)? as u8;
        }
        Ok(Self::new(data1, data2, data3, data4))
    }
}

/// Reads `len` lowercase hex digits starting at `start`. Uppercase digits
/// are rejected, keeping parse and format exact inverses.
fn hex_field(bytes: &[u8], start: usize, len: usize) -> Result<u64, GuidParseError> {
    let mut value = 0u64;
    for offset in start..start + len {
        let digit = match bytes[offset] {
            b @ b'0'..=b'9' => b - b'0',
            b @ b'a'..=b'f' => b - b'a' + 10,
            _ => return Err(GuidParseError::HexDigit(offset)),
        };
        value = value << 4 | u64::from(digit);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Product GUID of the NSO N64 controller as DirectInput renders it.
    const N64_PRODUCT: &str = "2019057e-0000-0000-0000-504944564944";

    #[test]
    fn formats_canonical_lowercase() {
        let guid = Guid::new(
            0x2019057e,
            0,
            0,
            [0x00, 0x00, 0x50, 0x49, 0x44, 0x56, 0x49, 0x44],
        );
        assert_eq!(guid.to_string(), N64_PRODUCT);
    }

    #[test]
    fn parse_and_format_are_exact_inverses() {
        let guid: Guid = N64_PRODUCT.parse().unwrap();
        assert_eq!(guid.to_string(), N64_PRODUCT);

        let other = Guid::new(0xdeadbeef, 0x1234, 0xabcd, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(other.to_string().parse::<Guid>().unwrap(), other);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            "1234".parse::<Guid>().unwrap_err(),
            GuidParseError::Length(4)
        );
    }

    #[test]
    fn rejects_misplaced_hyphens() {
        let s = "2019057e+0000-0000-0000-504944564944";
        assert_eq!(s.parse::<Guid>().unwrap_err(), GuidParseError::Hyphen(8));
    }

    #[test]
    fn rejects_non_hex_digits() {
        let s = "2019057g-0000-0000-0000-504944564944";
        assert_eq!(s.parse::<Guid>().unwrap_err(), GuidParseError::HexDigit(7));
    }

    #[test]
    fn rejects_uppercase_digits() {
        // Display only ever emits lowercase; a form it would not reproduce
        // must not parse.
        let s = "2019057E-0000-0000-0000-504944564944";
        assert_eq!(s.parse::<Guid>().unwrap_err(), GuidParseError::HexDigit(7));
    }

    #[test]
    fn ordering_is_total_and_stable() {
        let a = Guid::new(1, 0, 0, [0; 8]);
        let b = Guid::new(2, 0, 0, [0; 8]);
        assert!(a < b);
        assert_eq!(a.cmp(&a), std::cmp::Ordering::Equal);
    }
}
