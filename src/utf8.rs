//! UTF-8 validation, and the bounded diagnostic produced when validation fails.

use core::fmt;
use std::ffi::CStr;

use arrayvec::ArrayVec;

/// Most valid bytes shown before the failure point. 24 octets fit on one 80 column line.
const VALID_SHOWN: usize = 24;
/// Most bytes shown from the failure point onwards; enough to always include the faulty octet.
const INVALID_SHOWN: usize = 4;

/// Whether `data` is well-formed UTF-8.
pub fn is_valid(data: &[u8]) -> bool {
    core::str::from_utf8(data).is_ok()
}

/// Whether the bytes of `data`, up to its terminator, are well-formed UTF-8.
pub fn is_valid_cstring(data: &CStr) -> bool {
    is_valid(data.to_bytes())
}

/// Offset of the first byte of the first invalid sequence in `data`, or `data.len()` if all of
/// `data` is valid. A truncated sequence at the end counts as invalid.
pub fn last_valid(data: &[u8]) -> usize {
    match core::str::from_utf8(data) {
        Ok(_) => data.len(),
        Err(e) => e.valid_up_to(),
    }
}

/// Check that `data` is well-formed UTF-8.
pub fn check_utf8(data: &[u8]) -> Result<(), InvalidUtf8> {
    match last_valid(data) {
        end if end == data.len() => Ok(()),
        end => Err(InvalidUtf8::at(data, end)),
    }
}

/// Check that the bytes of `data`, up to its terminator, are well-formed UTF-8.
pub fn check_cstring_utf8(data: &CStr) -> Result<(), InvalidUtf8> {
    check_utf8(data.to_bytes())
}

/// Data that failed UTF-8 validation. Since the data is by definition not text in any known
/// encoding, only a bounded window of it around the failure point is kept, to be shown as hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidUtf8 {
    valid_up_to: usize,
    valid: ArrayVec<u8, VALID_SHOWN>,
    invalid: ArrayVec<u8, INVALID_SHOWN>,
}

impl InvalidUtf8 {
    fn at(data: &[u8], end: usize) -> InvalidUtf8 {
        let start = end.saturating_sub(VALID_SHOWN);
        let stop = data.len().min(end + INVALID_SHOWN);
        InvalidUtf8 {
            valid_up_to: end,
            valid: data[start..end].iter().copied().collect(),
            invalid: data[end..stop].iter().copied().collect(),
        }
    }

    /// The length of valid data before the first invalid sequence.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }

    /// At most the last 24 valid bytes before the failure point. This may start in the middle of
    /// a multi-byte character.
    pub fn valid_tail(&self) -> &[u8] {
        &self.valid
    }

    /// At most 4 bytes starting at the failure point.
    pub fn invalid_head(&self) -> &[u8] {
        &self.invalid
    }
}

struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, " {b:02x}"))
    }
}

impl fmt::Display for InvalidUtf8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Valid UTF-8 data\n(hex:{})\nfollowed by invalid UTF-8 sequence\n(hex:{})",
            Hex(&self.valid),
            Hex(&self.invalid),
        )
    }
}

impl std::error::Error for InvalidUtf8 {}
