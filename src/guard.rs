//! The check applied in place of a conversion when no converter is available.

use core::fmt;

/// Data rejected because it isn't plain, printable 7-bit ASCII and couldn't be converted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonAscii {
    safe: String,
    byte: u8,
}

impl NonAscii {
    /// The printable prefix of the data before the offending byte.
    pub fn safe_prefix(&self) -> &str {
        &self.safe
    }

    /// The first byte that isn't allowed through without conversion.
    pub fn byte(&self) -> u8 {
        self.byte
    }
}

impl fmt::Display for NonAscii {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.safe.is_empty() {
            write!(
                f,
                "Non-ASCII character (code {}) detected, and unable to convert to/from UTF-8",
                self.byte
            )
        } else {
            write!(
                f,
                "Safe data:\n\"{}\"\n... was followed by non-ASCII byte {}.\n\n\
                 Non-ASCII character detected (see above), and unable to convert to/from UTF-8",
                self.safe, self.byte
            )
        }
    }
}

impl std::error::Error for NonAscii {}

// Matches C's `isspace` in the "C" locale, which includes vertical tab
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

fn is_safe(b: u8) -> bool {
    b.is_ascii() && (is_space(b) || !b.is_ascii_control())
}

/// Check that `data` consists only of 7-bit ASCII bytes that are either printable or whitespace,
/// so it reads the same in UTF-8 and any ASCII-compatible native charset.
pub fn check_non_ascii(data: &[u8]) -> Result<(), NonAscii> {
    match data.iter().position(|b| !is_safe(*b)) {
        None => Ok(()),
        Some(at) => Err(NonAscii {
            // Every byte before `at` passed `is_safe`, so this is ASCII
            safe: data[..at].iter().map(|b| *b as char).collect(),
            byte: data[at],
        }),
    }
}
