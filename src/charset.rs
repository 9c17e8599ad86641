//! Charset tables backing the default converter facility. This module provides the [`Charset`]
//! trait and its implementors, such as [`Utf8`] or [`WIN_1252`], plus the name registry used to
//! resolve charset names like `"ISO-8859-1"` or `"cp1252"`.
//!
//! Charsets work one character at a time: [`Charset::decode`] reads a single character from the
//! front of a byte slice, and [`Charset::encode`] writes a single character into an output
//! buffer, reporting [`EncodeError::NeedSpace`] when it doesn't fit. The stream-level logic lives
//! in [`Recoder`](crate::xlate::Recoder).

mod ascii;
mod iso;
mod mac;
mod utf;
mod win;

pub use ascii::*;
pub use iso::*;
pub use mac::*;
pub use utf::*;
pub use win::*;

mod sealed {
    pub trait Sealed {}
}
use sealed::Sealed;

/// A byte-oriented character set that can be converted to and from Unicode.
///
/// This trait is sealed; the available charsets are the ones the [registry](lookup) knows about.
pub trait Charset: Sealed + Send + Sync {
    /// The canonical name of this charset, as used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether every 7-bit ASCII byte stands for the same ASCII character in this charset.
    fn ascii_compatible(&self) -> bool;

    /// Decode the character at the start of `bytes`, returning it and the number of bytes it
    /// occupied. `bytes` is never empty.
    fn decode(&self, bytes: &[u8]) -> Result<(char, usize), DecodeError>;

    /// Encode `c` into the start of `out`. If successful, returns the number of bytes written.
    fn encode(&self, c: char, out: &mut [u8]) -> Result<usize, EncodeError>;
}

/// An error while decoding a single character from a byte stream
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The bytes at the current position don't form a character in this charset
    Invalid {
        /// Number of bytes making up the invalid sequence
        len: usize,
    },
    /// The stream ended in the middle of a multi-byte character
    Incomplete,
}

/// An error while encoding a `char` directly into a buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    /// The output is too small to hold the encoded character
    NeedSpace {
        /// Space required to encode the character
        len: usize,
    },
    /// The provided character isn't representable in the output charset
    InvalidChar,
}

/// Write an already-encoded character into `out`, or report how much space it needs.
pub(crate) fn put(bytes: &[u8], out: &mut [u8]) -> Result<usize, EncodeError> {
    match out.get_mut(..bytes.len()) {
        Some(dst) => {
            dst.copy_from_slice(bytes);
            Ok(bytes.len())
        }
        None => Err(EncodeError::NeedSpace { len: bytes.len() }),
    }
}

/// Identifies one of the built-in charsets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CharsetId {
    /// US-ASCII
    Ascii,
    /// ISO-8859-1 (Latin-1)
    Latin1,
    /// ISO-8859-2 (Latin-2)
    Iso8859_2,
    /// ISO-8859-15 (Latin-9)
    Iso8859_15,
    /// Windows-1251
    Win1251,
    /// Windows-1252
    Win1252,
    /// Mac OS Roman
    MacRoman,
    /// UTF-8
    Utf8,
    /// UTF-16, little endian
    Utf16LE,
    /// UTF-16, big endian
    Utf16BE,
}

impl CharsetId {
    /// The charset implementation for this identifier.
    pub fn charset(self) -> &'static dyn Charset {
        match self {
            CharsetId::Ascii => &Ascii,
            CharsetId::Latin1 => &LATIN_1,
            CharsetId::Iso8859_2 => &ISO_8859_2,
            CharsetId::Iso8859_15 => &ISO_8859_15,
            CharsetId::Win1251 => &WIN_1251,
            CharsetId::Win1252 => &WIN_1252,
            CharsetId::MacRoman => &MAC_ROMAN,
            CharsetId::Utf8 => &Utf8,
            CharsetId::Utf16LE => &Utf16LE,
            CharsetId::Utf16BE => &Utf16BE,
        }
    }
}

// Keys are normalized by `normalize`: ASCII lowercase with '-', '_' and ' ' removed.
static ALIASES: phf::Map<&'static str, CharsetId> = phf::phf_map! {
    "ascii" => CharsetId::Ascii,
    "usascii" => CharsetId::Ascii,
    "us" => CharsetId::Ascii,
    "ansix3.41968" => CharsetId::Ascii,
    "iso646us" => CharsetId::Ascii,
    "646" => CharsetId::Ascii,
    "c" => CharsetId::Ascii,
    "posix" => CharsetId::Ascii,
    "iso88591" => CharsetId::Latin1,
    "latin1" => CharsetId::Latin1,
    "l1" => CharsetId::Latin1,
    "cp819" => CharsetId::Latin1,
    "iso88592" => CharsetId::Iso8859_2,
    "latin2" => CharsetId::Iso8859_2,
    "l2" => CharsetId::Iso8859_2,
    "iso885915" => CharsetId::Iso8859_15,
    "latin9" => CharsetId::Iso8859_15,
    "l9" => CharsetId::Iso8859_15,
    "windows1251" => CharsetId::Win1251,
    "cp1251" => CharsetId::Win1251,
    "windows1252" => CharsetId::Win1252,
    "cp1252" => CharsetId::Win1252,
    "macroman" => CharsetId::MacRoman,
    "macintosh" => CharsetId::MacRoman,
    "mac" => CharsetId::MacRoman,
    "utf8" => CharsetId::Utf8,
    "utf16le" => CharsetId::Utf16LE,
    "utf16be" => CharsetId::Utf16BE,
};

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve a charset name, ignoring case as well as `-`, `_` and spaces. Returns `None` for
/// names the registry doesn't know.
pub fn lookup(name: &str) -> Option<CharsetId> {
    ALIASES.get(normalize(name).as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_aliases() {
        assert_eq!(lookup("UTF-8"), Some(CharsetId::Utf8));
        assert_eq!(lookup("utf8"), Some(CharsetId::Utf8));
        assert_eq!(lookup("ISO_8859-1"), Some(CharsetId::Latin1));
        assert_eq!(lookup("ANSI_X3.4-1968"), Some(CharsetId::Ascii));
        assert_eq!(lookup("CP1252"), Some(CharsetId::Win1252));
        assert_eq!(lookup("EBCDIC-US"), None);
        assert_eq!(lookup(""), None);
    }

    #[test]
    fn test_names_resolve_to_themselves() {
        for id in [
            CharsetId::Ascii,
            CharsetId::Latin1,
            CharsetId::Iso8859_2,
            CharsetId::Iso8859_15,
            CharsetId::Win1251,
            CharsetId::Win1252,
            CharsetId::MacRoman,
            CharsetId::Utf8,
            CharsetId::Utf16LE,
            CharsetId::Utf16BE,
        ] {
            assert_eq!(lookup(id.charset().name()), Some(id));
        }
    }

    #[test]
    fn test_put() {
        let mut out = [0; 2];
        assert_eq!(put(b"ab", &mut out), Ok(2));
        assert_eq!(&out, b"ab");
        assert_eq!(put(b"abc", &mut out), Err(EncodeError::NeedSpace { len: 3 }));
    }
}
