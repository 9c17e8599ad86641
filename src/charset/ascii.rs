use crate::charset::sealed::Sealed;
use crate::charset::{put, Charset, DecodeError, EncodeError};

/// The [ASCII](https://en.wikipedia.org/wiki/ASCII) charset.
#[non_exhaustive]
#[derive(Default)]
pub struct Ascii;

impl Sealed for Ascii {}

impl Charset for Ascii {
    fn name(&self) -> &'static str {
        "US-ASCII"
    }

    fn ascii_compatible(&self) -> bool {
        true
    }

    fn decode(&self, bytes: &[u8]) -> Result<(char, usize), DecodeError> {
        match bytes[0] {
            b @ ..=0x7F => Ok((b as char, 1)),
            _ => Err(DecodeError::Invalid { len: 1 }),
        }
    }

    fn encode(&self, c: char, out: &mut [u8]) -> Result<usize, EncodeError> {
        if c.is_ascii() {
            put(&[c as u8], out)
        } else {
            Err(EncodeError::InvalidChar)
        }
    }
}

/// A single-byte, ASCII-compatible charset described by a table. Bytes in
/// `start..start + table.len()` map through `table`, every other byte maps to the code point of
/// the same value. Bytes listed in `holes` are unassigned.
pub struct SingleByte {
    name: &'static str,
    start: u8,
    table: &'static [char],
    holes: &'static [u8],
}

impl SingleByte {
    pub(crate) const fn new(
        name: &'static str,
        start: u8,
        table: &'static [char],
        holes: &'static [u8],
    ) -> SingleByte {
        SingleByte {
            name,
            start,
            table,
            holes,
        }
    }

    fn in_table(&self, cp: u32) -> bool {
        let start = self.start as u32;
        (start..start + self.table.len() as u32).contains(&cp)
    }
}

impl Sealed for SingleByte {}

impl Charset for SingleByte {
    fn name(&self) -> &'static str {
        self.name
    }

    fn ascii_compatible(&self) -> bool {
        true
    }

    fn decode(&self, bytes: &[u8]) -> Result<(char, usize), DecodeError> {
        let b = bytes[0];
        if self.holes.contains(&b) {
            Err(DecodeError::Invalid { len: 1 })
        } else if self.in_table(b as u32) {
            Ok((self.table[(b - self.start) as usize], 1))
        } else {
            Ok((b as char, 1))
        }
    }

    fn encode(&self, c: char, out: &mut [u8]) -> Result<usize, EncodeError> {
        let cp = c as u32;
        if cp < 0x100 && !self.in_table(cp) && !self.holes.contains(&(cp as u8)) {
            return put(&[cp as u8], out);
        }

        let b = self
            .table
            .iter()
            .position(|v| *v == c)
            .map(|pos| self.start + pos as u8)
            .filter(|b| !self.holes.contains(b))
            .ok_or(EncodeError::InvalidChar)?;
        put(&[b], out)
    }
}
