use crate::charset::sealed::Sealed;
use crate::charset::{put, Charset, DecodeError, EncodeError};

/// The [UTF-8](https://en.wikipedia.org/wiki/UTF-8) charset
#[non_exhaustive]
#[derive(Default)]
pub struct Utf8;

impl Sealed for Utf8 {}

impl Charset for Utf8 {
    fn name(&self) -> &'static str {
        "UTF-8"
    }

    fn ascii_compatible(&self) -> bool {
        true
    }

    fn decode(&self, bytes: &[u8]) -> Result<(char, usize), DecodeError> {
        let head = &bytes[..bytes.len().min(4)];
        let valid = match core::str::from_utf8(head) {
            Ok(s) => s,
            Err(e) if e.valid_up_to() > 0 => {
                // SAFETY: `valid_up_to` marks the end of a well-formed prefix
                unsafe { core::str::from_utf8_unchecked(&head[..e.valid_up_to()]) }
            }
            Err(e) => {
                return Err(match e.error_len() {
                    Some(len) => DecodeError::Invalid { len },
                    None => DecodeError::Incomplete,
                })
            }
        };
        match valid.chars().next() {
            Some(c) => Ok((c, c.len_utf8())),
            None => Err(DecodeError::Incomplete),
        }
    }

    fn encode(&self, c: char, out: &mut [u8]) -> Result<usize, EncodeError> {
        let mut buf = [0; 4];
        put(c.encode_utf8(&mut buf).as_bytes(), out)
    }
}

macro_rules! utf16_impl {
    (
        $name:ident,
        $canonical:literal,
        $method_from:ident,
        $method_to:ident,
        $docname:literal,
    ) => {
        #[doc = "The ["]
        #[doc = $docname]
        #[doc = "](https://en.wikipedia.org/wiki/UTF-16#Byte-order_encoding_schemes) charset"]
        #[non_exhaustive]
        #[derive(Default)]
        pub struct $name;

        impl Sealed for $name {}

        impl Charset for $name {
            fn name(&self) -> &'static str {
                $canonical
            }

            fn ascii_compatible(&self) -> bool {
                false
            }

            fn decode(&self, bytes: &[u8]) -> Result<(char, usize), DecodeError> {
                let [b0, b1, ..] = *bytes else {
                    return Err(DecodeError::Incomplete);
                };
                let high = u16::$method_from([b0, b1]);
                match high {
                    0xD800..=0xDBFF => {
                        let [_, _, b2, b3, ..] = *bytes else {
                            return Err(DecodeError::Incomplete);
                        };
                        let low = u16::$method_from([b2, b3]);
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(DecodeError::Invalid { len: 2 });
                        }
                        let cp = 0x10000 + ((high as u32 - 0xD800) << 10) + (low as u32 - 0xDC00);
                        char::from_u32(cp)
                            .map(|c| (c, 4))
                            .ok_or(DecodeError::Invalid { len: 4 })
                    }
                    0xDC00..=0xDFFF => Err(DecodeError::Invalid { len: 2 }),
                    _ => char::from_u32(high as u32)
                        .map(|c| (c, 2))
                        .ok_or(DecodeError::Invalid { len: 2 }),
                }
            }

            fn encode(&self, c: char, out: &mut [u8]) -> Result<usize, EncodeError> {
                let mut units = [0; 2];
                let units = c.encode_utf16(&mut units);
                let mut buf = [0; 4];
                for (dst, unit) in buf.chunks_exact_mut(2).zip(units.iter()) {
                    dst.copy_from_slice(&unit.$method_to());
                }
                put(&buf[..units.len() * 2], out)
            }
        }
    };
}

utf16_impl!(
    Utf16BE,
    "UTF-16BE",
    from_be_bytes,
    to_be_bytes,
    "UTF-16BE",
);

utf16_impl!(
    Utf16LE,
    "UTF-16LE",
    from_le_bytes,
    to_le_bytes,
    "UTF-16LE",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(Utf8.decode(b"abc"), Ok(('a', 1)));
        assert_eq!(Utf8.decode("é!".as_bytes()), Ok(('é', 2)));
        assert_eq!(Utf8.decode("𐐷".as_bytes()), Ok(('𐐷', 4)));
        assert_eq!(Utf8.decode(b"\xC3"), Err(DecodeError::Incomplete));
        assert_eq!(Utf8.decode(b"\xF0\x90\x90"), Err(DecodeError::Incomplete));
        assert_eq!(Utf8.decode(b"\xFF"), Err(DecodeError::Invalid { len: 1 }));
        // Overlong encoding of '/'
        assert_eq!(Utf8.decode(b"\xC0\xAF"), Err(DecodeError::Invalid { len: 1 }));
    }

    #[test]
    fn test_encode_utf8() {
        let mut out = [0; 4];
        assert_eq!(Utf8.encode('é', &mut out), Ok(2));
        assert_eq!(&out[..2], "é".as_bytes());
        assert_eq!(
            Utf8.encode('𐐷', &mut out[..3]),
            Err(EncodeError::NeedSpace { len: 4 })
        );
    }

    #[allow(clippy::octal_escapes)]
    #[test]
    fn test_decode_utf16_le() {
        assert_eq!(Utf16LE.decode(b"a\0b\0"), Ok(('a', 2)));
        assert_eq!(Utf16LE.decode(b"\x01\xD8\x37\xDC"), Ok(('\u{10437}', 4)));
        assert_eq!(Utf16LE.decode(b"\x01\xD8"), Err(DecodeError::Incomplete));
        assert_eq!(Utf16LE.decode(b"a"), Err(DecodeError::Incomplete));
        assert_eq!(
            Utf16LE.decode(b"\x37\xDC"),
            Err(DecodeError::Invalid { len: 2 })
        );
        assert_eq!(
            Utf16LE.decode(b"\x01\xD8a\0"),
            Err(DecodeError::Invalid { len: 2 })
        );
    }

    #[test]
    fn test_encode_utf16_be() {
        let mut out = [0; 4];
        assert_eq!(Utf16BE.encode('a', &mut out), Ok(2));
        assert_eq!(&out[..2], b"\0a");
        assert_eq!(Utf16BE.encode('\u{10437}', &mut out), Ok(4));
        assert_eq!(&out, b"\xD8\x01\xDC\x37");
        assert_eq!(
            Utf16BE.encode('\u{10437}', &mut out[..2]),
            Err(EncodeError::NeedSpace { len: 4 })
        );
    }
}
