//! Lossy, never-failing conversion of UTF-8 text to the native charset, for putting arbitrary text
//! into diagnostics.

use std::ffi::{CStr, CString};

use crate::err::Result;

/// Something able to convert a null-terminated UTF-8 string to the native charset.
///
/// Implemented by [`Transcoder`](crate::Transcoder), and by any closure with the signature of
/// [`Transcoder::cstring_from_utf8`](crate::Transcoder::cstring_from_utf8).
pub trait FromUtf8 {
    /// Convert `src` from UTF-8 to the native charset.
    fn cstring_from_utf8(&self, src: &CStr) -> Result<CString>;
}

impl<F> FromUtf8 for F
where
    F: Fn(&CStr) -> Result<CString>,
{
    fn cstring_from_utf8(&self, src: &CStr) -> Result<CString> {
        self(src)
    }
}

/// Replace every byte outside 7-bit ASCII with `?\ddd`, `ddd` being the byte's value in decimal.
/// The result is plain ASCII.
pub fn escape_non_ascii(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    for &b in src {
        if b.is_ascii() {
            out.push(b);
        } else {
            let digits = [b'0' + b / 100, b'0' + b / 10 % 10, b'0' + b % 10];
            out.extend_from_slice(b"?\\");
            out.extend_from_slice(&digits);
        }
    }
    out
}

/// Convert `src` to the native charset through `conv` after escaping its non-ASCII bytes. If that
/// conversion fails, the escaped text is returned as it is.
///
/// Characters outside ASCII never make it to the native charset, even when it could represent
/// them; the point is a result that is always displayable.
pub fn cstring_from_utf8_fuzzy<C>(src: &CStr, conv: &C) -> CString
where
    C: FromUtf8 + ?Sized,
{
    // No null bytes: `src` had none and escapes don't add any
    let escaped = CString::new(escape_non_ascii(src.to_bytes())).unwrap_or_default();
    match conv.cstring_from_utf8(&escaped) {
        Ok(native) => native,
        Err(err) => {
            log::debug!("fuzzy conversion fell back to escaped text: {err}");
            escaped
        }
    }
}
