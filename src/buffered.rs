//! Driving a [`Converter`] over a whole input, growing the output buffer as needed.

use crate::xlate::{ConvertCause, ConvertError, Converter};

/// Consecutive rounds without consumed input before giving up on a converter.
const MAX_STALLS: u32 = 8;

/// Convert all of `src` through `conv`, returning the output.
///
/// The output buffer starts at twice the input length, which covers the usual expansion ratios,
/// and doubles whenever a round fills it exactly while input is still pending. A round that makes
/// no progress at all while space remains is treated the same way: the next character is wider
/// than the space that is left.
///
/// On a hard error from the converter the partial output is discarded. A converter that reports
/// more progress than its buffers allow, or that stops consuming input for [`MAX_STALLS`] rounds in
/// a row, fails with [`ConvertCause::Overrun`] or [`ConvertCause::Stalled`].
pub fn convert_to_buf(conv: &mut dyn Converter, src: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let mut dest = Vec::new();
    // Some converters refuse empty input, and there's nothing to do anyway
    if src.is_empty() {
        return Ok(dest);
    }

    conv.reset();

    let mut buflen = src.len();
    let mut len = 0;
    let mut consumed = 0;
    let mut spare = 0;
    let mut stalls = 0;

    while consumed < src.len() {
        if spare == 0 {
            buflen = buflen.saturating_mul(2);
        }
        dest.resize(buflen, 0);

        let progress = conv
            .convert(&src[consumed..], &mut dest[len..buflen])
            .map_err(|e| e.offset_by(consumed))?;
        if progress.consumed > src.len() - consumed || progress.written > buflen - len {
            return Err(ConvertError::new(consumed, ConvertCause::Overrun));
        }
        consumed += progress.consumed;
        len += progress.written;
        spare = buflen - len;

        if progress.consumed == 0 {
            stalls += 1;
            if stalls == MAX_STALLS {
                return Err(ConvertError::new(consumed, ConvertCause::Stalled));
            }
            if progress.written == 0 {
                spare = 0;
            }
        } else {
            stalls = 0;
        }
    }

    dest.truncate(len);
    Ok(dest)
}
