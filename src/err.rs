//! The error type returned by the conversion functions.

use thiserror::Error;

use crate::guard::NonAscii;
use crate::utf8::InvalidUtf8;
use crate::xlate::{ConvertError, OpenError};

/// Errors returned by the conversion functions of this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The converter facility failed to create a converter, for a reason other than the pair of
    /// charsets being unsupported. A charset standing for the native charset is named `native`.
    #[error("Can't create a converter from '{from}' to '{to}'")]
    ConverterOpen {
        /// Source charset
        from: String,
        /// Destination charset
        to: String,
        /// What the facility reported
        #[source]
        source: OpenError,
    },
    /// The converter failed mid-stream. Partial output is discarded.
    #[error("Can't recode string")]
    Recode(#[from] ConvertError),
    /// The UTF-8 side of a conversion, before or after converting, is not valid UTF-8
    #[error(transparent)]
    InvalidUtf8(#[from] InvalidUtf8),
    /// No converter is available and the data isn't plain ASCII
    #[error(transparent)]
    NonAscii(#[from] NonAscii),
    /// Converted data meant for a null-terminated string contains a null byte
    #[error("Converted string contains a null byte at offset {position}")]
    InteriorNul {
        /// Offset of the null byte in the converted data
        position: usize,
    },
}

/// Result type of the conversion functions of this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::check_non_ascii;
    use crate::utf8::check_utf8;
    use crate::xlate::ConvertCause;
    use std::error::Error as _;

    #[test]
    fn test_open_message() {
        let err = Error::ConverterOpen {
            from: "native".into(),
            to: "UTF-8".into(),
            source: OpenError::Failed("out of descriptors".into()),
        };
        assert_eq!(
            err.to_string(),
            "Can't create a converter from 'native' to 'UTF-8'"
        );
        assert_eq!(err.source().unwrap().to_string(), "out of descriptors");
    }

    #[test]
    fn test_recode_keeps_cause() {
        let err = Error::from(ConvertError::new(3, ConvertCause::Incomplete));
        assert_eq!(err.to_string(), "Can't recode string");
        assert_eq!(
            err.source().unwrap().to_string(),
            "conversion failed at input offset 3: incomplete multi-byte sequence"
        );
    }

    #[test]
    fn test_transparent_messages() {
        let err = Error::from(check_non_ascii(b"\x80").unwrap_err());
        assert!(err.to_string().starts_with("Non-ASCII character (code 128)"));
        let err = Error::from(check_utf8(b"\xFF").unwrap_err());
        assert!(err.to_string().starts_with("Valid UTF-8 data\n"));
    }
}
