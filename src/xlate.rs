//! The converter facility: opening a converter for a pair of charsets, and driving a single
//! conversion round.
//!
//! [`Opener`] and [`Converter`] are the seams between this crate and whatever performs the actual
//! charset translation. The default implementation, [`Registry`], resolves names against the
//! built-in [charset tables](crate::charset) and hands out [`Recoder`]s.

use core::fmt;

use thiserror::Error;

use crate::charset::{self, Charset, CharsetId, DecodeError, EncodeError};

/// One side of a conversion: either the configured native charset, or an explicitly named one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Page<'a> {
    /// The process's native (locale) charset
    Native,
    /// A charset given by name, such as `"UTF-8"` or `"ISO-8859-1"`
    Named(&'a str),
}

impl Page<'_> {
    /// The UTF-8 page.
    pub const UTF8: Page<'static> = Page::Named("UTF-8");
}

impl fmt::Display for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Native => f.write_str("native"),
            Page::Named(name) => f.write_str(name),
        }
    }
}

/// How far a single call to [`Converter::convert`] got.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Bytes of input consumed
    pub consumed: usize,
    /// Bytes of output produced
    pub written: usize,
}

/// The reason a conversion stopped with a hard error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConvertCause {
    /// The input contains a byte sequence that isn't valid in the source charset
    InvalidInput {
        /// Length of the invalid sequence
        len: usize,
    },
    /// The input ends in the middle of a multi-byte character
    Incomplete,
    /// The input contains a character that the destination charset can't represent
    Unrepresentable {
        /// The offending character
        char: char,
    },
    /// The converter kept returning without consuming any input
    Stalled,
    /// The converter reported more progress than the buffers it was given allow
    Overrun,
}

/// A hard error reported by a [`Converter`] in the middle of a stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("conversion failed at input offset {at}: {cause}")]
pub struct ConvertError {
    at: usize,
    cause: ConvertCause,
}

impl ConvertError {
    /// Create an error at input offset `at`.
    pub fn new(at: usize, cause: ConvertCause) -> ConvertError {
        ConvertError { at, cause }
    }

    /// Offset into the input at which conversion failed.
    pub fn at(&self) -> usize {
        self.at
    }

    /// The reason conversion stopped.
    pub fn cause(&self) -> &ConvertCause {
        &self.cause
    }

    pub(crate) fn offset_by(self, base: usize) -> ConvertError {
        ConvertError {
            at: self.at + base,
            cause: self.cause,
        }
    }
}

impl fmt::Display for ConvertCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertCause::InvalidInput { len } => write!(f, "invalid {len}-byte input sequence"),
            ConvertCause::Incomplete => write!(f, "incomplete multi-byte sequence"),
            ConvertCause::Unrepresentable { char } => {
                write!(f, "character {char:?} is not representable in the target charset")
            }
            ConvertCause::Stalled => write!(f, "converter stopped consuming input"),
            ConvertCause::Overrun => write!(f, "converter reported progress past its buffers"),
        }
    }
}

/// An opened, stateful converter between two charsets.
///
/// Converters are not reentrant: a single instance is only ever driven by one thread at a time.
/// The [`HandleCache`](crate::cache::HandleCache) hands each converter to exactly one caller.
pub trait Converter: Send {
    /// Convert a prefix of `input` into a prefix of `output`.
    ///
    /// The converter may stop before all input is consumed, without error, when the next
    /// character doesn't fit into what is left of `output`. Callers supply a larger buffer and
    /// call again with the unconsumed remainder.
    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress, ConvertError>;

    /// Return the converter to its initial shift state.
    fn reset(&mut self) {}
}

/// Failure to open a converter.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum OpenError {
    /// The facility doesn't support this pair of charsets. Not a failure as far as callers are
    /// concerned; no conversion takes place.
    #[error("conversion not supported")]
    Unsupported,
    /// The facility failed for any other reason
    #[error("{0}")]
    Failed(String),
}

/// A facility able to open [`Converter`]s.
pub trait Opener: Send + Sync {
    /// Open a converter from `from` to `to`.
    fn open(&self, to: Page<'_>, from: Page<'_>) -> Result<Box<dyn Converter>, OpenError>;
}

/// A converter that decodes characters with one [`Charset`] and encodes them with another.
pub struct Recoder {
    from: &'static dyn Charset,
    to: &'static dyn Charset,
}

impl Recoder {
    /// Create a converter from `from` to `to`.
    pub fn new(from: &'static dyn Charset, to: &'static dyn Charset) -> Recoder {
        Recoder { from, to }
    }
}

impl Converter for Recoder {
    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress, ConvertError> {
        let mut progress = Progress::default();
        while progress.consumed < input.len() {
            let at = progress.consumed;
            let (c, len) = self.from.decode(&input[at..]).map_err(|e| {
                ConvertError::new(
                    at,
                    match e {
                        DecodeError::Invalid { len } => ConvertCause::InvalidInput { len },
                        DecodeError::Incomplete => ConvertCause::Incomplete,
                    },
                )
            })?;
            match self.to.encode(c, &mut output[progress.written..]) {
                Ok(written) => {
                    progress.consumed += len;
                    progress.written += written;
                }
                Err(EncodeError::NeedSpace { .. }) => break,
                Err(EncodeError::InvalidChar) => {
                    return Err(ConvertError::new(
                        at,
                        ConvertCause::Unrepresentable { char: c },
                    ))
                }
            }
        }
        Ok(progress)
    }
}

/// The default [`Opener`], backed by the built-in charset tables.
///
/// Unknown charset names are reported as [`OpenError::Unsupported`], as is any pair of an ASCII
/// charset with an ASCII-compatible one, since no translation is needed between them.
#[derive(Clone, Debug)]
pub struct Registry {
    native: String,
}

impl Registry {
    /// Create a registry that resolves [`Page::Native`] to `native`.
    pub fn new(native: impl Into<String>) -> Registry {
        Registry {
            native: native.into(),
        }
    }

    /// The name [`Page::Native`] resolves to.
    pub fn native(&self) -> &str {
        &self.native
    }

    fn resolve(&self, page: Page<'_>) -> Result<Option<&'static dyn Charset>, OpenError> {
        let name = match page {
            Page::Native => self.native.as_str(),
            Page::Named(name) => name,
        };
        let printable = name.bytes().all(|b| b.is_ascii_graphic() || b == b' ');
        if name.trim().is_empty() || !printable {
            return Err(OpenError::Failed(format!("invalid charset name {name:?}")));
        }
        Ok(charset::lookup(name).map(CharsetId::charset))
    }
}

impl Opener for Registry {
    fn open(&self, to: Page<'_>, from: Page<'_>) -> Result<Box<dyn Converter>, OpenError> {
        let (Some(to), Some(from)) = (self.resolve(to)?, self.resolve(from)?) else {
            return Err(OpenError::Unsupported);
        };
        let is_ascii = |cs: &dyn Charset| cs.name() == charset::Ascii.name();
        if (is_ascii(to) && from.ascii_compatible()) || (is_ascii(from) && to.ascii_compatible()) {
            return Err(OpenError::Unsupported);
        }
        Ok(Box::new(Recoder::new(from, to)))
    }
}
