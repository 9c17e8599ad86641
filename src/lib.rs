//! A crate for converting text between the process's native charset and UTF-8, for programs that
//! keep all of their strings in UTF-8 but exchange them with an environment that doesn't.
//!
//! The name, `xlate`, is the traditional abbreviation of 'translate' used by charset conversion
//! libraries.
//!
//! Converters are expensive to open, so they are pooled in a [`HandleCache`] shared by all threads.
//! A converter is only ever used by the thread that checked it out, and the pool's lock is held
//! just long enough to take a converter out or put it back.
//!
//! When no converter is available for a pair of charsets (typically because the native charset is
//! plain ASCII), data is passed through unchanged, as long as it is printable ASCII. Every result
//! on the UTF-8 side is validated, so a successful conversion to UTF-8 can always be used as a
//! `str`.
//!
//! The free functions of this crate use a process-wide [`Transcoder`], configured once through
//! [`initialize`] or otherwise from the locale environment on first use. Create a `Transcoder`
//! directly for an independent configuration.
//!
//! ## Limitations
//!
//! The native charset is fixed for the lifetime of a [`Transcoder`]. The built-in charset tables
//! cover ASCII, the common single-byte charsets, UTF-8 and UTF-16; other charsets can be supported
//! by implementing [`Opener`](xlate::Opener).

#![warn(
    elided_lifetimes_in_paths,
    missing_docs,
    clippy::cargo,
)]

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::sync::OnceLock;

pub mod buffered;
pub mod cache;
pub mod charset;
pub mod config;
pub mod err;
pub mod fuzzy;
pub mod guard;
mod transcoder;
pub mod utf8;
pub mod xlate;

pub use cache::{CacheKey, HandleCache};
pub use config::Config;
pub use err::{Error, Result};
pub use transcoder::Transcoder;

static TRANSCODER: OnceLock<Transcoder> = OnceLock::new();

fn transcoder() -> &'static Transcoder {
    TRANSCODER.get_or_init(|| Transcoder::new(Config::from_env()))
}

/// Set up the process-wide transcoder with `config`. Returns `false`, leaving the existing one in
/// place, if it was already set up, either by an earlier call or implicitly by a conversion.
pub fn initialize(config: Config) -> bool {
    let mut installed = false;
    let transcoder = TRANSCODER.get_or_init(|| {
        installed = true;
        Transcoder::new(config)
    });
    transcoder.cache().initialize();
    installed
}

/// Drop all pooled converters of the process-wide transcoder and stop pooling. Conversions keep
/// working afterwards, opening a converter each time.
pub fn shutdown() {
    if let Some(transcoder) = TRANSCODER.get() {
        transcoder.cache().shutdown();
    }
}

/// Convert a buffer from the native charset to UTF-8.
pub fn stringbuf_to_utf8(src: Vec<u8>) -> Result<String> {
    transcoder().stringbuf_to_utf8(src)
}

/// Convert a buffer from UTF-8 to the native charset.
pub fn stringbuf_from_utf8(src: String) -> Result<Vec<u8>> {
    transcoder().stringbuf_from_utf8(src)
}

/// Convert a string from the native charset to UTF-8.
pub fn string_to_utf8(src: &[u8]) -> Result<Cow<'_, str>> {
    transcoder().string_to_utf8(src)
}

/// Convert a string from UTF-8 to the native charset.
pub fn string_from_utf8(src: &str) -> Result<Cow<'_, [u8]>> {
    transcoder().string_from_utf8(src)
}

/// Convert a null-terminated string from the native charset to UTF-8.
pub fn cstring_to_utf8(src: &CStr) -> Result<CString> {
    transcoder().cstring_to_utf8(src)
}

/// Convert a null-terminated string from UTF-8 to the native charset.
pub fn cstring_from_utf8(src: &CStr) -> Result<CString> {
    transcoder().cstring_from_utf8(src)
}

/// Convert a UTF-8 buffer to a null-terminated native string.
pub fn cstring_from_utf8_stringbuf(src: String) -> Result<CString> {
    transcoder().cstring_from_utf8_stringbuf(src)
}

/// Convert a UTF-8 string to a null-terminated native string.
pub fn cstring_from_utf8_string(src: &str) -> Result<CString> {
    transcoder().cstring_from_utf8_string(src)
}

/// Convert a null-terminated UTF-8 string to the native charset for display, escaping non-ASCII
/// bytes. Never fails.
pub fn cstring_from_utf8_fuzzy(src: &CStr) -> CString {
    transcoder().cstring_from_utf8_fuzzy(src)
}

/// Convert a buffer from charset `frompage` to UTF-8, pooling converters under `key`.
pub fn stringbuf_to_utf8_ex(src: Vec<u8>, frompage: &str, key: &CacheKey) -> Result<String> {
    transcoder().stringbuf_to_utf8_ex(src, frompage, key)
}

/// Convert a buffer from UTF-8 to charset `topage`, pooling converters under `key`.
pub fn stringbuf_from_utf8_ex(src: String, topage: &str, key: &CacheKey) -> Result<Vec<u8>> {
    transcoder().stringbuf_from_utf8_ex(src, topage, key)
}

/// Convert a string from charset `frompage` to UTF-8, pooling converters under `key`.
pub fn string_to_utf8_ex<'a>(
    src: &'a [u8],
    frompage: &str,
    key: &CacheKey,
) -> Result<Cow<'a, str>> {
    transcoder().string_to_utf8_ex(src, frompage, key)
}

/// Convert a string from UTF-8 to charset `topage`, pooling converters under `key`.
pub fn string_from_utf8_ex<'a>(
    src: &'a str,
    topage: &str,
    key: &CacheKey,
) -> Result<Cow<'a, [u8]>> {
    transcoder().string_from_utf8_ex(src, topage, key)
}

/// Convert a null-terminated string from charset `frompage` to UTF-8, pooling converters under
/// `key`.
pub fn cstring_to_utf8_ex(src: &CStr, frompage: &str, key: &CacheKey) -> Result<CString> {
    transcoder().cstring_to_utf8_ex(src, frompage, key)
}

/// Convert a null-terminated string from UTF-8 to charset `topage`, pooling converters under
/// `key`.
pub fn cstring_from_utf8_ex(src: &CStr, topage: &str, key: &CacheKey) -> Result<CString> {
    transcoder().cstring_from_utf8_ex(src, topage, key)
}
