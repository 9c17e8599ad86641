//! The conversion entry points, composing the converter cache, the buffered converter and the
//! validity checks.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::fmt;

use crate::buffered::convert_to_buf;
use crate::cache::{CacheKey, HandleCache, HandleNode, Xlate};
use crate::config::Config;
use crate::err::{Error, Result};
use crate::fuzzy::{self, FromUtf8};
use crate::guard::check_non_ascii;
use crate::utf8::{check_cstring_utf8, check_utf8};
use crate::xlate::{Opener, Page, Registry};

/// Converts text between the native charset and UTF-8.
///
/// Every conversion borrows a converter from the transcoder's [`HandleCache`] and returns it
/// afterwards, so a `Transcoder` can be shared freely between threads. When the converter facility
/// reports a pair of charsets as unsupported, data is passed through unchanged as long as it is
/// plain ASCII, and rejected otherwise.
///
/// Each direction comes in three flavors: owned buffers ([`Vec<u8>`] and [`String`]), borrowed
/// strings returning a [`Cow`] that borrows when nothing needed converting, and null-terminated
/// strings. The `_ex` variants convert from or to an explicitly named charset instead of the
/// native one, pooling their converters under the given [`CacheKey`].
pub struct Transcoder {
    opener: Box<dyn Opener>,
    cache: HandleCache,
}

impl Transcoder {
    /// Create a transcoder using the built-in charset tables.
    pub fn new(config: Config) -> Transcoder {
        let cache = config.cache();
        Transcoder::with_opener(Registry::new(config.native_charset()), cache)
    }

    /// Create a transcoder using a custom converter facility.
    pub fn with_opener<O>(opener: O, cache: bool) -> Transcoder
    where
        O: Opener + 'static,
    {
        Transcoder {
            opener: Box::new(opener),
            cache: HandleCache::new(cache),
        }
    }

    /// The pool of converters used by this transcoder.
    pub fn cache(&self) -> &HandleCache {
        &self.cache
    }

    fn acquire(&self, to: Page<'_>, from: Page<'_>, key: &CacheKey) -> Result<HandleNode> {
        self.cache
            .acquire(key, to, from, || self.opener.open(to, from))
            .map_err(|source| Error::ConverterOpen {
                from: from.to_string(),
                to: to.to_string(),
                source,
            })
    }

    /// Convert `src` to UTF-8. `None` means `src` is already valid UTF-8 and is the result.
    fn to_utf8(&self, from: Page<'_>, key: &CacheKey, src: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut node = self.acquire(Page::UTF8, from, key)?;
        let res = recode_to_utf8(node.xlate(), src);
        self.cache.release(node, key);
        res
    }

    /// Convert `src`, which must be valid UTF-8, from UTF-8. `None` means `src` is the result as
    /// it is.
    fn from_utf8(&self, to: Page<'_>, key: &CacheKey, src: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut node = self.acquire(to, Page::UTF8, key)?;
        let res = recode_from_utf8(node.xlate(), src);
        self.cache.release(node, key);
        res
    }

    fn stringbuf_to_utf8_in(&self, src: Vec<u8>, from: Page<'_>, key: &CacheKey) -> Result<String> {
        let out = self.to_utf8(from, key, &src)?.unwrap_or(src);
        // SAFETY: Output of `to_utf8` has been validated as UTF-8, as has `src` when it is returned
        Ok(unsafe { String::from_utf8_unchecked(out) })
    }

    fn string_to_utf8_in<'a>(
        &self,
        src: &'a [u8],
        from: Page<'_>,
        key: &CacheKey,
    ) -> Result<Cow<'a, str>> {
        Ok(match self.to_utf8(from, key, src)? {
            // SAFETY: Output of `to_utf8` has been validated as UTF-8
            Some(out) => Cow::Owned(unsafe { String::from_utf8_unchecked(out) }),
            // SAFETY: `src` has been checked to be plain ASCII
            None => Cow::Borrowed(unsafe { core::str::from_utf8_unchecked(src) }),
        })
    }

    fn cstring_to_utf8_in(&self, src: &CStr, from: Page<'_>, key: &CacheKey) -> Result<CString> {
        match self.to_utf8(from, key, src.to_bytes())? {
            Some(out) => into_cstring(out),
            None => Ok(src.to_owned()),
        }
    }

    fn stringbuf_from_utf8_in(&self, src: String, to: Page<'_>, key: &CacheKey) -> Result<Vec<u8>> {
        Ok(self
            .from_utf8(to, key, src.as_bytes())?
            .unwrap_or_else(|| src.into_bytes()))
    }

    fn string_from_utf8_in<'a>(
        &self,
        src: &'a str,
        to: Page<'_>,
        key: &CacheKey,
    ) -> Result<Cow<'a, [u8]>> {
        Ok(match self.from_utf8(to, key, src.as_bytes())? {
            Some(out) => Cow::Owned(out),
            None => Cow::Borrowed(src.as_bytes()),
        })
    }

    fn cstring_from_utf8_in(&self, src: &CStr, to: Page<'_>, key: &CacheKey) -> Result<CString> {
        check_cstring_utf8(src)?;
        match self.from_utf8(to, key, src.to_bytes())? {
            Some(out) => into_cstring(out),
            None => Ok(src.to_owned()),
        }
    }

    /// Convert a buffer from the native charset to UTF-8.
    pub fn stringbuf_to_utf8(&self, src: Vec<u8>) -> Result<String> {
        self.stringbuf_to_utf8_in(src, Page::Native, &CacheKey::NativeToUtf8)
    }

    /// Convert a buffer from UTF-8 to the native charset.
    pub fn stringbuf_from_utf8(&self, src: String) -> Result<Vec<u8>> {
        self.stringbuf_from_utf8_in(src, Page::Native, &CacheKey::Utf8ToNative)
    }

    /// Convert a string from the native charset to UTF-8. Borrows from `src` if it needed no
    /// conversion.
    pub fn string_to_utf8<'a>(&self, src: &'a [u8]) -> Result<Cow<'a, str>> {
        self.string_to_utf8_in(src, Page::Native, &CacheKey::NativeToUtf8)
    }

    /// Convert a string from UTF-8 to the native charset. Borrows from `src` if it needed no
    /// conversion.
    pub fn string_from_utf8<'a>(&self, src: &'a str) -> Result<Cow<'a, [u8]>> {
        self.string_from_utf8_in(src, Page::Native, &CacheKey::Utf8ToNative)
    }

    /// Convert a null-terminated string from the native charset to UTF-8.
    pub fn cstring_to_utf8(&self, src: &CStr) -> Result<CString> {
        self.cstring_to_utf8_in(src, Page::Native, &CacheKey::NativeToUtf8)
    }

    /// Convert a null-terminated string from UTF-8 to the native charset. Fails with
    /// [`Error::InvalidUtf8`] if `src` isn't valid UTF-8.
    pub fn cstring_from_utf8(&self, src: &CStr) -> Result<CString> {
        self.cstring_from_utf8_in(src, Page::Native, &CacheKey::Utf8ToNative)
    }

    /// Convert a UTF-8 buffer to a null-terminated native string.
    pub fn cstring_from_utf8_stringbuf(&self, src: String) -> Result<CString> {
        into_cstring(self.stringbuf_from_utf8(src)?)
    }

    /// Convert a UTF-8 string to a null-terminated native string.
    pub fn cstring_from_utf8_string(&self, src: &str) -> Result<CString> {
        into_cstring(self.string_from_utf8(src)?.into_owned())
    }

    /// Convert a null-terminated UTF-8 string to the native charset, escaping anything outside
    /// ASCII as `?\ddd`. Never fails; see [`fuzzy::cstring_from_utf8_fuzzy`].
    pub fn cstring_from_utf8_fuzzy(&self, src: &CStr) -> CString {
        fuzzy::cstring_from_utf8_fuzzy(src, self)
    }

    /// Convert a buffer from charset `frompage` to UTF-8.
    pub fn stringbuf_to_utf8_ex(
        &self,
        src: Vec<u8>,
        frompage: &str,
        key: &CacheKey,
    ) -> Result<String> {
        self.stringbuf_to_utf8_in(src, Page::Named(frompage), key)
    }

    /// Convert a buffer from UTF-8 to charset `topage`.
    pub fn stringbuf_from_utf8_ex(
        &self,
        src: String,
        topage: &str,
        key: &CacheKey,
    ) -> Result<Vec<u8>> {
        self.stringbuf_from_utf8_in(src, Page::Named(topage), key)
    }

    /// Convert a string from charset `frompage` to UTF-8.
    pub fn string_to_utf8_ex<'a>(
        &self,
        src: &'a [u8],
        frompage: &str,
        key: &CacheKey,
    ) -> Result<Cow<'a, str>> {
        self.string_to_utf8_in(src, Page::Named(frompage), key)
    }

    /// Convert a string from UTF-8 to charset `topage`.
    pub fn string_from_utf8_ex<'a>(
        &self,
        src: &'a str,
        topage: &str,
        key: &CacheKey,
    ) -> Result<Cow<'a, [u8]>> {
        self.string_from_utf8_in(src, Page::Named(topage), key)
    }

    /// Convert a null-terminated string from charset `frompage` to UTF-8.
    pub fn cstring_to_utf8_ex(&self, src: &CStr, frompage: &str, key: &CacheKey) -> Result<CString> {
        self.cstring_to_utf8_in(src, Page::Named(frompage), key)
    }

    /// Convert a null-terminated string from UTF-8 to charset `topage`.
    pub fn cstring_from_utf8_ex(&self, src: &CStr, topage: &str, key: &CacheKey) -> Result<CString> {
        self.cstring_from_utf8_in(src, Page::Named(topage), key)
    }
}

impl FromUtf8 for Transcoder {
    fn cstring_from_utf8(&self, src: &CStr) -> Result<CString> {
        Transcoder::cstring_from_utf8(self, src)
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        Transcoder::new(Config::default())
    }
}

impl fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcoder")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn recode_to_utf8(xlate: &mut Xlate, src: &[u8]) -> Result<Option<Vec<u8>>> {
    match xlate {
        Xlate::Convert(conv) => {
            let out = convert_to_buf(&mut **conv, src)?;
            // The converter is not trusted to produce valid output
            check_utf8(&out)?;
            Ok(Some(out))
        }
        Xlate::Identity => {
            check_non_ascii(src)?;
            Ok(None)
        }
    }
}

fn recode_from_utf8(xlate: &mut Xlate, src: &[u8]) -> Result<Option<Vec<u8>>> {
    match xlate {
        Xlate::Convert(conv) => Ok(Some(convert_to_buf(&mut **conv, src)?)),
        Xlate::Identity => {
            check_non_ascii(src)?;
            Ok(None)
        }
    }
}

fn into_cstring(bytes: Vec<u8>) -> Result<CString> {
    CString::new(bytes).map_err(|e| Error::InteriorNul {
        position: e.nul_position(),
    })
}
