//! A pool of opened converters, shared by all threads.
//!
//! Opening a converter is expensive, so converters are pooled per [`CacheKey`]. A thread borrows a
//! converter for the duration of one conversion and puts it back afterwards. The pool's lock is
//! only held while a converter is taken from or returned to its list, never while converting, so
//! the pool doesn't serialize conversions. If no idle converter is available for a key, a new one
//! is opened; there are never more converters for a key than conversions that ran at the same
//! time on it.
//!
//! Each pooled converter remembers the pair of charsets it was opened for, and is only handed out
//! again for that same pair. A key used for more than one pair, such as a custom key used in both
//! directions, holds separate converters for each.
//!
//! A converter is a non-reentrant object. Exclusive use is guaranteed by ownership: a checked-out
//! [`HandleNode`] is owned by the caller and the pool has no reference to it until it is
//! [released](HandleCache::release).

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::xlate::{Converter, OpenError, Page};

/// Identifies a slot of pooled converters. Distinct keys never share converters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Converters from the native charset to UTF-8
    NativeToUtf8,
    /// Converters from UTF-8 to the native charset
    Utf8ToNative,
    /// Converters for a caller-chosen charset pair
    Custom(Cow<'static, str>),
}

impl CacheKey {
    /// A caller-named slot.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> CacheKey {
        CacheKey::Custom(name.into())
    }
}

/// What a [`HandleNode`] holds: a real converter, or the marker that no conversion is needed or
/// possible for its charset pair.
pub enum Xlate {
    /// An opened converter
    Convert(Box<dyn Converter>),
    /// No converter; data passes through unchanged once it has been checked to be plain ASCII
    Identity,
}

impl fmt::Debug for Xlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Xlate::Convert(_) => f.write_str("Xlate::Convert(..)"),
            Xlate::Identity => f.write_str("Xlate::Identity"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Origin {
    // Opened while the pool was active, returns to it on release
    Pooled,
    // Opened while caching was disabled, dropped on release
    Scoped,
}

// An owned `Page`
#[derive(Clone, Debug, PartialEq, Eq)]
enum Side {
    Native,
    Named(Box<str>),
}

impl Side {
    fn new(page: Page<'_>) -> Side {
        match page {
            Page::Native => Side::Native,
            Page::Named(name) => Side::Named(name.into()),
        }
    }

    fn is(&self, page: Page<'_>) -> bool {
        match (self, page) {
            (Side::Native, Page::Native) => true,
            (Side::Named(name), Page::Named(other)) => **name == *other,
            _ => false,
        }
    }
}

/// A converter checked out of a [`HandleCache`].
#[derive(Debug)]
pub struct HandleNode {
    xlate: Xlate,
    origin: Origin,
    to: Side,
    from: Side,
}

impl HandleNode {
    /// The converter, or [`Xlate::Identity`].
    pub fn xlate(&mut self) -> &mut Xlate {
        &mut self.xlate
    }

    /// Whether this node goes back into the pool when released.
    pub fn is_pooled(&self) -> bool {
        self.origin == Origin::Pooled
    }

    /// Whether this node converts from `from` to `to`.
    pub fn converts(&self, to: Page<'_>, from: Page<'_>) -> bool {
        self.to.is(to) && self.from.is(from)
    }
}

enum Slots {
    Uninitialized,
    Enabled(HashMap<CacheKey, Vec<HandleNode>>),
    Disabled,
}

/// A thread-safe pool of converters keyed by [`CacheKey`].
pub struct HandleCache {
    slots: Mutex<Slots>,
}

impl HandleCache {
    /// Create a cache. A cache created with `enabled = false` never pools anything: every
    /// acquisition opens a new converter and every release drops it.
    pub const fn new(enabled: bool) -> HandleCache {
        HandleCache {
            slots: Mutex::new(if enabled {
                Slots::Uninitialized
            } else {
                Slots::Disabled
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // A panic while the pool was locked leaves its lists in an unknown state. There is no
        // way to continue without risking two threads sharing one converter.
        self.slots.lock().unwrap_or_else(|_| {
            log::error!("converter cache lock is poisoned, aborting");
            std::process::abort()
        })
    }

    /// Set up the pool, if that hasn't happened yet. This also happens on first use.
    pub fn initialize(&self) {
        let mut slots = self.lock();
        if let Slots::Uninitialized = *slots {
            *slots = Slots::Enabled(HashMap::new());
        }
    }

    /// Whether converters are currently being pooled.
    pub fn is_enabled(&self) -> bool {
        !matches!(*self.lock(), Slots::Disabled)
    }

    /// Take an idle converter from `from` to `to` out of the pool for `key`, or open a new one
    /// with `open`.
    ///
    /// `open` runs without the lock held. If it reports [`OpenError::Unsupported`], the node holds
    /// [`Xlate::Identity`], which is pooled like a real converter so the expensive attempt isn't
    /// repeated. Any other error is returned.
    pub fn acquire<F>(
        &self,
        key: &CacheKey,
        to: Page<'_>,
        from: Page<'_>,
        open: F,
    ) -> Result<HandleNode, OpenError>
    where
        F: FnOnce() -> Result<Box<dyn Converter>, OpenError>,
    {
        let origin = {
            let mut slots = self.lock();
            if let Slots::Uninitialized = *slots {
                *slots = Slots::Enabled(HashMap::new());
            }
            match &mut *slots {
                Slots::Enabled(map) => {
                    if let Some(idle) = map.get_mut(key) {
                        if let Some(at) = idle.iter().rposition(|node| node.converts(to, from)) {
                            log::trace!("reusing pooled converter for {key:?} ({from} to {to})");
                            return Ok(idle.remove(at));
                        }
                    }
                    Origin::Pooled
                }
                _ => Origin::Scoped,
            }
        };

        let xlate = match open() {
            Ok(conv) => {
                log::debug!("opened converter for {key:?} ({from} to {to})");
                Xlate::Convert(conv)
            }
            Err(OpenError::Unsupported) => {
                log::debug!("conversion from {from} to {to} is unsupported, passing data through");
                Xlate::Identity
            }
            Err(err) => return Err(err),
        };
        Ok(HandleNode {
            xlate,
            origin,
            to: Side::new(to),
            from: Side::new(from),
        })
    }

    /// Return `node` to the pool for `key`. The most recently returned converter for a pair of
    /// charsets is the first to be handed out again.
    pub fn release(&self, node: HandleNode, key: &CacheKey) {
        if node.origin == Origin::Scoped {
            return;
        }
        let mut slots = self.lock();
        if let Slots::Enabled(map) = &mut *slots {
            map.entry(key.clone()).or_default().push(node);
        }
    }

    /// Drop every pooled converter and stop pooling for good. Conversions running concurrently
    /// keep working; their converters are dropped when released.
    pub fn shutdown(&self) {
        let old = std::mem::replace(&mut *self.lock(), Slots::Disabled);
        drop(old);
    }

    /// Number of idle converters pooled for `key`, over all pairs of charsets.
    pub fn idle_count(&self, key: &CacheKey) -> usize {
        match &*self.lock() {
            Slots::Enabled(map) => map.get(key).map_or(0, Vec::len),
            _ => 0,
        }
    }
}

impl Default for HandleCache {
    fn default() -> Self {
        HandleCache::new(true)
    }
}

impl fmt::Debug for HandleCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.lock() {
            Slots::Uninitialized => "uninitialized",
            Slots::Enabled(_) => "enabled",
            Slots::Disabled => "disabled",
        };
        f.debug_struct("HandleCache").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlate::{ConvertError, Progress};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    const TO: Page<'static> = Page::UTF8;
    const FROM: Page<'static> = Page::Native;

    /// A converter that writes its own id instead of converting.
    struct Tagged(usize);

    impl Converter for Tagged {
        fn convert(&mut self, _: &[u8], output: &mut [u8]) -> Result<Progress, ConvertError> {
            output[..8].copy_from_slice(&(self.0 as u64).to_le_bytes());
            Ok(Progress {
                consumed: 0,
                written: 8,
            })
        }
    }

    fn tag_of(node: &mut HandleNode) -> usize {
        let mut out = [0; 8];
        match node.xlate() {
            Xlate::Convert(conv) => conv.convert(b"", &mut out).unwrap(),
            Xlate::Identity => panic!("expected a converter"),
        };
        u64::from_le_bytes(out) as usize
    }

    fn opener(next: &AtomicUsize) -> impl Fn() -> Result<Box<dyn Converter>, OpenError> + '_ {
        move || Ok(Box::new(Tagged(next.fetch_add(1, Ordering::SeqCst))) as Box<dyn Converter>)
    }

    #[test]
    fn test_reuses_released_converter() {
        let cache = HandleCache::default();
        let key = CacheKey::NativeToUtf8;
        let next = AtomicUsize::new(0);

        let mut node = cache.acquire(&key, TO, FROM, opener(&next)).unwrap();
        assert!(node.is_pooled());
        assert_eq!(tag_of(&mut node), 0);
        cache.release(node, &key);
        assert_eq!(cache.idle_count(&key), 1);

        let mut node = cache.acquire(&key, TO, FROM, opener(&next)).unwrap();
        assert_eq!(tag_of(&mut node), 0);
        assert_eq!(cache.idle_count(&key), 0);
        cache.release(node, &key);
        assert_eq!(next.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_last_released_first_reused() {
        let cache = HandleCache::default();
        let key = CacheKey::Utf8ToNative;
        let next = AtomicUsize::new(0);

        let a = cache.acquire(&key, TO, FROM, opener(&next)).unwrap();
        let b = cache.acquire(&key, TO, FROM, opener(&next)).unwrap();
        cache.release(a, &key);
        cache.release(b, &key);
        assert_eq!(cache.idle_count(&key), 2);

        let mut first = cache.acquire(&key, TO, FROM, opener(&next)).unwrap();
        let mut second = cache.acquire(&key, TO, FROM, opener(&next)).unwrap();
        assert_eq!(tag_of(&mut first), 1);
        assert_eq!(tag_of(&mut second), 0);
        assert_eq!(next.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsupported_is_cached() {
        let cache = HandleCache::default();
        let key = CacheKey::custom("koi8-to-utf8");
        let attempts = AtomicUsize::new(0);
        let open = || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(OpenError::Unsupported)
        };

        for _ in 0..3 {
            let mut node = cache.acquire(&key, TO, FROM, open).unwrap();
            assert!(matches!(node.xlate(), Xlate::Identity));
            cache.release(node, &key);
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hard_open_error_propagates() {
        let cache = HandleCache::default();
        let err = cache
            .acquire(&CacheKey::Utf8ToNative, TO, FROM, || {
                Err(OpenError::Failed("no more descriptors".into()))
            })
            .unwrap_err();
        assert_eq!(err, OpenError::Failed("no more descriptors".into()));
        assert_eq!(cache.idle_count(&CacheKey::Utf8ToNative), 0);
    }

    #[test]
    fn test_keys_are_separate() {
        let cache = HandleCache::default();
        let node = cache
            .acquire(&CacheKey::NativeToUtf8, TO, FROM, || Err(OpenError::Unsupported))
            .unwrap();
        cache.release(node, &CacheKey::NativeToUtf8);
        assert_eq!(cache.idle_count(&CacheKey::NativeToUtf8), 1);
        assert_eq!(cache.idle_count(&CacheKey::Utf8ToNative), 0);
        assert_eq!(cache.idle_count(&CacheKey::custom("other")), 0);
    }

    #[test]
    fn test_pairs_under_one_key_are_separate() {
        let cache = HandleCache::default();
        let key = CacheKey::custom("cp1252");
        let cp1252 = Page::Named("windows-1252");
        let next = AtomicUsize::new(0);

        let mut decode = cache.acquire(&key, Page::UTF8, cp1252, opener(&next)).unwrap();
        assert!(decode.converts(Page::UTF8, cp1252));
        assert!(!decode.converts(cp1252, Page::UTF8));
        assert_eq!(tag_of(&mut decode), 0);
        cache.release(decode, &key);

        // The idle converter goes the other way, so a new one is opened
        let mut encode = cache.acquire(&key, cp1252, Page::UTF8, opener(&next)).unwrap();
        assert_eq!(tag_of(&mut encode), 1);
        cache.release(encode, &key);
        assert_eq!(cache.idle_count(&key), 2);

        let mut decode = cache.acquire(&key, Page::UTF8, cp1252, opener(&next)).unwrap();
        assert_eq!(tag_of(&mut decode), 0);
        let mut encode = cache.acquire(&key, cp1252, Page::UTF8, opener(&next)).unwrap();
        assert_eq!(tag_of(&mut encode), 1);
        assert_eq!(next.load(Ordering::SeqCst), 2);

        // Native is distinct from any named charset
        let named = cache.acquire(&key, Page::UTF8, Page::Named("native"), opener(&next));
        assert!(!named.unwrap().converts(Page::UTF8, Page::Native));
    }

    #[test]
    fn test_disabled_cache_never_pools() {
        let cache = HandleCache::new(false);
        cache.initialize();
        assert!(!cache.is_enabled());

        let key = CacheKey::NativeToUtf8;
        let node = cache.acquire(&key, TO, FROM, || Err(OpenError::Unsupported)).unwrap();
        assert!(!node.is_pooled());
        cache.release(node, &key);
        assert_eq!(cache.idle_count(&key), 0);
    }

    #[test]
    fn test_shutdown_degrades_to_uncached() {
        let cache = HandleCache::default();
        let key = CacheKey::Utf8ToNative;
        cache.initialize();
        cache.initialize();

        let node = cache.acquire(&key, TO, FROM, || Err(OpenError::Unsupported)).unwrap();
        let pending = cache.acquire(&key, TO, FROM, || Err(OpenError::Unsupported)).unwrap();
        cache.release(node, &key);
        assert_eq!(cache.idle_count(&key), 1);

        cache.shutdown();
        assert!(!cache.is_enabled());
        assert_eq!(cache.idle_count(&key), 0);

        // Checked out before shutdown, so it's dropped instead of pooled
        cache.release(pending, &key);
        assert_eq!(cache.idle_count(&key), 0);

        let node = cache.acquire(&key, TO, FROM, || Err(OpenError::Unsupported)).unwrap();
        assert!(!node.is_pooled());
        cache.initialize();
        assert!(!cache.is_enabled());
    }

    #[test]
    fn test_concurrent_checkout_is_exclusive() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 500;

        let cache = Arc::new(HandleCache::default());
        let next = Arc::new(AtomicUsize::new(0));
        let in_use = Arc::new(std::sync::Mutex::new(HashSet::new()));
        let key = CacheKey::custom("shared");

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let next = Arc::clone(&next);
                let in_use = Arc::clone(&in_use);
                let key = key.clone();
                thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        let mut node = cache.acquire(&key, TO, FROM, opener(&next)).unwrap();
                        let tag = tag_of(&mut node);
                        assert!(
                            in_use.lock().unwrap().insert(tag),
                            "converter {tag} handed out twice"
                        );
                        thread::yield_now();
                        in_use.lock().unwrap().remove(&tag);
                        cache.release(node, &key);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let opened = next.load(Ordering::SeqCst);
        assert!((1..=THREADS).contains(&opened));
        assert_eq!(cache.idle_count(&key), opened);
    }
}
