//! Process configuration: which charset is native, and whether converters are pooled.

use std::env;

/// The charset assumed when the locale doesn't name one.
pub const DEFAULT_CHARSET: &str = "US-ASCII";

/// Settings for a [`Transcoder`](crate::Transcoder).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    native_charset: String,
    cache: bool,
}

impl Config {
    /// Build a configuration from the locale environment: the first non-empty one of `LC_ALL`,
    /// `LC_CTYPE` and `LANG`.
    pub fn from_env() -> Config {
        let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
            .into_iter()
            .filter_map(|var| env::var(var).ok())
            .find(|val| !val.is_empty());
        Config::from_locale(locale.as_deref())
    }

    /// Build a configuration from a locale name such as `de_DE.ISO-8859-15@euro`. The native
    /// charset is the locale's codeset, or US-ASCII if it has none.
    pub fn from_locale(locale: Option<&str>) -> Config {
        let charset = locale.and_then(codeset).unwrap_or(DEFAULT_CHARSET);
        Config::default().with_native_charset(charset)
    }

    /// Set the native charset.
    pub fn with_native_charset(mut self, charset: impl Into<String>) -> Config {
        self.native_charset = charset.into();
        self
    }

    /// Enable or disable pooling of converters.
    pub fn with_cache(mut self, cache: bool) -> Config {
        self.cache = cache;
        self
    }

    /// Name of the native charset.
    pub fn native_charset(&self) -> &str {
        &self.native_charset
    }

    /// Whether converters are pooled.
    pub fn cache(&self) -> bool {
        self.cache
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            native_charset: DEFAULT_CHARSET.to_owned(),
            cache: true,
        }
    }
}

// language[_territory][.codeset][@modifier]
fn codeset(locale: &str) -> Option<&str> {
    let locale = locale.split('@').next().unwrap_or(locale);
    match locale.split_once('.') {
        Some((_, codeset)) if !codeset.is_empty() => Some(codeset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = Config::default();
        assert_eq!(config.native_charset(), "US-ASCII");
        assert!(config.cache());
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_native_charset("windows-1252")
            .with_cache(false);
        assert_eq!(config.native_charset(), "windows-1252");
        assert!(!config.cache());
    }

    #[test]
    fn test_from_locale() {
        let charset = |locale| Config::from_locale(locale).native_charset().to_owned();
        assert_eq!(charset(Some("en_US.UTF-8")), "UTF-8");
        assert_eq!(charset(Some("de_DE.ISO-8859-15@euro")), "ISO-8859-15");
        assert_eq!(charset(Some("C.utf8")), "utf8");
        assert_eq!(charset(Some("C")), "US-ASCII");
        assert_eq!(charset(Some("POSIX")), "US-ASCII");
        assert_eq!(charset(Some("fr_FR")), "US-ASCII");
        assert_eq!(charset(Some("sr_RS@latin")), "US-ASCII");
        assert_eq!(charset(Some("en_US.")), "US-ASCII");
        assert_eq!(charset(None), "US-ASCII");
    }
}
