//! Library settings
//!
//! Settings are read from TOML. Every field has a default, so a partial file
//! (or none at all) is valid:
//!
//! ```toml
//! reference_currency = "EUR_2020"
//! cache_dir = "/tmp/technologydata"
//! default_deflation_source = "imf"
//! cache_mode = "refresh"
//! ```

use crate::currency::{default_cache_dir, CacheMode, CurrencyCodeCache, CurrencyYear, DeflationSource};
use crate::errors::TechDataResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings controlling currency handling and caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Currency-year every other currency-year is defined against.
    ///
    /// Default: `USD_2020`
    pub reference_currency: String,

    /// Directory of the currency-code cache.
    ///
    /// Default: resolved from the environment, see [`default_cache_dir`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Deflation source used when none is given.
    ///
    /// Default: `worldbank`
    pub default_deflation_source: DeflationSource,

    /// How the currency-code cache is used when building a context.
    ///
    /// Default: `use`
    pub cache_mode: CacheMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reference_currency: "USD_2020".to_string(),
            cache_dir: None,
            default_deflation_source: DeflationSource::WorldBank,
            cache_mode: CacheMode::Use,
        }
    }
}

impl Settings {
    /// Parses settings from a TOML string.
    pub fn from_toml_str(toml: &str) -> TechDataResult<Self> {
        Ok(toml::from_str(toml)?)
    }

    /// Reads settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> TechDataResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded settings from {:?}", path.as_ref());
        Self::from_toml_str(&contents)
    }

    /// The reference currency-year.
    ///
    /// # Errors
    ///
    /// Fails if `reference_currency` is not of the form `CODE_YYYY`.
    pub fn reference_currency(&self) -> TechDataResult<CurrencyYear> {
        self.reference_currency.parse()
    }

    /// Directory holding cache files.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// The currency-code cache these settings point at.
    pub fn currency_code_cache(&self) -> CurrencyCodeCache {
        CurrencyCodeCache::in_dir(self.cache_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TechDataError;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(
            settings.reference_currency().unwrap(),
            CurrencyYear::new("USD", 2020)
        );
        assert_eq!(settings.default_deflation_source, DeflationSource::WorldBank);
        assert_eq!(settings.cache_mode, CacheMode::Use);
    }

    #[test]
    fn test_partial_deserialization() {
        let settings = Settings::from_toml_str(r#"default_deflation_source = "imf""#).unwrap();
        assert_eq!(settings.default_deflation_source, DeflationSource::Imf);
        assert_eq!(settings.reference_currency, "USD_2020");
        assert!(settings.cache_dir.is_none());
    }

    #[test]
    fn test_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
reference_currency = "EUR_2015"
cache_dir = "/var/cache/td"
default_deflation_source = "wb"
cache_mode = "bypass"
"#
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(
            settings.reference_currency().unwrap(),
            CurrencyYear::new("EUR", 2015)
        );
        assert_eq!(settings.cache_dir(), PathBuf::from("/var/cache/td"));
        assert_eq!(
            settings.currency_code_cache().path(),
            Path::new("/var/cache/td/currency_codes.json")
        );
        assert_eq!(settings.default_deflation_source, DeflationSource::WorldBank);
        assert_eq!(settings.cache_mode, CacheMode::Bypass);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Settings::from_toml_str(r#"cache_mode = "sometimes""#),
            Err(TechDataError::Config(_))
        ));
        let settings = Settings::from_toml_str(r#"reference_currency = "dollars""#).unwrap();
        assert!(matches!(
            settings.reference_currency(),
            Err(TechDataError::InvalidCurrencyToken(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Settings {
            cache_dir: Some(PathBuf::from("cache")),
            ..Settings::default()
        };
        let serialised = toml::to_string(&settings).unwrap();
        assert_eq!(Settings::from_toml_str(&serialised).unwrap(), settings);
    }
}
