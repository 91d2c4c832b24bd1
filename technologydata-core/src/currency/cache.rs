//! Persistent cache of the currency-code table.
//!
//! The table is stored as a JSON object mapping ISO3 country codes to
//! currency codes. It is built from a [`CountryDataSource`] the first time it
//! is needed and read back on every later call.

use super::codes::CurrencyCodes;
use super::country::CountryDataSource;
use crate::errors::TechDataResult;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the currency-code cache inside the cache directory.
pub const CURRENCY_CODES_FILE: &str = "currency_codes.json";

/// How a cached table is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Read the cache if present; otherwise fetch and write it.
    #[default]
    Use,
    /// Delete the cache, fetch and write it again.
    Refresh,
    /// Fetch without reading or writing the cache.
    Bypass,
}

/// Resolves the directory holding the crate's cache files.
///
/// Checked in order: `$TECHNOLOGYDATA_CACHE_DIR`, `$XDG_CACHE_HOME/technologydata`,
/// `$HOME/.cache/technologydata`. Falls back to `.technologydata` in the
/// working directory.
pub fn default_cache_dir() -> PathBuf {
    let non_empty = |key: &str| env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);

    if let Some(path) = non_empty("TECHNOLOGYDATA_CACHE_DIR") {
        return path;
    }
    if let Some(path) = non_empty("XDG_CACHE_HOME") {
        return path.join("technologydata");
    }
    if let Some(home) = non_empty("HOME") {
        return home.join(".cache").join("technologydata");
    }
    PathBuf::from(".technologydata")
}

/// A currency-code table persisted at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyCodeCache {
    path: PathBuf,
}

impl Default for CurrencyCodeCache {
    fn default() -> Self {
        Self::in_dir(default_cache_dir())
    }
}

impl CurrencyCodeCache {
    /// A cache stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A cache stored as [`CURRENCY_CODES_FILE`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CURRENCY_CODES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the table, fetching it from `source` as `mode` requires.
    ///
    /// # Errors
    ///
    /// Fails if the source fails, or if the cache file cannot be written or
    /// deleted. An unreadable cache file is rebuilt rather than reported.
    pub fn load_or_fetch(
        &self,
        source: &dyn CountryDataSource,
        mode: CacheMode,
    ) -> TechDataResult<CurrencyCodes> {
        match mode {
            CacheMode::Bypass => {
                log::debug!("Ignoring cache and fetching currency codes from source");
                CurrencyCodes::from_source(source)
            }
            CacheMode::Refresh => {
                log::debug!("Deleting currency code cache at {:?} to refresh it", self.path);
                self.clear()?;
                self.fetch_and_store(source)
            }
            CacheMode::Use => match self.read() {
                Some(codes) => Ok(codes),
                None => self.fetch_and_store(source),
            },
        }
    }

    /// Deletes the cache file if it exists.
    pub fn clear(&self) -> TechDataResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self) -> Option<CurrencyCodes> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => {
                log::debug!("No currency code cache at {:?}", self.path);
                return None;
            }
        };
        match serde_json::from_str::<CurrencyCodes>(&contents) {
            Ok(codes) if !codes.is_empty() => {
                log::debug!("Reading currency codes from cache at {:?}", self.path);
                Some(codes)
            }
            Ok(_) => {
                log::warn!("Currency code cache at {:?} is empty, rebuilding", self.path);
                None
            }
            Err(e) => {
                log::warn!(
                    "Currency code cache at {:?} is unreadable ({e}), rebuilding",
                    self.path
                );
                None
            }
        }
    }

    fn fetch_and_store(&self, source: &dyn CountryDataSource) -> TechDataResult<CurrencyCodes> {
        let codes = CurrencyCodes::from_source(source)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(&codes)?)?;
        log::info!(
            "Wrote {} currency codes to cache at {:?}",
            codes.len(),
            self.path
        );
        Ok(codes)
    }
}
