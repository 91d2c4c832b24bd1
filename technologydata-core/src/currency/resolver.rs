//! Memoized conversion rates between currency-years.

use super::codes::CurrencyCodes;
use super::deflation::{DeflationRequest, DeflationSource, Deflator, UseCase};
use super::token::CurrencyYear;
use crate::errors::{TechDataError, TechDataResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RateKey {
    from: CurrencyYear,
    to: CurrencyYear,
    country: String,
    source: DeflationSource,
    use_case: UseCase,
}

/// Resolves conversion rates between currency-years for a given country.
///
/// Currency codes are mapped to representative countries through
/// [`CurrencyCodes::code_to_iso3`] before the [`Deflator`] is queried. Every
/// rate is memoized per full input tuple for the lifetime of the resolver.
pub struct CurrencyResolver {
    codes: Arc<CurrencyCodes>,
    deflator: Box<dyn Deflator>,
    /// Used by conversions that do not name a source.
    default_source: DeflationSource,
    memo: Mutex<HashMap<RateKey, f64>>,
}

impl std::fmt::Debug for CurrencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyResolver")
            .field("codes", &self.codes.len())
            .field("default_source", &self.default_source)
            .field("memoized", &self.memoized())
            .finish()
    }
}

impl CurrencyResolver {
    pub fn new(codes: Arc<CurrencyCodes>, deflator: impl Deflator + 'static) -> Self {
        Self {
            codes,
            deflator: Box::new(deflator),
            default_source: DeflationSource::default(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the source used when a conversion names none, typically
    /// [`Settings::default_deflation_source`](crate::config::Settings::default_deflation_source).
    #[must_use]
    pub fn with_default_source(mut self, source: DeflationSource) -> Self {
        self.default_source = source;
        self
    }

    pub fn default_source(&self) -> DeflationSource {
        self.default_source
    }

    pub fn codes(&self) -> &CurrencyCodes {
        &self.codes
    }

    /// Number of memoized rates.
    pub fn memoized(&self) -> usize {
        self.memo.lock().expect("Rate memo lock poisoned").len()
    }

    /// Returns the value of one `from_code` of `from_year` in `to_code` of `to_year`.
    ///
    /// `country` is the ISO3 code of the country whose price level is used.
    /// For [`UseCase::InflationAdjustment`] the target is the source
    /// currency itself and `to_code` must equal `from_code`.
    ///
    /// # Errors
    ///
    /// - [`TechDataError::UnknownCountry`] for an unknown adjustment country.
    /// - [`TechDataError::UnknownCurrencyCode`] or
    ///   [`TechDataError::AmbiguousCurrency`] if a code has no country.
    /// - [`TechDataError::NotSupported`] for an inflation adjustment across currencies.
    /// - Any error of the underlying [`Deflator`].
    #[allow(clippy::too_many_arguments)]
    pub fn conversion_rate(
        &self,
        from_code: &str,
        from_year: i32,
        to_code: &str,
        to_year: i32,
        country: &str,
        source: DeflationSource,
        use_case: UseCase,
    ) -> TechDataResult<f64> {
        if !self.codes.is_known_country(country) {
            return Err(TechDataError::UnknownCountry(country.to_string()));
        }
        if use_case == UseCase::InflationAdjustment && from_code != to_code {
            return Err(TechDataError::NotSupported(format!(
                "Inflation adjustment keeps the currency, got {from_code} and {to_code}"
            )));
        }

        let key = RateKey {
            from: CurrencyYear::new(from_code, from_year),
            to: CurrencyYear::new(to_code, to_year),
            country: country.to_string(),
            source,
            use_case,
        };
        if let Some(rate) = self.memo.lock().expect("Rate memo lock poisoned").get(&key) {
            log::debug!("Memoized rate {} -> {} in {country}: {rate}", key.from, key.to);
            return Ok(*rate);
        }

        let source_currency = self.codes.code_to_iso3(from_code)?;
        let target_currency = match use_case {
            UseCase::CurrencyConversion => self.codes.code_to_iso3(to_code)?,
            UseCase::InflationAdjustment => source_currency.clone(),
        };
        let request = DeflationRequest {
            source_currency,
            target_currency,
            country: country.to_string(),
            from_year,
            base_year: to_year,
            source,
        };
        let rate = self.deflator.rate(&request)?;
        log::debug!(
            "Fetched {source} rate {} -> {} in {country}: {rate}",
            key.from,
            key.to
        );

        self.memo
            .lock()
            .expect("Rate memo lock poisoned")
            .insert(key, rate);
        Ok(rate)
    }

    /// Rates of each token relative to `reference`, keyed by token string.
    ///
    /// The reference itself is skipped; its rate is 1 by definition.
    pub fn rates_to_reference<'a>(
        &self,
        tokens: impl IntoIterator<Item = &'a CurrencyYear>,
        reference: &CurrencyYear,
        country: &str,
        source: DeflationSource,
    ) -> TechDataResult<HashMap<String, f64>> {
        let mut rates = HashMap::new();
        for token in tokens {
            if token == reference || rates.contains_key(&token.to_string()) {
                continue;
            }
            let rate = self.conversion_rate(
                &token.code,
                token.year,
                &reference.code,
                reference.year,
                country,
                source,
                UseCase::CurrencyConversion,
            )?;
            rates.insert(token.to_string(), rate);
        }
        Ok(rates)
    }
}
