//! The authoritative set of currency codes and their countries.

use super::country::{BundledCountryData, CountryDataSource};
use crate::errors::{TechDataError, TechDataResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Representative countries for currencies shared by several countries.
///
/// The representative is the largest economy using the currency; where
/// economies are comparable, the country with the most complete deflator
/// series is chosen.
pub const SHARED_CURRENCY_COUNTRIES: &[(&str, &str)] = &[
    ("EUR", "DEU"),
    ("XOF", "CIV"),
    ("XAF", "CMR"),
    ("XCD", "LCA"),
    ("USD", "USA"),
    ("AUD", "AUS"),
    ("XPF", "NCL"),
    ("ANG", "CUW"),
    ("DKK", "DNK"),
    ("NZD", "NZL"),
    ("CHF", "CHE"),
    ("ILS", "ISR"),
];

/// Mapping from ISO3 country code to the three-letter code of its currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCodes {
    iso3_to_currency: BTreeMap<String, String>,
}

impl CurrencyCodes {
    pub fn new(iso3_to_currency: BTreeMap<String, String>) -> Self {
        Self { iso3_to_currency }
    }

    /// Codes from the table shipped with the crate.
    pub fn bundled() -> Self {
        Self::new(BundledCountryData.iso3_to_currency_table())
    }

    /// Fetches the codes from a data source without any caching.
    pub fn from_source(source: &dyn CountryDataSource) -> TechDataResult<Self> {
        Ok(Self::new(source.iso3_to_currency()?))
    }

    /// The underlying ISO3 to currency mapping.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.iso3_to_currency
    }

    pub fn len(&self) -> usize {
        self.iso3_to_currency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iso3_to_currency.is_empty()
    }

    /// Returns true if at least one country uses `code`.
    pub fn is_valid_code(&self, code: &str) -> bool {
        self.iso3_to_currency.values().any(|c| c == code)
    }

    /// Returns true if `iso3` is a known country.
    pub fn is_known_country(&self, iso3: &str) -> bool {
        self.iso3_to_currency.contains_key(iso3)
    }

    /// All distinct currency codes, sorted.
    pub fn currency_codes(&self) -> BTreeSet<&str> {
        self.iso3_to_currency.values().map(String::as_str).collect()
    }

    /// Returns the currency of a country.
    ///
    /// # Errors
    ///
    /// Fails with [`TechDataError::UnknownCountry`] for an unknown ISO3 code.
    pub fn iso3_to_code(&self, iso3: &str) -> TechDataResult<&str> {
        self.iso3_to_currency
            .get(iso3)
            .map(String::as_str)
            .ok_or_else(|| TechDataError::UnknownCountry(iso3.to_string()))
    }

    /// Sorted ISO3 codes of the countries using `code`.
    pub fn countries_using(&self, code: &str) -> Vec<String> {
        // BTreeMap iteration keeps the result sorted
        self.iso3_to_currency
            .iter()
            .filter(|(_, c)| c.as_str() == code)
            .map(|(iso3, _)| iso3.clone())
            .collect()
    }

    /// Maps a currency code to a single representative country.
    ///
    /// # Examples
    ///
    /// ```
    /// use technologydata_core::currency::CurrencyCodes;
    ///
    /// let codes = CurrencyCodes::bundled();
    /// assert_eq!(codes.code_to_iso3("JPY").unwrap(), "JPN");
    /// assert_eq!(codes.code_to_iso3("EUR").unwrap(), "DEU");
    /// ```
    ///
    /// # Errors
    ///
    /// - [`TechDataError::UnknownCurrencyCode`] if no country uses the code.
    /// - [`TechDataError::AmbiguousCurrency`] if the code is shared and has no
    ///   representative country.
    pub fn code_to_iso3(&self, code: &str) -> TechDataResult<String> {
        let countries = self.countries_using(code);
        match countries.as_slice() {
            [] => Err(TechDataError::UnknownCurrencyCode(code.to_string())),
            [single] => Ok(single.clone()),
            _ => SHARED_CURRENCY_COUNTRIES
                .iter()
                .find(|(c, _)| *c == code)
                .map(|(_, iso3)| iso3.to_string())
                .ok_or_else(|| TechDataError::AmbiguousCurrency {
                    code: code.to_string(),
                    countries,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(pairs: &[(&str, &str)]) -> CurrencyCodes {
        CurrencyCodes::new(
            pairs
                .iter()
                .map(|(iso3, code)| (iso3.to_string(), code.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_one_to_one() {
        let codes = CurrencyCodes::bundled();
        assert_eq!(codes.code_to_iso3("GBP").unwrap(), "GBR");
        assert_eq!(codes.code_to_iso3("CNY").unwrap(), "CHN");
        assert_eq!(codes.iso3_to_code("DEU").unwrap(), "EUR");
    }

    #[test]
    fn test_shared_currencies_use_representatives() {
        let codes = CurrencyCodes::bundled();
        for (code, iso3) in SHARED_CURRENCY_COUNTRIES {
            assert_eq!(codes.code_to_iso3(code).unwrap(), *iso3, "{code}");
        }
    }

    #[test]
    fn test_countries_using_sorted() {
        let codes = CurrencyCodes::bundled();
        assert_eq!(
            codes.countries_using("XOF"),
            vec!["BEN", "BFA", "CIV", "GNB", "MLI", "NER", "SEN", "TGO"]
        );
    }

    #[test]
    fn test_ambiguous_without_override() {
        let codes = codes(&[("AAA", "QQQ"), ("BBB", "QQQ")]);
        assert!(matches!(
            codes.code_to_iso3("QQQ"),
            Err(TechDataError::AmbiguousCurrency { countries, .. }) if countries == vec!["AAA", "BBB"]
        ));
    }

    #[test]
    fn test_unknown_code() {
        let codes = CurrencyCodes::bundled();
        assert!(matches!(
            codes.code_to_iso3("XYZ"),
            Err(TechDataError::UnknownCurrencyCode(c)) if c == "XYZ"
        ));
        assert!(matches!(
            codes.iso3_to_code("XXX"),
            Err(TechDataError::UnknownCountry(_))
        ));
    }

    #[test]
    fn test_validity() {
        let codes = CurrencyCodes::bundled();
        assert!(codes.is_valid_code("USD"));
        assert!(codes.is_valid_code("EUR"));
        assert!(!codes.is_valid_code("XYZ"));
        assert!(codes.is_known_country("USA"));
        assert!(!codes.is_known_country("usa"));
    }
}
