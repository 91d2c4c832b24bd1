//! Deflation data: the external service that prices one currency-year in
//! terms of another.
//!
//! The [`Deflator`] trait is the seam to whatever provides GDP deflators and
//! exchange rates. [`TableDeflator`] is an in-memory implementation backed by
//! per-country tables, loadable from JSON.

use crate::errors::{TechDataError, TechDataResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Provider of deflator and exchange-rate series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeflationSource {
    #[default]
    #[serde(alias = "wb", alias = "world_bank")]
    WorldBank,
    #[serde(alias = "international_monetary_fund")]
    Imf,
}

impl FromStr for DeflationSource {
    type Err = TechDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "worldbank" | "wb" | "world_bank" => Ok(Self::WorldBank),
            "imf" | "international_monetary_fund" => Ok(Self::Imf),
            _ => Err(TechDataError::UnknownDeflationSource(s.to_string())),
        }
    }
}

impl fmt::Display for DeflationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorldBank => write!(f, "worldbank"),
            Self::Imf => write!(f, "imf"),
        }
    }
}

/// What a conversion rate is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseCase {
    /// Convert into another currency and price level.
    CurrencyConversion,
    /// Rebase the price level, staying in the source currency.
    InflationAdjustment,
}

/// A single rate query against a [`Deflator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeflationRequest {
    /// ISO3 code of the country issuing the source currency.
    pub source_currency: String,
    /// ISO3 code of the country issuing the target currency.
    pub target_currency: String,
    /// ISO3 code of the country whose price level is used.
    pub country: String,
    /// Year of the source currency.
    pub from_year: i32,
    /// Year of the target currency.
    pub base_year: i32,
    pub source: DeflationSource,
}

/// External deflation service.
///
/// Returns how many units of the target currency-year one unit of the source
/// currency-year is worth.
pub trait Deflator: Send + Sync {
    fn rate(&self, request: &DeflationRequest) -> TechDataResult<f64>;
}

/// Per-country series for one deflation source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeflationTables {
    /// GDP deflator index per ISO3 country and year.
    #[serde(default)]
    pub deflators: BTreeMap<String, BTreeMap<i32, f64>>,
    /// Local currency units per US dollar per ISO3 country and year.
    #[serde(default)]
    pub exchange_rates: BTreeMap<String, BTreeMap<i32, f64>>,
}

impl DeflationTables {
    fn deflator(&self, source: DeflationSource, iso3: &str, year: i32) -> TechDataResult<f64> {
        lookup(&self.deflators, iso3, year).ok_or_else(|| {
            TechDataError::Deflation(format!(
                "no {source} GDP deflator for {iso3} in {year}"
            ))
        })
    }

    fn exchange_rate(&self, source: DeflationSource, iso3: &str, year: i32) -> TechDataResult<f64> {
        // The US dollar is the unit of account of the exchange-rate series
        if iso3 == "USA" {
            return Ok(lookup(&self.exchange_rates, iso3, year).unwrap_or(1.0));
        }
        lookup(&self.exchange_rates, iso3, year).ok_or_else(|| {
            TechDataError::Deflation(format!(
                "no {source} exchange rate for {iso3} in {year}"
            ))
        })
    }
}

fn lookup(table: &BTreeMap<String, BTreeMap<i32, f64>>, iso3: &str, year: i32) -> Option<f64> {
    table.get(iso3)?.get(&year).copied()
}

/// In-memory deflator backed by deflator and exchange-rate tables.
///
/// The rate of a request is computed in three steps:
///
/// 1. exchange the source currency into the adjustment country's currency at
///    the source year,
/// 2. inflate with the country's deflator ratio between base and source year,
/// 3. exchange into the target currency at the base year.
///
/// # Examples
///
/// ```
/// use technologydata_core::currency::{DeflationRequest, DeflationSource, Deflator, TableDeflator};
///
/// let deflator = TableDeflator::new()
///     .with_deflator(DeflationSource::WorldBank, "USA", 2015, 100.0)
///     .with_deflator(DeflationSource::WorldBank, "USA", 2020, 110.0);
/// let request = DeflationRequest {
///     source_currency: "USA".into(),
///     target_currency: "USA".into(),
///     country: "USA".into(),
///     from_year: 2015,
///     base_year: 2020,
///     source: DeflationSource::WorldBank,
/// };
/// assert!((deflator.rate(&request).unwrap() - 1.1).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableDeflator {
    sources: BTreeMap<DeflationSource, DeflationTables>,
}

impl TableDeflator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses tables from JSON of the form
    /// `{"worldbank": {"deflators": {"USA": {"2020": 100.0}}, "exchange_rates": {...}}}`.
    pub fn from_json(json: &str) -> TechDataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads tables from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> TechDataResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> TechDataResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Adds one deflator index value.
    #[must_use]
    pub fn with_deflator(mut self, source: DeflationSource, iso3: &str, year: i32, value: f64) -> Self {
        self.tables_mut(source)
            .deflators
            .entry(iso3.to_string())
            .or_default()
            .insert(year, value);
        self
    }

    /// Adds one exchange rate, in local currency units per US dollar.
    #[must_use]
    pub fn with_exchange_rate(
        mut self,
        source: DeflationSource,
        iso3: &str,
        year: i32,
        value: f64,
    ) -> Self {
        self.tables_mut(source)
            .exchange_rates
            .entry(iso3.to_string())
            .or_default()
            .insert(year, value);
        self
    }

    /// Tables of one source, if any were loaded.
    pub fn tables(&self, source: DeflationSource) -> Option<&DeflationTables> {
        self.sources.get(&source)
    }

    fn tables_mut(&mut self, source: DeflationSource) -> &mut DeflationTables {
        self.sources.entry(source).or_default()
    }
}

impl Deflator for TableDeflator {
    fn rate(&self, request: &DeflationRequest) -> TechDataResult<f64> {
        let source = request.source;
        let tables = self.tables(source).ok_or_else(|| {
            TechDataError::Deflation(format!("no data loaded for source '{source}'"))
        })?;
        let country = request.country.as_str();

        let to_local = tables.exchange_rate(source, country, request.from_year)?
            / tables.exchange_rate(source, &request.source_currency, request.from_year)?;
        let inflation = tables.deflator(source, country, request.base_year)?
            / tables.deflator(source, country, request.from_year)?;
        let to_target = tables.exchange_rate(source, &request.target_currency, request.base_year)?
            / tables.exchange_rate(source, country, request.base_year)?;

        let rate = to_local * inflation * to_target;
        if !rate.is_finite() {
            return Err(TechDataError::Deflation(format!(
                "non-finite rate {rate} for {request:?}"
            )));
        }
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn request(src: &str, target: &str, country: &str, from: i32, base: i32) -> DeflationRequest {
        DeflationRequest {
            source_currency: src.to_string(),
            target_currency: target.to_string(),
            country: country.to_string(),
            from_year: from,
            base_year: base,
            source: DeflationSource::WorldBank,
        }
    }

    fn deflator() -> TableDeflator {
        let wb = DeflationSource::WorldBank;
        TableDeflator::new()
            .with_deflator(wb, "DEU", 2015, 100.0)
            .with_deflator(wb, "DEU", 2020, 108.0)
            .with_deflator(wb, "USA", 2015, 100.0)
            .with_deflator(wb, "USA", 2020, 112.0)
            .with_exchange_rate(wb, "DEU", 2015, 0.9)
            .with_exchange_rate(wb, "DEU", 2020, 0.88)
    }

    #[rstest]
    #[case("worldbank", DeflationSource::WorldBank)]
    #[case("WorldBank", DeflationSource::WorldBank)]
    #[case("wb", DeflationSource::WorldBank)]
    #[case("world_bank", DeflationSource::WorldBank)]
    #[case("imf", DeflationSource::Imf)]
    #[case("IMF", DeflationSource::Imf)]
    #[case("international_monetary_fund", DeflationSource::Imf)]
    fn test_source_names(#[case] name: &str, #[case] expected: DeflationSource) {
        assert_eq!(name.parse::<DeflationSource>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_source() {
        assert!(matches!(
            "invalid_source".parse::<DeflationSource>(),
            Err(TechDataError::UnknownDeflationSource(s)) if s == "invalid_source"
        ));
    }

    #[test]
    fn test_inflation_only() {
        let rate = deflator().rate(&request("DEU", "DEU", "DEU", 2015, 2020)).unwrap();
        assert_relative_eq!(rate, 1.08, max_relative = 1e-12);
    }

    #[test]
    fn test_conversion_through_country() {
        // EUR 2015 -> EUR (DEU) -> inflate in DEU -> USD 2020
        let rate = deflator().rate(&request("DEU", "USA", "DEU", 2015, 2020)).unwrap();
        assert_relative_eq!(rate, 1.08 / 0.88, max_relative = 1e-12);

        // USD 2015 -> EUR at 0.9 -> inflate in DEU -> USD 2020
        let rate = deflator().rate(&request("USA", "USA", "DEU", 2015, 2020)).unwrap();
        assert_relative_eq!(rate, 0.9 * 1.08 / 0.88, max_relative = 1e-12);
    }

    #[test]
    fn test_missing_data() {
        let err = deflator().rate(&request("DEU", "DEU", "DEU", 2015, 2030)).unwrap_err();
        assert!(matches!(err, TechDataError::Deflation(msg) if msg.contains("DEU") && msg.contains("2030")));

        let mut imf = request("DEU", "DEU", "DEU", 2015, 2020);
        imf.source = DeflationSource::Imf;
        assert!(matches!(deflator().rate(&imf), Err(TechDataError::Deflation(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let original = deflator();
        let parsed = TableDeflator::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_json_input() {
        let json = r#"{
            "imf": {
                "deflators": {"JPN": {"2010": 95.0, "2020": 100.0}},
                "exchange_rates": {"JPN": {"2010": 88.0, "2020": 107.0}}
            }
        }"#;
        let deflator = TableDeflator::from_json(json).unwrap();
        let mut req = request("JPN", "USA", "JPN", 2010, 2020);
        req.source = DeflationSource::Imf;
        let rate = deflator.rate(&req).unwrap();
        assert_relative_eq!(rate, (100.0 / 95.0) / 107.0, max_relative = 1e-12);
    }
}
