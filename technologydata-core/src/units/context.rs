//! The registries needed to interpret unit, carrier and heating-value strings.

use super::conversion::Unit;
use super::dimension::Dimension;
use super::parser::{ParseError, ParsedUnit};
use super::registry::UnitRegistry;
use super::tags::TagRegistry;
use crate::config::Settings;
use crate::currency::{CountryDataSource, CurrencyCodes, CurrencyRegistry, CurrencyYear};
use crate::errors::TechDataResult;
use std::collections::BTreeMap;
use std::sync::Arc;

/// All registries used to parse and canonicalize units.
///
/// A context holds four registries:
///
/// - physical units with SI prefixes ([`UnitRegistry`]),
/// - energy carriers ([`TagRegistry::carriers`]),
/// - heating-value conventions ([`TagRegistry::heating_values`]),
/// - currency-year tokens ([`CurrencyRegistry`]), filled on first use.
///
/// Only the currency registry changes after construction, behind a lock, so a
/// context can be shared by reference across threads.
///
/// # Examples
///
/// ```
/// use technologydata_core::units::{Dimension, UnitContext};
///
/// let ctx = UnitContext::bundled();
/// let unit = ctx.parse_unit("EUR_2020/kilowatt").unwrap();
/// assert_eq!(unit.normalized(), "EUR_2020 / kW");
/// assert_eq!(unit.dimension(), Dimension::CURRENCY - Dimension::POWER);
/// ```
#[derive(Debug)]
pub struct UnitContext {
    units: UnitRegistry,
    carriers: TagRegistry,
    heating_values: TagRegistry,
    currencies: CurrencyRegistry,
}

impl UnitContext {
    /// Creates a context validating currencies against `codes`.
    ///
    /// # Errors
    ///
    /// Fails if the code of `reference` is not a known currency.
    pub fn new(codes: Arc<CurrencyCodes>, reference: CurrencyYear) -> TechDataResult<Self> {
        Ok(Self {
            units: UnitRegistry::new(),
            carriers: TagRegistry::carriers(),
            heating_values: TagRegistry::heating_values(),
            currencies: CurrencyRegistry::new(codes, reference)?,
        })
    }

    /// A context using the bundled currency codes and `USD_2020` as reference.
    pub fn bundled() -> Self {
        Self::new(
            Arc::new(CurrencyCodes::bundled()),
            CurrencyYear::new("USD", 2020),
        )
        .expect("bundled currency codes contain USD")
    }

    /// Builds a context from settings, loading currency codes through the cache.
    pub fn from_settings(settings: &Settings, source: &dyn CountryDataSource) -> TechDataResult<Self> {
        let codes = settings
            .currency_code_cache()
            .load_or_fetch(source, settings.cache_mode)?;
        Self::new(Arc::new(codes), settings.reference_currency()?)
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    pub fn carriers(&self) -> &TagRegistry {
        &self.carriers
    }

    pub fn heating_values(&self) -> &TagRegistry {
        &self.heating_values
    }

    pub fn currencies(&self) -> &CurrencyRegistry {
        &self.currencies
    }

    /// The authoritative currency codes.
    pub fn currency_codes(&self) -> &Arc<CurrencyCodes> {
        self.currencies.codes()
    }

    /// The currency-year all others are defined against.
    pub fn reference_currency(&self) -> &CurrencyYear {
        self.currencies.reference()
    }

    /// Parses a unit expression into a resolved [`Unit`].
    ///
    /// Currency tokens are validated and registered before the physical
    /// symbols are resolved.
    ///
    /// # Errors
    ///
    /// - [`TechDataError::InvalidCurrencyCodes`](crate::errors::TechDataError::InvalidCurrencyCodes)
    ///   for currency tokens with unknown codes.
    /// - [`ParseError::UndefinedUnit`] for any other unknown symbol, including
    ///   carrier names such as `H2`.
    pub fn parse_unit(&self, expr: &str) -> TechDataResult<Unit> {
        self.currencies.ensure_defined(expr)?;

        // Tags are known here only so that "H2" is reported whole, not as "H^2"
        let is_known = |s: &str| {
            self.units.contains(s) || self.carriers.contains(s) || self.heating_values.contains(s)
        };
        let parsed = ParsedUnit::parse_with(expr, &is_known)?;

        let mut canonical = BTreeMap::new();
        let mut currencies = BTreeMap::new();
        let mut dimension = Dimension::dimensionless();
        let mut si_factor = 1.0;

        for (symbol, &exp) in parsed.components() {
            if self.currencies.is_defined(symbol) {
                currencies.insert(symbol.clone(), exp);
                accumulate(&mut canonical, symbol.clone(), exp)?;
                dimension = Dimension::CURRENCY
                    .checked_pow(exp)
                    .and_then(|d| d.checked_mul(&dimension))
                    .ok_or_else(|| ParseError::InvalidExponent(format!("{symbol}^{exp}")))?;
                continue;
            }

            let info = self
                .units
                .lookup(symbol)
                .ok_or_else(|| ParseError::UndefinedUnit(symbol.clone()))?;
            dimension = info
                .dimension
                .checked_pow(exp)
                .and_then(|d| d.checked_mul(&dimension))
                .ok_or_else(|| ParseError::InvalidExponent(format!("{symbol}^{exp}")))?;
            si_factor *= info.to_si_factor.powi(exp);
            // "1" is the dimensionless unit and never appears in canonical form
            if info.name != "1" {
                accumulate(&mut canonical, info.name, exp)?;
            }
        }

        Ok(Unit::new(
            ParsedUnit::from_components(canonical),
            dimension,
            si_factor,
            ParsedUnit::from_components(currencies),
        ))
    }

    /// Returns the canonical form of a unit expression.
    pub fn canonical_unit(&self, expr: &str) -> TechDataResult<String> {
        Ok(self.parse_unit(expr)?.normalized())
    }

    /// Parses a carrier expression into canonical carrier names.
    pub fn parse_carrier(&self, expr: &str) -> TechDataResult<ParsedUnit> {
        Ok(self.carriers.parse(expr)?)
    }

    /// Parses a heating-value expression into canonical convention names.
    pub fn parse_heating_value(&self, expr: &str) -> TechDataResult<ParsedUnit> {
        Ok(self.heating_values.parse(expr)?)
    }
}

impl Default for UnitContext {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Aliases of one unit (`kW`, `kilowatt`) merge into a single component.
fn accumulate(
    components: &mut BTreeMap<String, i32>,
    symbol: String,
    exp: i32,
) -> Result<(), ParseError> {
    let current = components.entry(symbol).or_insert(0);
    *current = current
        .checked_add(exp)
        .ok_or_else(|| ParseError::InvalidExponent(exp.to_string()))?;
    Ok(())
}
