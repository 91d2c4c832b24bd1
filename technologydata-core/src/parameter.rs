//! Techno-economic parameter values.
//!
//! A [`Parameter`] is a magnitude tagged with units, an energy carrier, a
//! heating-value convention, and provenance metadata. Units may contain
//! currency-year tokens such as `EUR_2020`.
//!
//! Parameters are immutable. Every operation returns a new instance, and the
//! unit strings they hold are always in canonical form, so two parameters
//! describing the same quantity compare equal regardless of how their units
//! were spelled.
//!
//! Operations that interpret units take a [`UnitContext`]. Operations that
//! price currencies also take a [`CurrencyResolver`].
//!
//! # Example
//!
//! ```
//! use technologydata_core::parameter::Parameter;
//! use technologydata_core::units::UnitContext;
//!
//! let ctx = UnitContext::bundled();
//! let capex = Parameter::builder(1000.0)
//!     .units("USD_2020/kilowatt")
//!     .carrier("H2")
//!     .heating_value("LHV")
//!     .build(&ctx)
//!     .unwrap();
//! assert_eq!(capex.units(), Some("USD_2020 / kW"));
//! assert_eq!(capex.carrier(), Some("hydrogen"));
//!
//! let per_mw = capex.to(&ctx, "USD_2020/MW").unwrap();
//! assert!((per_mw.magnitude() - 1e6).abs() < 1e-6);
//! ```

use crate::constants::hhv_to_lhv_ratio;
use crate::currency::{
    find_currency_tokens, replace_currency_tokens, CurrencyResolver, CurrencyYear,
    DeflationSource, UseCase,
};
use crate::errors::{TechDataError, TechDataResult};
use crate::source::SourceCollection;
use crate::units::{convert, ParsedUnit, Unit, UnitContext, HHV, LHV};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul};

/// A magnitude with units, carrier, heating value, and provenance.
///
/// # Equality
///
/// Equality is structural over all fields. `None` is a value of its own, so
/// a parameter without units differs from one with `dimensionless` units.
///
/// # Serialization
///
/// Deserialized parameters are not validated; pass them through
/// [`Parameter::canonicalize`] before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    magnitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    heating_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provenance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(default, skip_serializing_if = "SourceCollection::is_empty")]
    sources: SourceCollection,
}

/// Builder for [`Parameter`].
///
/// Nothing is validated until [`ParameterBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ParameterBuilder {
    magnitude: f64,
    units: Option<String>,
    carrier: Option<String>,
    heating_value: Option<String>,
    provenance: Option<String>,
    note: Option<String>,
    sources: SourceCollection,
}

impl ParameterBuilder {
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = Some(carrier.into());
        self
    }

    pub fn heating_value(mut self, heating_value: impl Into<String>) -> Self {
        self.heating_value = Some(heating_value.into());
        self
    }

    pub fn provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn sources(mut self, sources: SourceCollection) -> Self {
        self.sources = sources;
        self
    }

    /// Validates and canonicalizes the parameter.
    ///
    /// # Errors
    ///
    /// - [`TechDataError::HeatingValueWithoutCarrier`] if a heating value is
    ///   given without a carrier.
    /// - [`TechDataError::InvalidCurrencyCodes`] for currency tokens with
    ///   unknown codes.
    /// - [`TechDataError::UnitParse`] for unknown units, carriers or heating values.
    pub fn build(self, ctx: &UnitContext) -> TechDataResult<Parameter> {
        if self.heating_value.is_some() && self.carrier.is_none() {
            return Err(TechDataError::HeatingValueWithoutCarrier);
        }

        let units = self
            .units
            .map(|u| ctx.canonical_unit(&u))
            .transpose()?;
        let carrier = self
            .carrier
            .map(|c| ctx.parse_carrier(&c).map(|p| p.normalized()))
            .transpose()?;
        let heating_value = self
            .heating_value
            .map(|h| ctx.parse_heating_value(&h).map(|p| p.normalized()))
            .transpose()?;

        Ok(Parameter {
            magnitude: self.magnitude,
            units,
            carrier,
            heating_value,
            provenance: self.provenance,
            note: self.note,
            sources: self.sources,
        })
    }
}

impl Parameter {
    /// Starts building a parameter with the given magnitude.
    pub fn builder(magnitude: f64) -> ParameterBuilder {
        ParameterBuilder {
            magnitude,
            ..ParameterBuilder::default()
        }
    }

    /// Re-validates a parameter, typically one obtained by deserialization.
    pub fn canonicalize(self, ctx: &UnitContext) -> TechDataResult<Self> {
        ParameterBuilder {
            magnitude: self.magnitude,
            units: self.units,
            carrier: self.carrier,
            heating_value: self.heating_value,
            provenance: self.provenance,
            note: self.note,
            sources: self.sources,
        }
        .build(ctx)
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Canonical unit expression, if any.
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// Canonical carrier expression, if any.
    pub fn carrier(&self) -> Option<&str> {
        self.carrier.as_deref()
    }

    /// Canonical heating-value expression, if any.
    pub fn heating_value(&self) -> Option<&str> {
        self.heating_value.as_deref()
    }

    pub fn provenance(&self) -> Option<&str> {
        self.provenance.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn sources(&self) -> &SourceCollection {
        &self.sources
    }

    /// Same parameter with another magnitude.
    #[must_use]
    pub fn with_magnitude(&self, magnitude: f64) -> Self {
        Self {
            magnitude,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_provenance(&self, provenance: Option<String>) -> Self {
        Self {
            provenance,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_note(&self, note: Option<String>) -> Self {
        Self {
            note,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_sources(&self, sources: SourceCollection) -> Self {
        Self {
            sources,
            ..self.clone()
        }
    }

    /// The resolved unit; parameters without units are dimensionless.
    pub fn unit(&self, ctx: &UnitContext) -> TechDataResult<Unit> {
        match &self.units {
            Some(units) => ctx.parse_unit(units),
            None => Ok(Unit::dimensionless()),
        }
    }

    /// Returns true if `other` shares this parameter's carrier, heating value
    /// and unit dimension.
    pub fn is_compatible(&self, ctx: &UnitContext, other: &Self) -> TechDataResult<bool> {
        Ok(self.carrier == other.carrier
            && self.heating_value == other.heating_value
            && self.unit(ctx)?.is_compatible(&other.unit(ctx)?))
    }

    /// Converts to other units of the same dimension and currency composition.
    ///
    /// # Errors
    ///
    /// - [`TechDataError::NotSupported`] if `units` mentions other currency
    ///   tokens than the current units; use [`Parameter::change_currency`].
    /// - [`TechDataError::Conversion`] if the dimensions differ.
    pub fn to(&self, ctx: &UnitContext, units: &str) -> TechDataResult<Self> {
        let from = self.unit(ctx)?;
        let to = ctx.parse_unit(units)?;

        if from.currencies() != to.currencies() {
            return Err(TechDataError::NotSupported(format!(
                "Currency conversion from '{}' to '{}' is not supported by `to`, use `change_currency` instead",
                from, to
            )));
        }

        Ok(Self {
            magnitude: from.convert_to(self.magnitude, &to)?,
            units: Some(to.normalized()),
            ..self.clone()
        })
    }

    /// Converts every currency-year token of the units to `to_currency`.
    ///
    /// Rates come from `resolver`, for the price level of `country` (an ISO3
    /// code) according to `source`, or the resolver's default source when
    /// `None`. Each token is priced relative to the
    /// context's reference currency, and the magnitude is converted through
    /// [`convert`].
    ///
    /// Parameters without currency tokens, or whose tokens all equal
    /// `to_currency`, are returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`TechDataError::InvalidCurrencyToken`] or
    ///   [`TechDataError::InvalidCurrencyCodes`] for an invalid target.
    /// - [`TechDataError::UnknownCountry`] for an unknown adjustment country.
    /// - Any rate lookup error of the resolver.
    pub fn change_currency(
        &self,
        ctx: &UnitContext,
        resolver: &CurrencyResolver,
        to_currency: &str,
        country: &str,
        source: Option<DeflationSource>,
    ) -> TechDataResult<Self> {
        let source = source.unwrap_or_else(|| resolver.default_source());
        let target: CurrencyYear = to_currency.parse()?;
        ctx.currencies().ensure_defined(to_currency)?;
        if !ctx.currency_codes().is_known_country(country) {
            return Err(TechDataError::UnknownCountry(country.to_string()));
        }

        let Some(units) = &self.units else {
            return Ok(self.clone());
        };
        let tokens = find_currency_tokens(units);
        if tokens.iter().all(|t| *t == target) {
            // Also covers units without any currency
            return Ok(self.clone());
        }

        let reference = ctx.reference_currency();
        let rates = resolver.rates_to_reference(
            tokens.iter().chain(std::iter::once(&target)),
            reference,
            country,
            source,
        )?;

        let from = ctx.parse_unit(units)?;
        let to = ctx.parse_unit(&replace_currency_tokens(units, |_| target.to_string()))?;
        let magnitude = convert(self.magnitude, &from, &to, &rates, &reference.to_string())?;
        log::debug!(
            "Changed currency of {} {} to {} {} using {source} data for {country}",
            self.magnitude,
            from,
            magnitude,
            to
        );

        Ok(Self {
            magnitude,
            units: Some(to.normalized()),
            ..self.clone()
        })
    }

    /// Moves every currency-year token to `to_year`, keeping its currency.
    ///
    /// Only the price level changes, using the deflator of `country`. A
    /// `None` source falls back to the resolver's default.
    pub fn adjust_inflation(
        &self,
        ctx: &UnitContext,
        resolver: &CurrencyResolver,
        to_year: i32,
        country: &str,
        source: Option<DeflationSource>,
    ) -> TechDataResult<Self> {
        let source = source.unwrap_or_else(|| resolver.default_source());
        if !ctx.currency_codes().is_known_country(country) {
            return Err(TechDataError::UnknownCountry(country.to_string()));
        }
        let Some(units) = &self.units else {
            return Ok(self.clone());
        };
        if find_currency_tokens(units).iter().all(|t| t.year == to_year) {
            return Ok(self.clone());
        }

        let from = ctx.parse_unit(units)?;
        let mut factor = 1.0;
        for (token, &exp) in from.currencies().components() {
            let token: CurrencyYear = token.parse()?;
            if token.year == to_year {
                continue;
            }
            let rate = resolver.conversion_rate(
                &token.code,
                token.year,
                &token.code,
                to_year,
                country,
                source,
                UseCase::InflationAdjustment,
            )?;
            factor *= rate.powi(exp);
        }

        let adjusted = replace_currency_tokens(units, |t| CurrencyYear::new(t.code.clone(), to_year).to_string());
        Ok(Self {
            magnitude: self.magnitude * factor,
            units: Some(ctx.canonical_unit(&adjusted)?),
            ..self.clone()
        })
    }

    /// Rescales the magnitude to another heating-value convention.
    ///
    /// Each carrier component contributes the ratio of its higher to lower
    /// heating value (or the inverse, towards LHV), raised to the component's
    /// exponent. Carriers without tabulated energy densities contribute a
    /// ratio of 1 and are logged as errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use technologydata_core::parameter::Parameter;
    /// use technologydata_core::units::UnitContext;
    ///
    /// let ctx = UnitContext::bundled();
    /// let p = Parameter::builder(1.0)
    ///     .units("kWh")
    ///     .carrier("H2")
    ///     .heating_value("LHV")
    ///     .build(&ctx)
    ///     .unwrap();
    /// let hhv = p.change_heating_value(&ctx, "HHV").unwrap();
    /// assert!((hhv.magnitude() - 141.8 / 119.6).abs() < 1e-12);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails with [`TechDataError::HeatingValueConversion`] if the parameter
    /// has no carrier or no heating value, or if the target is neither LHV
    /// nor HHV.
    pub fn change_heating_value(&self, ctx: &UnitContext, to_heating_value: &str) -> TechDataResult<Self> {
        let Some(carrier) = &self.carrier else {
            return Err(TechDataError::HeatingValueConversion(
                "the parameter has no carrier".to_string(),
            ));
        };
        let current = match &self.heating_value {
            Some(hv) => ctx.parse_heating_value(hv)?,
            None => ParsedUnit::dimensionless(),
        };
        if current.has_no_components() {
            return Err(TechDataError::HeatingValueConversion(
                "the parameter has no heating value".to_string(),
            ));
        }

        let target = ctx.parse_heating_value(to_heating_value)?.normalized();
        if self.heating_value.as_deref() == Some(target.as_str()) {
            return Ok(self.clone());
        }
        if target != LHV && target != HHV {
            return Err(TechDataError::HeatingValueConversion(format!(
                "cannot convert to '{target}', expected {LHV} or {HHV}"
            )));
        }

        let mut multiplier = 1.0;
        for (name, &exp) in ctx.parse_carrier(carrier)?.components() {
            let ratio = match hhv_to_lhv_ratio(name) {
                Some(ratio) => ratio,
                None => {
                    log::error!(
                        "No heating values found for '{name}'. Assuming a ratio of 1."
                    );
                    1.0
                }
            };
            let ratio = if target == HHV { ratio } else { 1.0 / ratio };
            multiplier *= ratio.powi(exp);
        }

        let heating_value = current.map_symbols(|_| target.clone())?.normalized();
        Ok(Self {
            magnitude: self.magnitude * multiplier,
            heating_value: Some(heating_value),
            ..self.clone()
        })
    }

    /// Adds another parameter, converted into this parameter's units.
    ///
    /// # Errors
    ///
    /// Fails unless carrier and heating value match exactly, or if the units
    /// are not convertible.
    pub fn checked_add(&self, ctx: &UnitContext, other: &Self) -> TechDataResult<Self> {
        self.check_same_tags(other)?;
        let converted = other.unit(ctx)?.convert_to(other.magnitude, &self.unit(ctx)?)?;
        Ok(self.combine_metadata(other, self.magnitude + converted))
    }

    /// Subtracts another parameter, converted into this parameter's units.
    pub fn checked_sub(&self, ctx: &UnitContext, other: &Self) -> TechDataResult<Self> {
        self.check_same_tags(other)?;
        let converted = other.unit(ctx)?.convert_to(other.magnitude, &self.unit(ctx)?)?;
        Ok(self.combine_metadata(other, self.magnitude - converted))
    }

    /// Multiplies two parameters.
    ///
    /// Heating values must match; carriers combine into a compound carrier,
    /// where a missing carrier acts as identity.
    pub fn checked_mul(&self, ctx: &UnitContext, other: &Self) -> TechDataResult<Self> {
        self.combine(ctx, other, 1)
    }

    /// Divides by another parameter. See [`Parameter::checked_mul`].
    pub fn checked_div(&self, ctx: &UnitContext, other: &Self) -> TechDataResult<Self> {
        self.combine(ctx, other, -1)
    }

    /// Raises magnitude, units, carrier and heating value to the power `n`.
    pub fn pow(&self, ctx: &UnitContext, n: i32) -> TechDataResult<Self> {
        let units = match &self.units {
            Some(_) => Some(self.unit(ctx)?.pow(n)?.normalized()),
            None => None,
        };
        let carrier = match &self.carrier {
            Some(c) => Some(ctx.parse_carrier(c)?.pow(n)?.normalized()),
            None => None,
        };
        let heating_value = match &self.heating_value {
            Some(h) => Some(ctx.parse_heating_value(h)?.pow(n)?.normalized()),
            None => None,
        };
        Ok(Self {
            magnitude: self.magnitude.powi(n),
            units,
            carrier,
            heating_value,
            ..self.clone()
        })
    }

    fn check_same_tags(&self, other: &Self) -> TechDataResult<()> {
        if self.carrier != other.carrier {
            return Err(TechDataError::IncompatibleCarrier(
                display_option(&self.carrier),
                display_option(&other.carrier),
            ));
        }
        self.check_same_heating_value(other)
    }

    fn check_same_heating_value(&self, other: &Self) -> TechDataResult<()> {
        if self.heating_value != other.heating_value {
            return Err(TechDataError::IncompatibleHeatingValue(
                display_option(&self.heating_value),
                display_option(&other.heating_value),
            ));
        }
        Ok(())
    }

    /// Multiplication (`exp == 1`) or division (`exp == -1`) on all three axes.
    fn combine(&self, ctx: &UnitContext, other: &Self, exp: i32) -> TechDataResult<Self> {
        self.check_same_heating_value(other)?;

        let units = if self.units.is_none() && other.units.is_none() {
            None
        } else {
            Some(
                self.unit(ctx)?
                    .multiply(&other.unit(ctx)?.pow(exp)?)?
                    .normalized(),
            )
        };
        let carrier = combine_tags(&self.carrier, &other.carrier, exp, |c| ctx.parse_carrier(c))?;
        let heating_value = combine_tags(&self.heating_value, &other.heating_value, exp, |h| {
            ctx.parse_heating_value(h)
        })?;

        let magnitude = if exp > 0 {
            self.magnitude * other.magnitude
        } else {
            self.magnitude / other.magnitude
        };
        Ok(Self {
            units,
            carrier,
            heating_value,
            ..self.combine_metadata(other, magnitude)
        })
    }

    fn combine_metadata(&self, other: &Self, magnitude: f64) -> Self {
        Self {
            magnitude,
            provenance: join_text(&self.provenance, &other.provenance),
            note: join_text(&self.note, &other.note),
            sources: self.sources.union(&other.sources),
            ..self.clone()
        }
    }
}

fn display_option(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "None".to_string())
}

fn join_text(a: &Option<String>, b: &Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(format!("{a}; {b}")),
        (Some(x), None) | (None, Some(x)) => Some(x.clone()),
        (None, None) => None,
    }
}

fn combine_tags(
    a: &Option<String>,
    b: &Option<String>,
    exp: i32,
    parse: impl Fn(&str) -> TechDataResult<ParsedUnit>,
) -> TechDataResult<Option<String>> {
    if a.is_none() && b.is_none() {
        return Ok(None);
    }
    let parse_or_identity = |tag: &Option<String>| match tag {
        Some(t) => parse(t),
        None => Ok(ParsedUnit::dimensionless()),
    };
    let combined = parse_or_identity(a)?.multiply(&parse_or_identity(b)?.pow(exp)?)?;
    Ok(Some(combined.normalized()))
}

impl Mul<f64> for &Parameter {
    type Output = Parameter;

    fn mul(self, rhs: f64) -> Parameter {
        self.with_magnitude(self.magnitude * rhs)
    }
}

impl Mul<f64> for Parameter {
    type Output = Parameter;

    fn mul(self, rhs: f64) -> Parameter {
        &self * rhs
    }
}

impl Div<f64> for &Parameter {
    type Output = Parameter;

    fn div(self, rhs: f64) -> Parameter {
        self.with_magnitude(self.magnitude / rhs)
    }
}

impl Div<f64> for Parameter {
    type Output = Parameter;

    fn div(self, rhs: f64) -> Parameter {
        &self / rhs
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.magnitude)?;
        if let Some(units) = &self.units {
            write!(f, " {units}")?;
        }
        let tags: Vec<&str> = [self.carrier.as_deref(), self.heating_value.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !tags.is_empty() {
            write!(f, " ({})", tags.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{CurrencyCodes, TableDeflator};
    use crate::source::Source;
    use crate::units::{Dimension, ParseError};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn ctx() -> UnitContext {
        UnitContext::bundled()
    }

    fn hydrogen(ctx: &UnitContext, magnitude: f64, units: &str) -> Parameter {
        Parameter::builder(magnitude)
            .units(units)
            .carrier("H2")
            .heating_value("LHV")
            .build(ctx)
            .unwrap()
    }

    #[test]
    fn test_construction_canonicalizes() {
        let ctx = ctx();
        let p = Parameter::builder(5.0)
            .units("EUR_2020 per kilowatt")
            .carrier("CH4")
            .heating_value("GCV")
            .build(&ctx)
            .unwrap();
        assert_eq!(p.units(), Some("EUR_2020 / kW"));
        assert_eq!(p.carrier(), Some("methane"));
        assert_eq!(p.heating_value(), Some("HHV"));
    }

    #[test]
    fn test_heating_value_requires_carrier() {
        let ctx = ctx();
        let result = Parameter::builder(1.0).units("kWh").heating_value("LHV").build(&ctx);
        assert!(matches!(result, Err(TechDataError::HeatingValueWithoutCarrier)));

        let ok = Parameter::builder(1.0).units("kWh").carrier("H2").build(&ctx);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_invalid_currency_fails_construction() {
        let ctx = ctx();
        let result = Parameter::builder(1.0).units("XYZ_2020/kW").build(&ctx);
        assert!(matches!(result, Err(TechDataError::InvalidCurrencyCodes(_))));
    }

    #[test]
    fn test_equality_distinguishes_none() {
        let ctx = ctx();
        let none = Parameter::builder(1.0).build(&ctx).unwrap();
        let dimensionless = Parameter::builder(1.0).units("dimensionless").build(&ctx).unwrap();
        assert_ne!(none, dimensionless);

        let a = Parameter::builder(1.0).units("kW").build(&ctx).unwrap();
        let b = Parameter::builder(1.0).units("kilowatt").build(&ctx).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, b.with_note(Some("x".to_string())));
    }

    #[test]
    fn test_add_converts_into_left_units() {
        let ctx = ctx();
        let a = hydrogen(&ctx, 1.0, "MWh");
        let b = hydrogen(&ctx, 500.0, "kWh");
        let sum = a.checked_add(&ctx, &b).unwrap();
        assert_relative_eq!(sum.magnitude(), 1.5);
        assert_eq!(sum.units(), Some("MWh"));
        assert_eq!(sum.carrier(), Some("hydrogen"));

        let diff = a.checked_sub(&ctx, &b).unwrap();
        assert_relative_eq!(diff.magnitude(), 0.5);
    }

    #[test]
    fn test_add_incompatible_tags() {
        let ctx = ctx();
        let h2 = hydrogen(&ctx, 1.0, "MWh");
        let ch4 = Parameter::builder(1.0)
            .units("MWh")
            .carrier("CH4")
            .heating_value("LHV")
            .build(&ctx)
            .unwrap();
        assert!(matches!(
            h2.checked_add(&ctx, &ch4),
            Err(TechDataError::IncompatibleCarrier(a, b)) if a == "hydrogen" && b == "methane"
        ));

        let hhv = h2.change_heating_value(&ctx, "HHV").unwrap();
        assert!(matches!(
            h2.checked_sub(&ctx, &hhv),
            Err(TechDataError::IncompatibleHeatingValue(_, _))
        ));
    }

    #[test]
    fn test_add_incompatible_units() {
        let ctx = ctx();
        let energy = hydrogen(&ctx, 1.0, "MWh");
        let mass = hydrogen(&ctx, 1.0, "t");
        assert!(matches!(
            energy.checked_add(&ctx, &mass),
            Err(TechDataError::Conversion(_))
        ));
    }

    #[test]
    fn test_metadata_merge() {
        let ctx = ctx();
        let a = Parameter::builder(1.0)
            .units("kW")
            .provenance("literature")
            .note("a")
            .sources([Source::new("DEA")].into_iter().collect())
            .build(&ctx)
            .unwrap();
        let b = Parameter::builder(2.0)
            .units("kW")
            .note("b")
            .sources([Source::new("DEA"), Source::new("IEA")].into_iter().collect())
            .build(&ctx)
            .unwrap();
        let sum = a.checked_add(&ctx, &b).unwrap();
        assert_eq!(sum.provenance(), Some("literature"));
        assert_eq!(sum.note(), Some("a; b"));
        assert_eq!(sum.sources().len(), 2);
    }

    #[test]
    fn test_mul_combines_carriers() {
        let ctx = ctx();
        let a = Parameter::builder(2.0).units("kW").carrier("H2").build(&ctx).unwrap();
        let b = Parameter::builder(3.0).units("h").carrier("CH4").build(&ctx).unwrap();
        let product = a.checked_mul(&ctx, &b).unwrap();
        assert_eq!(product.magnitude(), 6.0);
        assert_eq!(product.units(), Some("h * kW"));
        assert_eq!(product.carrier(), Some("hydrogen * methane"));
        assert_eq!(product.heating_value(), None);

        let ratio = a.checked_div(&ctx, &b).unwrap();
        assert_eq!(ratio.carrier(), Some("hydrogen / methane"));
        assert_eq!(ratio.units(), Some("kW / h"));
    }

    #[test]
    fn test_mul_missing_carrier_is_identity() {
        let ctx = ctx();
        let a = Parameter::builder(2.0).units("kW").carrier("H2").build(&ctx).unwrap();
        let scalar = Parameter::builder(3.0).build(&ctx).unwrap();
        let product = a.checked_mul(&ctx, &scalar).unwrap();
        assert_eq!(product.carrier(), Some("hydrogen"));
        assert_eq!(product.units(), Some("kW"));

        let inverse = scalar.checked_div(&ctx, &a).unwrap();
        assert_eq!(inverse.carrier(), Some("1 / hydrogen"));
        assert_eq!(inverse.units(), Some("1 / kW"));
    }

    #[test]
    fn test_mul_requires_same_heating_value() {
        let ctx = ctx();
        let lhv = hydrogen(&ctx, 1.0, "kWh");
        let plain = Parameter::builder(1.0).units("kWh").carrier("H2").build(&ctx).unwrap();
        assert!(matches!(
            lhv.checked_mul(&ctx, &plain),
            Err(TechDataError::IncompatibleHeatingValue(_, _))
        ));

        let squared = lhv.checked_mul(&ctx, &lhv).unwrap();
        assert_eq!(squared.heating_value(), Some("LHV^2"));
    }

    #[test]
    fn test_pow_matches_self_multiplication() {
        let ctx = ctx();
        let p = hydrogen(&ctx, 3.0, "kW");
        assert_eq!(p.pow(&ctx, 2).unwrap(), p.checked_mul(&ctx, &p).unwrap());
        let cubed = p.pow(&ctx, 3).unwrap();
        assert_eq!(cubed.magnitude(), 27.0);
        assert_eq!(cubed.units(), Some("kW^3"));
        assert_eq!(cubed.carrier(), Some("hydrogen^3"));
        assert_eq!(cubed.heating_value(), Some("LHV^3"));
    }

    #[test]
    fn test_pow_large_exponents() {
        let ctx = ctx();
        let watt = Parameter::builder(1.0).units("W").build(&ctx).unwrap();
        let raised = watt.pow(&ctx, 64).unwrap();
        assert_eq!(raised.units(), Some("W^64"));
        assert_eq!(raised.unit(&ctx).unwrap().dimension(), Dimension::POWER.pow(64));

        assert!(matches!(
            watt.pow(&ctx, i32::MAX),
            Err(TechDataError::UnitParse(ParseError::InvalidExponent(_)))
        ));
    }

    #[test]
    fn test_scalar_ops() {
        let ctx = ctx();
        let p = hydrogen(&ctx, 3.0, "kW").with_note(Some("n".to_string()));
        let doubled = &p * 2.0;
        assert_eq!(doubled.magnitude(), 6.0);
        assert_eq!(doubled.note(), Some("n"));
        assert_eq!((p / 3.0).magnitude(), 1.0);
    }

    #[test]
    fn test_to_round_trip() {
        let ctx = ctx();
        let p = hydrogen(&ctx, 1000.0, "USD_2020/kW");
        let direct = p.to(&ctx, "USD_2020/GW").unwrap();
        let via = p.to(&ctx, "USD_2020/MW").unwrap().to(&ctx, "USD_2020/GW").unwrap();
        assert_relative_eq!(direct.magnitude(), via.magnitude(), max_relative = 1e-12);
        assert_relative_eq!(direct.magnitude(), 1e9);
        assert_eq!(direct.carrier(), Some("hydrogen"));
    }

    #[test]
    fn test_to_refuses_currency_change() {
        let ctx = ctx();
        let p = hydrogen(&ctx, 1000.0, "USD_2020/kW");
        assert!(matches!(
            p.to(&ctx, "EUR_2025/kW"),
            Err(TechDataError::NotSupported(_))
        ));
    }

    fn resolver() -> CurrencyResolver {
        let wb = DeflationSource::WorldBank;
        let deflator = TableDeflator::new()
            .with_deflator(wb, "DEU", 2015, 100.0)
            .with_deflator(wb, "DEU", 2020, 110.0)
            .with_deflator(wb, "DEU", 2023, 125.0)
            .with_exchange_rate(wb, "DEU", 2015, 0.9)
            .with_exchange_rate(wb, "DEU", 2020, 0.88)
            .with_exchange_rate(wb, "DEU", 2023, 0.92);
        CurrencyResolver::new(Arc::new(CurrencyCodes::bundled()), deflator)
    }

    #[test]
    fn test_change_currency() {
        let ctx = ctx();
        let resolver = resolver();
        let p = Parameter::builder(100.0).units("EUR_2015/kW").build(&ctx).unwrap();
        let converted = p
            .change_currency(&ctx, &resolver, "EUR_2023", "DEU", Some(DeflationSource::WorldBank))
            .unwrap();
        assert_eq!(converted.units(), Some("EUR_2023 / kW"));
        // Both legs go through USD_2020 with DEU prices, leaving the deflator ratio
        assert_relative_eq!(converted.magnitude(), 125.0, max_relative = 1e-12);

        let again = converted
            .change_currency(&ctx, &resolver, "EUR_2023", "DEU", Some(DeflationSource::WorldBank))
            .unwrap();
        assert_eq!(again, converted);
    }

    #[test]
    fn test_change_currency_validation() {
        let ctx = ctx();
        let resolver = resolver();
        let p = Parameter::builder(1.0).units("EUR_2015/kW").build(&ctx).unwrap();
        let wb = Some(DeflationSource::WorldBank);
        assert!(matches!(
            p.change_currency(&ctx, &resolver, "XYZ_2020", "DEU", wb),
            Err(TechDataError::InvalidCurrencyCodes(_))
        ));
        assert!(matches!(
            p.change_currency(&ctx, &resolver, "EUR_2020", "ABC", wb),
            Err(TechDataError::UnknownCountry(_))
        ));

        let plain = Parameter::builder(1.0).units("kW").build(&ctx).unwrap();
        assert_eq!(
            plain.change_currency(&ctx, &resolver, "EUR_2020", "DEU", wb).unwrap(),
            plain
        );
    }

    #[test]
    fn test_adjust_inflation() {
        let ctx = ctx();
        let resolver = resolver();
        let p = Parameter::builder(100.0).units("EUR_2015/kW").build(&ctx).unwrap();
        let adjusted = p
            .adjust_inflation(&ctx, &resolver, 2020, "DEU", Some(DeflationSource::WorldBank))
            .unwrap();
        assert_eq!(adjusted.units(), Some("EUR_2020 / kW"));
        assert_relative_eq!(adjusted.magnitude(), 110.0, max_relative = 1e-12);
    }

    #[test]
    fn test_default_source_fallback() {
        let ctx = ctx();
        let p = Parameter::builder(100.0).units("EUR_2015/kW").build(&ctx).unwrap();

        let world_bank = resolver();
        assert_eq!(world_bank.default_source(), DeflationSource::WorldBank);
        let adjusted = p.adjust_inflation(&ctx, &world_bank, 2020, "DEU", None).unwrap();
        assert_relative_eq!(adjusted.magnitude(), 110.0, max_relative = 1e-12);

        // The table has no IMF series
        let imf = resolver().with_default_source(DeflationSource::Imf);
        assert!(matches!(
            p.adjust_inflation(&ctx, &imf, 2020, "DEU", None),
            Err(TechDataError::Deflation(_))
        ));
        assert!(p
            .adjust_inflation(&ctx, &imf, 2020, "DEU", Some(DeflationSource::WorldBank))
            .is_ok());
    }

    #[test]
    fn test_change_heating_value() {
        let ctx = ctx();
        let p = hydrogen(&ctx, 1.0, "kWh");
        let hhv = p.change_heating_value(&ctx, "HHV").unwrap();
        assert_relative_eq!(hhv.magnitude(), 141.8 / 119.6, max_relative = 1e-12);
        assert_eq!(hhv.heating_value(), Some("HHV"));

        let back = hhv.change_heating_value(&ctx, "NCV").unwrap();
        assert_relative_eq!(back.magnitude(), 1.0, max_relative = 1e-12);

        assert_eq!(p.change_heating_value(&ctx, "LHV").unwrap(), p);
    }

    #[test]
    fn test_change_heating_value_uses_carrier_exponents() {
        let ctx = ctx();
        let p = Parameter::builder(1.0)
            .carrier("hydrogen / methane")
            .heating_value("LHV")
            .build(&ctx)
            .unwrap();
        let hhv = p.change_heating_value(&ctx, "HHV").unwrap();
        let expected = (141.8 / 119.6) / (55.5 / 50.0);
        assert_relative_eq!(hhv.magnitude(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_change_heating_value_unknown_density() {
        let ctx = ctx();
        let p = Parameter::builder(2.0)
            .carrier("electricity")
            .heating_value("LHV")
            .build(&ctx)
            .unwrap();
        let hhv = p.change_heating_value(&ctx, "HHV").unwrap();
        assert_eq!(hhv.magnitude(), 2.0);
    }

    #[test]
    fn test_change_heating_value_requires_tags() {
        let ctx = ctx();
        let no_carrier = Parameter::builder(1.0).units("kWh").build(&ctx).unwrap();
        assert!(matches!(
            no_carrier.change_heating_value(&ctx, "HHV"),
            Err(TechDataError::HeatingValueConversion(_))
        ));
        let no_hv = Parameter::builder(1.0).carrier("H2").build(&ctx).unwrap();
        assert!(matches!(
            no_hv.change_heating_value(&ctx, "HHV"),
            Err(TechDataError::HeatingValueConversion(_))
        ));
    }

    #[test]
    fn test_display() {
        let ctx = ctx();
        assert_eq!(
            hydrogen(&ctx, 2.5, "kW").to_string(),
            "2.5 kW (hydrogen, LHV)"
        );
        assert_eq!(Parameter::builder(1.0).build(&ctx).unwrap().to_string(), "1");
    }

    #[test]
    fn test_serde_round_trip() {
        let ctx = ctx();
        let p = hydrogen(&ctx, 2.5, "EUR_2020/kW");
        let json = serde_json::to_string(&p).unwrap();
        let parsed: Parameter = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.canonicalize(&ctx).unwrap(), p);
    }
}
