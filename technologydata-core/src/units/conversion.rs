//! Resolved units and the conversions between them.
//!
//! This module provides the resolved [`Unit`] type produced by
//! [`UnitContext::parse_unit`](super::UnitContext::parse_unit), and the pure
//! [`convert`] function used for currency conversion.
//!
//! A `Unit` carries everything needed for conversion, so no registry access
//! happens after parsing:
//!
//! - the canonical expression,
//! - its dimension (physical axes plus the currency axis),
//! - the SI factor of its physical part,
//! - its currency-year components.
//!
//! Currency-year tokens have no fixed factor. Converting between two units
//! that mention different currency tokens needs explicit rates (see
//! [`convert`]); [`Unit::conversion_factor`] refuses such pairs.
//!
//! # Example
//!
//! ```
//! use technologydata_core::units::UnitContext;
//!
//! let ctx = UnitContext::bundled();
//! let mwh = ctx.parse_unit("EUR_2020/MWh").unwrap();
//! let kwh = ctx.parse_unit("EUR_2020 / kWh").unwrap();
//! let factor = mwh.conversion_factor(&kwh).unwrap();
//! assert!((factor - 1e-3).abs() < 1e-12);
//! ```

use super::dimension::Dimension;
use super::parser::{ParseError, ParsedUnit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Error type for unit conversion failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Units have incompatible dimensions.
    #[error(
        "cannot convert from '{from_unit}' to '{to_unit}': incompatible dimensions ({from} vs {to})"
    )]
    IncompatibleDimensions {
        from: Dimension,
        to: Dimension,
        from_unit: String,
        to_unit: String,
    },
    /// Units mention different currency-year tokens and no rates were supplied.
    #[error(
        "cannot convert from '{from_unit}' to '{to_unit}': currency composition differs, use change_currency"
    )]
    CurrencyMismatch { from_unit: String, to_unit: String },
    /// A currency token has no rate in the supplied rate table.
    #[error("no conversion rate supplied for currency '{0}'")]
    MissingRate(String),
    #[error(transparent)]
    Exponent(#[from] ParseError),
}

/// A parsed, canonicalized and resolved unit.
///
/// # Equality
///
/// Two units are equal if they have the same canonical representation,
/// so `kilowatt` and `kW` compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Canonical components, physical and currency.
    parsed: ParsedUnit,
    /// Combined dimension including the currency axis.
    dimension: Dimension,
    /// SI factor of the physical components only.
    si_factor: f64,
    /// Currency-year components only.
    currencies: ParsedUnit,
}

impl Unit {
    pub(crate) fn new(
        parsed: ParsedUnit,
        dimension: Dimension,
        si_factor: f64,
        currencies: ParsedUnit,
    ) -> Self {
        Self {
            parsed,
            dimension,
            si_factor,
            currencies,
        }
    }

    /// The dimensionless unit.
    #[must_use]
    pub fn dimensionless() -> Self {
        Self::new(
            ParsedUnit::dimensionless(),
            Dimension::dimensionless(),
            1.0,
            ParsedUnit::dimensionless(),
        )
    }

    /// Returns the canonical components.
    #[must_use]
    pub fn parsed(&self) -> &ParsedUnit {
        &self.parsed
    }

    /// Returns the normalized string representation.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.parsed.normalized()
    }

    /// Returns the dimension of this unit, including the currency axis.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Returns the conversion factor of the physical part to SI base units.
    #[must_use]
    pub fn to_si_factor(&self) -> f64 {
        self.si_factor
    }

    /// Returns the currency-year components of this unit.
    #[must_use]
    pub fn currencies(&self) -> &ParsedUnit {
        &self.currencies
    }

    /// Returns true if any currency-year token appears in this unit.
    #[must_use]
    pub fn has_currency(&self) -> bool {
        !self.currencies.has_no_components()
    }

    /// Returns true if this unit is dimensionless.
    #[must_use]
    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    /// Returns true if this unit has the same dimension as `other`.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.dimension.is_compatible(&other.dimension)
    }

    /// Calculates the conversion factor from this unit to `other`.
    ///
    /// # Errors
    ///
    /// Fails if the dimensions differ or if the two units do not mention
    /// exactly the same currency-year tokens.
    pub fn conversion_factor(&self, other: &Self) -> Result<f64, ConversionError> {
        self.check_dimension(other)?;
        if self.currencies != other.currencies {
            return Err(ConversionError::CurrencyMismatch {
                from_unit: self.normalized(),
                to_unit: other.normalized(),
            });
        }

        // value_self * factor_self = SI_value = value_other * factor_other
        Ok(self.si_factor / other.si_factor)
    }

    /// Converts a value from this unit to the target unit.
    pub fn convert_to(&self, value: f64, other: &Self) -> Result<f64, ConversionError> {
        Ok(value * self.conversion_factor(other)?)
    }

    /// Multiplies this unit by another unit.
    ///
    /// # Errors
    ///
    /// Fails with [`ParseError::InvalidExponent`] if an exponent overflows.
    pub fn multiply(&self, other: &Self) -> Result<Self, ParseError> {
        let dimension = self
            .dimension
            .checked_mul(&other.dimension)
            .ok_or_else(|| {
                ParseError::InvalidExponent(format!("{} * {}", self.normalized(), other.normalized()))
            })?;
        Ok(Self::new(
            self.parsed.multiply(&other.parsed)?,
            dimension,
            self.si_factor * other.si_factor,
            self.currencies.multiply(&other.currencies)?,
        ))
    }

    /// Divides this unit by another unit. See [`Unit::multiply`].
    pub fn divide(&self, other: &Self) -> Result<Self, ParseError> {
        self.multiply(&other.pow(-1)?)
    }

    /// Raises this unit to an integer power. See [`Unit::multiply`].
    pub fn pow(&self, exp: i32) -> Result<Self, ParseError> {
        let dimension = self
            .dimension
            .checked_pow(exp)
            .ok_or_else(|| ParseError::InvalidExponent(format!("({})^{exp}", self.normalized())))?;
        Ok(Self::new(
            self.parsed.pow(exp)?,
            dimension,
            self.si_factor.powi(exp),
            self.currencies.pow(exp)?,
        ))
    }

    fn check_dimension(&self, other: &Self) -> Result<(), ConversionError> {
        if self.dimension.is_compatible(&other.dimension) {
            Ok(())
        } else {
            Err(ConversionError::IncompatibleDimensions {
                from: self.dimension,
                to: other.dimension,
                from_unit: self.normalized(),
                to_unit: other.normalized(),
            })
        }
    }
}

/// Converts `magnitude` from one unit to another using explicit currency rates.
///
/// `rates` maps a currency-year token to the value of one unit of that
/// currency expressed in the reference currency. Tokens equal to `reference`
/// have an implicit rate of 1. Tokens that appear identically on both sides
/// cancel and need no rate.
///
/// # Errors
///
/// Fails if the dimensions differ or a needed rate is missing.
pub fn convert(
    magnitude: f64,
    from: &Unit,
    to: &Unit,
    rates: &HashMap<String, f64>,
    reference: &str,
) -> Result<f64, ConversionError> {
    from.check_dimension(to)?;

    // Whatever is left after cancelling shared tokens needs a rate
    let net = from.currencies.divide(&to.currencies)?;
    let mut factor = from.si_factor / to.si_factor;
    for (token, &exp) in net.components() {
        let rate = if token == reference {
            1.0
        } else {
            *rates
                .get(token)
                .ok_or_else(|| ConversionError::MissingRate(token.clone()))?
        };
        factor *= rate.powi(exp);
    }
    Ok(magnitude * factor)
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.parsed == other.parsed
    }
}

impl Eq for Unit {}

impl std::hash::Hash for Unit {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.parsed.hash(state);
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}
