//! Dimensional analysis over SI base quantities plus money.
//!
//! Every currency-year token (`USD_2020`, `EUR_2015`, ...) maps onto the single
//! [`BaseQuantity::Currency`] axis. `USD_2020 / kW` and `EUR_2015 / kW` are
//! therefore dimensionally equal; telling them apart is the job of the
//! currency resolver, not of this module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Mul, Neg, Sub};

/// One axis of a [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseQuantity {
    Mass,
    Length,
    Time,
    Temperature,
    Amount,
    Current,
    Luminosity,
    Currency,
}

impl BaseQuantity {
    /// All axes in display order.
    pub const ALL: [BaseQuantity; 8] = [
        Self::Mass,
        Self::Length,
        Self::Time,
        Self::Temperature,
        Self::Amount,
        Self::Current,
        Self::Luminosity,
        Self::Currency,
    ];

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Mass => "M",
            Self::Length => "L",
            Self::Time => "T",
            Self::Temperature => "Θ",
            Self::Amount => "N",
            Self::Current => "I",
            Self::Luminosity => "J",
            Self::Currency => "¤",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Integer exponents over the [`BaseQuantity`] axes.
///
/// Power is `M L^2 T^-3`; a specific investment cost such as `EUR_2020 / kW`
/// is `M^-1 L^-2 T^3 ¤`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Dimension([i32; 8]);

impl Dimension {
    pub const MASS: Self = Self::base(BaseQuantity::Mass);
    pub const LENGTH: Self = Self::base(BaseQuantity::Length);
    pub const TIME: Self = Self::base(BaseQuantity::Time);
    pub const TEMPERATURE: Self = Self::base(BaseQuantity::Temperature);
    pub const AMOUNT: Self = Self::base(BaseQuantity::Amount);
    pub const CURRENT: Self = Self::base(BaseQuantity::Current);
    pub const LUMINOSITY: Self = Self::base(BaseQuantity::Luminosity);
    pub const CURRENCY: Self = Self::base(BaseQuantity::Currency);

    pub const AREA: Self = Self::LENGTH.pow(2);
    pub const VOLUME: Self = Self::LENGTH.pow(3);
    pub const ENERGY: Self = Self::from_exponents(&[
        (BaseQuantity::Mass, 1),
        (BaseQuantity::Length, 2),
        (BaseQuantity::Time, -2),
    ]);
    pub const POWER: Self = Self::from_exponents(&[
        (BaseQuantity::Mass, 1),
        (BaseQuantity::Length, 2),
        (BaseQuantity::Time, -3),
    ]);
    pub const PRESSURE: Self = Self::from_exponents(&[
        (BaseQuantity::Mass, 1),
        (BaseQuantity::Length, -1),
        (BaseQuantity::Time, -2),
    ]);

    #[must_use]
    pub const fn dimensionless() -> Self {
        Self([0; 8])
    }

    /// A single axis raised to the first power.
    #[must_use]
    pub const fn base(quantity: BaseQuantity) -> Self {
        Self::from_exponents(&[(quantity, 1)])
    }

    /// Builds a dimension from `(axis, exponent)` pairs; repeated axes accumulate.
    #[must_use]
    pub const fn from_exponents(pairs: &[(BaseQuantity, i32)]) -> Self {
        let mut exps = [0i32; 8];
        let mut i = 0;
        while i < pairs.len() {
            exps[pairs[i].0.index()] += pairs[i].1;
            i += 1;
        }
        Self(exps)
    }

    /// Exponent along one axis.
    #[must_use]
    pub const fn exponent(&self, quantity: BaseQuantity) -> i32 {
        self.0[quantity.index()]
    }

    #[must_use]
    pub const fn is_dimensionless(&self) -> bool {
        self.is_compatible(&Self::dimensionless())
    }

    /// Conversion is only possible between identical dimensions.
    #[must_use]
    pub const fn is_compatible(&self, other: &Self) -> bool {
        let mut i = 0;
        while i < 8 {
            if self.0[i] != other.0[i] {
                return false;
            }
            i += 1;
        }
        true
    }

    /// # Panics
    ///
    /// On exponent overflow; see [`Dimension::checked_pow`].
    #[must_use]
    pub const fn pow(&self, exp: i32) -> Self {
        match self.checked_pow(exp) {
            Some(dim) => dim,
            None => panic!("dimension exponent overflow"),
        }
    }

    /// `None` if any exponent overflows.
    #[must_use]
    pub const fn checked_pow(&self, exp: i32) -> Option<Self> {
        let mut exps = self.0;
        let mut i = 0;
        while i < 8 {
            exps[i] = match exps[i].checked_mul(exp) {
                Some(e) => e,
                None => return None,
            };
            i += 1;
        }
        Some(Self(exps))
    }

    /// Product of two dimensions; `None` if any exponent overflows.
    #[must_use]
    pub fn checked_mul(&self, other: &Self) -> Option<Self> {
        let mut exps = self.0;
        for (lhs, rhs) in exps.iter_mut().zip(other.0) {
            *lhs = lhs.checked_add(rhs)?;
        }
        Some(Self(exps))
    }
}

impl Mul for Dimension {
    type Output = Self;

    /// # Panics
    ///
    /// On exponent overflow; see [`Dimension::checked_mul`].
    fn mul(self, rhs: Self) -> Self {
        match self.checked_mul(&rhs) {
            Some(dim) => dim,
            None => panic!("dimension exponent overflow"),
        }
    }
}

impl Sub for Dimension {
    type Output = Self;

    /// Division of quantities.
    fn sub(self, rhs: Self) -> Self {
        self * -rhs
    }
}

impl Neg for Dimension {
    type Output = Self;

    /// Reciprocal.
    fn neg(self) -> Self {
        self.pow(-1)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("dimensionless");
        }
        let mut first = true;
        for quantity in BaseQuantity::ALL {
            let exp = self.exponent(quantity);
            if exp == 0 {
                continue;
            }
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            match exp {
                1 => f.write_str(quantity.symbol())?,
                _ => write!(f, "{}^{exp}", quantity.symbol())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensionless() {
        let dim = Dimension::dimensionless();
        assert!(dim.is_dimensionless());
        assert_eq!(dim.to_string(), "dimensionless");
    }

    #[test]
    fn test_energy_power_time() {
        assert_eq!(Dimension::ENERGY - Dimension::TIME, Dimension::POWER);
        assert_eq!(Dimension::POWER * Dimension::TIME, Dimension::ENERGY);
    }

    #[test]
    fn test_currency_axis() {
        let specific_cost = Dimension::CURRENCY - Dimension::POWER;
        assert_eq!(specific_cost.exponent(BaseQuantity::Currency), 1);
        assert_eq!(specific_cost.exponent(BaseQuantity::Mass), -1);
        assert!(!specific_cost.is_compatible(&(-Dimension::POWER)));
    }

    #[test]
    fn test_repeated_axes_accumulate() {
        let dim = Dimension::from_exponents(&[(BaseQuantity::Length, 1), (BaseQuantity::Length, 2)]);
        assert_eq!(dim, Dimension::VOLUME);
    }

    #[test]
    fn test_large_exponents_stay_distinct() {
        let up = Dimension::LENGTH.pow(128);
        assert_eq!(up.exponent(BaseQuantity::Length), 128);
        assert!(!up.is_compatible(&Dimension::LENGTH.pow(-128)));
        assert_eq!(Dimension::POWER.pow(64).exponent(BaseQuantity::Time), -192);
    }

    #[test]
    fn test_checked_overflow() {
        assert_eq!(Dimension::POWER.checked_pow(i32::MAX), None);
        let huge = Dimension::LENGTH.pow(i32::MAX);
        assert_eq!(huge.checked_mul(&Dimension::LENGTH), None);
        assert_eq!(huge.checked_mul(&Dimension::MASS).map(|d| d.exponent(BaseQuantity::Mass)), Some(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Dimension::MASS.to_string(), "M");
        assert_eq!(Dimension::AREA.to_string(), "L^2");
        assert_eq!(Dimension::POWER.to_string(), "M L^2 T^-3");
        assert_eq!(
            (Dimension::CURRENCY - Dimension::ENERGY).to_string(),
            "M^-1 L^-2 T^2 ¤"
        );
    }
}
