//! Logistic growth from an anchor observation.
//!
//! A logistic curve `L / (1 + exp(-k (x - x0)))` is often described by its
//! growth rate `k`, carrying capacity `L` and midpoint `x0`. Given one
//! observed point on the curve, any two of the three determine the third.

use super::{GrowthKind, GrowthModel};
use crate::errors::{TechDataError, TechDataResult};

/// Builds a resolved logistic model through the anchor `(x_a, y_a)`.
///
/// Exactly two of `growth_rate`, `carrying_capacity` and `midpoint` must be
/// given; the third is derived so that the curve passes through the anchor.
///
/// # Errors
///
/// Fails with [`TechDataError::InvalidParameterization`] if not exactly two
/// values are given, if the anchor value is not strictly positive, or if the
/// derived value is not finite or not sensible:
///
/// - a derived midpoint must lie strictly after the anchor year,
/// - a derived carrying capacity must exceed the anchor value,
/// - a derived growth rate must be strictly positive.
///
/// # Examples
///
/// ```
/// use technologydata_core::growth::logistic_from_anchor;
///
/// let model = logistic_from_anchor((2020.0, 10.0), Some(0.5), Some(100.0), None).unwrap();
/// assert!((model.project(2020.0).unwrap() - 10.0).abs() < 1e-9);
/// ```
pub fn logistic_from_anchor(
    anchor: (f64, f64),
    growth_rate: Option<f64>,
    carrying_capacity: Option<f64>,
    midpoint: Option<f64>,
) -> TechDataResult<GrowthModel> {
    let (x_a, y_a) = anchor;
    if !(y_a > 0.0 && y_a.is_finite() && x_a.is_finite()) {
        return Err(invalid(format!(
            "the anchor value must be finite and strictly positive, got ({x_a}, {y_a})"
        )));
    }

    let (k, l, x0) = match (growth_rate, carrying_capacity, midpoint) {
        (Some(k), Some(l), None) => {
            check_capacity(l, y_a)?;
            let x0 = x_a + (l / y_a - 1.0).ln() / k;
            if !(x0.is_finite() && x0 > x_a) {
                return Err(invalid(format!(
                    "derived midpoint {x0} must lie after the anchor year {x_a}"
                )));
            }
            (k, l, x0)
        }
        (Some(k), None, Some(x0)) => {
            let l = y_a * (1.0 + (-k * (x_a - x0)).exp());
            if !(l.is_finite() && l > y_a) {
                return Err(invalid(format!(
                    "derived carrying capacity {l} must exceed the anchor value {y_a}"
                )));
            }
            (k, l, x0)
        }
        (None, Some(l), Some(x0)) => {
            check_capacity(l, y_a)?;
            let k = -(l / y_a - 1.0).ln() / (x_a - x0);
            if !(k.is_finite() && k > 0.0) {
                return Err(invalid(format!("derived growth rate {k} must be positive")));
            }
            (k, l, x0)
        }
        _ => {
            return Err(invalid(
                "exactly two of growth rate, carrying capacity and midpoint must be given"
                    .to_string(),
            ))
        }
    };

    GrowthModel::new(GrowthKind::Logistic)
        .with_parameter("L", l)?
        .with_parameter("k", k)?
        .with_parameter("x0", x0)
}

fn check_capacity(l: f64, y_a: f64) -> TechDataResult<()> {
    if l > y_a {
        Ok(())
    } else {
        Err(invalid(format!(
            "carrying capacity {l} must exceed the anchor value {y_a}"
        )))
    }
}

fn invalid(message: String) -> TechDataError {
    TechDataError::InvalidParameterization(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Some(0.3), Some(50.0), None)]
    #[case(Some(0.3), None, Some(2030.0))]
    #[case(None, Some(50.0), Some(2030.0))]
    fn test_curve_passes_through_anchor(
        #[case] k: Option<f64>,
        #[case] l: Option<f64>,
        #[case] x0: Option<f64>,
    ) {
        let model = logistic_from_anchor((2020.0, 5.0), k, l, x0).unwrap();
        assert!(model.is_resolved());
        assert_relative_eq!(model.project(2020.0).unwrap(), 5.0, max_relative = 1e-9);
    }

    #[test]
    fn test_derived_values() {
        // y_a = L / 2 at the midpoint, so L = 2 * y_a
        let model = logistic_from_anchor((2030.0, 5.0), Some(0.3), None, Some(2030.0)).unwrap();
        assert_relative_eq!(model.parameter("L").unwrap(), 10.0);

        let model = logistic_from_anchor((2020.0, 25.0), None, Some(100.0), Some(2030.0)).unwrap();
        assert_relative_eq!(model.parameter("k").unwrap(), 3f64.ln() / 10.0, max_relative = 1e-12);
    }

    #[rstest]
    #[case(None, None, None)]
    #[case(Some(0.3), None, None)]
    #[case(Some(0.3), Some(50.0), Some(2030.0))]
    fn test_requires_exactly_two(
        #[case] k: Option<f64>,
        #[case] l: Option<f64>,
        #[case] x0: Option<f64>,
    ) {
        assert!(matches!(
            logistic_from_anchor((2020.0, 5.0), k, l, x0),
            Err(TechDataError::InvalidParameterization(_))
        ));
    }

    #[test]
    fn test_rejects_nonsensical_derivations() {
        // Capacity below twice the anchor puts the midpoint in the past
        assert!(logistic_from_anchor((2020.0, 5.0), Some(0.3), Some(8.0), None).is_err());
        // Capacity below the anchor value
        assert!(logistic_from_anchor((2020.0, 5.0), None, Some(4.0), Some(2030.0)).is_err());
        // Midpoint before the anchor while the anchor is below half capacity
        assert!(logistic_from_anchor((2020.0, 5.0), None, Some(50.0), Some(2010.0)).is_err());
        // Non-positive anchor value
        assert!(logistic_from_anchor((2020.0, 0.0), Some(0.3), Some(50.0), None).is_err());
    }
}
