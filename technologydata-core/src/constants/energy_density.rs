//! Gravimetric energy densities of energy carriers
//!
//! Values are per heating-value convention, in GJ/t. The ratio of the higher
//! to the lower heating value of a carrier is what
//! [`Parameter::change_heating_value`](crate::parameter::Parameter::change_heating_value)
//! rescales by.

use crate::errors::TechDataResult;
use crate::parameter::Parameter;
use crate::units::{UnitContext, HHV, LHV};

/// Units of every tabulated energy density.
pub const ENERGY_DENSITY_UNITS: &str = "GJ/t";

/// Energy density of one carrier under one heating-value convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDensity {
    /// Canonical carrier name.
    pub carrier: &'static str,
    /// Energy density in GJ/t.
    pub magnitude: f64,
}

impl EnergyDensity {
    /// The density as a parameter tagged with its carrier and `heating_value`.
    pub fn to_parameter(&self, ctx: &UnitContext, heating_value: &str) -> TechDataResult<Parameter> {
        Parameter::builder(self.magnitude)
            .units(ENERGY_DENSITY_UNITS)
            .carrier(self.carrier)
            .heating_value(heating_value)
            .build(ctx)
    }
}

/// Lower heating values.
pub static ENERGY_DENSITY_LHV: &[EnergyDensity] = &[
    EnergyDensity {
        carrier: "hydrogen",
        magnitude: 119.6,
    },
    EnergyDensity {
        carrier: "methane",
        magnitude: 50.0,
    },
];

/// Higher heating values.
pub static ENERGY_DENSITY_HHV: &[EnergyDensity] = &[
    EnergyDensity {
        carrier: "hydrogen",
        magnitude: 141.8,
    },
    EnergyDensity {
        carrier: "methane",
        magnitude: 55.5,
    },
];

/// Looks up the energy density of a canonical carrier name.
///
/// `heating_value` is `"LHV"` or `"HHV"`; anything else yields `None`.
pub fn energy_density(carrier: &str, heating_value: &str) -> Option<EnergyDensity> {
    let table = match heating_value {
        LHV => ENERGY_DENSITY_LHV,
        HHV => ENERGY_DENSITY_HHV,
        _ => return None,
    };
    table.iter().find(|d| d.carrier == carrier).copied()
}

/// Ratio of the higher to the lower heating value of a carrier.
pub fn hhv_to_lhv_ratio(carrier: &str) -> Option<f64> {
    let lhv = energy_density(carrier, LHV)?;
    let hhv = energy_density(carrier, HHV)?;
    Some(hhv.magnitude / lhv.magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn test_lookup() {
        assert_eq!(energy_density("hydrogen", LHV).unwrap().magnitude, 119.6);
        assert_eq!(energy_density("methane", HHV).unwrap().magnitude, 55.5);
        assert!(energy_density("ammonia", LHV).is_none());
        assert!(energy_density("hydrogen", "MHV").is_none());
    }

    #[test]
    fn test_ratio() {
        assert!(is_close!(hhv_to_lhv_ratio("hydrogen").unwrap(), 141.8 / 119.6));
        assert!(is_close!(hhv_to_lhv_ratio("methane").unwrap(), 1.11));
        assert!(hhv_to_lhv_ratio("carbon").is_none());
    }

    #[test]
    fn test_as_parameter() {
        let ctx = UnitContext::bundled();
        let density = energy_density("hydrogen", LHV).unwrap();
        let param = density.to_parameter(&ctx, LHV).unwrap();
        assert_eq!(param.units(), Some("GJ / t"));
        assert_eq!(param.carrier(), Some("hydrogen"));
        assert_eq!(param.heating_value(), Some("LHV"));

        let per_kg = param.to(&ctx, "MJ/kg").unwrap();
        assert!(is_close!(per_kg.magnitude(), 119.6));
    }
}
