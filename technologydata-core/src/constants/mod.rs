//! Physical constants of energy carriers.

pub mod energy_density;

pub use energy_density::{
    energy_density, hhv_to_lhv_ratio, EnergyDensity, ENERGY_DENSITY_HHV, ENERGY_DENSITY_LHV,
    ENERGY_DENSITY_UNITS,
};
