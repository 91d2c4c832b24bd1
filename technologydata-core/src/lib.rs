//! Techno-economic parameters for energy technologies.
//!
//! - [`parameter::Parameter`]: a magnitude with units, energy carrier and
//!   heating value, supporting unit-aware arithmetic and conversion.
//! - [`currency`]: currency-year tokens such as `EUR_2020`, their
//!   validation, and inflation/exchange-rate adjustment.
//! - [`growth`]: growth curves fitted to parameter time series.
//! - [`technology_collection::TechnologyCollection`]: collections of
//!   technologies with fitting and projection to future years.
//!
//! All unit handling goes through an explicit [`units::UnitContext`].

pub mod config;
pub mod constants;
pub mod currency;
pub mod growth;
pub mod parameter;
pub mod source;
pub mod technology;
pub mod technology_collection;
pub mod units;

pub mod errors;

pub use errors::{TechDataError, TechDataResult};
