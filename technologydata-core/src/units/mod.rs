//! Unit parsing, normalization, and conversion for techno-economic parameters.
//!
//! Units of a parameter live on three independent axes:
//!
//! - **physical units** with currency-year tokens (`EUR_2020 / kW`),
//! - **energy carriers** (`hydrogen`, `hydrogen / methane`),
//! - **heating values** (`LHV`, `HHV`).
//!
//! Each axis has its own registry inside a [`UnitContext`], so a carrier name
//! such as `H2` is never mistaken for a physical unit. All three are parsed by
//! the same grammar and combine with the same algebra.
//!
//! # Quick Start
//!
//! ```
//! use technologydata_core::units::UnitContext;
//!
//! let ctx = UnitContext::bundled();
//!
//! // Flexible syntax, canonical output
//! let u1 = ctx.parse_unit("EUR_2020/kilowatt").unwrap();
//! let u2 = ctx.parse_unit("EUR_2020 per kW").unwrap();
//! assert_eq!(u1, u2);
//! assert_eq!(u1.normalized(), "EUR_2020 / kW");
//!
//! // Conversion factors between compatible units
//! let mwh = ctx.parse_unit("MWh").unwrap();
//! let gj = ctx.parse_unit("GJ").unwrap();
//! assert!((mwh.conversion_factor(&gj).unwrap() - 3.6).abs() < 1e-12);
//!
//! // Carriers live on their own axis
//! let carrier = ctx.parse_carrier("H2 * CH4").unwrap();
//! assert_eq!(carrier.normalized(), "hydrogen * methane");
//! ```
//!
//! # Supported Syntax
//!
//! | Notation | Meaning |
//! |----------|---------|
//! | `m^2`, `m**2`, `m2` | Square metres |
//! | `EUR_2020/kW`, `EUR_2020 kW^-1`, `EUR_2020 per kW` | Euro (2020) per kilowatt |
//! | `kW h`, `kW*h`, `kW·h` | Kilowatt-hours |
//! | `1 / kW` | Reciprocal kilowatt |
//!
//! # Currency Units
//!
//! Currency-year tokens share one dimension, so `USD_2020/kW` and
//! `EUR_2015/kW` are compatible. Their relative value depends on exchange
//! rates and deflators, so [`Unit::conversion_factor`] refuses to convert
//! between them; use [`convert`] with explicit rates instead.
//!
//! # Module Structure
//!
//! - [`dimension`]: Physical dimensions plus the currency axis
//! - [`parser`]: Unit string parsing and normalization
//! - [`registry`]: Known physical units and SI prefixes
//! - [`tags`]: Carrier and heating-value registries
//! - [`conversion`]: Resolved units and conversion factors
//! - [`context`]: The bundle of all registries

pub mod context;
pub mod conversion;
pub mod dimension;
pub mod parser;
pub mod registry;
pub mod tags;

pub use context::UnitContext;
pub use conversion::{convert, ConversionError, Unit};
pub use dimension::{BaseQuantity, Dimension};
pub use parser::{ParseError, ParsedUnit};
pub use registry::UnitRegistry;
pub use tags::{TagRegistry, HHV, LHV};
