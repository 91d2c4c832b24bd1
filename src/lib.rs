pub use technologydata_core::*;

#[cfg(feature = "python")]
mod python;
