use crate::units::{ConversionError, ParseError};
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum TechDataError {
    #[error(transparent)]
    UnitParse(#[from] ParseError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Heating value cannot be set without a carrier")]
    HeatingValueWithoutCarrier,
    #[error("Operation not permitted on parameters with different carriers: '{0}' and '{1}'")]
    IncompatibleCarrier(String, String),
    #[error("Operation not permitted on parameters with different heating values: '{0}' and '{1}'")]
    IncompatibleHeatingValue(String, String),
    #[error("The collection contains one or more parameters with incompatible units/heating values/carriers:\n* {first}, and\n* {other}")]
    IncompatibleParameters { first: String, other: String },
    #[error("Cannot change heating value: {0}")]
    HeatingValueConversion(String),

    #[error("Currency token(s) with invalid 3-letter currency codes: {}", .0.join(", "))]
    InvalidCurrencyCodes(Vec<String>),
    #[error("Invalid currency token '{0}', expected the form CODE_YYYY (e.g. USD_2020)")]
    InvalidCurrencyToken(String),
    #[error("Unknown ISO3 country code '{0}'")]
    UnknownCountry(String),
    #[error("Unknown currency code '{0}'")]
    UnknownCurrencyCode(String),
    #[error("Currency '{code}' is used by several countries ({}) and has no representative country", .countries.join(", "))]
    AmbiguousCurrency { code: String, countries: Vec<String> },
    #[error("Unknown deflation source '{0}', expected one of: worldbank, imf")]
    UnknownDeflationSource(String),
    #[error("Deflation data unavailable: {0}")]
    Deflation(String),

    #[error("Not enough data points to fit: {available} data point(s) for {required} missing parameter(s)")]
    InsufficientData { available: usize, required: usize },
    #[error("The following parameters are not set: {}", .0.join(", "))]
    UnresolvedParameters(Vec<String>),
    #[error("Invalid parameterization: {0}")]
    InvalidParameterization(String),
    #[error("Fit did not converge: {0}")]
    FitFailed(String),

    #[error("Parameter '{name}' not found in technology '{technology}'. Available parameters: {}", .available.join(", "))]
    MissingParameter {
        name: String,
        technology: String,
        available: Vec<String>,
    },
    #[error("Cannot {0} an empty technology collection")]
    EmptyCollection(&'static str),
    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("{0}")]
    NotSupported(String),
    #[error("{0} is not implemented")]
    NotImplemented(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Convenience type for `Result<T, TechDataError>`.
pub type TechDataResult<T> = Result<T, TechDataError>;
