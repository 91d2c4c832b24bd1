//! Currency-year tokens embedded in unit strings.
//!
//! A currency-year token has the form `{CODE}_{YYYY}`, for example `USD_2020`
//! or `EUR_2015`. Tokens are found anywhere in a unit string, delimited by
//! word boundaries, so `EUR_2015/USD_2020` holds two of them.

use super::codes::CurrencyCodes;
use crate::errors::{TechDataError, TechDataResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static CURRENCY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{3})_(\d{4})\b").expect("currency token pattern is valid")
});

/// A currency code pinned to a price-level year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyYear {
    /// Three-letter currency code, e.g. `EUR`.
    pub code: String,
    /// Price-level year.
    pub year: i32,
}

impl CurrencyYear {
    pub fn new(code: impl Into<String>, year: i32) -> Self {
        Self {
            code: code.into(),
            year,
        }
    }
}

impl FromStr for CurrencyYear {
    type Err = TechDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TechDataError::InvalidCurrencyToken(s.to_string());
        let captures = CURRENCY_TOKEN.captures(s).ok_or_else(invalid)?;
        let whole = captures.get(0).ok_or_else(invalid)?;
        if whole.as_str() != s {
            return Err(invalid());
        }
        let year = captures[2].parse().map_err(|_| invalid())?;
        Ok(Self::new(&captures[1], year))
    }
}

impl fmt::Display for CurrencyYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:04}", self.code, self.year)
    }
}

/// Returns every currency-shaped token in `unit`, in order of appearance.
///
/// No validation of the codes takes place; see [`extract_currency_tokens`].
pub fn find_currency_tokens(unit: &str) -> Vec<CurrencyYear> {
    CURRENCY_TOKEN
        .captures_iter(unit)
        .filter_map(|c| Some(CurrencyYear::new(&c[1], c[2].parse().ok()?)))
        .collect()
}

/// Returns true if `unit` contains at least one currency-shaped token.
pub fn has_currency_token(unit: &str) -> bool {
    CURRENCY_TOKEN.is_match(unit)
}

/// Extracts the currency-year tokens of a unit string.
///
/// Tokens are returned in order of appearance with duplicates preserved.
///
/// # Examples
///
/// ```
/// use technologydata_core::currency::{extract_currency_tokens, CurrencyCodes};
///
/// let codes = CurrencyCodes::bundled();
/// let tokens = extract_currency_tokens("EUR_2015/USD_2020", &codes).unwrap();
/// assert_eq!(tokens, vec!["EUR_2015", "USD_2020"]);
/// ```
///
/// # Errors
///
/// Fails with [`TechDataError::InvalidCurrencyCodes`] listing every
/// currency-shaped token whose code is not a recognised currency.
pub fn extract_currency_tokens(unit: &str, codes: &CurrencyCodes) -> TechDataResult<Vec<String>> {
    let tokens = find_currency_tokens(unit);
    if tokens.is_empty() {
        log::debug!("No currency token found in '{unit}'");
        return Ok(Vec::new());
    }

    let invalid: Vec<String> = tokens
        .iter()
        .filter(|t| !codes.is_valid_code(&t.code))
        .map(ToString::to_string)
        .collect();
    if !invalid.is_empty() {
        return Err(TechDataError::InvalidCurrencyCodes(invalid));
    }

    Ok(tokens.iter().map(ToString::to_string).collect())
}

/// Rewrites every currency-year token of `unit` through `replace`.
pub fn replace_currency_tokens(unit: &str, mut replace: impl FnMut(&CurrencyYear) -> String) -> String {
    CURRENCY_TOKEN
        .replace_all(unit, |c: &regex::Captures| match c[2].parse() {
            Ok(year) => replace(&CurrencyYear::new(&c[1], year)),
            Err(_) => c[0].to_string(),
        })
        .into_owned()
}
