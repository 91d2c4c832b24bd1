//! Lazily populated registry of currency-year units.

use super::codes::CurrencyCodes;
use super::token::{extract_currency_tokens, CurrencyYear};
use crate::errors::{TechDataError, TechDataResult};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// A currency-year unit defined relative to the reference currency.
///
/// The factor is always NaN: the value of a currency-year in terms of the
/// reference depends on the deflation source and adjustment country, so it is
/// supplied per conversion rather than stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyUnit {
    pub token: CurrencyYear,
    pub reference: CurrencyYear,
    pub factor: f64,
}

/// Registry of the currency-year tokens seen so far.
///
/// Tokens are registered on first use. Registration takes the write lock
/// and only inserts tokens that are still absent.
#[derive(Debug)]
pub struct CurrencyRegistry {
    codes: Arc<CurrencyCodes>,
    reference: CurrencyYear,
    defined: RwLock<BTreeMap<String, CurrencyUnit>>,
}

impl CurrencyRegistry {
    /// Creates a registry with `reference` as the base currency-year.
    ///
    /// # Errors
    ///
    /// Fails if the reference currency code is not in `codes`.
    pub fn new(codes: Arc<CurrencyCodes>, reference: CurrencyYear) -> TechDataResult<Self> {
        if !codes.is_valid_code(&reference.code) {
            return Err(TechDataError::InvalidCurrencyCodes(vec![reference.to_string()]));
        }
        let registry = Self {
            codes,
            reference,
            defined: RwLock::new(BTreeMap::new()),
        };
        let reference = registry.reference.clone();
        registry
            .defined
            .write()
            .expect("Currency registry lock poisoned")
            .insert(
                reference.to_string(),
                CurrencyUnit {
                    token: reference.clone(),
                    reference,
                    factor: 1.0,
                },
            );
        Ok(registry)
    }

    pub fn codes(&self) -> &Arc<CurrencyCodes> {
        &self.codes
    }

    /// The base currency-year all others are defined against.
    pub fn reference(&self) -> &CurrencyYear {
        &self.reference
    }

    /// Returns true if `token` has been registered.
    pub fn is_defined(&self, token: &str) -> bool {
        self.defined
            .read()
            .expect("Currency registry lock poisoned")
            .contains_key(token)
    }

    /// Returns the definition of a registered token.
    pub fn get(&self, token: &str) -> Option<CurrencyUnit> {
        self.defined
            .read()
            .expect("Currency registry lock poisoned")
            .get(token)
            .cloned()
    }

    /// Validates the currency tokens of `unit` and registers the new ones.
    ///
    /// Returns the tokens in order of appearance.
    ///
    /// # Errors
    ///
    /// Fails with [`TechDataError::InvalidCurrencyCodes`] if any code is unknown.
    pub fn ensure_defined(&self, unit: &str) -> TechDataResult<Vec<String>> {
        let tokens = extract_currency_tokens(unit, &self.codes)?;
        if tokens.iter().all(|t| self.is_defined(t)) {
            return Ok(tokens);
        }

        let mut defined = self.defined.write().expect("Currency registry lock poisoned");
        for token in &tokens {
            if defined.contains_key(token) {
                continue;
            }
            log::debug!(
                "Defining currency unit '{token}' relative to '{}' without a conversion factor",
                self.reference
            );
            defined.insert(
                token.clone(),
                CurrencyUnit {
                    token: token.parse()?,
                    reference: self.reference.clone(),
                    factor: f64::NAN,
                },
            );
        }
        Ok(tokens)
    }

    /// Number of registered tokens, the reference included.
    pub fn len(&self) -> usize {
        self.defined
            .read()
            .expect("Currency registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
