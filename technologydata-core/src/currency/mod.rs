//! Currency-year units and their conversion.
//!
//! Monetary quantities carry their currency and price-level year inside the
//! unit string, as a token such as `EUR_2020`. This module:
//!
//! - detects and validates those tokens against an authoritative set of
//!   currency codes ([`CurrencyCodes`], persisted by [`CurrencyCodeCache`]),
//! - maps currency codes to representative countries,
//! - obtains conversion rates from a [`Deflator`] and memoizes them in a
//!   [`CurrencyResolver`].
//!
//! Every currency-year token is registered lazily relative to a reference
//! currency-year (`USD_2020` by default) with no fixed factor. Conversion
//! rates are passed explicitly to each conversion; see
//! [`convert`](crate::units::convert).

mod cache;
mod codes;
mod country;
mod deflation;
mod registry;
mod resolver;
mod token;

pub use cache::{default_cache_dir, CacheMode, CurrencyCodeCache, CURRENCY_CODES_FILE};
pub use codes::{CurrencyCodes, SHARED_CURRENCY_COUNTRIES};
pub use country::{BundledCountryData, CountryDataSource};
pub use deflation::{
    DeflationRequest, DeflationSource, DeflationTables, Deflator, TableDeflator, UseCase,
};
pub use registry::{CurrencyRegistry, CurrencyUnit};
pub use resolver::CurrencyResolver;
pub use token::{
    extract_currency_tokens, find_currency_tokens, has_currency_token, replace_currency_tokens,
    CurrencyYear,
};
