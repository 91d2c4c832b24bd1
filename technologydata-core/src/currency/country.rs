//! Sources of country to currency data.

use crate::errors::TechDataResult;
use std::collections::BTreeMap;

/// A provider of the ISO3 country code to currency code mapping.
///
/// Implementations may fetch the data from a remote service; results are
/// persisted by [`CurrencyCodeCache`](super::CurrencyCodeCache).
pub trait CountryDataSource: Send + Sync {
    /// Returns the currency code of every known country, keyed by ISO3 code.
    fn iso3_to_currency(&self) -> TechDataResult<BTreeMap<String, String>>;
}

/// ISO 4217 currencies of ISO 3166-1 countries, shipped with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCountryData;

impl BundledCountryData {
    pub(crate) fn iso3_to_currency_table(&self) -> BTreeMap<String, String> {
        ISO3_CURRENCIES
            .iter()
            .map(|(iso3, code)| (iso3.to_string(), code.to_string()))
            .collect()
    }
}

impl CountryDataSource for BundledCountryData {
    fn iso3_to_currency(&self) -> TechDataResult<BTreeMap<String, String>> {
        Ok(self.iso3_to_currency_table())
    }
}

#[rustfmt::skip]
const ISO3_CURRENCIES: &[(&str, &str)] = &[
    // Euro area and euro users
    ("AUT", "EUR"), ("BEL", "EUR"), ("CYP", "EUR"), ("DEU", "EUR"), ("ESP", "EUR"),
    ("EST", "EUR"), ("FIN", "EUR"), ("FRA", "EUR"), ("GRC", "EUR"), ("HRV", "EUR"),
    ("IRL", "EUR"), ("ITA", "EUR"), ("LTU", "EUR"), ("LUX", "EUR"), ("LVA", "EUR"),
    ("MLT", "EUR"), ("NLD", "EUR"), ("PRT", "EUR"), ("SVK", "EUR"), ("SVN", "EUR"),
    ("AND", "EUR"), ("MCO", "EUR"), ("SMR", "EUR"), ("VAT", "EUR"), ("MNE", "EUR"),
    ("XKX", "EUR"),
    // West African CFA franc
    ("BEN", "XOF"), ("BFA", "XOF"), ("CIV", "XOF"), ("GNB", "XOF"), ("MLI", "XOF"),
    ("NER", "XOF"), ("SEN", "XOF"), ("TGO", "XOF"),
    // Central African CFA franc
    ("CMR", "XAF"), ("CAF", "XAF"), ("TCD", "XAF"), ("COG", "XAF"), ("GNQ", "XAF"),
    ("GAB", "XAF"),
    // East Caribbean dollar
    ("ATG", "XCD"), ("DMA", "XCD"), ("GRD", "XCD"), ("KNA", "XCD"), ("LCA", "XCD"),
    ("VCT", "XCD"), ("AIA", "XCD"), ("MSR", "XCD"),
    // US dollar
    ("USA", "USD"), ("ECU", "USD"), ("SLV", "USD"), ("TLS", "USD"), ("FSM", "USD"),
    ("MHL", "USD"), ("PLW", "USD"), ("PRI", "USD"), ("GUM", "USD"), ("ASM", "USD"),
    ("VGB", "USD"), ("TCA", "USD"),
    // Other shared currencies
    ("AUS", "AUD"), ("KIR", "AUD"), ("NRU", "AUD"), ("TUV", "AUD"),
    ("NCL", "XPF"), ("PYF", "XPF"), ("WLF", "XPF"),
    ("CUW", "ANG"), ("SXM", "ANG"),
    ("DNK", "DKK"), ("GRL", "DKK"), ("FRO", "DKK"),
    ("NZL", "NZD"), ("COK", "NZD"), ("NIU", "NZD"),
    ("CHE", "CHF"), ("LIE", "CHF"),
    ("ISR", "ILS"), ("PSE", "ILS"),
    // Europe
    ("ALB", "ALL"), ("ARM", "AMD"), ("AZE", "AZN"), ("BIH", "BAM"), ("BGR", "BGN"),
    ("BLR", "BYN"), ("CZE", "CZK"), ("GBR", "GBP"), ("GEO", "GEL"), ("HUN", "HUF"),
    ("ISL", "ISK"), ("MDA", "MDL"), ("MKD", "MKD"), ("NOR", "NOK"), ("POL", "PLN"),
    ("ROU", "RON"), ("RUS", "RUB"), ("SRB", "RSD"), ("SWE", "SEK"), ("TUR", "TRY"),
    ("UKR", "UAH"),
    // Americas
    ("ARG", "ARS"), ("ABW", "AWG"), ("BHS", "BSD"), ("BLZ", "BZD"), ("BMU", "BMD"),
    ("BOL", "BOB"), ("BRA", "BRL"), ("BRB", "BBD"), ("CAN", "CAD"), ("CHL", "CLP"),
    ("COL", "COP"), ("CRI", "CRC"), ("CUB", "CUP"), ("CYM", "KYD"), ("DOM", "DOP"),
    ("GTM", "GTQ"), ("GUY", "GYD"), ("HND", "HNL"), ("HTI", "HTG"), ("JAM", "JMD"),
    ("MEX", "MXN"), ("NIC", "NIO"), ("PAN", "PAB"), ("PER", "PEN"), ("PRY", "PYG"),
    ("SUR", "SRD"), ("TTO", "TTD"), ("URY", "UYU"), ("VEN", "VES"),
    // Asia and the Middle East
    ("AFG", "AFN"), ("ARE", "AED"), ("BGD", "BDT"), ("BHR", "BHD"), ("BRN", "BND"),
    ("BTN", "BTN"), ("CHN", "CNY"), ("HKG", "HKD"), ("IDN", "IDR"), ("IND", "INR"),
    ("IRN", "IRR"), ("IRQ", "IQD"), ("JOR", "JOD"), ("JPN", "JPY"), ("KAZ", "KZT"),
    ("KGZ", "KGS"), ("KHM", "KHR"), ("KOR", "KRW"), ("KWT", "KWD"), ("LAO", "LAK"),
    ("LBN", "LBP"), ("LKA", "LKR"), ("MAC", "MOP"), ("MDV", "MVR"), ("MMR", "MMK"),
    ("MNG", "MNT"), ("MYS", "MYR"), ("NPL", "NPR"), ("OMN", "OMR"), ("PAK", "PKR"),
    ("PHL", "PHP"), ("PRK", "KPW"), ("QAT", "QAR"), ("SAU", "SAR"), ("SGP", "SGD"),
    ("SYR", "SYP"), ("THA", "THB"), ("TJK", "TJS"), ("TKM", "TMT"), ("TWN", "TWD"),
    ("UZB", "UZS"), ("VNM", "VND"), ("YEM", "YER"),
    // Africa
    ("AGO", "AOA"), ("BDI", "BIF"), ("BWA", "BWP"), ("COD", "CDF"), ("COM", "KMF"),
    ("CPV", "CVE"), ("DJI", "DJF"), ("DZA", "DZD"), ("EGY", "EGP"), ("ERI", "ERN"),
    ("ETH", "ETB"), ("GHA", "GHS"), ("GIN", "GNF"), ("GMB", "GMD"), ("KEN", "KES"),
    ("LBR", "LRD"), ("LBY", "LYD"), ("LSO", "LSL"), ("MAR", "MAD"), ("MDG", "MGA"),
    ("MOZ", "MZN"), ("MRT", "MRU"), ("MUS", "MUR"), ("MWI", "MWK"), ("NAM", "NAD"),
    ("NGA", "NGN"), ("RWA", "RWF"), ("SDN", "SDG"), ("SLE", "SLE"), ("SOM", "SOS"),
    ("SSD", "SSP"), ("STP", "STN"), ("SWZ", "SZL"), ("SYC", "SCR"), ("TUN", "TND"),
    ("TZA", "TZS"), ("UGA", "UGX"), ("ZAF", "ZAR"), ("ZMB", "ZMW"), ("ZWE", "ZWL"),
    // Oceania
    ("FJI", "FJD"), ("PNG", "PGK"), ("SLB", "SBD"), ("TON", "TOP"), ("VUT", "VUV"),
    ("WSM", "WST"),
];
