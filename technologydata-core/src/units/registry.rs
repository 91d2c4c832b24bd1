//! Physical units known to technology datasets.
//!
//! Each entry maps a canonical symbol to its [`Dimension`] and to the factor
//! that takes one of it to SI base units (`Wh` is 3600, `yr` is 365.25 days
//! in seconds). Long names (`kilowatt`, `tonne`) are aliases and resolve to
//! the canonical symbol, which is what canonical unit strings print.
//!
//! Symbol prefixes combine with symbols (`k` + `Wh`) and long prefixes with
//! long names (`giga` + `watt_hour`); mixing the two styles is rejected.

use super::dimension::Dimension;
use std::collections::HashMap;

pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const SECONDS_PER_HOUR: f64 = 60.0 * SECONDS_PER_MINUTE;
pub const SECONDS_PER_DAY: f64 = 24.0 * SECONDS_PER_HOUR;
/// Julian year of 365.25 days.
pub const SECONDS_PER_YEAR: f64 = 365.25 * SECONDS_PER_DAY;

/// A resolved unit symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitInfo {
    /// Canonical symbol, including any SI prefix.
    pub name: String,
    pub dimension: Dimension,
    /// Multiplier taking one of this unit to SI base units.
    pub to_si_factor: f64,
    /// Whether SI prefixes may be attached.
    pub prefixable: bool,
}

/// (symbol, long name, factor)
pub static SI_PREFIXES: &[(&str, &str, f64)] = &[
    ("da", "deca", 1e1),
    ("E", "exa", 1e18),
    ("P", "peta", 1e15),
    ("T", "tera", 1e12),
    ("G", "giga", 1e9),
    ("M", "mega", 1e6),
    ("k", "kilo", 1e3),
    ("h", "hecto", 1e2),
    ("d", "deci", 1e-1),
    ("c", "centi", 1e-2),
    ("m", "milli", 1e-3),
    ("u", "micro", 1e-6),
    ("n", "nano", 1e-9),
    ("p", "pico", 1e-12),
];

struct BuiltinUnit {
    symbol: &'static str,
    dimension: Dimension,
    factor: f64,
    prefixable: bool,
    aliases: &'static [&'static str],
}

const fn unit(
    symbol: &'static str,
    dimension: Dimension,
    factor: f64,
    prefixable: bool,
    aliases: &'static [&'static str],
) -> BuiltinUnit {
    BuiltinUnit {
        symbol,
        dimension,
        factor,
        prefixable,
        aliases,
    }
}

const PREFIXABLE: bool = true;
const FIXED: bool = false;

static BUILTIN_UNITS: &[BuiltinUnit] = &[
    // mass, length, base quantities
    unit("g", Dimension::MASS, 1e-3, PREFIXABLE, &["gram", "grams"]),
    unit("t", Dimension::MASS, 1e3, PREFIXABLE, &["tonne", "tonnes", "metric_ton"]),
    unit("m", Dimension::LENGTH, 1.0, PREFIXABLE, &["meter", "metre", "meters", "metres"]),
    unit("s", Dimension::TIME, 1.0, PREFIXABLE, &["second", "seconds", "sec"]),
    unit("K", Dimension::TEMPERATURE, 1.0, PREFIXABLE, &["kelvin"]),
    // temperature differences only, no offset to kelvin
    unit("degC", Dimension::TEMPERATURE, 1.0, FIXED, &["celsius", "degree_Celsius"]),
    unit("mol", Dimension::AMOUNT, 1.0, PREFIXABLE, &["mole", "moles"]),
    unit("A", Dimension::CURRENT, 1.0, PREFIXABLE, &["ampere", "amperes"]),
    unit("1", Dimension::dimensionless(), 1.0, FIXED, &["dimensionless"]),
    // time
    unit("yr", Dimension::TIME, SECONDS_PER_YEAR, FIXED, &["year", "years", "a", "annum"]),
    unit("day", Dimension::TIME, SECONDS_PER_DAY, FIXED, &["days", "d"]),
    unit("h", Dimension::TIME, SECONDS_PER_HOUR, FIXED, &["hour", "hours", "hr"]),
    unit("min", Dimension::TIME, SECONDS_PER_MINUTE, FIXED, &["minute", "minutes"]),
    // energy and power
    unit("J", Dimension::ENERGY, 1.0, PREFIXABLE, &["joule", "joules"]),
    unit("W", Dimension::POWER, 1.0, PREFIXABLE, &["watt", "watts"]),
    unit("Wh", Dimension::ENERGY, SECONDS_PER_HOUR, PREFIXABLE, &["watt_hour", "watthour", "watt_hours"]),
    // volume and pressure
    unit("L", Dimension::VOLUME, 1e-3, PREFIXABLE, &["l", "liter", "litre", "liters", "litres"]),
    unit("Nm3", Dimension::VOLUME, 1.0, FIXED, &["normal_cubic_meter"]),
    unit("Pa", Dimension::PRESSURE, 1.0, PREFIXABLE, &["pascal"]),
    unit("bar", Dimension::PRESSURE, 1e5, PREFIXABLE, &[]),
    // ratios
    unit("percent", Dimension::dimensionless(), 1e-2, FIXED, &["pct"]),
    unit("ppm", Dimension::dimensionless(), 1e-6, FIXED, &[]),
];

/// Physical units with SI prefixes and long-name aliases.
///
/// Carriers, heating values and currencies are not in here; they resolve
/// through their own registries in [`UnitContext`](super::UnitContext).
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: HashMap<&'static str, UnitInfo>,
    /// alias -> canonical symbol
    aliases: HashMap<&'static str, &'static str>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        let mut units = HashMap::with_capacity(BUILTIN_UNITS.len());
        let mut aliases = HashMap::new();
        for def in BUILTIN_UNITS {
            units.insert(
                def.symbol,
                UnitInfo {
                    name: def.symbol.to_string(),
                    dimension: def.dimension,
                    to_si_factor: def.factor,
                    prefixable: def.prefixable,
                },
            );
            aliases.extend(def.aliases.iter().map(|alias| (*alias, def.symbol)));
        }
        Self { units, aliases }
    }

    fn by_alias(&self, name: &str) -> Option<&UnitInfo> {
        self.aliases.get(name).and_then(|symbol| self.units.get(*symbol))
    }

    /// Resolves a symbol, alias or prefixed form.
    ///
    /// [`UnitInfo::name`] is always the canonical symbol: `kilowatt`, `kW`
    /// and `kilowatts` all resolve to `kW`.
    pub fn lookup(&self, symbol: &str) -> Option<UnitInfo> {
        self.units
            .get(symbol)
            .or_else(|| self.by_alias(symbol))
            .cloned()
            .or_else(|| self.lookup_prefixed(symbol))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.lookup(symbol).is_some()
    }

    fn lookup_prefixed(&self, symbol: &str) -> Option<UnitInfo> {
        // "da" precedes "d" in SI_PREFIXES
        let short = SI_PREFIXES.iter().find_map(|&(prefix, _, factor)| {
            let base = self.units.get(symbol.strip_prefix(prefix)?)?;
            base.prefixable.then_some((prefix, factor, base))
        });
        let long = || {
            SI_PREFIXES.iter().find_map(|&(prefix, long_prefix, factor)| {
                let base = self.by_alias(symbol.strip_prefix(long_prefix)?)?;
                base.prefixable.then_some((prefix, factor, base))
            })
        };

        let (prefix, factor, base) = short.or_else(long)?;
        Some(UnitInfo {
            name: format!("{prefix}{}", base.name),
            dimension: base.dimension,
            to_si_factor: base.to_si_factor * factor,
            prefixable: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lookup(symbol: &str) -> UnitInfo {
        UnitRegistry::new()
            .lookup(symbol)
            .unwrap_or_else(|| panic!("{symbol} should resolve"))
    }

    #[test]
    fn test_base_units() {
        let kg = lookup("kg");
        assert_eq!(kg.dimension, Dimension::MASS);
        assert_relative_eq!(kg.to_si_factor, 1.0);
        assert_eq!(lookup("m").dimension, Dimension::LENGTH);
    }

    #[test]
    fn test_prefixed_units() {
        let kw = lookup("kW");
        assert_eq!(kw.name, "kW");
        assert_eq!(kw.dimension, Dimension::POWER);
        assert_relative_eq!(kw.to_si_factor, 1e3);

        let mwh = lookup("MWh");
        assert_eq!(mwh.dimension, Dimension::ENERGY);
        assert_relative_eq!(mwh.to_si_factor, 3.6e9);
    }

    #[test]
    fn test_long_names_resolve_to_symbols() {
        assert_eq!(lookup("kilowatt").name, "kW");
        assert_eq!(lookup("tonne").name, "t");
        assert_eq!(lookup("gigawatt_hour").name, "GWh");
        assert_eq!(lookup("a").name, "yr");
    }

    #[test]
    fn test_rejected_symbols() {
        let registry = UnitRegistry::new();
        for symbol in ["kwatt", "kiloW", "kmin", "kpercent", "unknown_unit", "H2", "USD_2020"] {
            assert!(registry.lookup(symbol).is_none(), "{symbol}");
        }
    }

    #[test]
    fn test_direct_symbols_beat_prefixes() {
        // pascal, not peta-annum
        assert_eq!(lookup("Pa").dimension, Dimension::PRESSURE);
        // day, not deci-
        assert_eq!(lookup("d").name, "day");
        assert_relative_eq!(lookup("yr").to_si_factor, SECONDS_PER_YEAR);
    }
}
