//! Registries for the non-physical unit axes: energy carriers and
//! heating-value conventions.
//!
//! Each registered name is its own independent dimension. Expressions over
//! these names combine with the same algebra as physical units, so
//! `hydrogen * methane` and `hydrogen^2` are valid carrier expressions, but
//! they never mix with physical units: `H2` here is hydrogen, never a
//! unit of mass or energy.

use super::parser::{ParseError, ParsedUnit};
use std::collections::{BTreeSet, HashMap};

/// Heating value of a fuel including the latent heat of condensed water.
pub const HHV: &str = "HHV";
/// Heating value of a fuel excluding the latent heat of condensed water.
pub const LHV: &str = "LHV";

/// Registry of names forming one independent unit axis.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    kind: &'static str,
    names: BTreeSet<String>,
    aliases: HashMap<String, String>,
}

impl TagRegistry {
    /// Creates an empty registry. `kind` names the axis in error messages.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            names: BTreeSet::new(),
            aliases: HashMap::new(),
        }
    }

    /// Registry of energy carriers, keyed by long name with chemical formulas as aliases.
    pub fn carriers() -> Self {
        let mut registry = Self::new("carrier");
        registry.define("hydrogen", &["H2"]);
        registry.define("methane", &["CH4"]);
        registry.define("carbon_dioxide", &["CO2"]);
        registry.define("carbon_monoxide", &["CO"]);
        registry.define("oxygen", &["O2"]);
        registry.define("nitrogen", &["N2"]);
        registry.define("water", &["H2O"]);
        registry.define("carbon", &["C"]);
        registry.define("ammonia", &["NH3"]);
        registry.define("methanol", &["CH3OH", "MeOH"]);
        registry.define("electricity", &["el", "elec"]);
        registry.define("heat", &[]);
        registry
    }

    /// Registry of heating-value conventions.
    pub fn heating_values() -> Self {
        let mut registry = Self::new("heating value");
        registry.define(
            LHV,
            &["lower_heating_value", "NCV", "net_calorific_value"],
        );
        registry.define(
            HHV,
            &["higher_heating_value", "GCV", "gross_calorific_value"],
        );
        registry
    }

    /// Adds a name and its aliases to the registry.
    pub fn define(&mut self, name: &str, aliases: &[&str]) {
        self.names.insert(name.to_string());
        for alias in aliases {
            self.aliases.insert(alias.to_string(), name.to_string());
        }
    }

    /// Resolves a name or alias to its canonical name.
    pub fn lookup(&self, symbol: &str) -> Option<&str> {
        if let Some(name) = self.names.get(symbol) {
            return Some(name);
        }
        self.aliases.get(symbol).map(String::as_str)
    }

    /// Returns true if the symbol is registered, directly or as an alias.
    pub fn contains(&self, symbol: &str) -> bool {
        self.lookup(symbol).is_some()
    }

    /// Iterates over the canonical names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Parses an expression over this registry into canonical components.
    ///
    /// # Errors
    ///
    /// Fails with [`ParseError::UndefinedTag`] naming the first unknown symbol.
    pub fn parse(&self, expr: &str) -> Result<ParsedUnit, ParseError> {
        let parsed = ParsedUnit::parse_with(expr, &|s: &str| self.contains(s))?;
        let mut canonical = ParsedUnit::dimensionless();
        for (symbol, &exp) in parsed.components() {
            let name = self
                .lookup(symbol)
                .ok_or_else(|| ParseError::UndefinedTag {
                    kind: self.kind,
                    symbol: symbol.clone(),
                })?;
            canonical = canonical.multiply(&ParsedUnit::from_components(
                [(name.to_string(), exp)].into(),
            ))?;
        }
        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_aliases() {
        let carriers = TagRegistry::carriers();
        assert_eq!(carriers.lookup("H2"), Some("hydrogen"));
        assert_eq!(carriers.lookup("hydrogen"), Some("hydrogen"));
        assert_eq!(carriers.lookup("CH4"), Some("methane"));
        assert_eq!(carriers.lookup("kg"), None);
    }

    #[test]
    fn test_carrier_expression() {
        let carriers = TagRegistry::carriers();
        let expr = carriers.parse("H2 * CH4").unwrap();
        assert_eq!(expr.normalized(), "hydrogen * methane");

        let squared = carriers.parse("H2^2").unwrap();
        assert_eq!(squared.exponent("hydrogen"), 2);

        // Trailing digits of a known formula are not an exponent
        let water = carriers.parse("H2O / H2").unwrap();
        assert_eq!(water.normalized(), "water / hydrogen");
    }

    #[test]
    fn test_alias_and_name_merge() {
        let carriers = TagRegistry::carriers();
        let expr = carriers.parse("H2 / hydrogen").unwrap();
        assert!(expr.has_no_components());
    }

    #[test]
    fn test_heating_value_aliases() {
        let hvs = TagRegistry::heating_values();
        assert_eq!(hvs.parse("NCV").unwrap().normalized(), LHV);
        assert_eq!(hvs.parse("gross_calorific_value").unwrap().normalized(), HHV);
    }

    #[test]
    fn test_undefined_tag() {
        let carriers = TagRegistry::carriers();
        assert_eq!(
            carriers.parse("unobtainium"),
            Err(ParseError::UndefinedTag {
                kind: "carrier",
                symbol: "unobtainium".to_string()
            })
        );
    }
}
