//! Unit expressions as products of symbols raised to integer powers.
//!
//! Parsing runs in two passes: the input is split into tokens, then a
//! small recursive-descent parser folds them into a [`ParsedUnit`]. The parser
//! knows nothing about which symbols exist. The caller's lookup is consulted
//! only while tokenizing, to decide whether trailing digits belong to a symbol
//! (`CO2`, `Nm3`) or are an implicit exponent (`m2`). Physical units, carrier
//! expressions and heating-value expressions all go through here.
//!
//! ```text
//! expression = term (('/' | 'per') term)*
//! term       = factor (('*' | '·' | ' ') factor)*
//! factor     = ('(' expression ')' | symbol) exponent?
//! exponent   = ('^' | '**')? '-'? digits
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty unit string")]
    EmptyUnit,
    /// Symbol not present in the unit registry.
    #[error("undefined unit: '{0}'")]
    UndefinedUnit(String),
    /// Carrier or heating-value name not present in its registry.
    #[error("undefined {kind}: '{symbol}'")]
    UndefinedTag { kind: &'static str, symbol: String },
    #[error("invalid exponent: '{0}'")]
    InvalidExponent(String),
    #[error("unexpected character: '{0}'")]
    UnexpectedChar(char),
    #[error("parse failed: {0}")]
    ParseFailed(String),
}

/// A product of symbols with non-zero integer exponents.
///
/// `EUR_2020/kW` is `{EUR_2020: 1, kW: -1}`. Symbols are kept sorted so equal
/// expressions compare and hash equal regardless of how they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedUnit {
    components: BTreeMap<String, i32>,
}

impl ParsedUnit {
    #[must_use]
    pub fn dimensionless() -> Self {
        Self::default()
    }

    /// Zero exponents are dropped.
    #[must_use]
    pub fn from_components(mut components: BTreeMap<String, i32>) -> Self {
        components.retain(|_, exp| *exp != 0);
        Self { components }
    }

    fn symbol(symbol: &str) -> Self {
        Self::from_components(BTreeMap::from([(symbol.to_string(), 1)]))
    }

    /// Parses with no registered symbols, so `m2` is always `m^2`.
    ///
    /// ```
    /// use technologydata_core::units::parser::ParsedUnit;
    ///
    /// let unit = ParsedUnit::parse("EUR_2020/kW").unwrap();
    /// assert_eq!(unit, ParsedUnit::parse("EUR_2020 per kW").unwrap());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        Self::parse_with(input, &|_: &str| false)
    }

    /// Parses consulting `is_known`, which keeps the digits of registered
    /// symbols such as `CO2` or `Nm3`.
    pub fn parse_with(input: &str, is_known: &dyn Fn(&str) -> bool) -> Result<Self, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::EmptyUnit);
        }
        if input == "1" || input.eq_ignore_ascii_case("dimensionless") {
            return Ok(Self::dimensionless());
        }

        let tokens = tokenize(input, is_known)?;
        let mut parser = Parser { tokens: &tokens, pos: 0 };
        let unit = parser.expression()?;
        match parser.peek() {
            None => Ok(unit),
            Some(token) => Err(ParseError::UnexpectedChar(token.lead_char())),
        }
    }

    #[must_use]
    pub fn components(&self) -> &BTreeMap<String, i32> {
        &self.components
    }

    /// Zero for symbols that do not appear.
    #[must_use]
    pub fn exponent(&self, symbol: &str) -> i32 {
        self.components.get(symbol).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn has_no_components(&self) -> bool {
        self.components.is_empty()
    }

    /// # Errors
    ///
    /// Fails with [`ParseError::InvalidExponent`] if a combined exponent
    /// overflows.
    pub fn multiply(&self, other: &Self) -> Result<Self, ParseError> {
        self.combine(other, 1)
    }

    /// See [`ParsedUnit::multiply`].
    pub fn divide(&self, other: &Self) -> Result<Self, ParseError> {
        self.combine(other, -1)
    }

    fn combine(&self, other: &Self, sign: i32) -> Result<Self, ParseError> {
        let mut components = self.components.clone();
        for (symbol, &exp) in &other.components {
            let current = components.entry(symbol.clone()).or_default();
            let combined = exp.checked_mul(sign).and_then(|e| current.checked_add(e));
            *current = combined
                .ok_or_else(|| ParseError::InvalidExponent(format!("{symbol}^{exp}")))?;
        }
        Ok(Self::from_components(components))
    }

    /// Raises every component to `exp`.
    ///
    /// # Errors
    ///
    /// Fails with [`ParseError::InvalidExponent`] if an exponent overflows.
    pub fn pow(&self, exp: i32) -> Result<Self, ParseError> {
        let components = self
            .components
            .iter()
            .map(|(symbol, &e)| {
                e.checked_mul(exp)
                    .map(|e| (symbol.clone(), e))
                    .ok_or_else(|| ParseError::InvalidExponent(format!("({symbol}^{e})^{exp}")))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self::from_components(components))
    }

    /// Renames every symbol; symbols mapping to the same name merge.
    pub fn map_symbols(&self, mut rename: impl FnMut(&str) -> String) -> Result<Self, ParseError> {
        self.components
            .iter()
            .map(|(symbol, &exp)| Self::from_components(BTreeMap::from([(rename(symbol), exp)])))
            .try_fold(Self::dimensionless(), |merged, renamed| merged.multiply(&renamed))
    }

    /// Canonical rendering: positive powers joined by ` * `, then ` / ` and
    /// the negative powers, parenthesised when there is more than one.
    /// `1` stands in for an empty numerator; an empty unit is `dimensionless`.
    #[must_use]
    pub fn normalized(&self) -> String {
        let (above, below): (Vec<_>, Vec<_>) =
            self.components.iter().partition(|(_, exp)| **exp > 0);

        let render = |side: &[(&String, &i32)]| {
            side.iter()
                .map(|(symbol, exp)| match exp.unsigned_abs() {
                    1 => symbol.to_string(),
                    n => format!("{symbol}^{n}"),
                })
                .collect::<Vec<_>>()
                .join(" * ")
        };

        if below.is_empty() {
            return if above.is_empty() {
                "dimensionless".to_string()
            } else {
                render(&above)
            };
        }
        let numerator = if above.is_empty() { "1".to_string() } else { render(&above) };
        match below.len() {
            1 => format!("{numerator} / {}", render(&below)),
            _ => format!("{numerator} / ({})", render(&below)),
        }
    }
}

impl fmt::Display for ParsedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Symbol(String),
    Exponent(i32),
    Times,
    Over,
    Open,
    Close,
}

impl Token {
    fn lead_char(&self) -> char {
        match self {
            Self::Symbol(s) => s.chars().next().unwrap_or('?'),
            Self::Exponent(_) => '^',
            Self::Times => '*',
            Self::Over => '/',
            Self::Open => '(',
            Self::Close => ')',
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(input: &str, is_known: &dyn Fn(&str) -> bool) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '*' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == '*').is_some() {
                    tokens.push(Token::Exponent(explicit_exponent(input, &mut chars)?));
                } else {
                    tokens.push(Token::Times);
                }
            }
            '^' => {
                chars.next();
                tokens.push(Token::Exponent(explicit_exponent(input, &mut chars)?));
            }
            '\u{00B7}' => {
                chars.next();
                tokens.push(Token::Times);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Over);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            c if is_word_char(c) => {
                let mut end = start;
                while let Some((i, c)) = chars.next_if(|&(_, c)| is_word_char(c)) {
                    end = i + c.len_utf8();
                }
                push_word(&mut tokens, &input[start..end], is_known)?;
            }
            other => return Err(ParseError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

/// Reads `-?digits` after a `^` or `**` marker.
fn explicit_exponent(input: &str, chars: &mut Peekable<CharIndices<'_>>) -> Result<i32, ParseError> {
    while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}

    let Some(&(start, _)) = chars.peek() else {
        return Err(ParseError::ParseFailed("expected exponent after ^".into()));
    };
    let mut end = start;
    if let Some((i, _)) = chars.next_if(|&(_, c)| c == '-') {
        end = i + 1;
    }
    let digits_from = end;
    while let Some((i, _)) = chars.next_if(|&(_, c)| c.is_ascii_digit()) {
        end = i + 1;
    }
    if end == digits_from {
        return Err(ParseError::ParseFailed("expected exponent after ^".into()));
    }
    parse_exponent(&input[start..end])
}

fn parse_exponent(text: &str) -> Result<i32, ParseError> {
    text.parse()
        .map_err(|_| ParseError::InvalidExponent(text.to_string()))
}

fn push_word(
    tokens: &mut Vec<Token>,
    word: &str,
    is_known: &dyn Fn(&str) -> bool,
) -> Result<(), ParseError> {
    if word.eq_ignore_ascii_case("per") {
        tokens.push(Token::Over);
        return Ok(());
    }

    if word.bytes().all(|b| b.is_ascii_digit()) {
        // "(kW h)2"
        if tokens.last() == Some(&Token::Close) {
            tokens.push(Token::Exponent(parse_exponent(word)?));
        } else {
            tokens.push(Token::Symbol(word.to_string()));
        }
        return Ok(());
    }

    let head_len = word.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let splits = head_len < word.len()
        && word[..head_len].ends_with(|c: char| c.is_ascii_alphabetic())
        && !is_known(word);
    if splits {
        tokens.push(Token::Symbol(word[..head_len].to_string()));
        tokens.push(Token::Exponent(parse_exponent(&word[head_len..])?));
    } else {
        tokens.push(Token::Symbol(word.to_string()));
    }
    Ok(())
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        let hit = self.peek() == Some(expected);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn expression(&mut self) -> Result<ParsedUnit, ParseError> {
        let mut unit = self.term()?;
        while self.eat(&Token::Over) {
            unit = unit.divide(&self.term()?)?;
        }
        Ok(unit)
    }

    fn term(&mut self) -> Result<ParsedUnit, ParseError> {
        let mut unit = self.factor()?;
        loop {
            if self.eat(&Token::Times) {
                unit = unit.multiply(&self.factor()?)?;
            } else if matches!(self.peek(), Some(Token::Symbol(_) | Token::Open)) {
                unit = unit.multiply(&self.factor()?)?;
            } else {
                return Ok(unit);
            }
        }
    }

    fn factor(&mut self) -> Result<ParsedUnit, ParseError> {
        let base = match self.bump().cloned() {
            Some(Token::Open) => {
                let inner = self.expression()?;
                if !self.eat(&Token::Close) {
                    return Err(ParseError::ParseFailed("missing closing parenthesis".into()));
                }
                inner
            }
            // identity, as in "1 / kW"
            Some(Token::Symbol(s)) if s == "1" => ParsedUnit::dimensionless(),
            Some(Token::Symbol(s)) => ParsedUnit::symbol(&s),
            Some(token) => return Err(ParseError::UnexpectedChar(token.lead_char())),
            None => return Err(ParseError::ParseFailed("expected unit symbol".into())),
        };
        match self.peek() {
            Some(&Token::Exponent(exp)) => {
                self.pos += 1;
                base.pow(exp)
            }
            _ => Ok(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(symbol: &str) -> bool {
        matches!(symbol, "CO2" | "H2" | "Nm3")
    }

    fn parse(input: &str) -> ParsedUnit {
        ParsedUnit::parse(input).unwrap()
    }

    #[test]
    fn test_exponent_spellings() {
        for input in ["m^2", "m**2", "m2", "m ^ 2", "m ** 2"] {
            assert_eq!(parse(input).exponent("m"), 2, "{input}");
        }
        assert_eq!(parse("m ** -2").exponent("m"), -2);
        assert_eq!(parse("kW^-1").exponent("kW"), -1);
    }

    #[test]
    fn test_division_spellings() {
        let expected = parse("EUR_2020/kW");
        assert_eq!(expected.exponent("EUR_2020"), 1);
        assert_eq!(expected.exponent("kW"), -1);
        for input in ["EUR_2020 / kW", "EUR_2020 per kW", "EUR_2020 PER kW", "EUR_2020 kW^-1"] {
            assert_eq!(parse(input), expected, "{input}");
        }
    }

    #[test]
    fn test_multiplication_spellings() {
        let expected = parse("kW h");
        assert_eq!(parse("kW*h"), expected);
        assert_eq!(parse("kW·h"), expected);
        assert_eq!(parse("  kW  *  h "), expected);
    }

    #[test]
    fn test_reciprocal() {
        let unit = parse("1 / kW");
        assert_eq!(unit.components().len(), 1);
        assert_eq!(unit.normalized(), "1 / kW");
    }

    #[test]
    fn test_known_symbols_keep_digits() {
        let unit = ParsedUnit::parse_with("t CO2 / Nm3", &known).unwrap();
        assert_eq!(unit.exponent("CO2"), 1);
        assert_eq!(unit.exponent("Nm3"), -1);

        assert_eq!(parse("CO2").exponent("CO"), 2);
    }

    #[test]
    fn test_per_prefix_is_a_symbol() {
        assert_eq!(parse("percent").exponent("percent"), 1);
    }

    #[test]
    fn test_parentheses() {
        let unit = parse("EUR_2020 / (kW * yr)");
        assert_eq!(unit.exponent("kW"), -1);
        assert_eq!(unit.exponent("yr"), -1);

        let squared = parse("(kW h)^2");
        assert_eq!(squared.exponent("kW"), 2);
        assert_eq!(squared.exponent("h"), 2);
        assert_eq!(parse("(kW h)2"), squared);
    }

    #[test]
    fn test_normalized() {
        assert_eq!(parse("kW^-1 EUR_2020").normalized(), "EUR_2020 / kW");
        assert_eq!(parse("EUR_2020 / kW / yr").normalized(), "EUR_2020 / (kW * yr)");
        assert_eq!(parse("hydrogen * methane").normalized(), "hydrogen * methane");
        assert_eq!(parse("m^2 kg^-3").normalized(), "m^2 / kg^3");
    }

    #[test]
    fn test_normalized_reparses_to_itself() {
        for input in [
            "EUR_2020 / kW / yr",
            "1 / (kW * yr)",
            "m^2 kg^-3",
            "hydrogen^2 / methane",
            "dimensionless",
        ] {
            let parsed = parse(input);
            assert_eq!(parse(&parsed.normalized()), parsed, "{input}");
        }
    }

    #[test]
    fn test_dimensionless() {
        assert!(parse("1").has_no_components());
        assert!(parse("dimensionless").has_no_components());
        assert!(parse("kW/kW").has_no_components());
    }

    #[test]
    fn test_map_symbols_merges() {
        let unit = parse("kilowatt / kW");
        let canonical = unit
            .map_symbols(|s| if s == "kilowatt" { "kW".into() } else { s.into() })
            .unwrap();
        assert!(canonical.has_no_components());
    }

    #[test]
    fn test_exponent_overflow() {
        let big = parse("m^2000000000");
        assert!(matches!(big.pow(2), Err(ParseError::InvalidExponent(_))));
        assert!(matches!(big.multiply(&big), Err(ParseError::InvalidExponent(_))));
        assert_eq!(big.divide(&big).unwrap(), ParsedUnit::dimensionless());
        assert!(matches!(
            ParsedUnit::parse("m^2000000000 * m^2000000000"),
            Err(ParseError::InvalidExponent(_))
        ));

        let smallest = parse("m^-2147483648");
        assert_eq!(smallest.normalized(), "1 / m^2147483648");
    }

    #[test]
    fn test_errors() {
        assert_eq!(ParsedUnit::parse(""), Err(ParseError::EmptyUnit));
        assert_eq!(ParsedUnit::parse("   "), Err(ParseError::EmptyUnit));
        assert_eq!(ParsedUnit::parse("kW)"), Err(ParseError::UnexpectedChar(')')));
        assert_eq!(ParsedUnit::parse("%"), Err(ParseError::UnexpectedChar('%')));
        assert!(matches!(ParsedUnit::parse("(kW"), Err(ParseError::ParseFailed(_))));
        assert!(matches!(ParsedUnit::parse("kW^"), Err(ParseError::ParseFailed(_))));
        assert!(matches!(
            ParsedUnit::parse("m^99999999999"),
            Err(ParseError::InvalidExponent(_))
        ));
    }
}
