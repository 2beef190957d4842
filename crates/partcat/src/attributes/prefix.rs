//! SI magnitude prefixes accepted for numeric attribute input.
//!
//! An attribute may restrict which prefixes a user can pick when entering a value
//! (e.g. resistance: `-`, `k`, `M`). The symbol `-` stands for the base unit
//! without any prefix.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A known SI prefix, including the prefix-less base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SiPrefix {
    Peta,
    Tera,
    Giga,
    Mega,
    Kilo,
    Hecto,
    Deca,
    Base,
    Deci,
    Centi,
    Milli,
    Micro,
    Nano,
    Pico,
    Femto,
}

/// Table entry for one prefix.
#[derive(Debug, Clone, Copy)]
pub struct PrefixSpec {
    pub prefix: SiPrefix,
    /// Canonical symbol as stored and serialized.
    pub symbol: &'static str,
    pub name: &'static str,
    pub exponent: i32,
}

impl PrefixSpec {
    const fn new(prefix: SiPrefix, symbol: &'static str, name: &'static str, exponent: i32) -> Self {
        Self {
            prefix,
            symbol,
            name,
            exponent,
        }
    }
}

/// The fixed set of known prefixes, largest first.
pub const SI_PREFIXES: &[PrefixSpec] = &[
    PrefixSpec::new(SiPrefix::Peta, "P", "peta", 15),
    PrefixSpec::new(SiPrefix::Tera, "T", "tera", 12),
    PrefixSpec::new(SiPrefix::Giga, "G", "giga", 9),
    PrefixSpec::new(SiPrefix::Mega, "M", "mega", 6),
    PrefixSpec::new(SiPrefix::Kilo, "k", "kilo", 3),
    PrefixSpec::new(SiPrefix::Hecto, "h", "hecto", 2),
    PrefixSpec::new(SiPrefix::Deca, "da", "deca", 1),
    PrefixSpec::new(SiPrefix::Base, "-", "base", 0),
    PrefixSpec::new(SiPrefix::Deci, "d", "deci", -1),
    PrefixSpec::new(SiPrefix::Centi, "c", "centi", -2),
    PrefixSpec::new(SiPrefix::Milli, "m", "milli", -3),
    PrefixSpec::new(SiPrefix::Micro, "\u{00B5}", "micro", -6),
    PrefixSpec::new(SiPrefix::Nano, "n", "nano", -9),
    PrefixSpec::new(SiPrefix::Pico, "p", "pico", -12),
    PrefixSpec::new(SiPrefix::Femto, "f", "femto", -15),
];

// Accepted spellings. The empty string and the Greek mu (U+03BC) are aliases.
static BY_SYMBOL: Lazy<HashMap<&'static str, SiPrefix>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, SiPrefix> =
        SI_PREFIXES.iter().map(|p| (p.symbol, p.prefix)).collect();
    map.insert("", SiPrefix::Base);
    map.insert("\u{03BC}", SiPrefix::Micro);
    map
});

impl SiPrefix {
    pub fn spec(self) -> &'static PrefixSpec {
        // The table covers every variant.
        SI_PREFIXES
            .iter()
            .find(|p| p.prefix == self)
            .unwrap_or(&SI_PREFIXES[7])
    }

    pub fn symbol(self) -> &'static str {
        self.spec().symbol
    }

    pub fn factor(self) -> f64 {
        10f64.powi(self.spec().exponent)
    }

    /// Look up a prefix by symbol. Returns `None` for unknown tokens.
    pub fn from_symbol(symbol: &str) -> Option<SiPrefix> {
        BY_SYMBOL.get(symbol).copied()
    }
}

impl fmt::Display for SiPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPrefix(pub String);

impl fmt::Display for UnknownPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown SI prefix '{}'", self.0)
    }
}

impl std::error::Error for UnknownPrefix {}

impl FromStr for SiPrefix {
    type Err = UnknownPrefix;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SiPrefix::from_symbol(s).ok_or_else(|| UnknownPrefix(s.to_string()))
    }
}

impl TryFrom<String> for SiPrefix {
    type Error = UnknownPrefix;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SiPrefix> for String {
    fn from(prefix: SiPrefix) -> Self {
        prefix.symbol().to_string()
    }
}
