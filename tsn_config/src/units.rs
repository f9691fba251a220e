//! Magnitude normalization. Configuration values arrive either as bare
//! integers (assumed canonical already) or as strings with a unit
//! suffix. Strings are parsed exactly once; anything that does not
//! match the grammar is rejected with a [`ParseError`], never silently
//! defaulted.
//!
//! Canonical units are nanoseconds (time), bits/sec (rate) and bits
//! (size). Digit groups may use `_` as a visual separator:
//! `1_000_000ns` and `1ms` normalize to the same value.

use crate::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<v>[\d_]+)\s*(?P<unit>|ns|us|µs|ms)$").expect("static regex")
});

static RATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<v>[\d_]+)\s*(?P<prefix>|k|M|G|ki|Mi|Gi)(?P<b>b|B)[p/]s$")
        .expect("static regex")
});

static SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<v>[\d_]+)\s*(?P<prefix>|k|M|G|ki|Mi|Gi)(?P<b>b|B)$").expect("static regex")
});

/// A human-authored value with an optional unit suffix. Integers pass
/// through unchanged (the caller-declared unit is assumed canonical);
/// strings are normalized on demand by the `as_*` methods.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Magnitude {
    /// Already-canonical integer.
    Count(i64),
    /// Unit-suffixed string, e.g. `"100Mbps"` or `"125us"`.
    Text(String),
}

impl Magnitude {
    /// Normalize as a time value, in nanoseconds.
    ///
    /// Accepted suffixes: none/`ns` (x1), `us`/`µs` (x1,000) and `ms`
    /// (x1,000,000).
    pub fn as_nanos(&self) -> Result<i64, ParseError> {
        match self {
            Self::Count(n) => Ok(*n),
            Self::Text(s) => {
                let caps = TIME_RE
                    .captures(s)
                    .ok_or_else(|| ParseError::Time(s.clone()))?;
                let v = digits(&caps["v"]).ok_or_else(|| ParseError::Time(s.clone()))?;
                let multiplier = match &caps["unit"] {
                    "" | "ns" => 1,
                    "us" | "µs" => 1_000,
                    "ms" => 1_000_000,
                    _ => return Err(ParseError::Time(s.clone())),
                };
                // grammar-valid digits can still overflow the widening
                v.checked_mul(multiplier)
                    .ok_or_else(|| ParseError::Time(s.clone()))
            }
        }
    }

    /// Normalize as a bit-rate, in bits/sec.
    ///
    /// Accepted suffixes: `<prefix><b|B>ps` or `<prefix><b|B>/s`, where
    /// the prefix is empty, SI (`k`/`M`/`G`) or binary (`ki`/`Mi`/`Gi`)
    /// and `B` selects bytes (x8).
    pub fn as_bps(&self) -> Result<i64, ParseError> {
        match self {
            Self::Count(n) => Ok(*n),
            Self::Text(s) => {
                let caps = RATE_RE
                    .captures(s)
                    .ok_or_else(|| ParseError::Rate(s.clone()))?;
                let v = digits(&caps["v"]).ok_or_else(|| ParseError::Rate(s.clone()))?;
                v.checked_mul(prefix_multiplier(&caps["prefix"]))
                    .and_then(|bits| bits.checked_mul(bit_multiplier(&caps["b"])))
                    .ok_or_else(|| ParseError::Rate(s.clone()))
            }
        }
    }

    /// Normalize as a size, in bits. Same prefix table as [`as_bps`],
    /// without the `ps` suffix.
    ///
    /// [`as_bps`]: Magnitude::as_bps
    pub fn as_bits(&self) -> Result<i64, ParseError> {
        match self {
            Self::Count(n) => Ok(*n),
            Self::Text(s) => {
                let caps = SIZE_RE
                    .captures(s)
                    .ok_or_else(|| ParseError::Size(s.clone()))?;
                let v = digits(&caps["v"]).ok_or_else(|| ParseError::Size(s.clone()))?;
                v.checked_mul(prefix_multiplier(&caps["prefix"]))
                    .and_then(|bits| bits.checked_mul(bit_multiplier(&caps["b"])))
                    .ok_or_else(|| ParseError::Size(s.clone()))
            }
        }
    }
}

impl From<i64> for Magnitude {
    fn from(n: i64) -> Self {
        Self::Count(n)
    }
}

impl From<&str> for Magnitude {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

fn digits(group: &str) -> Option<i64> {
    group.replace('_', "").parse::<i64>().ok()
}

fn prefix_multiplier(prefix: &str) -> i64 {
    match prefix {
        "k" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "ki" => 1 << 10,
        "Mi" => 1 << 20,
        "Gi" => 1 << 30,
        _ => 1,
    }
}

fn bit_multiplier(b: &str) -> i64 {
    // Bytes before bits on the wire: `B` means the value was given in
    // bytes and must be widened to bits.
    if b == "B" { 8 } else { 1 }
}

#[cfg(test)]
mod test {
    use super::*;

    fn text(s: &str) -> Magnitude {
        Magnitude::Text(s.to_string())
    }

    #[test]
    fn time_units() {
        assert_eq!(text("125ns").as_nanos().unwrap(), 125);
        assert_eq!(text("125us").as_nanos().unwrap(), 125_000);
        assert_eq!(text("125µs").as_nanos().unwrap(), 125_000);
        assert_eq!(text("125ms").as_nanos().unwrap(), 125_000_000);
        assert_eq!(text("125").as_nanos().unwrap(), 125);
        assert_eq!(text("1_000_000 ns").as_nanos().unwrap(), 1_000_000);
    }

    #[test]
    fn rate_units() {
        assert_eq!(text("1000Mbps").as_bps().unwrap(), 1_000_000_000);
        assert_eq!(text("1Gbps").as_bps().unwrap(), 1_000_000_000);
        assert_eq!(
            text("1000Mbps").as_bps().unwrap(),
            text("1Gbps").as_bps().unwrap()
        );
        assert_eq!(text("100 kbps").as_bps().unwrap(), 100_000);
        // ethtool prints the `/s` spelling
        assert_eq!(text("1000Mb/s").as_bps().unwrap(), 1_000_000_000);
        // byte-based rates widen to bits
        assert_eq!(text("1kBps").as_bps().unwrap(), 8_000);
        // binary prefixes
        assert_eq!(text("1kibps").as_bps().unwrap(), 1_024);
    }

    #[test]
    fn size_units() {
        assert_eq!(text("1_500B").as_bits().unwrap(), 12_000);
        assert_eq!(text("1522B").as_bits().unwrap(), 12_176);
        assert_eq!(text("64b").as_bits().unwrap(), 64);
        assert_eq!(text("1kiB").as_bits().unwrap(), 8_192);
    }

    #[test]
    fn integers_pass_through() {
        assert_eq!(Magnitude::Count(42).as_nanos().unwrap(), 42);
        assert_eq!(Magnitude::Count(42).as_bps().unwrap(), 42);
        assert_eq!(Magnitude::Count(42).as_bits().unwrap(), 42);
    }

    #[test]
    fn idempotent_once_canonical() {
        let canonical = text("1Gbps").as_bps().unwrap();
        assert_eq!(Magnitude::Count(canonical).as_bps().unwrap(), canonical);
        let canonical = text("125us").as_nanos().unwrap();
        assert_eq!(Magnitude::Count(canonical).as_nanos().unwrap(), canonical);
    }

    #[test]
    fn rejects_values_that_overflow_the_widening() {
        // i64::MAX with a multiplying suffix
        let huge = format!("{}ms", i64::MAX);
        assert_eq!(text(&huge).as_nanos(), Err(ParseError::Time(huge.clone())));
        let huge = format!("{}Gbps", i64::MAX);
        assert_eq!(text(&huge).as_bps(), Err(ParseError::Rate(huge.clone())));
        let huge = format!("{}GiB", i64::MAX);
        assert_eq!(text(&huge).as_bits(), Err(ParseError::Size(huge.clone())));
        // the largest representable value still passes
        let max = format!("{}", i64::MAX);
        assert_eq!(text(&max).as_nanos().unwrap(), i64::MAX);
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!(
            text("fast").as_bps(),
            Err(ParseError::Rate("fast".to_string()))
        );
        // wrong family: a rate is not a time
        assert!(text("100Mbps").as_nanos().is_err());
        // a size is not a rate
        assert!(text("1500B").as_bps().is_err());
        assert!(text("12x").as_bits().is_err());
        assert!(text("").as_nanos().is_err());
    }
}
