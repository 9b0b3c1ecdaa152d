//! Flexible version-number comparison
//!
//! JVM version strings are not semver: `1.8.0_51`, `21.0.1+12-LTS`, and game
//! versions like `1.20.4` all need to compare sensibly. A `VersionNumber`
//! tokenizes its input into numeric and alphabetic runs and compares them
//! piecewise, numbers numerically and text lexicographically.

use std::cmp::Ordering;
use std::fmt;

/// A version string with order-aware comparison
#[derive(Debug, Clone, Eq)]
pub struct VersionNumber {
    raw: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Num(u64),
    Text(String),
}

impl VersionNumber {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parts = tokenize(&raw);
        Self { raw, parts }
    }

    /// The raw version string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The major Java version: `1.8.0_51` is 8, `21.0.1` is 21.
    /// `None` when the string does not start with a number.
    pub fn major_version(&self) -> Option<u32> {
        let mut nums = self.parts.iter().filter_map(|p| match p {
            Part::Num(n) => Some(*n),
            Part::Text(_) => None,
        });
        let first = nums.next()?;
        let major = if first == 1 { nums.next()? } else { first };
        u32::try_from(major).ok()
    }
}

fn tokenize(raw: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut chars = raw.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            let mut n: u64 = 0;
            while let Some(&d) = chars.peek() {
                if let Some(digit) = d.to_digit(10) {
                    n = n.saturating_mul(10).saturating_add(u64::from(digit));
                    chars.next();
                } else {
                    break;
                }
            }
            parts.push(Part::Num(n));
        } else if c.is_alphabetic() {
            let mut s = String::new();
            while let Some(&a) = chars.peek() {
                if a.is_alphabetic() {
                    s.push(a);
                    chars.next();
                } else {
                    break;
                }
            }
            parts.push(Part::Text(s));
        } else {
            // separator: . _ + - and anything else
            chars.next();
        }
    }
    parts
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut a = self.parts.iter();
        let mut b = other.parts.iter();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return Ordering::Equal,
                // a longer version with the same prefix is newer: 1.8.0_51 > 1.8.0,
                // except when the extra part is text: 1.8.0-ea < 1.8.0
                (Some(Part::Text(_)), None) => return Ordering::Less,
                (None, Some(Part::Text(_))) => return Ordering::Greater,
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some(x), Some(y)) => {
                    let ord = match (x, y) {
                        (Part::Num(m), Part::Num(n)) => m.cmp(n),
                        (Part::Text(s), Part::Text(t)) => s.cmp(t),
                        // a number beats text in the same position: 1.8.0 > 1.8.0-ea... (handled above)
                        (Part::Num(_), Part::Text(_)) => Ordering::Greater,
                        (Part::Text(_), Part::Num(_)) => Ordering::Less,
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl From<&str> for VersionNumber {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
