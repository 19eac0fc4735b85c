//! Fractional ordering keys for script file names.
//!
//! A keyed file name looks like `003.45-Scene_Map.rb`:
//!
//! ```text
//! MAJOR[.MINOR]-NAME
//! ```
//!
//! `MAJOR` is an integer written with at least three digits. `MINOR` is the
//! fractional part of a decimal number, so `003.5` sorts between `003` and
//! `004`, and `003.45` sorts before `003.5`. New keys are synthesized
//! between two neighbours without touching either of them.

use std::cmp::Ordering;
use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::error::{Error, Result};

/// Majors handed out to scripts inserted after an unkeyed name.
pub const LEGACY_MAJORS: std::ops::RangeInclusive<u32> = 900..=999;

const MIN_MAJOR_WIDTH: usize = 3;

/// Samples tried per synthesis before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 32;

static KEYED_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3,})(?:\.(\d+))?-(.*)$").expect("Invalid keyed name regex")
});

/// The `MAJOR[.MINOR]` prefix of a keyed name.
///
/// Equality and hashing follow the numeric order, so `0012` and `012` are
/// the same key. The major's written width is kept for display.
#[derive(Debug, Clone)]
pub struct OrderKey {
    major: u32,
    /// Fraction digits with trailing zeros removed; never empty.
    minor: Option<String>,
    /// Digits the major is printed with, at least 3
    width: usize,
}

impl OrderKey {
    pub fn new(major: u32) -> Self {
        Self {
            major,
            minor: None,
            width: MIN_MAJOR_WIDTH,
        }
    }

    /// Build a key from a major and fraction digits. Returns `None` when
    /// `minor` contains anything but ASCII digits.
    pub fn with_minor(major: u32, minor: &str) -> Option<Self> {
        if !minor.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            major,
            minor: normalize_fraction(minor),
            width: MIN_MAJOR_WIDTH,
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> Option<&str> {
        self.minor.as_deref()
    }

    /// Split `003.5-Main` into its key and `Main`.
    ///
    /// Names without a well-formed prefix are legacy names and yield `None`.
    pub fn split(stem: &str) -> Option<(OrderKey, &str)> {
        let caps = KEYED_NAME_REGEX.captures(stem)?;
        let digits = caps.get(1)?.as_str();
        let major = digits.parse::<u32>().ok()?;
        let minor = caps.get(2).and_then(|m| normalize_fraction(m.as_str()));
        let name = caps.get(3)?.as_str();
        let key = OrderKey {
            major,
            minor,
            width: digits.len(),
        };
        Some((key, name))
    }

    /// Parse a bare `MAJOR[.MINOR]` prefix.
    pub fn parse(prefix: &str) -> Option<Self> {
        let (major, minor) = match prefix.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (prefix, None),
        };
        if major.len() < 3 || !major.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let width = major.len();
        let major = major.parse::<u32>().ok()?;
        let key = match minor {
            Some(minor) if !minor.is_empty() => Self::with_minor(major, minor)?,
            Some(_) => return None,
            None => Self::new(major),
        };
        Some(Self { width, ..key })
    }

    /// Name with the key prefix removed, or the name itself when unkeyed.
    pub fn strip(stem: &str) -> &str {
        match Self::split(stem) {
            Some((_, name)) => name,
            None => stem,
        }
    }

    /// Render `<key>-<name>`.
    pub fn apply(&self, name: &str) -> String {
        format!("{}-{}", self, name)
    }

    fn fraction(&self) -> &str {
        self.minor.as_deref().unwrap_or("")
    }
}

impl std::fmt::Display for OrderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0width$}", self.major, width = self.width)?;
        if let Some(minor) = &self.minor {
            write!(f, ".{}", minor)?;
        }
        Ok(())
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Normalized fractions compare correctly as plain strings
        self.major
            .cmp(&other.major)
            .then_with(|| self.fraction().cmp(other.fraction()))
    }
}

impl PartialEq for OrderKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderKey {}

impl std::hash::Hash for OrderKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.fraction().hash(state);
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn normalize_fraction(digits: &str) -> Option<String> {
    let trimmed = digits.trim_end_matches('0');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Synthesizes new keys between existing neighbours.
#[derive(Debug)]
pub struct KeyGenerator {
    rng: StdRng,
    max_attempts: usize,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Key for a new entry placed after `prev` and before `next`.
    ///
    /// `prev` is the key of the entry being inserted after (`None` when it
    /// has a legacy name). `next` is the following entry's key, if any.
    /// `taken` reports keys already in use.
    pub fn after(
        &mut self,
        prev: Option<&OrderKey>,
        next: Option<&OrderKey>,
        taken: impl Fn(&OrderKey) -> bool,
    ) -> Result<OrderKey> {
        match prev {
            Some(prev) => self.between(prev, next, taken),
            None => self.legacy(taken),
        }
    }

    /// Key strictly greater than `lo` and, when `hi` shares its major,
    /// strictly less than `hi`.
    pub fn between(
        &mut self,
        lo: &OrderKey,
        hi: Option<&OrderKey>,
        taken: impl Fn(&OrderKey) -> bool,
    ) -> Result<OrderKey> {
        let upper = hi
            .filter(|hi| hi.major == lo.major && *hi > lo)
            .map(|hi| hi.fraction().to_string());

        if let Some(bumped) = bump_last_digit(lo)
            && upper.as_deref().is_none_or(|upper| bumped.fraction() < upper)
            && !taken(&bumped)
        {
            return Ok(bumped);
        }

        for _ in 0..self.max_attempts {
            let Some(fraction) = self.sample_fraction(lo.fraction(), upper.as_deref()) else {
                break;
            };
            let candidate = OrderKey {
                major: lo.major,
                minor: Some(fraction),
                width: lo.width,
            };
            if !taken(&candidate) {
                tracing::trace!(key = %candidate, after = %lo, "synthesized order key");
                return Ok(candidate);
            }
        }

        Err(Error::OrderKeyExhausted {
            after: lo.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Fresh key for an entry inserted after a legacy name.
    pub fn legacy(&mut self, taken: impl Fn(&OrderKey) -> bool) -> Result<OrderKey> {
        for _ in 0..self.max_attempts {
            let candidate = OrderKey::new(self.rng.gen_range(LEGACY_MAJORS));
            if !taken(&candidate) {
                return Ok(candidate);
            }
        }
        Err(Error::OrderKeyExhausted {
            after: "legacy name".to_string(),
            attempts: self.max_attempts,
        })
    }

    /// Random fraction strictly inside `(lo, hi)`, with `hi = None`
    /// meaning one. Returns `None` when the interval is empty.
    fn sample_fraction(&mut self, lo: &str, hi: Option<&str>) -> Option<String> {
        let lo = lo.as_bytes();
        let hi = hi.map(str::as_bytes);
        let mut bounded = hi.is_some();
        let mut out = String::new();

        for i in 0.. {
            let l = digit_at(lo, i);
            let h = match hi {
                Some(hi) if bounded => digit_at(hi, i),
                _ => 10,
            };
            if bounded && i >= lo.len() && hi.is_some_and(|hi| i >= hi.len()) {
                return None;
            }
            match h.checked_sub(l)? {
                0 => out.push(char::from(b'0' + l)),
                1 => {
                    out.push(char::from(b'0' + l));
                    bounded = false;
                }
                _ => {
                    let picked = self.rng.gen_range(l + 1..h);
                    out.push(char::from(b'0' + picked));
                    for _ in 0..self.rng.gen_range(0..=2) {
                        out.push(char::from(b'0' + self.rng.gen_range(1..=9u8)));
                    }
                    return Some(out);
                }
            }
        }
        None
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn digit_at(digits: &[u8], i: usize) -> u8 {
    digits.get(i).map(|d| d - b'0').unwrap_or(0)
}

/// `003.5` becomes `003.6`. Keys without a minor or ending in 9 yield `None`.
fn bump_last_digit(key: &OrderKey) -> Option<OrderKey> {
    let minor = key.minor.as_deref()?;
    let last = *minor.as_bytes().last()?;
    if last >= b'9' {
        return None;
    }
    let mut bumped = minor[..minor.len() - 1].to_string();
    bumped.push(char::from(last + 1));
    Some(OrderKey {
        major: key.major,
        minor: Some(bumped),
        width: key.width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn key(s: &str) -> OrderKey {
        OrderKey::parse(s).unwrap()
    }

    #[rstest]
    #[case("003", "003.5")]
    #[case("003.45", "003.5")]
    #[case("003.5", "004")]
    #[case("003.09", "003.1")]
    #[case("999", "1000")]
    fn keys_order_as_decimals(#[case] lower: &str, #[case] higher: &str) {
        assert!(key(lower) < key(higher));
    }

    #[test]
    fn trailing_zeros_do_not_change_the_key() {
        assert_eq!(key("003.50"), key("003.5"));
        assert_eq!(key("003.0"), key("003"));
    }

    #[rstest]
    #[case("0012.25-Patch", "0012.25")]
    #[case("012.25-Patch", "012.25")]
    #[case("1000-Patch", "1000")]
    fn split_then_display_keeps_the_written_major(#[case] stem: &str, #[case] rendered: &str) {
        let (k, name) = OrderKey::split(stem).unwrap();
        assert_eq!(k.to_string(), rendered);
        assert_eq!(k.apply(name), stem);
    }

    #[test]
    fn wide_major_is_the_same_key() {
        assert_eq!(key("0012.25"), key("012.25"));
        assert_eq!(key("0012"), OrderKey::new(12));
        assert_eq!(key("0012").to_string(), "0012");
    }

    #[test]
    fn split_separates_key_and_name() {
        let (k, name) = OrderKey::split("003.5-Scene_Map").unwrap();
        assert_eq!(k, key("003.5"));
        assert_eq!(name, "Scene_Map");
    }

    #[rstest]
    #[case("Main")]
    #[case("03-Short")]
    #[case("003Main")]
    #[case("003.-Main")]
    fn unkeyed_names_are_legacy(#[case] stem: &str) {
        assert!(OrderKey::split(stem).is_none());
        assert_eq!(OrderKey::strip(stem), stem);
    }

    #[test]
    fn display_pads_major() {
        assert_eq!(OrderKey::new(7).to_string(), "007");
        assert_eq!(key("0012.25").to_string(), "012.25");
    }

    #[test]
    fn bump_increments_last_fraction_digit() {
        let mut generator = KeyGenerator::with_seed(1);
        let next = generator.between(&key("003.5"), Some(&key("004")), |_| false).unwrap();
        assert_eq!(next, key("003.6"));
    }

    #[test]
    fn bump_respects_upper_neighbour() {
        let mut generator = KeyGenerator::with_seed(1);
        let next = generator
            .between(&key("003.5"), Some(&key("003.6")), |_| false)
            .unwrap();
        assert!(key("003.5") < next && next < key("003.6"));
    }

    #[test]
    fn sampling_descends_when_digits_are_adjacent() {
        let mut generator = KeyGenerator::with_seed(3);
        for _ in 0..50 {
            let next = generator
                .between(&key("003.59"), Some(&key("003.6")), |_| false)
                .unwrap();
            assert!(key("003.59") < next && next < key("003.6"), "{next}");
        }
    }

    #[test]
    fn legacy_keys_use_reserved_majors() {
        let mut generator = KeyGenerator::with_seed(5);
        let k = generator.after(None, None, |_| false).unwrap();
        assert!(LEGACY_MAJORS.contains(&k.major()));
        assert!(k.minor().is_none());
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut generator = KeyGenerator::with_seed(5);
        let err = generator.between(&key("003"), None, |_| true).unwrap_err();
        assert!(matches!(err, Error::OrderKeyExhausted { attempts: 32, .. }));
    }
}
