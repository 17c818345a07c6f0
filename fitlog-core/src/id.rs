//! Entity identifiers.
//!
//! Ids are integers derived from the creation time in milliseconds, the same
//! shape older exported data uses. Wall-clock milliseconds alone collide when
//! several entities are created in one burst (loading a routine copies every
//! exercise at once), so ids are issued through [`next_ids`], which keeps them
//! strictly increasing relative to the last id handed out by the store.
//!
//! Older data instead broke ties with a random fraction (`1700000000000.12`).
//! Those ids are kept exactly as read, fraction included, so two records
//! from the same millisecond never become one.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fraction digits kept for a legacy id; more than an f64 timestamp can carry.
const MAX_FRACTION_DIGITS: u32 = 18;

/// Errors that can occur when parsing an id from user input
#[derive(Error, Debug, PartialEq)]
pub enum EntityIdError {
    #[error("Invalid id '{0}': expected a number")]
    InvalidFormat(String),
}

/// Identifier of a workout, routine, exercise or food entry.
///
/// `fraction` holds the decimal digits after the point of a legacy id,
/// without trailing zeros; `fraction_digits` is `0` for every id issued here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntityId {
    whole: i64,
    fraction: u64,
    fraction_digits: u32,
}

impl EntityId {
    pub fn new(value: i64) -> Self {
        Self {
            whole: value,
            fraction: 0,
            fraction_digits: 0,
        }
    }

    /// Integer part; the millisecond timestamp the id was issued at.
    pub fn value(&self) -> i64 {
        self.whole
    }

    pub fn is_legacy(&self) -> bool {
        self.fraction_digits > 0
    }

    /// Builds an id from its decimal text, e.g. `"1700000000000.12"`.
    fn parse_decimal(s: &str) -> Option<Self> {
        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction.trim_end_matches('0')),
            None => (s, ""),
        };
        let whole = whole.parse::<i64>().ok()?;
        if fraction.is_empty() {
            return Some(Self::new(whole));
        }
        if fraction.len() > MAX_FRACTION_DIGITS as usize
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        Some(Self {
            whole,
            fraction: fraction.parse().ok()?,
            fraction_digits: fraction.len() as u32,
        })
    }

    /// Fraction scaled to a common number of digits, for ordering.
    fn scaled_fraction(&self) -> u128 {
        self.fraction as u128 * 10u128.pow(MAX_FRACTION_DIGITS - self.fraction_digits)
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.whole
            .cmp(&other.whole)
            .then_with(|| self.scaled_fraction().cmp(&other.scaled_fraction()))
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = if self.is_legacy() {
            format!(
                "{}.{:0width$}",
                self.whole,
                self.fraction,
                width = self.fraction_digits as usize
            )
        } else {
            self.whole.to_string()
        };
        f.pad(&text)
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s.trim()).ok_or_else(|| EntityIdError::InvalidFormat(s.to_string()))
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if !self.is_legacy() {
            return serializer.serialize_i64(self.whole);
        }
        // Shortest float formatting gives back the digits that were read
        let value: f64 = self.to_string().parse().map_err(serde::ser::Error::custom)?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Float(f64),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Int(v) => Ok(EntityId::new(v)),
            RawId::Float(v) if v.is_finite() => EntityId::parse_decimal(&v.to_string())
                .ok_or_else(|| serde::de::Error::custom(format!("invalid id {}", v))),
            RawId::Float(v) => Err(serde::de::Error::custom(format!("invalid id {}", v))),
        }
    }
}

/// Issues `count` ids after `last` for a clock reading of `now_ms`.
///
/// The first id is `now_ms` unless that would not be greater than `last`,
/// in which case the sequence continues from `last + 1`.
pub fn next_ids(last: Option<i64>, now_ms: i64, count: usize) -> Vec<EntityId> {
    let first = match last {
        Some(last) if last >= now_ms => last.saturating_add(1),
        _ => now_ms,
    };
    (0..count as i64)
        .map(|offset| EntityId::new(first.saturating_add(offset)))
        .collect()
}
