//! Exact fixed-point currency amounts.
//!
//! Fares and revenue are carried as whole paise in an `i64` so that summed
//! revenue is reproducible from the per-record figures. Decimal strings are
//! parsed digit by digit; no floating point is involved anywhere.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

const PAISE_PER_RUPEE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyParseError {
    #[error("invalid currency amount: {0:?}")]
    Invalid(String),
    #[error("currency amount out of range: {0:?}")]
    OutOfRange(String),
}

/// A currency amount in paise (1/100 rupee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_paise(paise: i64) -> Self {
        Self(paise)
    }

    pub const fn from_rupees(rupees: i64) -> Self {
        Self(rupees * PAISE_PER_RUPEE)
    }

    pub const fn paise(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a count, returning `None` on overflow.
    pub fn checked_mul(self, count: u64) -> Option<Money> {
        let count = i64::try_from(count).ok()?;
        self.0.checked_mul(count).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Parses `"10"`, `"10.5"` or `"10.50"` (at most two fractional digits).
    pub fn parse(value: &str) -> Result<Self, MoneyParseError> {
        let trimmed = value.trim();
        let invalid = || MoneyParseError::Invalid(value.to_string());
        let out_of_range = || MoneyParseError::OutOfRange(value.to_string());

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if unsigned.contains('.') && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let rupees: i64 = whole.parse().map_err(|_| out_of_range())?;
        let mut paise: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid())?
        };
        if fraction.len() == 1 {
            paise *= 10;
        }

        let total = rupees
            .checked_mul(PAISE_PER_RUPEE)
            .and_then(|p| p.checked_add(paise))
            .ok_or_else(out_of_range)?;

        Ok(Self(if negative { -total } else { total }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_rupee = PAISE_PER_RUPEE as u64;
        write!(f, "{}{}.{:02}", sign, abs / per_rupee, abs % per_rupee)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Money::parse(&raw).map_err(de::Error::custom)
    }
}
