//! Ledger amounts.
//!
//! Amounts are fixed-point integers (u64) to avoid floating-point errors.
//! The smallest unit is one base unit; one native coin is
//! [`BASE_UNITS_PER_NATIVE`] base units.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Base units in one native coin.
pub const BASE_UNITS_PER_NATIVE: u64 = 100_000_000;

const DECIMALS: usize = 8;

/// An amount of the ledger's native coin, stored in base units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn from_base_units(units: u64) -> Self {
        Self(units)
    }

    /// Whole native coins.
    pub fn from_native(coins: u64) -> Self {
        Self(coins.saturating_mul(BASE_UNITS_PER_NATIVE))
    }

    /// Hundredths of a native coin (`from_cents(1)` is 0.01).
    pub fn from_cents(cents: u64) -> Self {
        Self(cents.saturating_mul(BASE_UNITS_PER_NATIVE / 100))
    }

    pub fn base_units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Absolute difference between two amounts.
    pub fn abs_diff(self, other: Self) -> Self {
        Self(self.0.abs_diff(other.0))
    }

    /// Whether `self` is strictly closer than `tolerance` to `other`.
    pub fn within(self, other: Self, tolerance: Self) -> bool {
        self.abs_diff(other) < tolerance
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / BASE_UNITS_PER_NATIVE;
        let frac = self.0 % BASE_UNITS_PER_NATIVE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:0width$}", width = DECIMALS);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

/// Parses a decimal native-coin amount such as `"1"`, `"0.25"` or `"12.00000001"`.
impl FromStr for Amount {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidAmount(s.to_string());
        let s_trim = s.trim();
        let (whole, frac) = match s_trim.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s_trim, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > DECIMALS
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_units: u64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<width$}", width = DECIMALS)
                .parse()
                .map_err(|_| invalid())?
        };
        whole
            .checked_mul(BASE_UNITS_PER_NATIVE)
            .and_then(|w| w.checked_add(frac_units))
            .map(Self)
            .ok_or_else(invalid)
    }
}
