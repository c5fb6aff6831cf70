//! Monetary amounts in minor currency units.
//!
//! Files store money as an integer count of minor units (cents). Callers
//! supply amounts in major units (`50.00`); `rust_decimal` does the
//! conversion so no floating-point rounding is involved.

use crate::error::{FixedWidthError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A non-negative amount of money held as minor units.
///
/// # Examples
///
/// ```
/// use fixed_width_file::Amount;
///
/// let amount: Amount = "50.5".parse().unwrap();
/// assert_eq!(amount.minor_units(), 5050);
/// assert_eq!(amount.to_string(), "50.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Number of minor-unit digits in a major unit.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Amount(0);

    const MINOR_PER_MAJOR: u64 = 100;

    /// Wraps a raw count of minor units.
    pub const fn from_minor_units(units: u64) -> Self {
        Amount(units)
    }

    /// Returns the raw count of minor units.
    pub const fn minor_units(self) -> u64 {
        self.0
    }

    /// Converts a major-unit decimal into minor units.
    ///
    /// Rejects negative values and values with more than [`Self::SCALE`]
    /// fractional digits.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(FixedWidthError::InvalidAmount(format!(
                "{}: must not be negative",
                value
            )));
        }

        let scaled = value
            .abs()
            .checked_mul(Decimal::from(Self::MINOR_PER_MAJOR))
            .ok_or_else(|| FixedWidthError::InvalidAmount(format!("{}: too large", value)))?;

        if !scaled.fract().is_zero() {
            return Err(FixedWidthError::InvalidAmount(format!(
                "{}: more than {} decimal places",
                value,
                Self::SCALE
            )));
        }

        scaled
            .to_u64()
            .map(Amount)
            .ok_or_else(|| FixedWidthError::InvalidAmount(format!("{}: too large", value)))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Sums amounts, returning `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

impl FromStr for Amount {
    type Err = FixedWidthError;

    /// Parses a major-unit decimal such as `12.34`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)
            .map_err(|_| FixedWidthError::InvalidAmountFormat(trimmed.to_string()))?;
        Amount::from_decimal(decimal)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / Self::MINOR_PER_MAJOR,
            self.0 % Self::MINOR_PER_MAJOR
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
