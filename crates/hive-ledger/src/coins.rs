//! Coin amount representation.
//!
//! Balances and prices are whole coins stored as `u64`. Amounts are never
//! negative by construction; every subtraction goes through a checked or
//! saturating variant so underflow is not representable.

use crate::COINS_PER_PAYOUT_UNIT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// An amount of Taskhive coins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Coins(u64);

impl Coins {
    /// Zero coins.
    pub const ZERO: Self = Self(0);

    /// Maximum representable amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Create an amount from a whole coin count.
    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    /// Get the coin count.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.0
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Checked subtraction. Returns `None` when `other` exceeds `self`.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(count) => Some(Self(count)),
            None => None,
        }
    }

    /// Checked multiplication by a slot count.
    #[must_use]
    pub const fn checked_mul(&self, factor: u64) -> Option<Self> {
        match self.0.checked_mul(factor) {
            Some(count) => Some(Self(count)),
            None => None,
        }
    }

    /// Saturating multiplication by a slot count.
    #[must_use]
    pub const fn saturating_mul(&self, factor: u64) -> Self {
        Self(self.0.saturating_mul(factor))
    }

    /// Convert to an external payout in currency cents at the fixed
    /// 20-coins-per-unit rate.
    ///
    /// The conversion is exact integer math with a `u128` intermediate;
    /// results that would overflow `u64` saturate to `u64::MAX`.
    ///
    /// # Examples
    /// ```
    /// use hive_ledger::Coins;
    ///
    /// // 200 coins = 10 currency units = 1000 cents
    /// assert_eq!(Coins::new(200).payout_cents(), 1000);
    ///
    /// // 20 coins = 1 unit
    /// assert_eq!(Coins::new(20).payout_cents(), 100);
    /// ```
    #[must_use]
    pub const fn payout_cents(&self) -> u64 {
        let cents = self.0 as u128 * 100 / COINS_PER_PAYOUT_UNIT as u128;
        if cents > u64::MAX as u128 {
            u64::MAX
        } else {
            cents as u64
        }
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} coins", self.0)
    }
}

impl Add for Coins {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Sum for Coins {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, c| acc.saturating_add(c))
    }
}

impl From<u64> for Coins {
    fn from(count: u64) -> Self {
        Self(count)
    }
}
