//! Withdrawal requests and their decision state machine.
//!
//! A withdrawal converts a worker's coins into an external payout at the
//! fixed 20-coins-per-unit rate. Requesting holds nothing: the coins stay
//! spendable until an admin decides, and the decision-time debit is the
//! real balance guard.

use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use hive_ledger::{AccountId, Coins};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Minimum coins a withdrawal may request.
pub const MIN_WITHDRAWAL_COINS: Coins = Coins::new(200);

/// Unique withdrawal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WithdrawalId(String);

impl WithdrawalId {
    /// Create a new random withdrawal ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("wd-{}", Uuid::new_v4()))
    }

    /// Create from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WithdrawalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WithdrawalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Withdrawal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Awaiting an admin decision.
    Pending,
    /// Approved; the coins have been debited.
    Approved,
    /// Rejected; no balance was touched.
    Rejected,
}

impl WithdrawalStatus {
    /// Whether the request still awaits a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// The admin's decision on a pending withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Debit the coins and pay out.
    Approve,
    /// Decline; the coins were never held.
    Reject,
}

impl std::str::FromStr for Decision {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(MarketError::validation(format!("invalid decision: {other}"))),
        }
    }
}

/// A request to convert coins into an external payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Unique withdrawal ID.
    pub id: WithdrawalId,

    /// The worker requesting the payout.
    pub worker: AccountId,

    /// Worker display name, for notifications.
    pub worker_name: String,

    /// Coins to convert.
    pub coin_amount: Coins,

    /// Derived payout in currency cents (20 coins = 1 unit).
    pub payout_cents: u64,

    /// External payment system the payout goes to.
    pub payment_system: String,

    /// Account number at the payment system.
    pub account_number: String,

    /// Current status.
    pub status: WithdrawalStatus,

    /// Request timestamp.
    pub created_at: DateTime<Utc>,
}

impl Withdrawal {
    /// Create a pending withdrawal request.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the payout fields are missing and
    /// `BelowMinimum` if the amount is under [`MIN_WITHDRAWAL_COINS`].
    pub fn new(
        worker: AccountId,
        worker_name: impl Into<String>,
        coin_amount: Coins,
        payment_system: impl Into<String>,
        account_number: impl Into<String>,
    ) -> Result<Self> {
        let payment_system = payment_system.into();
        let account_number = account_number.into();

        if payment_system.trim().is_empty() {
            return Err(MarketError::validation("payment system must not be empty"));
        }
        if account_number.trim().is_empty() {
            return Err(MarketError::validation("account number must not be empty"));
        }
        if coin_amount < MIN_WITHDRAWAL_COINS {
            return Err(MarketError::BelowMinimum {
                requested: coin_amount.count(),
                minimum: MIN_WITHDRAWAL_COINS.count(),
            });
        }

        Ok(Self {
            id: WithdrawalId::new(),
            worker,
            worker_name: worker_name.into(),
            payout_cents: coin_amount.payout_cents(),
            coin_amount,
            payment_system,
            account_number,
            status: WithdrawalStatus::Pending,
            created_at: Utc::now(),
        })
    }

    /// The payout formatted in currency units, e.g. `$10.00`.
    #[must_use]
    pub fn payout_display(&self) -> String {
        format!("${}.{:02}", self.payout_cents / 100, self.payout_cents % 100)
    }

    /// Mark approved.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyProcessed` if the status is terminal.
    pub fn approve(&mut self) -> Result<()> {
        self.transition_to(WithdrawalStatus::Approved)
    }

    /// Mark rejected.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyProcessed` if the status is terminal.
    pub fn reject(&mut self) -> Result<()> {
        self.transition_to(WithdrawalStatus::Rejected)
    }

    fn transition_to(&mut self, target: WithdrawalStatus) -> Result<()> {
        if !self.status.is_pending() {
            return Err(MarketError::AlreadyProcessed {
                id: self.id.to_string(),
                status: self.status.to_string(),
            });
        }
        self.status = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn request(coins: u64) -> Result<Withdrawal> {
        Withdrawal::new(
            AccountId::new("worker@example.com"),
            "Worker",
            Coins::new(coins),
            "bkash",
            "01700000000",
        )
    }

    #[test]
    fn minimum_boundary() {
        let below = request(199);
        assert!(matches!(
            below,
            Err(MarketError::BelowMinimum {
                requested: 199,
                minimum: 200
            })
        ));

        let at = request(200).expect("should create");
        assert_eq!(at.status, WithdrawalStatus::Pending);
        assert_eq!(at.payout_cents, 1000);
    }

    #[test_case(200, "$10.00")]
    #[test_case(250, "$12.50")]
    #[test_case(219, "$10.95")]
    #[test_case(4000, "$200.00")]
    fn payout_display_formats_cents(coins: u64, expected: &str) {
        let withdrawal = request(coins).expect("should create");
        assert_eq!(withdrawal.payout_display(), expected);
    }

    #[test]
    fn missing_payout_fields_are_rejected() {
        let no_system = Withdrawal::new(
            AccountId::new("w@example.com"),
            "W",
            Coins::new(200),
            "  ",
            "0170",
        );
        assert!(matches!(no_system, Err(MarketError::Validation { .. })));

        let no_account = Withdrawal::new(
            AccountId::new("w@example.com"),
            "W",
            Coins::new(200),
            "bkash",
            "",
        );
        assert!(matches!(no_account, Err(MarketError::Validation { .. })));
    }

    #[test]
    fn approve_is_terminal() {
        let mut withdrawal = request(200).expect("should create");
        withdrawal.approve().expect("should approve");
        assert_eq!(withdrawal.status, WithdrawalStatus::Approved);

        let again = withdrawal.approve();
        assert!(matches!(again, Err(MarketError::AlreadyProcessed { .. })));
        let flip = withdrawal.reject();
        assert!(matches!(flip, Err(MarketError::AlreadyProcessed { .. })));
    }

    #[test]
    fn reject_is_terminal() {
        let mut withdrawal = request(300).expect("should create");
        withdrawal.reject().expect("should reject");
        assert_eq!(withdrawal.status, WithdrawalStatus::Rejected);
        assert!(withdrawal.status.is_terminal());
    }

    #[test]
    fn withdrawal_serialization_roundtrip() {
        let withdrawal = request(400).expect("should create");
        let json = serde_json::to_string(&withdrawal).expect("serialize");
        let parsed: Withdrawal = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.id, withdrawal.id);
        assert_eq!(parsed.coin_amount, withdrawal.coin_amount);
        assert_eq!(parsed.payout_cents, withdrawal.payout_cents);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn payout_is_exact_for_valid_requests(coins in 200u64..=1_000_000_000) {
                let withdrawal = request(coins).expect("should create");
                // cents * 20 == coins * 100 exactly
                prop_assert_eq!(
                    u128::from(withdrawal.payout_cents) * 20,
                    u128::from(coins) * 100
                );
            }
        }
    }
}
