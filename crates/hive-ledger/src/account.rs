//! Accounts and roles.
//!
//! Identity verification happens outside this crate; an [`AccountId`] is the
//! opaque identity key the external provider hands us. Roles are a closed
//! set — every authorization decision matches on [`Role`] exhaustively, so
//! an unknown role value cannot slip past a check.

use crate::error::{LedgerError, Result};
use crate::{BUYER_SIGNUP_GRANT, WORKER_SIGNUP_GRANT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::coins::Coins;

/// The identity key of an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account id from an identity key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the identity key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// The role an account holds on the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Completes tasks and earns coins.
    Worker,
    /// Funds tasks and reviews submissions.
    Buyer,
    /// Operates the platform; decides withdrawals and manages accounts.
    Admin,
}

impl Role {
    /// Returns all defined roles.
    #[must_use]
    pub fn all() -> &'static [Role] {
        &[Role::Worker, Role::Buyer, Role::Admin]
    }

    /// The coin grant issued when an account registers with this role.
    #[must_use]
    pub const fn signup_grant(&self) -> Coins {
        match self {
            Self::Worker => WORKER_SIGNUP_GRANT,
            Self::Buyer => BUYER_SIGNUP_GRANT,
            Self::Admin => Coins::ZERO,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Worker => write!(f, "worker"),
            Self::Buyer => write!(f, "buyer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "worker" => Ok(Self::Worker),
            "buyer" => Ok(Self::Buyer),
            "admin" => Ok(Self::Admin),
            other => Err(LedgerError::InvalidRole {
                value: other.to_string(),
            }),
        }
    }
}

/// A marketplace account with a coin balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Identity key.
    pub id: AccountId,

    /// Display name.
    pub name: String,

    /// Role held by this account.
    pub role: Role,

    /// Current coin balance.
    pub balance: Coins,

    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a freshly registered account with its role-based signup grant.
    #[must_use]
    pub fn new(id: AccountId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            balance: role.signup_grant(),
            created_at: Utc::now(),
        }
    }
}
