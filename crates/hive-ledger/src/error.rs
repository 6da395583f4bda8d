//! Error types for ledger operations.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No account exists for the given identity key.
    #[error("account not found: {id}")]
    AccountNotFound {
        /// The identity key that was looked up.
        id: String,
    },

    /// An account with the given identity key already exists.
    #[error("account already exists: {id}")]
    AccountExists {
        /// The identity key that collided.
        id: String,
    },

    /// Balance guard failed for a debit.
    #[error("insufficient funds: required {required} coins, available {available} coins")]
    InsufficientFunds {
        /// Coins required for the operation.
        required: u64,
        /// Coins currently available.
        available: u64,
    },

    /// The caller is not allowed to perform the operation.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// Why the operation was refused.
        reason: String,
    },

    /// A role value outside the closed set.
    #[error("invalid role: {value}")]
    InvalidRole {
        /// The rejected role string.
        value: String,
    },
}

impl LedgerError {
    /// Create an account-not-found error.
    #[must_use]
    pub fn account_not_found(id: impl Into<String>) -> Self {
        Self::AccountNotFound { id: id.into() }
    }

    /// Create an insufficient-funds error.
    #[must_use]
    pub const fn insufficient_funds(required: u64, available: u64) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_funds_display_carries_both_sides() {
        let err = LedgerError::insufficient_funds(100, 40);
        let message = err.to_string();
        assert!(message.contains("100"));
        assert!(message.contains("40"));
    }

    #[test]
    fn account_not_found_display() {
        let err = LedgerError::account_not_found("ghost@example.com");
        assert!(err.to_string().contains("ghost@example.com"));
    }

    #[test]
    fn invalid_role_display() {
        let err = LedgerError::InvalidRole {
            value: "superuser".to_string(),
        };
        assert!(err.to_string().contains("superuser"));
    }
}
