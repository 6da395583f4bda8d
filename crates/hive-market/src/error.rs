//! Error types for marketplace workflows.

use thiserror::Error;

/// Result type alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors that can occur in marketplace workflows.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Malformed or missing input. Never retried.
    #[error("validation failed: {reason}")]
    Validation {
        /// What was wrong with the input.
        reason: String,
    },

    /// Role or ownership mismatch.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// Why the operation was refused.
        reason: String,
    },

    /// Task not found.
    #[error("task not found: {id}")]
    TaskNotFound {
        /// The task ID that was looked up.
        id: String,
    },

    /// Submission not found.
    #[error("submission not found: {id}")]
    SubmissionNotFound {
        /// The submission ID that was looked up.
        id: String,
    },

    /// Withdrawal not found.
    #[error("withdrawal not found: {id}")]
    WithdrawalNotFound {
        /// The withdrawal ID that was looked up.
        id: String,
    },

    /// The task has no remaining worker slots.
    #[error("task is full: {task_id}")]
    TaskFull {
        /// The task whose capacity is exhausted.
        task_id: String,
    },

    /// The worker already has a submission for this task, in any status.
    #[error("already submitted: worker {worker} on task {task_id}")]
    AlreadySubmitted {
        /// The task in question.
        task_id: String,
        /// The worker who already submitted.
        worker: String,
    },

    /// Re-entry into a terminal workflow state.
    #[error("already processed: {id} is {status}")]
    AlreadyProcessed {
        /// The record whose state is terminal.
        id: String,
        /// The terminal status it holds.
        status: String,
    },

    /// Withdrawal amount below the platform minimum.
    #[error("below minimum withdrawal: requested {requested} coins, minimum {minimum} coins")]
    BelowMinimum {
        /// Coins requested.
        requested: u64,
        /// The platform minimum.
        minimum: u64,
    },

    /// Ledger operation failed (insufficient funds, unknown account, ...).
    #[error(transparent)]
    Ledger(#[from] hive_ledger::LedgerError),
}

impl MarketError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Check whether this error is an insufficient-funds guard failure.
    #[must_use]
    pub const fn is_insufficient_funds(&self) -> bool {
        matches!(
            self,
            Self::Ledger(hive_ledger::LedgerError::InsufficientFunds { .. })
        )
    }
}
