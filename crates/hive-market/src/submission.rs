//! Submission records and their resolution state machine.
//!
//! A submission moves `pending → approved` or `pending → rejected`; both
//! targets are terminal. The payable amount is snapshotted at submission
//! time, so later task edits never change what an approval settles.

use crate::error::{MarketError, Result};
use crate::task::{Task, TaskId};
use chrono::{DateTime, Utc};
use hive_ledger::{AccountId, Coins};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique submission identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(String);

impl SubmissionId {
    /// Create a new random submission ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("sub-{}", Uuid::new_v4()))
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

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Submission status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Awaiting the buyer's decision.
    Pending,
    /// Settled; the worker has been credited.
    Approved,
    /// Declined; the slot was restored to the task.
    Rejected,
}

impl SubmissionStatus {
    /// Whether the submission still awaits a decision.
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

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// The buyer's decision on a pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Settle the snapshot amount to the worker.
    Approve,
    /// Decline and restore the slot.
    Reject,
}

impl std::str::FromStr for Resolution {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(MarketError::validation(format!(
                "invalid resolution: {other}"
            ))),
        }
    }
}

/// A worker's submission against a task slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Unique submission ID.
    pub id: SubmissionId,

    /// The task this submission answers.
    pub task_id: TaskId,

    /// Task title at submission time (survives task deletion in views).
    pub task_title: String,

    /// The worker who submitted.
    pub worker: AccountId,

    /// Worker display name, for notifications.
    pub worker_name: String,

    /// The buyer who owns the task.
    pub buyer: AccountId,

    /// Proof of completion.
    pub details: String,

    /// Current status.
    pub status: SubmissionStatus,

    /// Payable amount snapshotted at submission time.
    pub payable_snapshot: Coins,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Create a pending submission against a task, snapshotting its
    /// current payable amount.
    #[must_use]
    pub fn new(
        task: &Task,
        worker: AccountId,
        worker_name: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            worker,
            worker_name: worker_name.into(),
            buyer: task.owner.clone(),
            details: details.into(),
            status: SubmissionStatus::Pending,
            payable_snapshot: task.payable_amount,
            created_at: Utc::now(),
        }
    }

    /// Mark approved.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyProcessed` if the status is terminal.
    pub fn approve(&mut self) -> Result<()> {
        self.transition_to(SubmissionStatus::Approved)
    }

    /// Mark rejected.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyProcessed` if the status is terminal.
    pub fn reject(&mut self) -> Result<()> {
        self.transition_to(SubmissionStatus::Rejected)
    }

    fn transition_to(&mut self, target: SubmissionStatus) -> Result<()> {
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
