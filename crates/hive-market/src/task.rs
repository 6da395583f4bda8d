//! Task records and escrow accounting.
//!
//! A task reserves `original_capacity × payable_amount` coins from its buyer
//! at creation. The live `capacity` counts remaining worker slots: submits
//! consume a slot, rejections restore one, and the refund on deletion is
//! whatever the unconsumed slots are still worth.

use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use hive_ledger::{AccountId, Coins};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new random task ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("task-{}", Uuid::new_v4()))
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

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task title.
    pub title: String,
    /// Full task description.
    pub detail: String,
    /// Worker slots to fund.
    pub capacity: u64,
    /// Coins paid per approved submission.
    pub payable_amount: Coins,
    /// Completion deadline.
    pub deadline: DateTime<Utc>,
    /// What workers must submit as proof.
    pub submission_info: String,
}

impl TaskSpec {
    /// Validate that all fields are present and positive.
    ///
    /// # Errors
    ///
    /// Returns `Validation` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(MarketError::validation("title must not be empty"));
        }
        if self.detail.trim().is_empty() {
            return Err(MarketError::validation("detail must not be empty"));
        }
        if self.submission_info.trim().is_empty() {
            return Err(MarketError::validation("submission info must not be empty"));
        }
        if self.capacity == 0 {
            return Err(MarketError::validation("capacity must be positive"));
        }
        if self.payable_amount.is_zero() {
            return Err(MarketError::validation("payable amount must be positive"));
        }
        if self.payable_amount.checked_mul(self.capacity).is_none() {
            return Err(MarketError::validation(
                "escrow total exceeds the representable coin range",
            ));
        }
        Ok(())
    }
}

/// Owner-editable task fields.
///
/// Payable amount and capacity are deliberately absent: they are immutable
/// after creation, which keeps submission-time payment snapshots sound.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New title, if changing.
    pub title: Option<String>,
    /// New detail, if changing.
    pub detail: Option<String>,
    /// New submission info, if changing.
    pub submission_info: Option<String>,
}

impl TaskPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the submission info.
    #[must_use]
    pub fn with_submission_info(mut self, info: impl Into<String>) -> Self {
        self.submission_info = Some(info.into());
        self
    }
}

/// A funded task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID.
    pub id: TaskId,

    /// The buyer who funded the task.
    pub owner: AccountId,

    /// Task title.
    pub title: String,

    /// Full task description.
    pub detail: String,

    /// What workers must submit as proof.
    pub submission_info: String,

    /// Remaining worker slots.
    pub capacity: u64,

    /// Slot count at creation; fixed for escrow accounting.
    pub original_capacity: u64,

    /// Coins paid per approved submission.
    pub payable_amount: Coins,

    /// Completion deadline.
    pub deadline: DateTime<Utc>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task from a validated spec.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the spec is invalid.
    pub fn new(owner: AccountId, spec: TaskSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            id: TaskId::new(),
            owner,
            title: spec.title,
            detail: spec.detail,
            submission_info: spec.submission_info,
            capacity: spec.capacity,
            original_capacity: spec.capacity,
            payable_amount: spec.payable_amount,
            deadline: spec.deadline,
            created_at: Utc::now(),
        })
    }

    /// Coins reserved from the buyer when this task was created.
    #[must_use]
    pub const fn escrow_total(&self) -> Coins {
        // Validated against overflow at creation.
        self.payable_amount.saturating_mul(self.original_capacity)
    }

    /// Coins the unconsumed slots are still worth.
    #[must_use]
    pub const fn refund_value(&self) -> Coins {
        self.payable_amount.saturating_mul(self.capacity)
    }

    /// Whether the task can accept another submission.
    #[must_use]
    pub const fn has_capacity(&self) -> bool {
        self.capacity > 0
    }

    /// Consume one worker slot.
    ///
    /// # Errors
    ///
    /// Returns `TaskFull` when no slots remain.
    pub fn consume_slot(&mut self) -> Result<()> {
        if self.capacity == 0 {
            return Err(MarketError::TaskFull {
                task_id: self.id.to_string(),
            });
        }
        self.capacity -= 1;
        Ok(())
    }

    /// Restore one worker slot, clamped to the original capacity.
    pub fn restore_slot(&mut self) {
        self.capacity = (self.capacity + 1).min(self.original_capacity);
    }

    /// Apply an owner edit. Payable amount and capacity are untouched.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(detail) = patch.detail {
            self.detail = detail;
        }
        if let Some(info) = patch.submission_info {
            self.submission_info = info;
        }
    }
}
