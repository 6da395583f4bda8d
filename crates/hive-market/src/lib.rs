//! # hive-market
//!
//! Marketplace workflows for the Taskhive platform.
//!
//! This crate provides:
//!
//! - Task lifecycle: funding (escrow debit), owner edits, deletion with
//!   refund and cascade
//! - Submission workflow: capacity-guarded submits, approve/reject
//!   settlement against payment snapshots
//! - Withdrawal workflow: request and admin decision at a fixed
//!   20-coins-per-unit payout rate
//! - Notification emission contract and a durable inbox sink
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hive_ledger::{AccountId, Coins, Ledger, Role};
//! use hive_market::{Inbox, MarketEngine, Resolution, TaskSpec};
//!
//! # async fn example() -> hive_market::Result<()> {
//! let ledger = Ledger::new();
//! let buyer = AccountId::new("buyer@example.com");
//! let worker = AccountId::new("worker@example.com");
//! ledger.register(buyer.clone(), "Ada", Role::Buyer).await?;
//! ledger.register(worker.clone(), "Grace", Role::Worker).await?;
//!
//! let inbox = Arc::new(Inbox::new());
//! let engine = MarketEngine::new(ledger, inbox, AccountId::new("admin@example.com"));
//!
//! // Fund a task, submit against it, settle the submission.
//! let task_id = engine
//!     .create_task(
//!         &buyer,
//!         TaskSpec {
//!             title: "Label images".into(),
//!             detail: "Bounding boxes around cats".into(),
//!             capacity: 5,
//!             payable_amount: Coins::new(10),
//!             deadline: chrono::Utc::now() + chrono::Duration::days(7),
//!             submission_info: "Dataset link".into(),
//!         },
//!     )
//!     .await?;
//! let submission_id = engine.submit(&worker, &task_id, "done").await?;
//! engine.resolve(&buyer, &submission_id, Resolution::Approve).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod notify;
pub mod stats;
pub mod submission;
pub mod task;
pub mod withdrawal;

pub use engine::{MarketEngine, TaskDeletion};
pub use error::{MarketError, Result};
pub use notify::{
    Inbox, Notification, NotificationId, NotificationSink, NotifyError, MAX_INBOX_PAGE,
};
pub use stats::{AdminStats, BuyerStats, WorkerStats};
pub use submission::{Resolution, Submission, SubmissionId, SubmissionStatus};
pub use task::{Task, TaskId, TaskPatch, TaskSpec};
pub use withdrawal::{
    Decision, Withdrawal, WithdrawalId, WithdrawalStatus, MIN_WITHDRAWAL_COINS,
};
