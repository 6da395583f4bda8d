//! The market engine: workflow handlers over the shared store.
//!
//! Every operation is an independent async handler against shared state.
//! The market mutex serializes the two hot counters — task capacity and
//! submission/withdrawal status — so a decrement or status flip is always a
//! compare-and-act on current state, never a read-modify-write across lock
//! boundaries. Fallible ledger steps run before the record writes they pay
//! for, inside the same critical section, which makes each operation
//! all-or-nothing. Lock order is market state, then ledger, never the
//! reverse.

use crate::error::{MarketError, Result};
use crate::notify::{
    Notification, NotificationSink, ROUTE_MY_SUBMISSIONS, ROUTE_TASK_REVIEW,
    ROUTE_WITHDRAW_REQUESTS, ROUTE_WITHDRAWALS,
};
use crate::stats::{AdminStats, BuyerStats, WorkerStats};
use crate::submission::{Resolution, Submission, SubmissionId, SubmissionStatus};
use crate::task::{Task, TaskId, TaskPatch, TaskSpec};
use crate::withdrawal::{Decision, Withdrawal, WithdrawalId};
use hive_ledger::{AccountId, Coins, Ledger, LedgerError, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Outcome of a task deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDeletion {
    /// Whether a refund was credited to the owner.
    pub refunded: bool,
    /// Coins refunded (zero for admin deletion of another buyer's task).
    pub refund_amount: Coins,
    /// Submissions removed by the cascade, any status.
    pub submissions_removed: usize,
}

/// Shared market state.
#[derive(Debug, Default)]
struct MarketState {
    tasks: HashMap<String, Task>,
    submissions: HashMap<String, Submission>,
    withdrawals: HashMap<String, Withdrawal>,
}

/// The market engine.
///
/// Clones share the same underlying state, so every request handler can
/// hold its own handle.
#[derive(Debug, Clone)]
pub struct MarketEngine {
    ledger: Ledger,
    sink: Arc<dyn NotificationSink>,
    admin_recipient: AccountId,
    state: Arc<Mutex<MarketState>>,
}

impl MarketEngine {
    /// Create an engine over a ledger, a notification sink, and the
    /// administrative account that receives withdrawal requests.
    #[must_use]
    pub fn new(ledger: Ledger, sink: Arc<dyn NotificationSink>, admin_recipient: AccountId) -> Self {
        Self {
            ledger,
            sink,
            admin_recipient,
            state: Arc::new(Mutex::new(MarketState::default())),
        }
    }

    /// The underlying ledger handle.
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ------------------------------------------------------------------
    // Task lifecycle
    // ------------------------------------------------------------------

    /// Create and fund a task.
    ///
    /// The escrow total (`capacity × payable_amount`) is debited from the
    /// buyer before the task record exists; on `InsufficientFunds` no task
    /// is created.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for non-buyers, `Validation` for a malformed
    /// spec, `InsufficientFunds` when the buyer cannot cover the escrow.
    pub async fn create_task(&self, buyer: &AccountId, spec: TaskSpec) -> Result<TaskId> {
        let account = self.ledger.account(buyer).await?;
        match account.role {
            Role::Buyer => {}
            Role::Worker | Role::Admin => {
                return Err(MarketError::unauthorized("only buyers can create tasks"));
            }
        }

        let task = Task::new(buyer.clone(), spec)?;
        let total = task.escrow_total();

        // Fails closed: the debit happens before any record write.
        self.ledger.debit(buyer, total).await?;

        let task_id = task.id.clone();
        let mut state = self.state.lock().await;
        state.tasks.insert(task_id.as_str().to_string(), task);
        drop(state);

        info!(task = %task_id, buyer = %buyer, escrow = %total, "task created");
        Ok(task_id)
    }

    /// Edit a task's descriptive fields. Owner only.
    ///
    /// Payable amount and capacity are immutable after creation.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` or `Unauthorized`.
    pub async fn update_task(
        &self,
        requester: &AccountId,
        task_id: &TaskId,
        patch: TaskPatch,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let task = state
            .tasks
            .get_mut(task_id.as_str())
            .ok_or_else(|| MarketError::TaskNotFound {
                id: task_id.to_string(),
            })?;
        if task.owner != *requester {
            return Err(MarketError::unauthorized("only the task owner may edit it"));
        }
        task.apply(patch);
        debug!(task = %task_id, "task updated");
        Ok(())
    }

    /// Delete a task, refunding the unconsumed escrow to the owner.
    ///
    /// The requester must be the owner or an admin. Admin deletion of
    /// another buyer's task refunds nobody. Every submission referencing
    /// the task is removed with it, pending ones included; their authors
    /// are not notified.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` or `Unauthorized`.
    pub async fn delete_task(&self, requester: &AccountId, task_id: &TaskId) -> Result<TaskDeletion> {
        let account = self.ledger.account(requester).await?;
        let mut state = self.state.lock().await;
        let task = state
            .tasks
            .get(task_id.as_str())
            .ok_or_else(|| MarketError::TaskNotFound {
                id: task_id.to_string(),
            })?;

        let is_owner = task.owner == *requester;
        let allowed = match account.role {
            Role::Admin => true,
            Role::Buyer => is_owner,
            Role::Worker => false,
        };
        if !allowed {
            return Err(MarketError::unauthorized(
                "only the task owner or an admin may delete a task",
            ));
        }

        let refund = task.refund_value();
        let owner = task.owner.clone();
        let refunded = is_owner && !refund.is_zero();
        if refunded {
            self.ledger.credit(&owner, refund).await?;
        }

        state.tasks.remove(task_id.as_str());
        let before = state.submissions.len();
        state.submissions.retain(|_, s| s.task_id != *task_id);
        let submissions_removed = before - state.submissions.len();
        drop(state);

        info!(
            task = %task_id,
            requester = %requester,
            refunded,
            refund = %refund,
            submissions_removed,
            "task deleted"
        );
        Ok(TaskDeletion {
            refunded,
            refund_amount: if refunded { refund } else { Coins::ZERO },
            submissions_removed,
        })
    }

    // ------------------------------------------------------------------
    // Submission workflow
    // ------------------------------------------------------------------

    /// Submit work against a task slot.
    ///
    /// The capacity decrement is a compare-and-decrement under the market
    /// lock: of two concurrent submits against a single remaining slot,
    /// exactly one succeeds and the other sees `TaskFull`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for non-workers, `TaskNotFound`,
    /// `AlreadySubmitted` when the worker has any submission for the task,
    /// `TaskFull` when no slots remain.
    pub async fn submit(
        &self,
        worker: &AccountId,
        task_id: &TaskId,
        details: impl Into<String>,
    ) -> Result<SubmissionId> {
        let account = self.ledger.account(worker).await?;
        match account.role {
            Role::Worker => {}
            Role::Buyer | Role::Admin => {
                return Err(MarketError::unauthorized("only workers can submit tasks"));
            }
        }

        let mut state = self.state.lock().await;
        if !state.tasks.contains_key(task_id.as_str()) {
            return Err(MarketError::TaskNotFound {
                id: task_id.to_string(),
            });
        }
        let duplicate = state
            .submissions
            .values()
            .any(|s| s.task_id == *task_id && s.worker == *worker);
        if duplicate {
            return Err(MarketError::AlreadySubmitted {
                task_id: task_id.to_string(),
                worker: worker.to_string(),
            });
        }

        let task = state
            .tasks
            .get_mut(task_id.as_str())
            .ok_or_else(|| MarketError::TaskNotFound {
                id: task_id.to_string(),
            })?;
        task.consume_slot()?;

        let submission = Submission::new(task, worker.clone(), account.name.clone(), details);
        let submission_id = submission.id.clone();
        let owner = task.owner.clone();
        let title = task.title.clone();
        state
            .submissions
            .insert(submission_id.as_str().to_string(), submission);
        drop(state);

        debug!(submission = %submission_id, task = %task_id, worker = %worker, "submission created");
        self.emit(
            &owner,
            format!("{} has submitted a task: {title}", account.name),
            ROUTE_TASK_REVIEW,
        );
        Ok(submission_id)
    }

    /// Resolve a pending submission.
    ///
    /// The status flip is a compare-and-set under the market lock, so a
    /// submission settles at most once. Approval credits the amount
    /// snapshotted at submission time, never the task's current payable
    /// amount, and leaves the slot consumed; rejection restores the slot.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionNotFound`, `Unauthorized` when the caller is not
    /// the task's buyer, `AlreadyProcessed` on terminal re-entry.
    pub async fn resolve(
        &self,
        buyer: &AccountId,
        submission_id: &SubmissionId,
        resolution: Resolution,
    ) -> Result<()> {
        let account = self.ledger.account(buyer).await?;
        let mut state = self.state.lock().await;
        let submission = state
            .submissions
            .get(submission_id.as_str())
            .ok_or_else(|| MarketError::SubmissionNotFound {
                id: submission_id.to_string(),
            })?;

        if submission.buyer != *buyer {
            return Err(MarketError::unauthorized(
                "only the task's buyer may resolve its submissions",
            ));
        }
        if !submission.status.is_pending() {
            return Err(MarketError::AlreadyProcessed {
                id: submission_id.to_string(),
                status: submission.status.to_string(),
            });
        }

        let worker = submission.worker.clone();
        let amount = submission.payable_snapshot;
        let title = submission.task_title.clone();
        let task_key = submission.task_id.as_str().to_string();

        match resolution {
            Resolution::Approve => {
                // Settle first; the status flip cannot fail afterwards, so
                // a credit failure leaves the submission pending.
                self.ledger.credit(&worker, amount).await?;
                let submission = state
                    .submissions
                    .get_mut(submission_id.as_str())
                    .ok_or_else(|| MarketError::SubmissionNotFound {
                        id: submission_id.to_string(),
                    })?;
                submission.approve()?;
                drop(state);

                info!(
                    submission = %submission_id,
                    worker = %worker,
                    amount = %amount,
                    "submission approved"
                );
                self.emit(
                    &worker,
                    format!(
                        "You have earned {amount} from {} for completing {title}",
                        account.name
                    ),
                    ROUTE_MY_SUBMISSIONS,
                );
            }
            Resolution::Reject => {
                let submission = state
                    .submissions
                    .get_mut(submission_id.as_str())
                    .ok_or_else(|| MarketError::SubmissionNotFound {
                        id: submission_id.to_string(),
                    })?;
                submission.reject()?;
                if let Some(task) = state.tasks.get_mut(&task_key) {
                    task.restore_slot();
                }
                drop(state);

                info!(submission = %submission_id, worker = %worker, "submission rejected");
                self.emit(
                    &worker,
                    format!(
                        "Your submission for {title} has been rejected by {}",
                        account.name
                    ),
                    ROUTE_MY_SUBMISSIONS,
                );
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Withdrawal workflow
    // ------------------------------------------------------------------

    /// Request a payout of coins.
    ///
    /// The balance is checked at request time but nothing is held: the
    /// coins stay spendable until an admin decides, and the decision-time
    /// debit is the real guard.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for non-workers, `Validation` for missing
    /// payout fields, `BelowMinimum` under 200 coins, `InsufficientFunds`
    /// when the balance cannot cover the request right now.
    pub async fn request_withdrawal(
        &self,
        worker: &AccountId,
        coins: Coins,
        payment_system: impl Into<String>,
        account_number: impl Into<String>,
    ) -> Result<WithdrawalId> {
        let account = self.ledger.account(worker).await?;
        match account.role {
            Role::Worker => {}
            Role::Buyer | Role::Admin => {
                return Err(MarketError::unauthorized(
                    "only workers can request withdrawals",
                ));
            }
        }

        let withdrawal = Withdrawal::new(
            worker.clone(),
            account.name.clone(),
            coins,
            payment_system,
            account_number,
        )?;

        if account.balance < coins {
            return Err(
                LedgerError::insufficient_funds(coins.count(), account.balance.count()).into(),
            );
        }

        let withdrawal_id = withdrawal.id.clone();
        let payout = withdrawal.payout_display();
        let mut state = self.state.lock().await;
        state
            .withdrawals
            .insert(withdrawal_id.as_str().to_string(), withdrawal);
        drop(state);

        info!(withdrawal = %withdrawal_id, worker = %worker, coins = %coins, "withdrawal requested");
        self.emit(
            &self.admin_recipient,
            format!("{} has requested a withdrawal of {payout}", account.name),
            ROUTE_WITHDRAW_REQUESTS,
        );
        Ok(withdrawal_id)
    }

    /// Decide a pending withdrawal.
    ///
    /// Approval re-checks the balance by debiting at decision time; if the
    /// worker has since spent the coins the request stays pending and
    /// `InsufficientFunds` propagates. Rejection touches no balance — the
    /// coins were never held.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for non-admins, `WithdrawalNotFound`,
    /// `AlreadyProcessed` on terminal re-entry, `InsufficientFunds` on a
    /// failed approval guard.
    pub async fn decide_withdrawal(
        &self,
        admin: &AccountId,
        withdrawal_id: &WithdrawalId,
        decision: Decision,
    ) -> Result<()> {
        let account = self.ledger.account(admin).await?;
        match account.role {
            Role::Admin => {}
            Role::Worker | Role::Buyer => {
                return Err(MarketError::unauthorized(
                    "deciding withdrawals requires the admin role",
                ));
            }
        }

        let mut state = self.state.lock().await;
        let withdrawal = state
            .withdrawals
            .get(withdrawal_id.as_str())
            .ok_or_else(|| MarketError::WithdrawalNotFound {
                id: withdrawal_id.to_string(),
            })?;
        if !withdrawal.status.is_pending() {
            return Err(MarketError::AlreadyProcessed {
                id: withdrawal_id.to_string(),
                status: withdrawal.status.to_string(),
            });
        }

        let worker = withdrawal.worker.clone();
        let coins = withdrawal.coin_amount;
        let payout = withdrawal.payout_display();

        match decision {
            Decision::Approve => {
                // Decision-time guard: debit before the status flip.
                self.ledger.debit(&worker, coins).await?;
                let withdrawal = state
                    .withdrawals
                    .get_mut(withdrawal_id.as_str())
                    .ok_or_else(|| MarketError::WithdrawalNotFound {
                        id: withdrawal_id.to_string(),
                    })?;
                withdrawal.approve()?;
                drop(state);

                info!(withdrawal = %withdrawal_id, worker = %worker, coins = %coins, "withdrawal approved");
                self.emit(
                    &worker,
                    format!("Your withdrawal request of {payout} has been approved"),
                    ROUTE_WITHDRAWALS,
                );
            }
            Decision::Reject => {
                let withdrawal = state
                    .withdrawals
                    .get_mut(withdrawal_id.as_str())
                    .ok_or_else(|| MarketError::WithdrawalNotFound {
                        id: withdrawal_id.to_string(),
                    })?;
                withdrawal.reject()?;
                drop(state);

                info!(withdrawal = %withdrawal_id, worker = %worker, "withdrawal rejected");
                self.emit(
                    &worker,
                    format!("Your withdrawal request of {payout} has been rejected"),
                    ROUTE_WITHDRAWALS,
                );
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Get a task by ID.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound`.
    pub async fn task(&self, id: &TaskId) -> Result<Task> {
        let state = self.state.lock().await;
        state
            .tasks
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| MarketError::TaskNotFound { id: id.to_string() })
    }

    /// Tasks with remaining capacity, newest first.
    pub async fn open_tasks(&self) -> Vec<Task> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.has_capacity())
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Tasks owned by a buyer, newest first.
    pub async fn tasks_for(&self, owner: &AccountId) -> Vec<Task> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.owner == *owner)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Get a submission by ID.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionNotFound`.
    pub async fn submission(&self, id: &SubmissionId) -> Result<Submission> {
        let state = self.state.lock().await;
        state
            .submissions
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| MarketError::SubmissionNotFound { id: id.to_string() })
    }

    /// A worker's submissions, optionally filtered by status, newest first.
    pub async fn submissions_for_worker(
        &self,
        worker: &AccountId,
        status: Option<SubmissionStatus>,
    ) -> Vec<Submission> {
        let state = self.state.lock().await;
        let mut submissions: Vec<Submission> = state
            .submissions
            .values()
            .filter(|s| s.worker == *worker && status.is_none_or(|wanted| s.status == wanted))
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        submissions
    }

    /// Submissions against a buyer's tasks, optionally filtered by status,
    /// newest first.
    pub async fn submissions_for_buyer(
        &self,
        buyer: &AccountId,
        status: Option<SubmissionStatus>,
    ) -> Vec<Submission> {
        let state = self.state.lock().await;
        let mut submissions: Vec<Submission> = state
            .submissions
            .values()
            .filter(|s| s.buyer == *buyer && status.is_none_or(|wanted| s.status == wanted))
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        submissions
    }

    /// Get a withdrawal by ID.
    ///
    /// # Errors
    ///
    /// Returns `WithdrawalNotFound`.
    pub async fn withdrawal(&self, id: &WithdrawalId) -> Result<Withdrawal> {
        let state = self.state.lock().await;
        state
            .withdrawals
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| MarketError::WithdrawalNotFound { id: id.to_string() })
    }

    /// A worker's withdrawal requests, newest first.
    pub async fn withdrawals_for(&self, worker: &AccountId) -> Vec<Withdrawal> {
        let state = self.state.lock().await;
        let mut withdrawals: Vec<Withdrawal> = state
            .withdrawals
            .values()
            .filter(|w| w.worker == *worker)
            .cloned()
            .collect();
        withdrawals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        withdrawals
    }

    /// All withdrawals awaiting a decision, oldest first.
    pub async fn pending_withdrawals(&self) -> Vec<Withdrawal> {
        let state = self.state.lock().await;
        let mut withdrawals: Vec<Withdrawal> = state
            .withdrawals
            .values()
            .filter(|w| w.status.is_pending())
            .cloned()
            .collect();
        withdrawals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        withdrawals
    }

    /// Coins still reserved against unconsumed task slots.
    pub async fn open_escrow_value(&self) -> Coins {
        let state = self.state.lock().await;
        state.tasks.values().map(Task::refund_value).sum()
    }

    /// Coins reserved against submissions awaiting a decision.
    pub async fn pending_submission_value(&self) -> Coins {
        let state = self.state.lock().await;
        state
            .submissions
            .values()
            .filter(|s| s.status.is_pending())
            .map(|s| s.payable_snapshot)
            .sum()
    }

    // ------------------------------------------------------------------
    // Dashboard stats
    // ------------------------------------------------------------------

    /// Platform-wide aggregates for the admin dashboard.
    pub async fn admin_stats(&self) -> AdminStats {
        let accounts = self.ledger.accounts().await;
        let total_coins = self.ledger.total_coins().await;
        let state = self.state.lock().await;

        AdminStats {
            workers: accounts
                .iter()
                .filter(|a| matches!(a.role, Role::Worker))
                .count(),
            buyers: accounts
                .iter()
                .filter(|a| matches!(a.role, Role::Buyer))
                .count(),
            total_coins,
            pending_withdrawals: state
                .withdrawals
                .values()
                .filter(|w| w.status.is_pending())
                .count(),
        }
    }

    /// Aggregates over a buyer's tasks and their submissions.
    pub async fn buyer_stats(&self, buyer: &AccountId) -> BuyerStats {
        let state = self.state.lock().await;

        BuyerStats {
            tasks: state.tasks.values().filter(|t| t.owner == *buyer).count(),
            pending_submissions: state
                .submissions
                .values()
                .filter(|s| s.buyer == *buyer && s.status.is_pending())
                .count(),
            total_settled: state
                .submissions
                .values()
                .filter(|s| s.buyer == *buyer && s.status == SubmissionStatus::Approved)
                .map(|s| s.payable_snapshot)
                .sum(),
        }
    }

    /// Aggregates over a worker's submissions.
    pub async fn worker_stats(&self, worker: &AccountId) -> WorkerStats {
        let state = self.state.lock().await;
        let mine: Vec<&Submission> = state
            .submissions
            .values()
            .filter(|s| s.worker == *worker)
            .collect();

        WorkerStats {
            total_submissions: mine.len(),
            pending: mine.iter().filter(|s| s.status.is_pending()).count(),
            approved: mine
                .iter()
                .filter(|s| s.status == SubmissionStatus::Approved)
                .count(),
            rejected: mine
                .iter()
                .filter(|s| s.status == SubmissionStatus::Rejected)
                .count(),
            total_earned: mine
                .iter()
                .filter(|s| s.status == SubmissionStatus::Approved)
                .map(|s| s.payable_snapshot)
                .sum(),
        }
    }

    // ------------------------------------------------------------------
    // Notification emission
    // ------------------------------------------------------------------

    /// Best-effort emission: a sink failure is logged and swallowed, never
    /// propagated into the workflow result.
    fn emit(&self, to: &AccountId, message: String, action_route: &str) {
        let notification = Notification::new(to.clone(), message, action_route);
        if let Err(error) = self.sink.deliver(&notification) {
            warn!(
                sink = self.sink.name(),
                recipient = %to,
                %error,
                "notification dropped"
            );
        }
    }
}
