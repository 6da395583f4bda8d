//! Dashboard aggregates.
//!
//! Point-in-time reads for the three dashboard views. Values are computed
//! under the market lock, so they are mutually consistent for one call but
//! can interleave with settlements across calls.

use hive_ledger::Coins;
use serde::{Deserialize, Serialize};

/// Platform-wide aggregates for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminStats {
    /// Registered worker accounts.
    pub workers: usize,
    /// Registered buyer accounts.
    pub buyers: usize,
    /// Sum of all account balances.
    pub total_coins: Coins,
    /// Withdrawals awaiting a decision.
    pub pending_withdrawals: usize,
}

/// Aggregates over a buyer's own tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuyerStats {
    /// Tasks currently open.
    pub tasks: usize,
    /// Submissions awaiting this buyer's decision.
    pub pending_submissions: usize,
    /// Coins settled to workers from this buyer's tasks.
    pub total_settled: Coins,
}

/// Aggregates over a worker's submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Total submissions ever made.
    pub total_submissions: usize,
    /// Submissions awaiting a decision.
    pub pending: usize,
    /// Approved submissions.
    pub approved: usize,
    /// Rejected submissions.
    pub rejected: usize,
    /// Coins earned from approvals.
    pub total_earned: Coins,
}
