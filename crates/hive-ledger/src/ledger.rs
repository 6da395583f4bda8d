//! The coin ledger.
//!
//! [`Ledger`] is a cheaply-cloneable handle around shared account state.
//! Every balance mutation happens inside a single lock acquisition: the
//! guard (balance check) and the write are one critical section, so a debit
//! can never observe or produce a negative balance regardless of how many
//! handlers race on the same account.

use crate::account::{Account, AccountId, Role};
use crate::coins::Coins;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Unique purchase receipt identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptId(String);

impl ReceiptId {
    /// Create a new random receipt ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("rcpt-{}", Uuid::new_v4()))
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReceiptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record of a coin top-up settled through the external payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Unique receipt ID.
    pub id: ReceiptId,

    /// The buyer who purchased coins.
    pub buyer: AccountId,

    /// Coins credited.
    pub coin_amount: Coins,

    /// Price paid, in currency cents.
    pub amount_paid_cents: u64,

    /// Gateway reference for the settled payment.
    pub payment_ref: String,

    /// Purchase timestamp.
    pub created_at: DateTime<Utc>,
}

/// Shared ledger state.
#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<String, Account>,
    receipts: Vec<PurchaseReceipt>,
}

/// The coin ledger.
///
/// Clones share the same underlying state, so every workflow handler can
/// hold its own handle.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    state: Arc<Mutex<LedgerState>>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account with its role-based signup grant.
    ///
    /// # Errors
    ///
    /// Returns `AccountExists` if the identity key is already registered.
    pub async fn register(
        &self,
        id: AccountId,
        name: impl Into<String>,
        role: Role,
    ) -> Result<Account> {
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(id.as_str()) {
            return Err(LedgerError::AccountExists { id: id.to_string() });
        }

        let account = Account::new(id.clone(), name, role);
        state
            .accounts
            .insert(id.as_str().to_string(), account.clone());

        info!(
            account = %id,
            role = %role,
            grant = %account.balance,
            "account registered"
        );
        Ok(account)
    }

    /// Look up an account by identity key.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account exists.
    pub async fn account(&self, id: &AccountId) -> Result<Account> {
        let state = self.state.lock().await;
        state
            .accounts
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| LedgerError::account_not_found(id.as_str()))
    }

    /// Get the current balance of an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account exists.
    pub async fn balance(&self, id: &AccountId) -> Result<Coins> {
        Ok(self.account(id).await?.balance)
    }

    /// Unconditionally increase an account's balance.
    ///
    /// Credits always succeed for an existing account; the addition
    /// saturates at `u64::MAX`. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account exists.
    pub async fn credit(&self, id: &AccountId, amount: Coins) -> Result<Coins> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(id.as_str())
            .ok_or_else(|| LedgerError::account_not_found(id.as_str()))?;
        account.balance = account.balance.saturating_add(amount);
        let balance = account.balance;

        debug!(account = %id, amount = %amount, balance = %balance, "credit applied");
        Ok(balance)
    }

    /// Conditionally decrease an account's balance.
    ///
    /// The balance guard and the write are one critical section: either the
    /// full amount is available and gets deducted, or nothing changes.
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` when the balance cannot cover the amount,
    /// `AccountNotFound` if no account exists.
    pub async fn debit(&self, id: &AccountId, amount: Coins) -> Result<Coins> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(id.as_str())
            .ok_or_else(|| LedgerError::account_not_found(id.as_str()))?;

        let remaining = account.balance.checked_sub(amount).ok_or_else(|| {
            LedgerError::insufficient_funds(amount.count(), account.balance.count())
        })?;
        account.balance = remaining;

        debug!(account = %id, amount = %amount, balance = %remaining, "debit applied");
        Ok(remaining)
    }

    /// Credit a buyer with purchased coins and record the receipt.
    ///
    /// The gateway checkout itself happens outside the ledger; this records
    /// its settled result.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the account does not hold the buyer role,
    /// `AccountNotFound` if no account exists.
    pub async fn top_up(
        &self,
        id: &AccountId,
        coins: Coins,
        amount_paid_cents: u64,
        payment_ref: impl Into<String>,
    ) -> Result<PurchaseReceipt> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(id.as_str())
            .ok_or_else(|| LedgerError::account_not_found(id.as_str()))?;

        match account.role {
            Role::Buyer => {}
            Role::Worker | Role::Admin => {
                return Err(LedgerError::unauthorized("only buyers can purchase coins"));
            }
        }

        account.balance = account.balance.saturating_add(coins);

        let receipt = PurchaseReceipt {
            id: ReceiptId::new(),
            buyer: id.clone(),
            coin_amount: coins,
            amount_paid_cents,
            payment_ref: payment_ref.into(),
            created_at: Utc::now(),
        };
        state.receipts.push(receipt.clone());

        info!(
            account = %id,
            coins = %coins,
            receipt = %receipt.id,
            "top-up credited"
        );
        Ok(receipt)
    }

    /// List purchase receipts for an account, newest first.
    pub async fn receipts_for(&self, id: &AccountId) -> Vec<PurchaseReceipt> {
        let state = self.state.lock().await;
        let mut receipts: Vec<PurchaseReceipt> = state
            .receipts
            .iter()
            .filter(|r| r.buyer == *id)
            .cloned()
            .collect();
        receipts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        receipts
    }

    /// Change an account's role. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the requester is not an admin,
    /// `AccountNotFound` if either account is missing.
    pub async fn set_role(
        &self,
        requester: &AccountId,
        target: &AccountId,
        role: Role,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        require_admin(&state, requester)?;

        let account = state
            .accounts
            .get_mut(target.as_str())
            .ok_or_else(|| LedgerError::account_not_found(target.as_str()))?;
        let previous = account.role;
        account.role = role;

        info!(account = %target, from = %previous, to = %role, "role changed");
        Ok(())
    }

    /// Remove an account. Admin only. Returns the removed account.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the requester is not an admin,
    /// `AccountNotFound` if either account is missing.
    pub async fn remove_account(&self, requester: &AccountId, target: &AccountId) -> Result<Account> {
        let mut state = self.state.lock().await;
        require_admin(&state, requester)?;

        let removed = state
            .accounts
            .remove(target.as_str())
            .ok_or_else(|| LedgerError::account_not_found(target.as_str()))?;

        info!(account = %target, balance = %removed.balance, "account removed");
        Ok(removed)
    }

    /// List all accounts.
    pub async fn accounts(&self) -> Vec<Account> {
        let state = self.state.lock().await;
        state.accounts.values().cloned().collect()
    }

    /// Sum of all account balances.
    pub async fn total_coins(&self) -> Coins {
        let state = self.state.lock().await;
        state.accounts.values().map(|a| a.balance).sum()
    }
}

fn require_admin(state: &LedgerState, requester: &AccountId) -> Result<()> {
    let account = state
        .accounts
        .get(requester.as_str())
        .ok_or_else(|| LedgerError::account_not_found(requester.as_str()))?;
    match account.role {
        Role::Admin => Ok(()),
        Role::Worker | Role::Buyer => Err(LedgerError::unauthorized(
            "account management requires the admin role",
        )),
    }
}
