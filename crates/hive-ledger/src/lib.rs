//! # hive-ledger
//!
//! Coin ledger for the Taskhive task marketplace.
//!
//! This crate provides:
//! - Accounts keyed by an external identity key, with a closed role set
//! - Coin balances with guarded credit/debit (no negative balance is ever
//!   observable)
//! - Role-based signup grants and top-up receipts
//! - Admin-gated account management
//!
//! ## Economic constants
//!
//! - Buyer signup grant: 50 coins
//! - Worker signup grant: 10 coins
//! - Payout conversion: 20 coins = 1 currency unit
//!
//! ## Example
//!
//! ```rust,no_run
//! use hive_ledger::{AccountId, Coins, Ledger, Role};
//!
//! # async fn example() -> hive_ledger::Result<()> {
//! let ledger = Ledger::new();
//!
//! // Register a buyer; the signup grant is credited automatically.
//! let buyer = AccountId::new("buyer@example.com");
//! ledger.register(buyer.clone(), "Ada", Role::Buyer).await?;
//!
//! // Reserve coins for a task escrow.
//! ledger.debit(&buyer, Coins::new(30)).await?;
//! println!("balance: {}", ledger.balance(&buyer).await?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod coins;
pub mod error;
pub mod ledger;

pub use account::{Account, AccountId, Role};
pub use coins::Coins;
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, PurchaseReceipt, ReceiptId};

/// Coins granted to a buyer at registration.
pub const BUYER_SIGNUP_GRANT: Coins = Coins::new(50);

/// Coins granted to a worker at registration.
pub const WORKER_SIGNUP_GRANT: Coins = Coins::new(10);

/// Coins that convert to one external currency unit on payout.
pub const COINS_PER_PAYOUT_UNIT: u64 = 20;
