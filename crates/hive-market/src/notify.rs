//! Notification emission contract and the default inbox sink.
//!
//! Notifications sit outside the consistency boundary: the engine emits
//! them best-effort after a workflow mutation commits, and a failed
//! delivery is logged and swallowed, never rolled back into the ledger.

use chrono::{DateTime, Utc};
use hive_ledger::AccountId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Action route shown to a buyer reviewing new submissions.
pub const ROUTE_TASK_REVIEW: &str = "/dashboard/task-review";

/// Action route shown to a worker for their submission list.
pub const ROUTE_MY_SUBMISSIONS: &str = "/dashboard/my-submissions";

/// Action route shown to a worker for their withdrawal list.
pub const ROUTE_WITHDRAWALS: &str = "/dashboard/withdrawals";

/// Action route shown to an admin for pending withdrawal requests.
pub const ROUTE_WITHDRAW_REQUESTS: &str = "/dashboard/withdraw-requests";

/// Maximum notifications returned per listing.
pub const MAX_INBOX_PAGE: usize = 50;

/// Errors from the notification side channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The sink could not accept the notification.
    #[error("notification delivery failed: {reason}")]
    Delivery {
        /// Why delivery failed.
        reason: String,
    },

    /// No notification with the given ID for this recipient.
    #[error("notification not found: {id}")]
    NotFound {
        /// The notification ID that was looked up.
        id: String,
    },
}

/// Unique notification identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(String);

impl NotificationId {
    /// Create a new random notification ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("note-{}", Uuid::new_v4()))
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message delivered to an account's inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification ID.
    pub id: NotificationId,

    /// Recipient account.
    pub to: AccountId,

    /// Human-readable message.
    pub message: String,

    /// Route the recipient should be taken to on click.
    pub action_route: String,

    /// Whether the recipient has read it.
    pub read: bool,

    /// Emission timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification.
    #[must_use]
    pub fn new(to: AccountId, message: impl Into<String>, action_route: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            to,
            message: message.into(),
            action_route: action_route.into(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// A destination for workflow notifications.
///
/// Implementations must not block workflow completion: the engine treats a
/// delivery error as a logged, swallowed event.
pub trait NotificationSink: Send + Sync + fmt::Debug {
    /// Returns the name of this sink.
    fn name(&self) -> &str;

    /// Delivers a notification.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Delivery` if the notification cannot be
    /// accepted.
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// The default sink: a durable in-memory inbox per recipient.
#[derive(Debug, Default)]
pub struct Inbox {
    entries: RwLock<Vec<Notification>>,
}

impl Inbox {
    /// Create an empty inbox store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications for an account, newest first, capped at
    /// [`MAX_INBOX_PAGE`].
    #[must_use]
    pub fn notifications_for(&self, account: &AccountId) -> Vec<Notification> {
        let entries = self.entries.read();
        let mut notifications: Vec<Notification> = entries
            .iter()
            .filter(|n| n.to == *account)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(MAX_INBOX_PAGE);
        notifications
    }

    /// Count of unread notifications for an account.
    #[must_use]
    pub fn unread_count(&self, account: &AccountId) -> usize {
        let entries = self.entries.read();
        entries.iter().filter(|n| n.to == *account && !n.read).count()
    }

    /// Mark one of the recipient's notifications as read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ID does not name a notification addressed
    /// to this account — another recipient's notification is invisible here.
    pub fn mark_read(&self, account: &AccountId, id: &NotificationId) -> Result<(), NotifyError> {
        let mut entries = self.entries.write();
        let notification = entries
            .iter_mut()
            .find(|n| n.id == *id && n.to == *account)
            .ok_or_else(|| NotifyError::NotFound { id: id.to_string() })?;
        notification.read = true;
        Ok(())
    }
}

impl NotificationSink for Inbox {
    fn name(&self) -> &str {
        "inbox"
    }

    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut entries = self.entries.write();
        entries.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliver_to(inbox: &Inbox, to: &AccountId, message: &str) -> NotificationId {
        let notification = Notification::new(to.clone(), message, ROUTE_MY_SUBMISSIONS);
        let id = notification.id.clone();
        inbox.deliver(&notification).expect("should deliver");
        id
    }

    #[test]
    fn inbox_stores_and_lists() {
        let inbox = Inbox::new();
        let worker = AccountId::new("w@example.com");
        deliver_to(&inbox, &worker, "first");
        deliver_to(&inbox, &worker, "second");

        let listed = inbox.notifications_for(&worker);
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|n| !n.read));
    }

    #[test]
    fn listing_is_recipient_scoped() {
        let inbox = Inbox::new();
        let worker = AccountId::new("w@example.com");
        let buyer = AccountId::new("b@example.com");
        deliver_to(&inbox, &worker, "for the worker");
        deliver_to(&inbox, &buyer, "for the buyer");

        let listed = inbox.notifications_for(&worker);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].message, "for the worker");
    }

    #[test]
    fn listing_caps_at_page_size() {
        let inbox = Inbox::new();
        let worker = AccountId::new("w@example.com");
        for i in 0..60 {
            deliver_to(&inbox, &worker, &format!("message {i}"));
        }
        assert_eq!(inbox.notifications_for(&worker).len(), MAX_INBOX_PAGE);
    }

    #[test]
    fn mark_read_flips_flag() {
        let inbox = Inbox::new();
        let worker = AccountId::new("w@example.com");
        let id = deliver_to(&inbox, &worker, "unread");

        assert_eq!(inbox.unread_count(&worker), 1);
        inbox.mark_read(&worker, &id).expect("should mark");
        assert_eq!(inbox.unread_count(&worker), 0);
    }

    #[test]
    fn mark_read_is_recipient_gated() {
        let inbox = Inbox::new();
        let worker = AccountId::new("w@example.com");
        let other = AccountId::new("other@example.com");
        let id = deliver_to(&inbox, &worker, "private");

        let result = inbox.mark_read(&other, &id);
        assert!(matches!(result, Err(NotifyError::NotFound { .. })));
        assert_eq!(inbox.unread_count(&worker), 1);
    }

    #[test]
    fn mark_read_unknown_id() {
        let inbox = Inbox::new();
        let worker = AccountId::new("w@example.com");
        let result = inbox.mark_read(&worker, &NotificationId::new());
        assert!(matches!(result, Err(NotifyError::NotFound { .. })));
    }

    #[test]
    fn notification_serialization_roundtrip() {
        let notification = Notification::new(
            AccountId::new("w@example.com"),
            "You have earned 10 coins",
            ROUTE_MY_SUBMISSIONS,
        );
        let json = serde_json::to_string(&notification).expect("serialize");
        let parsed: Notification = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.id, notification.id);
        assert_eq!(parsed.action_route, ROUTE_MY_SUBMISSIONS);
        assert!(!parsed.read);
    }
}
