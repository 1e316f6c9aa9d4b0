use chrono::{DateTime, Utc};

use super::domain::{Notification, NotificationId};
use crate::marketplace::jobs::domain::UserId;
use crate::marketplace::store::RepositoryError;

/// Whether an upsert wrote a new record or hit an existing dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    AlreadyDelivered,
}

/// Storage abstraction for notification records.
pub trait NotificationRepository: Send + Sync {
    /// Deterministic write keyed by `dedup_key`: at most one record per key
    /// ever exists, no matter how often the same event is replayed.
    fn upsert(&self, notification: Notification) -> Result<UpsertOutcome, RepositoryError>;

    /// Newest-first page of a user's notifications.
    fn list_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError>;

    fn unread_count(&self, user_id: &UserId) -> Result<usize, RepositoryError>;

    /// Flip `read`/`read_at` on the given ids; returns how many flipped.
    fn mark_read(
        &self,
        user_id: &UserId,
        ids: &[NotificationId],
        read_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;

    fn mark_all_read(
        &self,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;
}
