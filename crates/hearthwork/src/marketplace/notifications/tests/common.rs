use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::marketplace::events::DomainEvent;
use crate::marketplace::jobs::domain::{JobId, UserId};
use crate::marketplace::notifications::dispatcher::NotificationDispatcher;
use crate::marketplace::notifications::domain::{Notification, NotificationId};
use crate::marketplace::notifications::repository::{NotificationRepository, UpsertOutcome};
use crate::marketplace::store::RepositoryError;

pub(super) fn household() -> UserId {
    UserId("household-1".to_string())
}

pub(super) fn worker() -> UserId {
    UserId("worker-1".to_string())
}

pub(super) fn job_id() -> JobId {
    JobId("job-000001".to_string())
}

pub(super) fn application_event() -> DomainEvent {
    DomainEvent::ApplicationSubmitted {
        job_id: job_id(),
        job_title: "House cleaning help".to_string(),
        household_id: household(),
        worker_id: worker(),
        worker_name: "Worker 1".to_string(),
    }
}

/// In-memory notification store with the dedup-key upsert contract.
#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    records: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub(super) fn records(&self) -> Vec<Notification> {
        self.records
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }

    pub(super) fn for_user(&self, user_id: &UserId) -> Vec<Notification> {
        self.records()
            .into_iter()
            .filter(|notification| &notification.recipient_id == user_id)
            .collect()
    }
}

impl NotificationRepository for MemoryNotifications {
    fn upsert(&self, notification: Notification) -> Result<UpsertOutcome, RepositoryError> {
        let mut guard = self.records.lock().expect("notification mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.dedup_key == notification.dedup_key)
        {
            return Ok(UpsertOutcome::AlreadyDelivered);
        }
        guard.push(notification);
        Ok(UpsertOutcome::Created)
    }

    fn list_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let guard = self.records.lock().expect("notification mutex poisoned");
        let mut notifications: Vec<Notification> = guard
            .iter()
            .filter(|notification| &notification.recipient_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(limit);
        Ok(notifications)
    }

    fn unread_count(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
        let guard = self.records.lock().expect("notification mutex poisoned");
        Ok(guard
            .iter()
            .filter(|notification| &notification.recipient_id == user_id && !notification.read)
            .count())
    }

    fn mark_read(
        &self,
        user_id: &UserId,
        ids: &[NotificationId],
        read_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("notification mutex poisoned");
        let mut marked = 0;
        for notification in guard.iter_mut() {
            if &notification.recipient_id == user_id
                && ids.contains(&notification.id)
                && !notification.read
            {
                notification.read = true;
                notification.read_at = Some(read_at);
                marked += 1;
            }
        }
        Ok(marked)
    }

    fn mark_all_read(
        &self,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("notification mutex poisoned");
        let mut marked = 0;
        for notification in guard.iter_mut() {
            if &notification.recipient_id == user_id && !notification.read {
                notification.read = true;
                notification.read_at = Some(read_at);
                marked += 1;
            }
        }
        Ok(marked)
    }
}

/// Store double that fails every write.
pub(super) struct UnavailableNotifications;

impl NotificationRepository for UnavailableNotifications {
    fn upsert(&self, _notification: Notification) -> Result<UpsertOutcome, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn list_for_user(
        &self,
        _user_id: &UserId,
        _limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn unread_count(&self, _user_id: &UserId) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn mark_read(
        &self,
        _user_id: &UserId,
        _ids: &[NotificationId],
        _read_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn mark_all_read(
        &self,
        _user_id: &UserId,
        _read_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

pub(super) fn build_dispatcher() -> (
    NotificationDispatcher<MemoryNotifications>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryNotifications::default());
    let dispatcher = NotificationDispatcher::new(repository.clone());
    (dispatcher, repository)
}
