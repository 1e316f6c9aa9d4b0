use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::domain::{dedup_key, NotificationDraft, NotificationKind};
use super::repository::{NotificationRepository, UpsertOutcome};
use crate::marketplace::events::{AccountStatus, ActorRole, DispatchError, DomainEvent, EventSink};
use crate::marketplace::jobs::domain::{JobId, UserId};

/// Turns committed domain events into notification records. Routing is a
/// pure function of the event; the write path is idempotent by construction,
/// so redelivering an event is safe.
pub struct NotificationDispatcher<N> {
    repository: Arc<N>,
}

impl<N> NotificationDispatcher<N>
where
    N: NotificationRepository + 'static,
{
    pub fn new(repository: Arc<N>) -> Self {
        Self { repository }
    }

    /// Fan an event out to its recipients. Returns how many records were
    /// newly created; replays count zero.
    pub fn dispatch(&self, event: &DomainEvent) -> Result<usize, DispatchError> {
        let mut created = 0;
        for draft in route(event) {
            let recipient = draft.recipient_id.clone();
            let key = draft.dedup_key.clone();
            let notification = draft.into_notification(Utc::now());
            match self.repository.upsert(notification) {
                Ok(UpsertOutcome::Created) => created += 1,
                Ok(UpsertOutcome::AlreadyDelivered) => {
                    debug!(%recipient, dedup_key = %key, "notification already delivered");
                }
                Err(err) => return Err(DispatchError::Sink(err.to_string())),
            }
        }
        Ok(created)
    }
}

impl<N> EventSink for NotificationDispatcher<N>
where
    N: NotificationRepository + 'static,
{
    fn publish(&self, event: &DomainEvent) -> Result<usize, DispatchError> {
        self.dispatch(event)
    }
}

/// The event -> recipient -> payload table. The recipient is always the
/// counterparty of the actor who caused the event; lifecycle steps the
/// counterparty sees anyway through the job read produce no record.
pub(crate) fn route(event: &DomainEvent) -> Vec<NotificationDraft> {
    match event {
        DomainEvent::JobCreated { .. }
        | DomainEvent::JobAssigned { .. }
        | DomainEvent::WorkStarted { .. }
        | DomainEvent::JobCompleted { .. } => Vec::new(),

        DomainEvent::ApplicationSubmitted {
            job_id,
            job_title,
            household_id,
            worker_id,
            worker_name,
        } => {
            let entity = format!("{job_id}/{worker_id}");
            vec![NotificationDraft {
                recipient_id: household_id.clone(),
                title: "New Job Application".to_string(),
                body: format!("{worker_name} applied to \"{job_title}\""),
                kind: NotificationKind::JobApplication,
                action_url: Some(job_url(job_id)),
                metadata: job_metadata(job_id, Some(worker_id)),
                dedup_key: dedup_key(event.kind(), &entity, household_id),
            }]
        }

        DomainEvent::EtaUpdated {
            job_id,
            job_title,
            household_id,
            worker_id,
            estimated_arrival,
        } => {
            // Each ETA revision is its own event; the timestamp is part of
            // the entity identity so revisions notify while replays do not.
            let entity = format!("{job_id}@{}", estimated_arrival.to_rfc3339());
            vec![NotificationDraft {
                recipient_id: household_id.clone(),
                title: "Worker ETA Updated".to_string(),
                body: format!(
                    "Estimated arrival for \"{job_title}\" is now {}",
                    estimated_arrival.to_rfc3339()
                ),
                kind: NotificationKind::Info,
                action_url: Some(job_url(job_id)),
                metadata: job_metadata(job_id, Some(worker_id)),
                dedup_key: dedup_key(event.kind(), &entity, household_id),
            }]
        }

        DomainEvent::ArrivalConfirmed {
            job_id,
            job_title,
            household_id,
            worker_id,
        } => vec![NotificationDraft {
            recipient_id: household_id.clone(),
            title: "Worker Has Arrived".to_string(),
            body: format!("Your worker has arrived for \"{job_title}\""),
            kind: NotificationKind::Success,
            action_url: Some(job_url(job_id)),
            metadata: job_metadata(job_id, Some(worker_id)),
            dedup_key: dedup_key(event.kind(), &job_id.0, household_id),
        }],

        DomainEvent::JobCancelled {
            job_id,
            job_title,
            household_id,
            worker_id,
            cancelled_by,
        } => {
            // Notify the non-actor party. An unassigned job cancelled by its
            // household has no counterparty to tell.
            let recipient = match cancelled_by {
                ActorRole::Household => worker_id.clone(),
                ActorRole::Worker => Some(household_id.clone()),
            };
            recipient
                .map(|recipient_id| {
                    let by = match cancelled_by {
                        ActorRole::Household => "the household",
                        ActorRole::Worker => "the worker",
                    };
                    NotificationDraft {
                        recipient_id: recipient_id.clone(),
                        title: "Job Cancelled".to_string(),
                        body: format!("\"{job_title}\" was cancelled by {by}"),
                        kind: NotificationKind::Warning,
                        action_url: Some(job_url(job_id)),
                        metadata: job_metadata(job_id, None),
                        dedup_key: dedup_key(event.kind(), &job_id.0, &recipient_id),
                    }
                })
                .into_iter()
                .collect()
        }

        DomainEvent::MessageSent {
            message_id,
            conversation_id,
            sender_id,
            receiver_id,
            preview,
        } => {
            let mut metadata = BTreeMap::new();
            metadata.insert("conversation_id".to_string(), conversation_id.clone());
            metadata.insert("sender_id".to_string(), sender_id.0.clone());
            vec![NotificationDraft {
                recipient_id: receiver_id.clone(),
                title: "New Message".to_string(),
                body: preview.clone(),
                kind: NotificationKind::Info,
                action_url: Some(format!("/conversations/{conversation_id}")),
                metadata,
                dedup_key: dedup_key(event.kind(), message_id, receiver_id),
            }]
        }

        DomainEvent::PaymentCompleted {
            payment_id,
            job_id,
            worker_id,
            amount,
        } => {
            let mut metadata = BTreeMap::new();
            metadata.insert("payment_id".to_string(), payment_id.clone());
            if let Some(job_id) = job_id {
                metadata.insert("job_id".to_string(), job_id.0.clone());
            }
            vec![NotificationDraft {
                recipient_id: worker_id.clone(),
                title: "Payment Received".to_string(),
                body: format!("A payment of {amount} has been credited to you"),
                kind: NotificationKind::Payment,
                action_url: None,
                metadata,
                dedup_key: dedup_key(event.kind(), payment_id, worker_id),
            }]
        }

        DomainEvent::UserStatusChanged {
            user_id,
            new_status,
        } => {
            // Suspended accounts are not told about their own suspension.
            if *new_status == AccountStatus::Suspended {
                return Vec::new();
            }
            let entity = format!("{user_id}@{}", new_status.label());
            let mut metadata = BTreeMap::new();
            metadata.insert("status".to_string(), new_status.label().to_string());
            vec![NotificationDraft {
                recipient_id: user_id.clone(),
                title: "Account Status Updated".to_string(),
                body: format!("Your account is now {}", new_status.label()),
                kind: NotificationKind::Info,
                action_url: None,
                metadata,
                dedup_key: dedup_key(event.kind(), &entity, user_id),
            }]
        }
    }
}

fn job_url(job_id: &JobId) -> String {
    format!("/jobs/{job_id}")
}

fn job_metadata(job_id: &JobId, worker_id: Option<&UserId>) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("job_id".to_string(), job_id.0.clone());
    if let Some(worker_id) = worker_id {
        metadata.insert("worker_id".to_string(), worker_id.0.clone());
    }
    metadata
}
