//! Domain events emitted after committed state changes, and the sink seam the
//! notification dispatcher plugs into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::jobs::domain::{JobId, UserId};

/// Party performing a mutation. Threaded through every state-changing call so
/// audit logs and cancellation fan-out name a real caller, never a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: ActorRole,
}

impl Actor {
    pub fn household(user_id: UserId) -> Self {
        Self {
            user_id,
            role: ActorRole::Household,
        }
    }

    pub fn worker(user_id: UserId) -> Self {
        Self {
            user_id,
            role: ActorRole::Worker,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Household,
    Worker,
}

/// Account states relayed by the (out-of-scope) identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
    Deactivated,
}

impl AccountStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deactivated => "deactivated",
        }
    }
}

/// Signal emitted after a successful state-changing operation. Consumed only
/// by the notification dispatcher; each variant carries enough denormalized
/// context to route and render without a second store read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    JobCreated {
        job_id: JobId,
        household_id: UserId,
    },
    ApplicationSubmitted {
        job_id: JobId,
        job_title: String,
        household_id: UserId,
        worker_id: UserId,
        worker_name: String,
    },
    JobAssigned {
        job_id: JobId,
        household_id: UserId,
        worker_id: UserId,
    },
    EtaUpdated {
        job_id: JobId,
        job_title: String,
        household_id: UserId,
        worker_id: UserId,
        estimated_arrival: DateTime<Utc>,
    },
    ArrivalConfirmed {
        job_id: JobId,
        job_title: String,
        household_id: UserId,
        worker_id: UserId,
    },
    WorkStarted {
        job_id: JobId,
        household_id: UserId,
        worker_id: UserId,
    },
    JobCompleted {
        job_id: JobId,
        household_id: UserId,
        worker_id: UserId,
    },
    JobCancelled {
        job_id: JobId,
        job_title: String,
        household_id: UserId,
        worker_id: Option<UserId>,
        cancelled_by: ActorRole,
    },
    MessageSent {
        message_id: String,
        conversation_id: String,
        sender_id: UserId,
        receiver_id: UserId,
        preview: String,
    },
    PaymentCompleted {
        payment_id: String,
        job_id: Option<JobId>,
        worker_id: UserId,
        amount: u32,
    },
    UserStatusChanged {
        user_id: UserId,
        new_status: AccountStatus,
    },
}

impl DomainEvent {
    /// Stable kind tag used in logs and notification dedup keys.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::JobCreated { .. } => "job_created",
            Self::ApplicationSubmitted { .. } => "application_submitted",
            Self::JobAssigned { .. } => "job_assigned",
            Self::EtaUpdated { .. } => "eta_updated",
            Self::ArrivalConfirmed { .. } => "arrival_confirmed",
            Self::WorkStarted { .. } => "work_started",
            Self::JobCompleted { .. } => "job_completed",
            Self::JobCancelled { .. } => "job_cancelled",
            Self::MessageSent { .. } => "message_sent",
            Self::PaymentCompleted { .. } => "payment_completed",
            Self::UserStatusChanged { .. } => "user_status_changed",
        }
    }
}

/// Consumer of committed domain events. Returns how many notifications the
/// event produced so callers can report fan-out alongside the primary result.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &DomainEvent) -> Result<usize, DispatchError>;
}

/// Notification fan-out failure. Never unwinds the primary transition.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification sink unavailable: {0}")]
    Sink(String),
}

/// Secondary outcome attached to a successful primary operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchReport {
    Delivered { notifications: usize },
    Failed { detail: String },
}

impl DispatchReport {
    pub const fn delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Publish an event after its transition has committed. A sink failure is
/// logged and folded into the report; the committed state stands either way.
pub fn publish_after_commit<S>(sink: &S, event: &DomainEvent) -> DispatchReport
where
    S: EventSink + ?Sized,
{
    match sink.publish(event) {
        Ok(notifications) => DispatchReport::Delivered { notifications },
        Err(err) => {
            warn!(event = event.kind(), error = %err, "dispatch failed after commit");
            DispatchReport::Failed {
                detail: err.to_string(),
            }
        }
    }
}
