use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::marketplace::jobs::domain::UserId;

/// Identifier wrapper for notification records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
    Success,
    JobApplication,
    Payment,
    Booking,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
            Self::JobApplication => "job_application",
            Self::Payment => "payment",
            Self::Booking => "booking",
        }
    }
}

/// One delivered notification. `dedup_key` is the idempotency anchor: the
/// repository upsert treats a second write with the same key as a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub action_url: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub dedup_key: String,
}

/// Stable composite of (event kind, triggering entity, recipient). Replaying
/// an event reproduces the same key, so redelivery cannot create a second
/// record for the same recipient.
pub fn dedup_key(event_kind: &str, entity_id: &str, recipient: &UserId) -> String {
    format!("{event_kind}:{entity_id}:{recipient}")
}

/// Routed-but-unwritten notification produced by the dispatch table.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub recipient_id: UserId,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub action_url: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub dedup_key: String,
}

impl NotificationDraft {
    pub fn into_notification(self, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id: NotificationId(Uuid::new_v4().to_string()),
            recipient_id: self.recipient_id,
            title: self.title,
            body: self.body,
            kind: self.kind,
            read: false,
            read_at: None,
            created_at,
            action_url: self.action_url,
            metadata: self.metadata,
            dedup_key: self.dedup_key,
        }
    }
}
