//! Notification dispatch and the per-user notification inbox.
//!
//! The dispatcher is the only consumer of domain events. Fan-out is
//! deterministic and idempotent: each record is keyed by a stable composite
//! of event kind, triggering entity, and recipient, so replaying an event
//! can never deliver twice.

pub mod dispatcher;
pub mod domain;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use dispatcher::NotificationDispatcher;
pub use domain::{dedup_key, Notification, NotificationDraft, NotificationId, NotificationKind};
pub use repository::{NotificationRepository, UpsertOutcome};
pub use router::notifications_router;
