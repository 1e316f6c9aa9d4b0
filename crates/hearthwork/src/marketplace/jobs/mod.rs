//! Job lifecycle engine and application registry.
//!
//! A job moves `open -> assigned -> on_way -> arrived -> in_progress ->
//! completed`, with `cancelled` reachable from any non-terminal state. Every
//! committed transition emits exactly one domain event; concurrent writers
//! are serialized per job by version-guarded writes.

pub mod domain;
pub mod engine;
pub mod registry;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationDraft, ApplicationStatus, Job, JobBenefits, JobDraft, JobId, JobStatus,
    PayFrequency, UserId, ValidationError,
};
pub use engine::{JobLifecycleEngine, LifecycleError, Transition};
pub use registry::{ApplicationError, ApplicationRegistry, SubmittedApplication};
pub use repository::{JobFilter, JobRepository};
pub use router::{jobs_router, JobsApi};
