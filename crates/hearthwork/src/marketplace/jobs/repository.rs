use serde::{Deserialize, Serialize};

use super::domain::{Job, JobId, JobStatus, UserId};
use crate::marketplace::store::RepositoryError;

/// Storage abstraction for job documents. Writes are conditional
/// single-document updates; the trait never assumes cross-document
/// transactions.
pub trait JobRepository: Send + Sync {
    /// Persist a new job. The store assigns the id and initial version.
    fn insert(&self, job: Job) -> Result<Job, RepositoryError>;

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;

    /// Conditional write: commits only while the stored version still equals
    /// `expected_version`, and returns the committed document with its new
    /// version. Fails with `Conflict` when a concurrent writer got there
    /// first.
    fn update(&self, job: Job, expected_version: u64) -> Result<Job, RepositoryError>;

    /// Unconditional counter bump. Side-channel only: never participates in
    /// version conflicts and never blocks the state machine.
    fn increment_view_count(&self, id: &JobId) -> Result<u64, RepositoryError>;

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, RepositoryError>;
}

/// Filter for the job listing query, newest postings first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub household_id: Option<UserId>,
    #[serde(default)]
    pub worker_id: Option<UserId>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(status) = self.status {
            if job.status != status {
                return false;
            }
        }
        if let Some(service_type) = &self.service_type {
            if &job.service_type != service_type {
                return false;
            }
        }
        if let Some(household_id) = &self.household_id {
            if &job.household_id != household_id {
                return false;
            }
        }
        if let Some(worker_id) = &self.worker_id {
            if job.worker_id.as_ref() != Some(worker_id) {
                return false;
            }
        }
        true
    }
}
