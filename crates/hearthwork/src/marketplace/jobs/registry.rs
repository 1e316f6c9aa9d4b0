use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{Application, ApplicationDraft, Job, JobId, JobStatus, UserId, ValidationError};
use super::repository::JobRepository;
use crate::marketplace::events::{publish_after_commit, DispatchReport, DomainEvent, EventSink};
use crate::marketplace::store::RepositoryError;

/// Lost-race retries before `apply` gives up and surfaces `Conflict`. Each
/// retry re-reads and re-validates, so a same-worker race settles on
/// `Duplicate` instead of a second row.
const APPLY_RETRY_LIMIT: usize = 3;

/// Owns the applications embedded in a job: eligibility against job state and
/// the one-application-per-worker rule.
pub struct ApplicationRegistry<R, S> {
    repository: Arc<R>,
    events: Arc<S>,
}

/// Result of a committed application: the stored job, the appended
/// application, and the secondary dispatch outcome.
#[derive(Debug)]
pub struct SubmittedApplication {
    pub job: Job,
    pub application: Application,
    pub dispatch: DispatchReport,
}

/// Error raised by application intake.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("job is no longer accepting applications (status: {status})")]
    Closed { status: JobStatus },
    #[error("worker {worker_id} already applied to this job")]
    Duplicate { worker_id: UserId },
    #[error("job not found")]
    JobNotFound,
    #[error("application lost repeated concurrent races; retry")]
    Conflict,
    #[error(transparent)]
    Storage(RepositoryError),
}

impl<R, S> ApplicationRegistry<R, S>
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    pub fn new(repository: Arc<R>, events: Arc<S>) -> Self {
        Self { repository, events }
    }

    /// Append a pending application to an open job. The write is conditioned
    /// on the version read just before it, so a duplicate submission racing
    /// this one cannot slip in between the existence check and the commit.
    pub fn apply(
        &self,
        job_id: &JobId,
        draft: ApplicationDraft,
    ) -> Result<SubmittedApplication, ApplicationError> {
        draft.validate()?;

        for _attempt in 0..APPLY_RETRY_LIMIT {
            let current = self
                .repository
                .fetch(job_id)
                .map_err(storage_error)?
                .ok_or(ApplicationError::JobNotFound)?;

            if current.status != JobStatus::Open {
                return Err(ApplicationError::Closed {
                    status: current.status,
                });
            }
            if current.has_applicant(&draft.worker_id) {
                return Err(ApplicationError::Duplicate {
                    worker_id: draft.worker_id.clone(),
                });
            }

            let now = Utc::now();
            let application = draft.clone().into_application(now);
            let mut next = current.clone();
            next.applicants.push(application.clone());
            next.updated_at = now;

            match self.repository.update(next, current.version) {
                Ok(job) => {
                    info!(job_id = %job.id, worker_id = %application.worker_id, "application submitted");
                    let event = DomainEvent::ApplicationSubmitted {
                        job_id: job.id.clone(),
                        job_title: job.title.clone(),
                        household_id: job.household_id.clone(),
                        worker_id: application.worker_id.clone(),
                        worker_name: application.worker_name.clone(),
                    };
                    let dispatch = publish_after_commit(self.events.as_ref(), &event);
                    return Ok(SubmittedApplication {
                        job,
                        application,
                        dispatch,
                    });
                }
                // Another writer moved the document; re-read and re-validate.
                Err(RepositoryError::Conflict) => continue,
                Err(other) => return Err(storage_error(other)),
            }
        }

        Err(ApplicationError::Conflict)
    }

    /// Pure read: applicants in insertion order (= application order).
    pub fn list_applications(&self, job_id: &JobId) -> Result<Vec<Application>, ApplicationError> {
        let job = self
            .repository
            .fetch(job_id)
            .map_err(storage_error)?
            .ok_or(ApplicationError::JobNotFound)?;
        Ok(job.applicants)
    }
}

fn storage_error(err: RepositoryError) -> ApplicationError {
    match err {
        RepositoryError::Conflict => ApplicationError::Conflict,
        RepositoryError::NotFound => ApplicationError::JobNotFound,
        other => ApplicationError::Storage(other),
    }
}
