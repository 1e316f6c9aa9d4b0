use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{
    Application, ApplicationStatus, Job, JobDraft, JobId, JobStatus, UserId, ValidationError,
};
use super::repository::{JobFilter, JobRepository};
use crate::marketplace::events::{
    publish_after_commit, Actor, DispatchReport, DomainEvent, EventSink,
};
use crate::marketplace::store::RepositoryError;

/// Owns the job state machine: validates proposed transitions, applies them
/// through version-guarded writes, and emits one domain event per commit.
pub struct JobLifecycleEngine<R, S> {
    repository: Arc<R>,
    events: Arc<S>,
}

/// Result of a committed transition: the stored document plus the secondary
/// dispatch outcome. Dispatch never rolls the transition back.
#[derive(Debug)]
pub struct Transition {
    pub job: Job,
    pub dispatch: DispatchReport,
}

/// Error raised by lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot {action} while job is {from}")]
    InvalidTransition {
        action: &'static str,
        from: JobStatus,
    },
    #[error("job was modified concurrently; re-read and retry")]
    Conflict,
    #[error("job not found")]
    JobNotFound,
    #[error("worker never applied to this job")]
    ApplicantNotFound,
    #[error(transparent)]
    Storage(RepositoryError),
}

impl From<RepositoryError> for LifecycleError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict => Self::Conflict,
            RepositoryError::NotFound => Self::JobNotFound,
            other => Self::Storage(other),
        }
    }
}

impl<R, S> JobLifecycleEngine<R, S>
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    pub fn new(repository: Arc<R>, events: Arc<S>) -> Self {
        Self { repository, events }
    }

    /// Validate and persist a new posting. Status starts at `open` with an
    /// empty applicant list.
    pub fn create_job(&self, draft: JobDraft, actor: &Actor) -> Result<Transition, LifecycleError> {
        let job = Job::from_draft(draft, Utc::now())?;
        let job = self.repository.insert(job)?;
        info!(job_id = %job.id, actor = %actor.user_id, "job created");

        let event = DomainEvent::JobCreated {
            job_id: job.id.clone(),
            household_id: job.household_id.clone(),
        };
        let dispatch = publish_after_commit(self.events.as_ref(), &event);
        Ok(Transition { job, dispatch })
    }

    /// Choose one applicant for an open job. The chosen application flips to
    /// `accepted` and the rest to `rejected` within the same committed write.
    pub fn assign_worker(
        &self,
        job_id: &JobId,
        worker_id: &UserId,
        actor: &Actor,
    ) -> Result<Transition, LifecycleError> {
        let current = self.load(job_id)?;
        if current.status != JobStatus::Open {
            return Err(LifecycleError::InvalidTransition {
                action: "assign a worker",
                from: current.status,
            });
        }
        let chosen: Application = current
            .applicant(worker_id)
            .cloned()
            .ok_or(LifecycleError::ApplicantNotFound)?;

        let mut next = current.clone();
        next.status = JobStatus::Assigned;
        next.worker_id = Some(chosen.worker_id.clone());
        next.worker_name = Some(chosen.worker_name.clone());
        for application in &mut next.applicants {
            application.status = if application.worker_id == chosen.worker_id {
                ApplicationStatus::Accepted
            } else {
                ApplicationStatus::Rejected
            };
        }
        next.updated_at = Utc::now();

        let job = self.repository.update(next, current.version)?;
        info!(job_id = %job.id, worker_id = %chosen.worker_id, actor = %actor.user_id, "worker assigned");

        let event = DomainEvent::JobAssigned {
            job_id: job.id.clone(),
            household_id: job.household_id.clone(),
            worker_id: chosen.worker_id,
        };
        let dispatch = publish_after_commit(self.events.as_ref(), &event);
        Ok(Transition { job, dispatch })
    }

    /// Record or revise the worker's ETA. Legal from `assigned` (first
    /// report) and `on_way` (revision); once the worker has arrived, late
    /// revisions are rejected.
    pub fn update_eta(
        &self,
        job_id: &JobId,
        estimated_arrival: DateTime<Utc>,
        location: String,
        actor: &Actor,
    ) -> Result<Transition, LifecycleError> {
        let current = self.load(job_id)?;
        if !matches!(current.status, JobStatus::Assigned | JobStatus::OnWay) {
            return Err(LifecycleError::InvalidTransition {
                action: "update the eta",
                from: current.status,
            });
        }
        let now = Utc::now();
        if estimated_arrival < now {
            return Err(LifecycleError::Validation(ValidationError::EtaInPast));
        }

        let mut next = current.clone();
        next.status = JobStatus::OnWay;
        next.estimated_arrival = Some(estimated_arrival);
        next.current_location = Some(location);
        next.updated_at = now;

        let job = self.repository.update(next, current.version)?;
        info!(job_id = %job.id, actor = %actor.user_id, eta = %estimated_arrival, "eta updated");

        let event = DomainEvent::EtaUpdated {
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            household_id: job.household_id.clone(),
            worker_id: actor.user_id.clone(),
            estimated_arrival,
        };
        let dispatch = publish_after_commit(self.events.as_ref(), &event);
        Ok(Transition { job, dispatch })
    }

    /// Mark the worker on site. Reachable from `on_way`, or straight from
    /// `assigned` when the ETA step was skipped.
    pub fn confirm_arrival(
        &self,
        job_id: &JobId,
        location: String,
        actor: &Actor,
    ) -> Result<Transition, LifecycleError> {
        let current = self.load(job_id)?;
        if !matches!(current.status, JobStatus::OnWay | JobStatus::Assigned) {
            return Err(LifecycleError::InvalidTransition {
                action: "confirm arrival",
                from: current.status,
            });
        }
        let now = Utc::now();

        let mut next = current.clone();
        next.status = JobStatus::Arrived;
        next.arrived_at = Some(now);
        next.worker_location = Some(location);
        next.updated_at = now;

        let job = self.repository.update(next, current.version)?;
        info!(job_id = %job.id, actor = %actor.user_id, "arrival confirmed");

        let event = DomainEvent::ArrivalConfirmed {
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            household_id: job.household_id.clone(),
            worker_id: actor.user_id.clone(),
        };
        let dispatch = publish_after_commit(self.events.as_ref(), &event);
        Ok(Transition { job, dispatch })
    }

    pub fn start_work(&self, job_id: &JobId, actor: &Actor) -> Result<Transition, LifecycleError> {
        let current = self.load(job_id)?;
        if current.status != JobStatus::Arrived {
            return Err(LifecycleError::InvalidTransition {
                action: "start work",
                from: current.status,
            });
        }

        let mut next = current.clone();
        next.status = JobStatus::InProgress;
        next.updated_at = Utc::now();

        let job = self.repository.update(next, current.version)?;
        info!(job_id = %job.id, actor = %actor.user_id, "work started");

        let event = DomainEvent::WorkStarted {
            job_id: job.id.clone(),
            household_id: job.household_id.clone(),
            worker_id: actor.user_id.clone(),
        };
        let dispatch = publish_after_commit(self.events.as_ref(), &event);
        Ok(Transition { job, dispatch })
    }

    pub fn complete_job(
        &self,
        job_id: &JobId,
        actor: &Actor,
    ) -> Result<Transition, LifecycleError> {
        let current = self.load(job_id)?;
        if current.status != JobStatus::InProgress {
            return Err(LifecycleError::InvalidTransition {
                action: "complete the job",
                from: current.status,
            });
        }

        let mut next = current.clone();
        next.status = JobStatus::Completed;
        next.updated_at = Utc::now();

        let job = self.repository.update(next, current.version)?;
        info!(job_id = %job.id, actor = %actor.user_id, "job completed");

        let event = DomainEvent::JobCompleted {
            job_id: job.id.clone(),
            household_id: job.household_id.clone(),
            worker_id: actor.user_id.clone(),
        };
        let dispatch = publish_after_commit(self.events.as_ref(), &event);
        Ok(Transition { job, dispatch })
    }

    /// Cancel from any non-terminal state. Cancellation is terminal status,
    /// not removal; the document stays queryable.
    pub fn cancel_job(&self, job_id: &JobId, actor: &Actor) -> Result<Transition, LifecycleError> {
        let current = self.load(job_id)?;
        if current.status.is_terminal() {
            return Err(LifecycleError::InvalidTransition {
                action: "cancel the job",
                from: current.status,
            });
        }
        let now = Utc::now();

        let mut next = current.clone();
        next.status = JobStatus::Cancelled;
        next.cancelled_at = Some(now);
        // worker attachment tracks live engagements only; the applicant list
        // keeps the acceptance history
        next.worker_id = None;
        next.worker_name = None;
        next.updated_at = now;

        let job = self.repository.update(next, current.version)?;
        info!(job_id = %job.id, actor = %actor.user_id, role = ?actor.role, "job cancelled");

        let event = DomainEvent::JobCancelled {
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            household_id: job.household_id.clone(),
            worker_id: current.worker_id.clone(),
            cancelled_by: actor.role,
        };
        let dispatch = publish_after_commit(self.events.as_ref(), &event);
        Ok(Transition { job, dispatch })
    }

    /// Side-channel read counter. Legal in any state, emits no event.
    pub fn increment_view_count(&self, job_id: &JobId) -> Result<u64, LifecycleError> {
        Ok(self.repository.increment_view_count(job_id)?)
    }

    pub fn get_job(&self, job_id: &JobId) -> Result<Job, LifecycleError> {
        self.load(job_id)
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, LifecycleError> {
        Ok(self.repository.list(filter)?)
    }

    fn load(&self, job_id: &JobId) -> Result<Job, LifecycleError> {
        self.repository
            .fetch(job_id)?
            .ok_or(LifecycleError::JobNotFound)
    }
}
