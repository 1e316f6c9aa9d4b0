use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use crate::marketplace::events::{DispatchError, DomainEvent, EventSink};
use crate::marketplace::jobs::domain::{
    ApplicationDraft, Job, JobBenefits, JobDraft, JobId, PayFrequency, UserId,
};
use crate::marketplace::jobs::engine::JobLifecycleEngine;
use crate::marketplace::jobs::registry::ApplicationRegistry;
use crate::marketplace::jobs::repository::{JobFilter, JobRepository};
use crate::marketplace::store::RepositoryError;

pub(super) fn household() -> UserId {
    UserId("household-1".to_string())
}

pub(super) fn worker(n: usize) -> UserId {
    UserId(format!("worker-{n}"))
}

pub(super) fn job_draft() -> JobDraft {
    JobDraft {
        title: "House cleaning help".to_string(),
        service_type: "cleaning".to_string(),
        description: "Weekly deep clean of a two-bedroom apartment".to_string(),
        schedule: "Saturdays 09:00-13:00".to_string(),
        salary: 5000,
        pay_frequency: PayFrequency::Monthly,
        household_id: household(),
        household_name: "The Andersons".to_string(),
        location: "Des Moines".to_string(),
        benefits: JobBenefits {
            meals: true,
            ..JobBenefits::default()
        },
    }
}

pub(super) fn application_draft(n: usize) -> ApplicationDraft {
    ApplicationDraft {
        worker_id: worker(n),
        worker_name: format!("Worker {n}"),
        cover_letter: Some("I have five years of experience".to_string()),
        proposed_rate: Some(4800),
    }
}

/// In-memory job store with the same version-guarded write contract as the
/// managed store adapter.
#[derive(Default, Clone)]
pub(super) struct MemoryJobs {
    jobs: Arc<Mutex<HashMap<String, Job>>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryJobs {
    pub(super) fn stored(&self, id: &JobId) -> Option<Job> {
        self.jobs
            .lock()
            .expect("job store mutex poisoned")
            .get(&id.0)
            .cloned()
    }
}

impl JobRepository for MemoryJobs {
    fn insert(&self, mut job: Job) -> Result<Job, RepositoryError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        job.id = JobId(format!("job-{id:06}"));
        job.version = 1;
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        guard.insert(job.id.0.clone(), job.clone());
        Ok(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("job store mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn update(&self, mut job: Job, expected_version: u64) -> Result<Job, RepositoryError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        match guard.get(&job.id.0) {
            None => Err(RepositoryError::NotFound),
            Some(stored) if stored.version != expected_version => Err(RepositoryError::Conflict),
            Some(_) => {
                job.version = expected_version + 1;
                guard.insert(job.id.0.clone(), job.clone());
                Ok(job)
            }
        }
    }

    fn increment_view_count(&self, id: &JobId) -> Result<u64, RepositoryError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        let job = guard.get_mut(&id.0).ok_or(RepositoryError::NotFound)?;
        job.view_count += 1;
        Ok(job.view_count)
    }

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("job store mutex poisoned");
        let mut jobs: Vec<Job> = guard.values().filter(|job| filter.matches(job)).cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }
}

/// Decorator that parks the first `gated` fetches on a barrier so concurrent
/// writers provably read the same version before racing the write.
pub(super) struct GatedJobs {
    inner: MemoryJobs,
    gate: Arc<Barrier>,
    remaining: Arc<AtomicUsize>,
}

impl GatedJobs {
    pub(super) fn new(inner: MemoryJobs, gated: usize) -> Self {
        Self {
            inner,
            gate: Arc::new(Barrier::new(gated)),
            remaining: Arc::new(AtomicUsize::new(gated)),
        }
    }
}

impl JobRepository for GatedJobs {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.insert(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let result = self.inner.fetch(id);
        let park = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if park {
            self.gate.wait();
        }
        result
    }

    fn update(&self, job: Job, expected_version: u64) -> Result<Job, RepositoryError> {
        self.inner.update(job, expected_version)
    }

    fn increment_view_count(&self, id: &JobId) -> Result<u64, RepositoryError> {
        self.inner.increment_view_count(id)
    }

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, RepositoryError> {
        self.inner.list(filter)
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl RecordingSink {
    pub(super) fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &DomainEvent) -> Result<usize, DispatchError> {
        self.events
            .lock()
            .expect("sink mutex poisoned")
            .push(event.clone());
        Ok(1)
    }
}

pub(super) struct FailingSink;

impl EventSink for FailingSink {
    fn publish(&self, _event: &DomainEvent) -> Result<usize, DispatchError> {
        Err(DispatchError::Sink("notification store offline".to_string()))
    }
}

pub(super) fn build_engine() -> (
    JobLifecycleEngine<MemoryJobs, RecordingSink>,
    Arc<MemoryJobs>,
    Arc<RecordingSink>,
) {
    let repository = Arc::new(MemoryJobs::default());
    let sink = Arc::new(RecordingSink::default());
    let engine = JobLifecycleEngine::new(repository.clone(), sink.clone());
    (engine, repository, sink)
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn build_api() -> (
    crate::marketplace::jobs::router::JobsApi<MemoryJobs, RecordingSink>,
    Arc<MemoryJobs>,
    Arc<RecordingSink>,
) {
    let repository = Arc::new(MemoryJobs::default());
    let sink = Arc::new(RecordingSink::default());
    let api = crate::marketplace::jobs::router::JobsApi {
        engine: Arc::new(JobLifecycleEngine::new(repository.clone(), sink.clone())),
        registry: Arc::new(ApplicationRegistry::new(repository.clone(), sink.clone())),
    };
    (api, repository, sink)
}

pub(super) fn build_registry() -> (
    ApplicationRegistry<MemoryJobs, RecordingSink>,
    JobLifecycleEngine<MemoryJobs, RecordingSink>,
    Arc<MemoryJobs>,
    Arc<RecordingSink>,
) {
    let repository = Arc::new(MemoryJobs::default());
    let sink = Arc::new(RecordingSink::default());
    let registry = ApplicationRegistry::new(repository.clone(), sink.clone());
    let engine = JobLifecycleEngine::new(repository.clone(), sink.clone());
    (registry, engine, repository, sink)
}
