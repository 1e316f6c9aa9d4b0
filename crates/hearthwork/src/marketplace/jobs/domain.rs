use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for marketplace users (households and workers alike).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for job postings. Assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed status lifecycle for a job posting. One unambiguous meaning per
/// state; the wire strings are the boundary contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Assigned,
    OnWay,
    Arrived,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::OnWay => "on_way",
            Self::Arrived => "arrived",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// States in which a worker must be attached to the job.
    pub const fn requires_worker(self) -> bool {
        matches!(
            self,
            Self::Assigned | Self::OnWay | Self::Arrived | Self::InProgress | Self::Completed
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Explicit per-application status, written during assignment rather than
/// inferred from the job's worker field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Compensation cadence advertised with the posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl PayFrequency {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Benefit flags surfaced on the posting card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBenefits {
    #[serde(default)]
    pub meals: bool,
    #[serde(default)]
    pub lodging: bool,
    #[serde(default)]
    pub transport: bool,
}

/// A worker's bid on an open job, embedded in the job document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub worker_id: UserId,
    pub worker_name: String,
    pub cover_letter: Option<String>,
    pub proposed_rate: Option<u32>,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
}

/// Inbound payload for submitting an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub worker_id: UserId,
    pub worker_name: String,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub proposed_rate: Option<u32>,
}

impl ApplicationDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_id.0.trim().is_empty() {
            return Err(ValidationError::MissingWorker);
        }
        if self.worker_name.trim().is_empty() {
            return Err(ValidationError::MissingWorkerName);
        }
        Ok(())
    }

    pub(crate) fn into_application(self, applied_at: DateTime<Utc>) -> Application {
        Application {
            worker_id: self.worker_id,
            worker_name: self.worker_name,
            cover_letter: self.cover_letter,
            proposed_rate: self.proposed_rate,
            applied_at,
            status: ApplicationStatus::Pending,
        }
    }
}

/// Inbound payload for creating a job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub service_type: String,
    pub description: String,
    pub schedule: String,
    pub salary: u32,
    pub pay_frequency: PayFrequency,
    pub household_id: UserId,
    pub household_name: String,
    pub location: String,
    #[serde(default)]
    pub benefits: JobBenefits,
}

pub const TITLE_MIN_CHARS: usize = 5;
pub const DESCRIPTION_MIN_CHARS: usize = 20;

impl JobDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().chars().count() < TITLE_MIN_CHARS {
            return Err(ValidationError::TitleTooShort);
        }
        if self.description.trim().chars().count() < DESCRIPTION_MIN_CHARS {
            return Err(ValidationError::DescriptionTooShort);
        }
        if self.schedule.trim().is_empty() {
            return Err(ValidationError::MissingSchedule);
        }
        if self.salary == 0 {
            return Err(ValidationError::NonPositiveSalary);
        }
        if self.service_type.trim().is_empty() {
            return Err(ValidationError::MissingServiceType);
        }
        if self.household_id.0.trim().is_empty() {
            return Err(ValidationError::MissingHousehold);
        }
        Ok(())
    }
}

/// Structural validation failures. Non-retriable; the caller fixes the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title must be at least 5 characters")]
    TitleTooShort,
    #[error("description must be at least 20 characters")]
    DescriptionTooShort,
    #[error("schedule must be provided")]
    MissingSchedule,
    #[error("salary must be greater than zero")]
    NonPositiveSalary,
    #[error("service type must be provided")]
    MissingServiceType,
    #[error("household id must be provided")]
    MissingHousehold,
    #[error("worker id must be provided")]
    MissingWorker,
    #[error("worker name must be provided")]
    MissingWorkerName,
    #[error("estimated arrival must not be in the past")]
    EtaInPast,
}

/// A service request posted by a household. The document is the unit of
/// mutual exclusion: every write is conditioned on `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Store-maintained write counter; bumped on every committed mutation.
    pub version: u64,
    pub title: String,
    pub service_type: String,
    pub description: String,
    pub schedule: String,
    pub salary: u32,
    pub pay_frequency: PayFrequency,
    pub household_id: UserId,
    pub household_name: String,
    pub location: String,
    pub benefits: JobBenefits,
    pub status: JobStatus,
    pub worker_id: Option<UserId>,
    pub worker_name: Option<String>,
    pub applicants: Vec<Application>,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub current_location: Option<String>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub worker_location: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Build a fresh posting from a validated draft. The store assigns the
    /// real id and version on insert.
    pub fn from_draft(draft: JobDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        draft.validate()?;
        Ok(Self {
            id: JobId("pending".to_string()),
            version: 0,
            title: draft.title,
            service_type: draft.service_type,
            description: draft.description,
            schedule: draft.schedule,
            salary: draft.salary,
            pay_frequency: draft.pay_frequency,
            household_id: draft.household_id,
            household_name: draft.household_name,
            location: draft.location,
            benefits: draft.benefits,
            status: JobStatus::Open,
            worker_id: None,
            worker_name: None,
            applicants: Vec::new(),
            view_count: 0,
            created_at: now,
            updated_at: now,
            estimated_arrival: None,
            current_location: None,
            arrived_at: None,
            worker_location: None,
            cancelled_at: None,
        })
    }

    pub fn applicant(&self, worker_id: &UserId) -> Option<&Application> {
        self.applicants
            .iter()
            .find(|application| &application.worker_id == worker_id)
    }

    pub fn has_applicant(&self, worker_id: &UserId) -> bool {
        self.applicant(worker_id).is_some()
    }
}
