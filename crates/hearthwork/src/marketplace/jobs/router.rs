use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationDraft, JobDraft, JobId, UserId};
use super::engine::{JobLifecycleEngine, LifecycleError, Transition};
use super::registry::{ApplicationError, ApplicationRegistry};
use super::repository::{JobFilter, JobRepository};
use crate::marketplace::events::{Actor, ActorRole, EventSink};

/// Shared state for the job endpoints: the lifecycle engine and the
/// application registry over the same repository and sink.
pub struct JobsApi<R, S> {
    pub engine: Arc<JobLifecycleEngine<R, S>>,
    pub registry: Arc<ApplicationRegistry<R, S>>,
}

impl<R, S> Clone for JobsApi<R, S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            registry: self.registry.clone(),
        }
    }
}

/// Router builder exposing the job lifecycle and application endpoints.
pub fn jobs_router<R, S>(api: JobsApi<R, S>) -> Router
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            post(create_job_handler::<R, S>).get(list_jobs_handler::<R, S>),
        )
        .route("/api/v1/jobs/:job_id", get(get_job_handler::<R, S>))
        .route("/api/v1/jobs/:job_id/assign", post(assign_handler::<R, S>))
        .route("/api/v1/jobs/:job_id/eta", post(eta_handler::<R, S>))
        .route(
            "/api/v1/jobs/:job_id/arrival",
            post(arrival_handler::<R, S>),
        )
        .route("/api/v1/jobs/:job_id/start", post(start_handler::<R, S>))
        .route(
            "/api/v1/jobs/:job_id/complete",
            post(complete_handler::<R, S>),
        )
        .route("/api/v1/jobs/:job_id/cancel", post(cancel_handler::<R, S>))
        .route(
            "/api/v1/jobs/:job_id/applications",
            post(apply_handler::<R, S>).get(list_applications_handler::<R, S>),
        )
        .with_state(api)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRequest {
    pub(crate) worker_id: UserId,
    pub(crate) actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EtaRequest {
    pub(crate) estimated_arrival: DateTime<Utc>,
    pub(crate) location: String,
    pub(crate) actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArrivalRequest {
    pub(crate) location: String,
    pub(crate) actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkerActionRequest {
    pub(crate) actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CancelRequest {
    pub(crate) actor_id: UserId,
    pub(crate) actor_role: ActorRole,
}

pub(crate) async fn create_job_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    axum::Json(draft): axum::Json<JobDraft>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    let actor = Actor::household(draft.household_id.clone());
    match api.engine.create_job(draft, &actor) {
        Ok(transition) => transition_response(StatusCode::CREATED, transition),
        Err(err) => lifecycle_error_response(err),
    }
}

pub(crate) async fn get_job_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    let id = JobId(job_id);
    // Reads count as views; the bump never blocks the read itself.
    if let Err(err) = api.engine.increment_view_count(&id) {
        if !matches!(err, LifecycleError::JobNotFound) {
            return lifecycle_error_response(err);
        }
    }
    match api.engine.get_job(&id) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(err) => lifecycle_error_response(err),
    }
}

pub(crate) async fn list_jobs_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Query(filter): Query<JobFilter>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    match api.engine.list_jobs(&filter) {
        Ok(jobs) => (StatusCode::OK, axum::Json(jobs)).into_response(),
        Err(err) => lifecycle_error_response(err),
    }
}

pub(crate) async fn assign_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<AssignRequest>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    let actor = Actor::household(request.actor_id);
    match api
        .engine
        .assign_worker(&JobId(job_id), &request.worker_id, &actor)
    {
        Ok(transition) => transition_response(StatusCode::OK, transition),
        Err(err) => lifecycle_error_response(err),
    }
}

pub(crate) async fn eta_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<EtaRequest>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    let actor = Actor::worker(request.actor_id);
    match api.engine.update_eta(
        &JobId(job_id),
        request.estimated_arrival,
        request.location,
        &actor,
    ) {
        Ok(transition) => transition_response(StatusCode::OK, transition),
        Err(err) => lifecycle_error_response(err),
    }
}

pub(crate) async fn arrival_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<ArrivalRequest>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    let actor = Actor::worker(request.actor_id);
    match api
        .engine
        .confirm_arrival(&JobId(job_id), request.location, &actor)
    {
        Ok(transition) => transition_response(StatusCode::OK, transition),
        Err(err) => lifecycle_error_response(err),
    }
}

pub(crate) async fn start_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<WorkerActionRequest>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    let actor = Actor::worker(request.actor_id);
    match api.engine.start_work(&JobId(job_id), &actor) {
        Ok(transition) => transition_response(StatusCode::OK, transition),
        Err(err) => lifecycle_error_response(err),
    }
}

pub(crate) async fn complete_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<WorkerActionRequest>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    let actor = Actor::worker(request.actor_id);
    match api.engine.complete_job(&JobId(job_id), &actor) {
        Ok(transition) => transition_response(StatusCode::OK, transition),
        Err(err) => lifecycle_error_response(err),
    }
}

pub(crate) async fn cancel_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<CancelRequest>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    let actor = Actor {
        user_id: request.actor_id,
        role: request.actor_role,
    };
    match api.engine.cancel_job(&JobId(job_id), &actor) {
        Ok(transition) => transition_response(StatusCode::OK, transition),
        Err(err) => lifecycle_error_response(err),
    }
}

pub(crate) async fn apply_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Path(job_id): Path<String>,
    axum::Json(draft): axum::Json<ApplicationDraft>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    match api.registry.apply(&JobId(job_id), draft) {
        Ok(submitted) => {
            let payload = json!({
                "job": submitted.job,
                "application": submitted.application,
                "dispatch": submitted.dispatch,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => application_error_response(err),
    }
}

pub(crate) async fn list_applications_handler<R, S>(
    State(api): State<JobsApi<R, S>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
    S: EventSink + 'static,
{
    match api.registry.list_applications(&JobId(job_id)) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(err) => application_error_response(err),
    }
}

fn transition_response(status: StatusCode, transition: Transition) -> Response {
    let payload = json!({
        "job": transition.job,
        "dispatch": transition.dispatch,
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) fn lifecycle_error_response(err: LifecycleError) -> Response {
    let status = match &err {
        LifecycleError::Validation(_) | LifecycleError::InvalidTransition { .. } => {
            StatusCode::BAD_REQUEST
        }
        LifecycleError::Conflict => StatusCode::CONFLICT,
        LifecycleError::JobNotFound | LifecycleError::ApplicantNotFound => StatusCode::NOT_FOUND,
        LifecycleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) fn application_error_response(err: ApplicationError) -> Response {
    let status = match &err {
        ApplicationError::Validation(_) | ApplicationError::Closed { .. } => {
            StatusCode::BAD_REQUEST
        }
        ApplicationError::Duplicate { .. } | ApplicationError::Conflict => StatusCode::CONFLICT,
        ApplicationError::JobNotFound => StatusCode::NOT_FOUND,
        ApplicationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
