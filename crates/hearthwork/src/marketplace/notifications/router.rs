use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::NotificationId;
use super::repository::NotificationRepository;
use crate::marketplace::jobs::domain::UserId;
use crate::marketplace::store::RepositoryError;

const DEFAULT_PAGE_LIMIT: usize = 50;

/// Router builder exposing the notification read/mark-read surface.
pub fn notifications_router<N>(repository: Arc<N>) -> Router
where
    N: NotificationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:user_id/notifications",
            get(list_handler::<N>),
        )
        .route(
            "/api/v1/users/:user_id/notifications/read",
            post(mark_read_handler::<N>),
        )
        .route(
            "/api/v1/users/:user_id/notifications/read-all",
            post(mark_all_read_handler::<N>),
        )
        .with_state(repository)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarkReadRequest {
    pub(crate) ids: Vec<NotificationId>,
}

pub(crate) async fn list_handler<N>(
    State(repository): State<Arc<N>>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response
where
    N: NotificationRepository + 'static,
{
    let user = UserId(user_id);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let notifications = match repository.list_for_user(&user, limit) {
        Ok(notifications) => notifications,
        Err(err) => return store_error_response(err),
    };
    let unread = match repository.unread_count(&user) {
        Ok(unread) => unread,
        Err(err) => return store_error_response(err),
    };
    let payload = json!({
        "notifications": notifications,
        "unread_count": unread,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn mark_read_handler<N>(
    State(repository): State<Arc<N>>,
    Path(user_id): Path<String>,
    axum::Json(request): axum::Json<MarkReadRequest>,
) -> Response
where
    N: NotificationRepository + 'static,
{
    let user = UserId(user_id);
    match repository.mark_read(&user, &request.ids, Utc::now()) {
        Ok(marked) => {
            let payload = json!({ "marked": marked });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn mark_all_read_handler<N>(
    State(repository): State<Arc<N>>,
    Path(user_id): Path<String>,
) -> Response
where
    N: NotificationRepository + 'static,
{
    let user = UserId(user_id);
    match repository.mark_all_read(&user, Utc::now()) {
        Ok(marked) => {
            let payload = json!({ "marked": marked });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

fn store_error_response(err: RepositoryError) -> Response {
    let status = match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
