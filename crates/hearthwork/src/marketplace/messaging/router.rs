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

use super::domain::{ConversationId, MessageDraft};
use super::repository::ConversationRepository;
use super::service::{ConversationRouter, MessagingError};
use crate::marketplace::events::EventSink;
use crate::marketplace::jobs::domain::UserId;

const DEFAULT_PAGE_LIMIT: usize = 50;

/// Router builder exposing the messaging endpoints.
pub fn messaging_router<M, S>(service: Arc<ConversationRouter<M, S>>) -> Router
where
    M: ConversationRepository + 'static,
    S: EventSink + 'static,
{
    Router::new()
        .route("/api/v1/messages", post(send_handler::<M, S>))
        .route(
            "/api/v1/conversations/:conversation_id/messages",
            get(list_messages_handler::<M, S>),
        )
        .route(
            "/api/v1/users/:user_id/conversations",
            get(list_conversations_handler::<M, S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    #[serde(default)]
    pub(crate) before: Option<DateTime<Utc>>,
}

pub(crate) async fn send_handler<M, S>(
    State(service): State<Arc<ConversationRouter<M, S>>>,
    axum::Json(draft): axum::Json<MessageDraft>,
) -> Response
where
    M: ConversationRepository + 'static,
    S: EventSink + 'static,
{
    match service.send_message(draft) {
        Ok(sent) => {
            let payload = json!({
                "message": sent.message,
                "conversation": sent.conversation,
                "dispatch": sent.dispatch,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => messaging_error_response(err),
    }
}

pub(crate) async fn list_messages_handler<M, S>(
    State(service): State<Arc<ConversationRouter<M, S>>>,
    Path(conversation_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Response
where
    M: ConversationRepository + 'static,
    S: EventSink + 'static,
{
    let id = ConversationId(conversation_id);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    match service.list_messages(&id, limit, query.before) {
        Ok(messages) => (StatusCode::OK, axum::Json(messages)).into_response(),
        Err(err) => messaging_error_response(err),
    }
}

pub(crate) async fn list_conversations_handler<M, S>(
    State(service): State<Arc<ConversationRouter<M, S>>>,
    Path(user_id): Path<String>,
) -> Response
where
    M: ConversationRepository + 'static,
    S: EventSink + 'static,
{
    match service.list_conversations(&UserId(user_id)) {
        Ok(conversations) => (StatusCode::OK, axum::Json(conversations)).into_response(),
        Err(err) => messaging_error_response(err),
    }
}

pub(crate) fn messaging_error_response(err: MessagingError) -> Response {
    let status = match &err {
        MessagingError::EmptyContent | MessagingError::SelfConversation => StatusCode::BAD_REQUEST,
        MessagingError::ConversationNotFound => StatusCode::NOT_FOUND,
        MessagingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
