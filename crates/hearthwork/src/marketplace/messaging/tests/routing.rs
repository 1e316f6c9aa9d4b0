use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::marketplace::messaging::domain::conversation_id_for;
use crate::marketplace::messaging::router::messaging_router;

async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[tokio::test]
async fn send_route_creates_message_and_summary() {
    let (service, _, _) = build_service();
    let router = messaging_router(Arc::new(service));

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/messages")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&json!({
                        "sender_id": "alice",
                        "receiver_id": "bob",
                        "content": "Hello there",
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"]["kind"], "text");
    assert_eq!(payload["conversation"]["last_message"], "Hello there");
    assert_eq!(payload["dispatch"]["status"], "delivered");
}

#[tokio::test]
async fn send_route_rejects_empty_content() {
    let (service, _, _) = build_service();
    let router = messaging_router(Arc::new(service));

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/messages")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&json!({
                        "sender_id": "alice",
                        "receiver_id": "bob",
                        "content": "",
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn messages_route_reads_the_thread() {
    let (service, _, _) = build_service();
    service.send_message(draft("First")).expect("send");
    let conversation_id = conversation_id_for(&alice(), &bob());
    let router = messaging_router(Arc::new(service));

    let response = router
        .oneshot(
            axum::http::Request::get(format!(
                "/api/v1/conversations/{conversation_id}/messages"
            ))
            .body(axum::body::Body::empty())
            .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["content"], "First");
}

#[tokio::test]
async fn messages_route_maps_unknown_thread_to_not_found() {
    let (service, _, _) = build_service();
    let router = messaging_router(Arc::new(service));

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/conversations/deadbeef/messages")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conversations_route_lists_user_threads() {
    let (service, _, _) = build_service();
    service.send_message(draft("First")).expect("send");
    let router = messaging_router(Arc::new(service));

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/users/bob/conversations")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().expect("threads").len(), 1);
}
