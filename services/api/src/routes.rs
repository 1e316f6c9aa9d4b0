use crate::infra::{AppState, Marketplace};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;

use hearthwork::marketplace::jobs::{jobs_router, JobsApi};
use hearthwork::marketplace::messaging::messaging_router;
use hearthwork::marketplace::notifications::notifications_router;

/// Compose the domain routers with the operational endpoints.
pub(crate) fn with_marketplace_routes(marketplace: &Marketplace) -> axum::Router {
    let jobs = JobsApi {
        engine: marketplace.engine.clone(),
        registry: marketplace.registry.clone(),
    };

    jobs_router(jobs)
        .merge(notifications_router(marketplace.notifications.clone()))
        .merge(messaging_router(marketplace.messaging.clone()))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
