use crate::config::ConfigError;
use crate::marketplace::events::DispatchError;
use crate::marketplace::jobs::engine::LifecycleError;
use crate::marketplace::jobs::registry::ApplicationError;
use crate::marketplace::messaging::service::MessagingError;
use crate::marketplace::store::RepositoryError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Lifecycle(LifecycleError),
    Application(ApplicationError),
    Messaging(MessagingError),
    Dispatch(DispatchError),
    Store(RepositoryError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Lifecycle(err) => write!(f, "lifecycle error: {}", err),
            AppError::Application(err) => write!(f, "application error: {}", err),
            AppError::Messaging(err) => write!(f, "messaging error: {}", err),
            AppError::Dispatch(err) => write!(f, "dispatch error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Lifecycle(err) => Some(err),
            AppError::Application(err) => Some(err),
            AppError::Messaging(err) => Some(err),
            AppError::Dispatch(err) => Some(err),
            AppError::Store(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Lifecycle(_) | AppError::Application(_) | AppError::Messaging(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Dispatch(_)
            | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<LifecycleError> for AppError {
    fn from(value: LifecycleError) -> Self {
        Self::Lifecycle(value)
    }
}

impl From<ApplicationError> for AppError {
    fn from(value: ApplicationError) -> Self {
        Self::Application(value)
    }
}

impl From<MessagingError> for AppError {
    fn from(value: MessagingError) -> Self {
        Self::Messaging(value)
    }
}

impl From<DispatchError> for AppError {
    fn from(value: DispatchError) -> Self {
        Self::Dispatch(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Store(value)
    }
}
