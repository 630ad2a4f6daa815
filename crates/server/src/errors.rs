use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use service::errors::ServiceError;

/// JSON error payload: `{"error": title, "detail": detail?}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }

    /// Map the service taxonomy to HTTP. Storage details are logged, not
    /// echoed to the client.
    pub fn from_service(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg))
            }
            ServiceError::NotFound(msg) => {
                Self::new(StatusCode::NOT_FOUND, "Not Found", Some(msg))
            }
            ServiceError::Conflict(msg) => {
                Self::new(StatusCode::CONFLICT, "Conflict", Some(msg))
            }
            ServiceError::Storage(msg) => {
                error!(error = %msg, "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
            }
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = match self.detail {
            Some(detail) => serde_json::json!({ "error": self.title, "detail": detail }),
            None => serde_json::json!({ "error": self.title }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
