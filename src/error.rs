use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Engine-wide error type.
///
/// `FeedUnavailable` and `StoreUnavailable` are transient: the scan loop logs
/// them and retries on its next pass. The rest are caller errors and are
/// surfaced as-is.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert not found")]
    NotFound,

    #[error("invalid alert: {reason}")]
    InvalidAlert { reason: String },

    #[error("invalid transition: {reason}")]
    InvalidTransition { reason: String },

    #[error("price feed unavailable: {reason}")]
    FeedUnavailable { reason: String },

    #[error("alert store unavailable: {reason}")]
    StoreUnavailable { reason: String },
}

impl AlertError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        AlertError::InvalidAlert {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AlertError::NotFound => StatusCode::NOT_FOUND,
            AlertError::InvalidAlert { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AlertError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AlertError::FeedUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AlertError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AlertError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
