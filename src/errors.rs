use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::booking_status::StatusError;
use crate::services::refund::RefundRejection;
use crate::services::rules::ValidationError;
use crate::services::scheduling::ScheduleRejection;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Schedule(#[from] ScheduleRejection),

    #[error(transparent)]
    Refund(#[from] RefundRejection),

    #[error(transparent)]
    Status(#[from] StatusError),
}

impl AppError {
    /// Stable rejection tag for rule failures, `None` for everything else.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            AppError::Schedule(r) => Some(r.tag()),
            AppError::Refund(r) => Some(r.tag()),
            AppError::Status(r) => Some(r.tag()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Schedule(_) | AppError::Refund(_) | AppError::Status(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match self.reason() {
            Some(reason) => serde_json::json!({ "error": self.to_string(), "reason": reason }),
            None => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
