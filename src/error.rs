//! Application error taxonomy and its HTTP mapping

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by the session engine and the API layer.
///
/// Every variant is recoverable by the caller re-submitting corrected input;
/// there is no fatal class in this core.
#[derive(Debug, Error)]
pub enum AppError {
    /// A single field of the request is out of range or malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation is not valid in the current session phase
    #[error("precondition not met: {0}")]
    PreconditionNotMet(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The session engine task is gone; only happens during shutdown
    #[error("session engine unavailable")]
    EngineUnavailable,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PreconditionNotMet(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::EngineUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }
        let body = Json(crate::api::responses::ApiResponse::failure(self.to_string()));
        (status, body).into_response()
    }
}
