//! Error handling for the admin API.
//!
//! Every handler returns `Result<_, ApiError>`; the error converts itself
//! into the structured JSON envelope
//! `{"error": {"code", "message", "requestId", "detail"?}}`.
//! The request id is filled in by the request-context middleware after the
//! handler has produced the response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Main error type for the admin API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("invalid status code '{0}'")]
    InvalidStatus(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Auth(String),

    #[error("storage operation failed")]
    Storage(#[from] sqlx::Error),

    #[error("email delivery failed")]
    Email(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Email(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidStatus(_) => "INVALID_STATUS",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Auth(_) => "AUTH_ERROR",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Email(_) => "EMAIL_ERROR",
            ApiError::Internal(_) => "SERVER_ERROR",
        }
    }

    /// Operator-facing detail, surfaced alongside the generic message.
    fn detail(&self) -> Option<String> {
        match self {
            ApiError::Storage(e) => Some(e.to_string()),
            ApiError::Email(e) => Some(e.clone()),
            ApiError::Internal(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
    request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, detail = ?self.detail(), "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                // Filled in by the request-context middleware.
                request_id: None,
                detail: self.detail(),
            },
        };
        (status, Json(body)).into_response()
    }
}
