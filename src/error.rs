use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ports::{AuthFailure, StoreError};
use crate::validation::ValidationError;

/// Failure taxonomy of the payment intake pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    /// Bad input. Never retried.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Credential invalid, payment declined, or the authority unreachable under a strict policy.
    #[error("authorization failed: {0}")]
    AuthorizationFailed(#[from] AuthFailure),

    /// Safe for the caller to retry with the same idempotency key.
    #[error("transaction store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("unclassified error: {0}")]
    Unclassified(String),
}

impl From<StoreError> for IntakeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => IntakeError::StoreUnavailable(reason),
            StoreError::Other(reason) => IntakeError::Unclassified(reason),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        let message = err.to_string();
        match err {
            IntakeError::Validation(_) => AppError::Validation(message),
            IntakeError::AuthorizationFailed(AuthFailure::Unauthorized(_)) => {
                AppError::Unauthorized(message)
            }
            IntakeError::AuthorizationFailed(AuthFailure::Denied { .. }) => {
                AppError::Forbidden(message)
            }
            IntakeError::AuthorizationFailed(AuthFailure::Unreachable(_))
            | IntakeError::StoreUnavailable(_) => AppError::ServiceUnavailable(message),
            IntakeError::Unclassified(_) => AppError::Internal(message),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::Validation(rejection.body_text())
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        IntakeError::from(err).into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
