//! Unified error handling for Approval Core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, ApprovalError>;

/// Application error types
#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("RBAC service error: {0}")]
    Rbac(String),

    #[error("RBAC network error: {0}")]
    Network(String),

    #[error("RBAC request timed out: {0}")]
    TimedOut(String),

    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApprovalError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApprovalError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApprovalError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            ApprovalError::InvalidStateTransition(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_state_transition", msg.clone())
            }
            ApprovalError::NotAuthorized(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApprovalError::Rbac(msg) => {
                tracing::error!("RBAC service error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "rbac_error",
                    "The RBAC service returned an error".to_string(),
                )
            }
            ApprovalError::Network(msg) => {
                tracing::error!("RBAC network error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "network_error",
                    "The RBAC service is unreachable".to_string(),
                )
            }
            ApprovalError::TimedOut(msg) => {
                tracing::error!("RBAC timeout: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "timed_out",
                    "The RBAC service timed out".to_string(),
                )
            }
            ApprovalError::InternalInconsistency(msg) => {
                tracing::error!("Internal inconsistency: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_inconsistency",
                    "An internal error occurred".to_string(),
                )
            }
            ApprovalError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            ApprovalError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for ApprovalError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApprovalError::Validation(errors.to_string())
    }
}
