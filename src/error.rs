//! Error handling module
//!
//! Provides unified error types and handling for the entire application.
//! Every operation failure is rendered as `{ success: false, message, code }`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Proposal already submitted for team '{0}'")]
    DuplicateTeam(String),

    #[error("Submission deadline has passed")]
    DeadlinePassed,

    #[error("Maximum of {capacity} teams already selected")]
    CapacityExceeded { selected: u64, capacity: u64 },

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Error response structure
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_count: Option<u64>,
}

impl AppError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DuplicateTeam(_) => "DUPLICATE_TEAM",
            AppError::DeadlinePassed => "DEADLINE_PASSED",
            AppError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AppError::Database(_) | AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Pool(_) => "POOL_EXHAUSTED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::DeadlinePassed => StatusCode::BAD_REQUEST,
            AppError::DuplicateTeam(_) | AppError::CapacityExceeded { .. } => StatusCode::CONFLICT,
            AppError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                ("A database error occurred".to_string(), Some(e.to_string()))
            }
            AppError::Pool(e) => {
                error!("Pool error: {:?}", e);
                ("Database connection pool exhausted".to_string(), Some(e.to_string()))
            }
            AppError::Storage(msg) => {
                error!("Storage error: {}", msg);
                ("A storage error occurred".to_string(), Some(msg.clone()))
            }
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg) => (msg.clone(), None),
            AppError::DuplicateTeam(_)
            | AppError::DeadlinePassed
            | AppError::CapacityExceeded { .. } => (self.to_string(), None),
        };

        let selected_count = match &self {
            AppError::CapacityExceeded { selected, .. } => Some(*selected),
            _ => None,
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(code.to_string()),
            selected_count,
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::DeadlinePassed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::CapacityExceeded { selected: 15, capacity: 15 }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Storage("down".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_capacity_message() {
        let err = AppError::CapacityExceeded { selected: 15, capacity: 15 };
        assert_eq!(err.to_string(), "Maximum of 15 teams already selected");
        assert_eq!(err.code(), "CAPACITY_EXCEEDED");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::CapacityExceeded { selected: 15, capacity: 15 }.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "CAPACITY_EXCEEDED");
        assert_eq!(body["selectedCount"], 15);
    }
}
