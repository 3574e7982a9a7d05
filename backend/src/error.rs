//! Error handling for the GebeyaNet inventory server
//!
//! Every service returns [`AppResult`]; the HTTP layer turns the error into a
//! JSON body with a stable machine-readable code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Caller errors
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict on {field}: {message}")]
    Conflict { field: String, message: String },

    #[error("Insufficient stock for item {item_id}: {available} available, {requested} requested")]
    InsufficientStock {
        item_id: Uuid,
        available: i32,
        requested: i32,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Contention on a locked row; the caller may retry
    #[error("Concurrent update: {0}")]
    Concurrency(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Conflict {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Only lock contention is worth retrying unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Concurrency(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors.field_errors().into_iter().next().map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("Invalid value for {}", field));
            (field.to_string(), message)
        });

        match first {
            Some((field, message)) => AppError::Validation { field, message },
            None => AppError::validation("request", "Validation failed"),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            available: None,
            retryable: false,
        }
    }

    fn on_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone()).on_field(field),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::Conflict { field, message } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", message.clone()).on_field(field),
            ),
            AppError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                let mut detail = ErrorDetail::new(
                    "INSUFFICIENT_STOCK",
                    format!(
                        "Insufficient stock. Only {} left, {} requested",
                        available, requested
                    ),
                )
                .on_field("quantity");
                detail.available = Some(*available);
                (StatusCode::UNPROCESSABLE_ENTITY, detail)
            }
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone()),
            ),
            AppError::Concurrency(message) => {
                let mut detail = ErrorDetail::new("CONCURRENT_UPDATE", message.clone());
                detail.retryable = true;
                (StatusCode::SERVICE_UNAVAILABLE, detail)
            }
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg)),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct NamedInput {
        #[validate(length(min = 1, message = "Item name is required"))]
        name: String,
    }

    #[test]
    fn test_only_concurrency_is_retryable() {
        assert!(AppError::Concurrency("lock timeout".into()).is_retryable());
        assert!(!AppError::NotFound("Item".into()).is_retryable());
        assert!(!AppError::InsufficientStock {
            item_id: Uuid::nil(),
            available: 1,
            requested: 2
        }
        .is_retryable());
    }

    #[test]
    fn test_validator_errors_map_to_field() {
        let err: AppError = NamedInput { name: String::new() }
            .validate()
            .unwrap_err()
            .into();
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "name");
                assert_eq!(message, "Item name is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (AppError::validation("quantity", "bad"), StatusCode::BAD_REQUEST),
            (AppError::NotFound("Sale".into()), StatusCode::NOT_FOUND),
            (AppError::conflict("name", "taken"), StatusCode::CONFLICT),
            (
                AppError::InsufficientStock {
                    item_id: Uuid::nil(),
                    available: 2,
                    requested: 5,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::Concurrency("busy".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
