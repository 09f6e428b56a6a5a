//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// A request that failed validation, with the offending field attached.
///
/// Validation failures are recovered at the boundary and reported to the
/// caller with field-level detail; they never reach the query compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown value `{value}` for {field}")]
    InvalidEnumValue { field: &'static str, value: String },

    #[error("{message}")]
    InvalidPagination {
        field: &'static str,
        message: String,
    },

    #[error("{message}")]
    InvalidRange {
        field: &'static str,
        message: String,
    },

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    /// The request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidEnumValue { field, .. }
            | ValidationError::InvalidPagination { field, .. }
            | ValidationError::InvalidRange { field, .. }
            | ValidationError::MissingField { field }
            | ValidationError::InvalidField { field, .. } => field,
        }
    }
}

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

/// JSON error body returned to the caller.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage and internal faults are logged in full but surfaced as an
        // opaque message; validation failures carry the offending field.
        let body = match &self {
            AppError::Validation(e) => ErrorBody {
                error: e.to_string(),
                field: Some(e.field()),
            },
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                ErrorBody {
                    error: "internal server error".to_string(),
                    field: None,
                }
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                ErrorBody {
                    error: "internal server error".to_string(),
                    field: None,
                }
            }
            other => ErrorBody {
                error: other.to_string(),
                field: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_reports_field() {
        let err = ValidationError::InvalidEnumValue {
            field: "sortBy",
            value: "price".to_string(),
        };
        assert_eq!(err.field(), "sortBy");
        assert_eq!(err.to_string(), "unknown value `price` for sortBy");
    }

    #[test]
    fn range_error_reports_field() {
        let err = ValidationError::InvalidRange {
            field: "endDate",
            message: "end date must be after start date".to_string(),
        };
        assert_eq!(err.field(), "endDate");
    }
}
