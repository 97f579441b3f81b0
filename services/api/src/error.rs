//! Custom error types for the API service
//!
//! Every failure inside request handling ends up here and is rendered as the
//! standard error envelope.

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing input
    #[error("{0}")]
    BadRequest(String),

    /// Input failed one or more field checks
    #[error("{message}")]
    Validation { message: String, errors: Vec<String> },

    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to touch the resource
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate unique field
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("{0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Error envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub data: Option<()>,
    pub errors: Vec<String>,
}

impl ApiError {
    /// Log `source` and surface only `message`
    pub fn internal(message: &str, source: impl std::fmt::Display) -> Self {
        error!("{}: {}", message, source);
        ApiError::Internal(message.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(e) => match e {
                sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
                sqlx::Error::Database(db) if db.is_unique_violation() => StatusCode::CONFLICT,
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    StatusCode::NOT_FOUND
                }
                sqlx::Error::Database(db) if db.is_check_violation() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to hand to the client
    fn public_message(&self) -> String {
        match self {
            ApiError::Database(e) => match e {
                sqlx::Error::RowNotFound => "Resource not found".to_string(),
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    "Resource already exists".to_string()
                }
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    "Referenced resource not found".to_string()
                }
                sqlx::Error::Database(db) if db.is_check_violation() => {
                    "Request violates a data constraint".to_string()
                }
                _ => "Database error".to_string(),
            },
            other => other.to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        let errors = match self {
            ApiError::Validation { errors, .. } => errors.clone(),
            _ => Vec::new(),
        };

        ErrorBody {
            status_code: self.status_code().as_u16(),
            success: false,
            message: self.public_message(),
            data: None,
            errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), 400),
            (ApiError::Unauthorized("x".into()), 401),
            (ApiError::Forbidden("x".into()), 403),
            (ApiError::NotFound("x".into()), 404),
            (ApiError::Conflict("x".into()), 409),
            (ApiError::TooManyRequests("x".into()), 429),
            (ApiError::Internal("x".into()), 500),
        ];

        for (error, code) in cases {
            assert_eq!(error.status_code().as_u16(), code);
        }
    }

    #[test]
    fn envelope_has_null_data_and_failure_flag() {
        let body = serde_json::to_value(ApiError::Forbidden("Not yours".into()).body()).unwrap();

        assert_eq!(body["statusCode"], 403);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Not yours");
        assert!(body["data"].is_null());
        assert_eq!(body["errors"], serde_json::json!([]));
    }

    #[test]
    fn validation_errors_are_listed() {
        let error = ApiError::Validation {
            message: "Validation failed".into(),
            errors: vec!["Invalid email format".into()],
        };
        let body = serde_json::to_value(error.body()).unwrap();

        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["errors"][0], "Invalid email format");
    }

    #[test]
    fn missing_row_is_not_found_without_leaking_details() {
        let error = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.body().message, "Resource not found");
    }

    #[test]
    fn generic_database_failure_is_opaque() {
        let error = ApiError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.body().message, "Database error");
    }
}
