//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for {key}: {message}")]
    InvalidEnv { key: &'static str, message: String },
    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: &'static str, name: String },
    #[error("entity document: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// One offending input field. `field` is the column or query parameter name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no {0} found with given id")]
    NotFound(String),
    #[error("invalid input")]
    Validation(Vec<FieldError>),
    #[error("permission denied")]
    PermissionDenied,
    #[error("storage: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AppError {
    /// Validation failure on a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::PermissionDenied => (StatusCode::FORBIDDEN, "permission_denied"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };
        let (message, details) = match self {
            AppError::Storage(e) => {
                tracing::error!(error = %e, "storage operation failed");
                ("database error".to_string(), None)
            }
            AppError::Config(e) => {
                tracing::error!(error = %e, "configuration error");
                ("configuration error".to_string(), None)
            }
            AppError::Validation(fields) => (
                "invalid input".to_string(),
                serde_json::to_value(fields).ok(),
            ),
            other => (other.to_string(), None),
        };
        let body = ErrorBody {
            status: "error",
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
