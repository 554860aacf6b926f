//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::content::{FieldErrors, ServiceError};

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    /// 404 with the given message.
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    /// A content type definition failed structural validation.
    #[error("Invalid content type definition")]
    InvalidDefinition(Vec<String>),

    /// Item data failed validation.
    #[error("Validation failed")]
    Validation(FieldErrors),
}

impl AppError {
    pub fn content_type_not_found() -> Self {
        AppError::NotFound("Content type not found")
    }

    pub fn content_not_found() -> Self {
        AppError::NotFound("Content not found")
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UnknownType(_) => AppError::content_type_not_found(),
            ServiceError::NotFound(_) => AppError::content_not_found(),
            ServiceError::Invalid(errors) => AppError::Validation(errors),
            ServiceError::Store(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::InvalidDefinition(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        // Internal details are logged, never returned.
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal server error");
                json!({ "error": self.to_string() })
            }
            AppError::InvalidDefinition(errors) => {
                json!({ "error": self.to_string(), "errors": errors })
            }
            AppError::Validation(errors) => {
                json!({ "error": self.to_string(), "errors": errors })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
