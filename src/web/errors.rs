//! # Web API Error Types
//!
//! HTTP mapping for every error the item API can surface. Bodies are JSON:
//! `{ "error": CODE, "message": ..., "details": [...] }`, where `details` is
//! only present for validation failures.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error::ItemflowError;
use crate::logging::log_error;
use crate::models::ItemValidationError;

/// Web API specific errors with HTTP status code mappings
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Item not found with id: {id}")]
    NotFound { id: i64 },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Validation failed: {0}")]
    Validation(ItemValidationError),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let body = match &self {
            ApiError::NotFound { .. } => json!({
                "error": "NOT_FOUND",
                "message": self.to_string(),
            }),
            ApiError::BadRequest { message } => json!({
                "error": "BAD_REQUEST",
                "message": message,
            }),
            ApiError::Validation(validation) => json!({
                "error": "VALIDATION_FAILED",
                "message": "Request body failed validation",
                "details": validation.messages(),
            }),
            ApiError::Internal => json!({
                "error": "INTERNAL_ERROR",
                "message": "Internal server error",
            }),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<ItemflowError> for ApiError {
    fn from(err: ItemflowError) -> Self {
        match err {
            ItemflowError::NotFound { id } => ApiError::NotFound { id },
            ItemflowError::Validation(validation) => ApiError::Validation(validation),
            other => {
                log_error("web", "request", &other.to_string(), None);
                ApiError::Internal
            }
        }
    }
}

/// Malformed JSON or a body that does not fit the item shape
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}
