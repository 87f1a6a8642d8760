use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::users::{repo::StoreError, validation::ValidationErrors};

/// Errors surfaced by request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Field-level problems with client input.
    #[error("{message}: {errors}")]
    Validation {
        message: &'static str,
        errors: ValidationErrors,
    },

    #[error("duplicate user")]
    DuplicateKey,

    #[error("user not found")]
    NotFound,

    #[error("malformed request body: {0}")]
    MalformedRequest(String),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_body(errors: ValidationErrors) -> Self {
        Self::Validation {
            message: "Validation failed",
            errors,
        }
    }

    pub fn invalid_id(errors: ValidationErrors) -> Self {
        Self::Validation {
            message: "Invalid ID format",
            errors,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateKey => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey(_) => AppError::DuplicateKey,
        }
    }
}

/// JSON body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: &'static str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message,
            errors: None,
            error: Some(error.into()),
        }
    }

    /// Generic 500 body; never carries internal details.
    pub fn internal() -> Self {
        Self::new("Internal server error", "Something went wrong")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation { message, errors } => ErrorBody {
                success: false,
                message,
                errors: Some(errors.into_vec()),
                error: None,
            },
            AppError::DuplicateKey => ErrorBody::new("User already exists", "Duplicate user"),
            AppError::NotFound => ErrorBody::new("User not found", "User does not exist"),
            AppError::MalformedRequest(_) => {
                ErrorBody::new("Invalid JSON in request body", "Bad request")
            }
            AppError::PayloadTooLarge => {
                ErrorBody::new("Request body too large", "Payload too large")
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                ErrorBody::internal()
            }
        };
        (status, Json(body)).into_response()
    }
}
