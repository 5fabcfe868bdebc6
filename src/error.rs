use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use crate::auth::error::{FieldErrors, StoreError};

/// Error body; `errors` is keyed by form field.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn fields(errors: FieldErrors) -> Self {
        Self {
            errors,
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            errors: FieldErrors::new(),
            message: Some(message.into()),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::message(message)))
}

impl From<StoreError> for ErrorResponse {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(errors) | StoreError::InvalidCredentials(errors) => {
                ErrorResponse::fields(errors)
            }
            other => ErrorResponse::message(other.to_string()),
        }
    }
}

pub fn store_error(e: StoreError) -> ApiError {
    let status = match &e {
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
        StoreError::UserNotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Corrupt { .. } | StoreError::Storage(_) => {
            error!(error = %e, "account store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::from(e)))
}
