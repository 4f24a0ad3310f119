//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use course_generator_core::{
    CompletionError, ExportError, InvalidRequest, ParseError, SessionError, StoreError,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The submitted course request failed validation.
    #[error("Invalid course request: {0}")]
    InvalidRequest(#[from] InvalidRequest),

    #[error("Course {0} not found")]
    CourseNotFound(Uuid),

    #[error("Course {0} is already being generated")]
    GenerationInProgress(Uuid),

    /// A stage was requested before the stage it depends on exists.
    #[error("Course stage error: {0}")]
    Session(#[from] SessionError),

    /// A model call failed at a stage that cannot recover from it.
    #[error("Completion Error: {0}")]
    Completion(#[from] CompletionError),

    /// The outline could not be turned into a course structure.
    #[error("Structure Error: {0}")]
    Parse(#[from] ParseError),

    /// Rendering a course document failed.
    #[error("Export Error: {0}")]
    Export(#[from] ExportError),

    /// The chat-history store failed.
    #[error("History Store Error: {0}")]
    Store(#[from] StoreError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::CourseNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Session(_) | ApiError::GenerationInProgress(_) => StatusCode::CONFLICT,
            ApiError::Completion(CompletionError::MissingCredential) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Completion(_) | ApiError::Parse(_) => StatusCode::BAD_GATEWAY,
            ApiError::Config(_)
            | ApiError::Export(_)
            | ApiError::Store(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The JSON body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(
            ApiError::CourseNotFound(Uuid::nil()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Session(SessionError::MissingOutline).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::GenerationInProgress(Uuid::nil()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Completion(CompletionError::MissingCredential).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Parse(ParseError::Empty).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Export(ExportError::EmptyDocument).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_messages_name_the_failure() {
        let err = ApiError::CourseNotFound(Uuid::nil());
        assert_eq!(
            err.to_string(),
            "Course 00000000-0000-0000-0000-000000000000 not found"
        );
    }
}
