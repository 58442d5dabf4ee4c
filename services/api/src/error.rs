//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use go_tany_core::analysis::AnalysisError;
use go_tany_core::errors::{AuthErrorKind, AuthFailure};
use go_tany_core::ports::PortError;
use go_tany_core::validation::ValidationError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A classified identity provider failure; its message is user-facing.
    #[error("{0}")]
    Auth(#[from] AuthFailure),

    /// A form failed its local checks before reaching the provider.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    /// The multipart upload could not be read.
    #[error("Upload error: {0}")]
    Upload(#[from] MultipartError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(failure) => match failure.kind {
                AuthErrorKind::UserNotFound
                | AuthErrorKind::WrongPassword
                | AuthErrorKind::InvalidCredential => StatusCode::UNAUTHORIZED,
                AuthErrorKind::UserDisabled | AuthErrorKind::OperationNotAllowed => {
                    StatusCode::FORBIDDEN
                }
                AuthErrorKind::EmailAlreadyInUse => StatusCode::CONFLICT,
                AuthErrorKind::InvalidEmail | AuthErrorKind::WeakPassword => {
                    StatusCode::BAD_REQUEST
                }
                AuthErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
                AuthErrorKind::PopupClosedByUser => StatusCode::UNAUTHORIZED,
                AuthErrorKind::NetworkRequestFailed => StatusCode::BAD_GATEWAY,
                AuthErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Analysis(AnalysisError::NotAnImage) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Analysis(AnalysisError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Port(PortError::NotFound(_)) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Upload(e) => e.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let error = match &self {
            // Internal details stay in the log.
            ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Config(_)
            | ApiError::Internal(_)
            | ApiError::Port(PortError::Unexpected(_)) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}
