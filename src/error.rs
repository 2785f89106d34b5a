//! Domain error types for the GOAT Memory server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors for the lookup surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The user directory could not be read
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Anything else that should never reach a client verbatim
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Lookup(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, response_message) = match self {
            AppError::Lookup(err_str) => {
                tracing::error!("Lookup error: {}", err_str);
                (
                    "LOOKUP_ERROR",
                    "An error occurred while looking up the user".to_string(),
                )
            }
            AppError::InvalidInput(_) => ("INVALID_INPUT", self.to_string()),
            AppError::Internal(err_str) => {
                tracing::error!("Internal error: {}", err_str);
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Lookup(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Lookup(format!("Malformed document: {}", err))
    }
}

/// Rejections and failures of the download proxy.
///
/// Every variant is terminal. The body is the plain-text display string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    #[error("Missing param 'u'")]
    MissingParam,

    #[error("Invalid URL encoding")]
    InvalidEncoding,

    #[error("Only http/https allowed")]
    UnsupportedScheme,

    #[error("Forbidden host")]
    ForbiddenHost,

    #[error("Failed to fetch source")]
    Upstream,
}

impl ResponseError for DownloadError {
    fn status_code(&self) -> StatusCode {
        match self {
            DownloadError::Upstream => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}
