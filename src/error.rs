/// Unified error types for Profile Seeker
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::ResolutionError;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum SeekerError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Validation errors
    #[error("{0}")]
    Validation(String),

    /// Every retrieval strategy was exhausted
    #[error(transparent)]
    UpstreamUnavailable(#[from] ResolutionError),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error envelope shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for SeekerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SeekerError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            SeekerError::Authentication(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            SeekerError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            SeekerError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
            SeekerError::Database(_) | SeekerError::Internal(_) | SeekerError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: message,
        });

        if let SeekerError::RateLimitExceeded { retry_after } = &self {
            return (
                status,
                [(header::RETRY_AFTER, retry_after.as_secs().max(1).to_string())],
                body,
            )
                .into_response();
        }

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type SeekerResult<T> = Result<T, SeekerError>;
