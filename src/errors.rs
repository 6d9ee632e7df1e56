// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Every handler returns this type, so every failure reaches
/// the single response builder below. Messages are safe to show to callers;
/// underlying store and file-system faults are logged where they occur.
#[derive(Error, Debug, PartialEq)]
pub enum PlacesError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),
}

impl PlacesError {
    fn code(&self) -> &'static str {
        match self {
            PlacesError::NotFound(_) => "NOT_FOUND",
            PlacesError::ValidationError(_) => "VALIDATION_ERROR",
            PlacesError::Unauthorized(_) => "UNAUTHORIZED",
            PlacesError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert PlacesError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for PlacesError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PlacesError::NotFound(_) => StatusCode::NOT_FOUND,
            PlacesError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PlacesError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PlacesError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
