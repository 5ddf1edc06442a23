// ABOUTME: Unified error handling for the tipple catalog API
// ABOUTME: Error codes, HTTP status mapping, and the {message} response envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

//! # Unified Error Handling
//!
//! Every fallible operation in the crate returns [`AppResult`]. Errors carry a
//! coarse [`ErrorCode`] used for HTTP status mapping and a one-line
//! human-readable message, which is the only thing exposed to clients
//! (as `{"message": "..."}`).

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error categories used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Requested entity absent, soft-deleted, or filtered by visibility
    NotFound,
    /// A body-supplied foreign reference failed resolution
    ReferenceNotFound,
    /// Missing or invalid authentication token
    Unauthenticated,
    /// Authenticated but not permitted (wrong owner or role)
    Unauthorized,
    /// Malformed input or domain-constraint violation
    Validation,
    /// Underlying store operation failed
    Database,
    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ReferenceNotFound | Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::Database | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error category
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Entity lookup miss: `"{Kind} with id {id} was not found"` -> 404
    pub fn not_found(kind: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("{kind} with id {id} was not found"),
        )
    }

    /// A body-supplied reference failed to resolve -> 400
    ///
    /// Reported per missing id, never as a generic bulk failure.
    pub fn reference_not_found(kind: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ReferenceNotFound,
            format!("{kind} with id {id} was not found"),
        )
    }

    /// Missing or invalid credentials -> 401
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    /// Wrong owner or role for the attempted action -> 403
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Malformed input or domain-constraint violation -> 400
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Store operation failure -> 500
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Database, message)
    }

    /// Internal server error -> 500
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

/// HTTP error envelope: a one-line message, no structured codes
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, "request failed: {}", self.message);
        }
        (
            status,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::ReferenceNotFound.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::Unauthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::Unauthorized.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::Validation.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::Database.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reference_not_found_names_the_id() {
        let error = AppError::reference_not_found("Ingredient", "abc-123");
        assert_eq!(error.message, "Ingredient with id abc-123 was not found");
        assert_eq!(error.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_display_is_the_message() {
        let error = AppError::unauthorized("You do not have permission to update this recipe");
        assert_eq!(
            error.to_string(),
            "You do not have permission to update this recipe"
        );
    }
}
