// ABOUTME: Unified error handling with error codes, HTTP mapping, and JSON envelopes
// ABOUTME: Maps auth, validation, and storage failures to the API's {success:false, message} shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # Unified Error Handling
//!
//! Centralized error types for the admin API. Every handler returns
//! [`AppResult`]; failures are rendered as a `{success: false, message}`
//! JSON envelope with the status code derived from [`ErrorCode`].
//!
//! Internal error detail (the `error` field) is only included when the
//! process runs in a development configuration; see [`set_expose_detail`].

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Whether 500-class responses carry internal error detail.
/// Set once at startup from the environment configuration.
static EXPOSE_DETAIL: OnceLock<bool> = OnceLock::new();

/// Enable or disable internal error detail in responses.
///
/// Called once by the bootstrap layer; later calls are ignored.
pub fn set_expose_detail(expose: bool) {
    let _ = EXPOSE_DETAIL.set(expose);
}

fn expose_detail() -> bool {
    EXPOSE_DETAIL.get().copied().unwrap_or(false)
}

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// No credentials were presented on a protected route
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired,
    /// Presented token failed signature, expiry, or format checks
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid,
    /// Username/password pair did not match (deliberately generic)
    #[serde(rename = "INVALID_CREDENTIALS")]
    InvalidCredentials,
    /// Submitted TOTP code did not verify
    #[serde(rename = "INVALID_2FA_CODE")]
    InvalidTwoFactorCode,
    /// Authenticated but not a member of the admin role set
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied,
    /// Request body or parameters failed validation
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Requested record does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound,
    /// Uniqueness constraint would be violated
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists,
    /// Storage layer failure
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    /// Anything else that should not leak detail to the caller
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::AuthRequired
            | Self::AuthInvalid
            | Self::InvalidCredentials
            | Self::InvalidTwoFactorCode => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::ResourceAlreadyExists => StatusCode::CONFLICT,
            Self::DatabaseError | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Client-facing message
    pub message: String,
    /// Internal detail, never shown to callers outside development
    pub detail: Option<String>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

/// Result type alias for route handlers and services
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// Attach internal detail (logged, and surfaced only in development)
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// No credentials on a protected route
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid or expired token
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Generic credential failure. The message never distinguishes an
    /// unknown username from a wrong password (anti-enumeration).
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Invalid credentials")
    }

    /// Submitted TOTP code did not verify
    #[must_use]
    pub fn invalid_two_factor_code() -> Self {
        Self::new(ErrorCode::InvalidTwoFactorCode, "Invalid 2FA code")
    }

    /// Authenticated but lacking the admin role
    #[must_use]
    pub fn permission_denied() -> Self {
        Self::new(ErrorCode::PermissionDenied, "Admin privileges required")
    }

    /// Request validation failure
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing record
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Uniqueness conflict
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Storage failure; the caller sees a generic message
    pub fn database(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, "Internal server error").with_detail(detail)
    }

    /// Internal failure; the caller sees a generic message
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error").with_detail(detail)
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(format!("{error:#}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string())
    }
}

/// JSON error envelope returned to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    /// Internal detail, only populated in development
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();

        if status.is_server_error() {
            tracing::error!(code = ?self.code, detail = ?self.detail, "request failed");
        } else {
            tracing::debug!(code = ?self.code, message = %self.message, "request rejected");
        }

        let body = ErrorResponse {
            success: false,
            message: self.message,
            error: if expose_detail() { self.detail } else { None },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(
            ErrorCode::InvalidCredentials.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::InvalidTwoFactorCode.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::ResourceNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_generic_messages_hide_detail() {
        let err = AppError::database("connection refused");
        assert_eq!(err.message, "Internal server error");
        assert_eq!(err.detail.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_credential_error_is_generic() {
        // Unknown-user and wrong-password cases must be indistinguishable.
        let a = AppError::invalid_credentials();
        let b = AppError::invalid_credentials();
        assert_eq!(a.message, b.message);
        assert_eq!(a.message, "Invalid credentials");
    }
}
