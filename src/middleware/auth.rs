// ABOUTME: Authentication and authorization gates for the admin API
// ABOUTME: Pure request inspectors composed into an axum middleware layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # Auth Middleware Chain
//!
//! Two gates run in order on every protected route:
//!
//! 1. [`authenticate`] resolves the bearer token to an [`AdminIdentity`]
//!    or short-circuits with 401.
//! 2. [`authorize_admin`] checks role membership or short-circuits
//!    with 403.
//!
//! Both are pure functions over the request headers and the injected
//! [`AuthManager`] - no storage access, no mutation - so they are
//! testable without an HTTP server. [`admin_auth_middleware`] is the
//! axum layer that chains them and attaches the identity to the request
//! extensions for downstream handlers.

use crate::auth::AuthManager;
use crate::errors::{AppError, AppResult};
use crate::models::AdminRole;
use crate::routes::ApiContext;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use std::sync::Arc;

/// Authenticated caller identity attached to the request context
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub admin_id: i64,
    pub username: String,
    pub role: AdminRole,
}

/// Resolve the `Authorization: Bearer <token>` header to an identity.
///
/// # Errors
/// Returns 401-mapped errors for a missing header, a non-bearer scheme,
/// or a token that fails signature/expiry/format checks. Token error
/// variants are deliberately collapsed to a single unauthorized answer.
pub fn authenticate(headers: &HeaderMap, auth: &AuthManager) -> AppResult<AdminIdentity> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(AppError::auth_required)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::auth_invalid("Authorization header must be 'Bearer <token>'"))?;

    let claims = auth.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "token validation failed");
        AppError::auth_invalid("Invalid or expired token")
    })?;

    let admin_id = claims
        .admin_id()
        .map_err(|_| AppError::auth_invalid("Invalid or expired token"))?;

    Ok(AdminIdentity {
        admin_id,
        username: claims.username,
        role: claims.role,
    })
}

/// Check membership in the allowed admin role set.
///
/// # Errors
/// Returns a 403-mapped error for identities outside the set.
pub fn authorize_admin(identity: &AdminIdentity) -> AppResult<()> {
    if !identity.role.is_admin_or_higher() {
        tracing::warn!(username = %identity.username, role = %identity.role, "admin gate rejected caller");
        return Err(AppError::permission_denied());
    }
    Ok(())
}

/// Axum layer chaining both gates and injecting the identity.
///
/// Applied with `middleware::from_fn_with_state` on every protected
/// router; handlers receive the identity via `Extension<AdminIdentity>`.
///
/// # Errors
/// Short-circuits with the gate's error response; the downstream
/// handler is never invoked on failure.
pub async fn admin_auth_middleware(
    State(context): State<Arc<ApiContext>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(request.headers(), &context.auth)?;
    authorize_admin(&identity)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
