// ABOUTME: Admin authentication routes - login with optional TOTP, 2FA lifecycle, password change
// ABOUTME: Login is the only public API endpoint; everything else requires a bearer token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # Authentication Routes
//!
//! Credential verification with bcrypt, optional TOTP second factor, and
//! JWT issuance. Unknown usernames and wrong passwords produce the same
//! response so the login endpoint cannot be used to enumerate accounts.

use crate::crypto::password::{hash_password_blocking, verify_password_blocking};
use crate::crypto::totp;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::middleware::{admin_auth_middleware, AdminIdentity};
use crate::models::{Admin, AdminProfile};
use crate::routes::{client_ip, ApiContext};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{middleware, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub two_factor_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AdminProfile>,
    #[serde(rename = "requires2FA", skip_serializing_if = "Option::is_none")]
    pub requires_2fa: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorVerifyRequest {
    pub code: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorDisableRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorSetupResponse {
    pub success: bool,
    pub secret: String,
    pub otpauth_url: String,
    pub qr_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Outcome of a credential check against a stored admin
#[derive(Debug)]
pub enum LoginOutcome {
    Success { token: String, admin: AdminProfile },
    TwoFactorRequired,
}

/// Authentication service backing the login and 2FA endpoints
pub struct AuthService;

impl AuthService {
    /// Run the full login flow against the stored credentials
    ///
    /// # Errors
    /// Returns `InvalidCredentials` for unknown usernames and wrong
    /// passwords alike, and `InvalidTwoFactorCode` for a rejected TOTP code.
    pub async fn login(
        context: &ApiContext,
        request: &LoginRequest,
        ip_address: Option<&str>,
    ) -> AppResult<LoginOutcome> {
        let admin = context
            .database
            .get_admin_by_username(&request.username)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        // Same failure for unknown user and wrong password
        let Some(admin) = admin else {
            warn!("Login attempt for unknown admin username");
            return Err(AppError::invalid_credentials());
        };

        let password_ok = verify_password_blocking(
            request.password.clone(),
            admin.password_hash.clone(),
        )
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;

        if !password_ok {
            warn!(admin_id = admin.id, "Login attempt with wrong password");
            return Err(AppError::invalid_credentials());
        }

        if admin.two_factor_enabled {
            let Some(code) = request
                .two_factor_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
            else {
                return Ok(LoginOutcome::TwoFactorRequired);
            };

            let secret = admin
                .two_factor_secret
                .as_deref()
                .ok_or_else(|| AppError::internal("2FA enabled without a stored secret"))?;

            let code_ok = totp::verify(secret, code, totp::DEFAULT_WINDOW_STEPS)
                .map_err(|e| AppError::internal(e.to_string()))?;
            if !code_ok {
                warn!(admin_id = admin.id, "Login attempt with invalid 2FA code");
                return Err(AppError::invalid_two_factor_code());
            }
        }

        context
            .database
            .touch_admin_last_login(admin.id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        let token = context
            .auth
            .issue_token(&admin)
            .map_err(|e| AppError::internal(e.to_string()))?;

        context
            .database
            .log_activity(
                Some(admin.id),
                Some(&admin.username),
                "admin_login",
                None,
                ip_address,
            )
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        info!(admin_id = admin.id, username = %admin.username, "Admin logged in");

        Ok(LoginOutcome::Success {
            token,
            admin: admin.profile(),
        })
    }

    async fn load_admin(database: &Database, admin_id: i64) -> AppResult<Admin> {
        database
            .get_admin_by_id(admin_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| AppError::not_found("Admin account"))
    }
}

async fn handle_login(
    State(context): State<Arc<ApiContext>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let ip = client_ip(&headers);
    match AuthService::login(&context, &request, ip.as_deref()).await? {
        LoginOutcome::Success { token, admin } => Ok(Json(LoginResponse {
            success: true,
            message: "Login successful".into(),
            token: Some(token),
            user: Some(admin),
            requires_2fa: None,
        })),
        // Not an error: the client is told to re-submit with a code
        LoginOutcome::TwoFactorRequired => Ok(Json(LoginResponse {
            success: false,
            message: "2FA code required".into(),
            token: None,
            user: None,
            requires_2fa: Some(true),
        })),
    }
}

/// Generate a fresh pending secret; nothing is persisted until the code
/// is verified
async fn handle_2fa_enable(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
) -> AppResult<impl IntoResponse> {
    let admin = AuthService::load_admin(&context.database, identity.admin_id).await?;
    if admin.two_factor_enabled {
        return Err(AppError::already_exists("2FA is already enabled"));
    }

    let pending = totp::generate_secret(&admin.username)
        .map_err(|e| AppError::internal(e.to_string()))?;

    Ok(Json(TwoFactorSetupResponse {
        success: true,
        secret: pending.secret,
        otpauth_url: pending.otpauth_url,
        qr_code: pending.qr_png_base64,
    }))
}

/// Confirm the pending secret with a live code, then persist secret and
/// flag together
async fn handle_2fa_verify(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
    headers: HeaderMap,
    Json(request): Json<TwoFactorVerifyRequest>,
) -> AppResult<impl IntoResponse> {
    let admin = AuthService::load_admin(&context.database, identity.admin_id).await?;
    if admin.two_factor_enabled {
        return Err(AppError::already_exists("2FA is already enabled"));
    }
    if request.secret.trim().is_empty() {
        return Err(AppError::invalid_input("Secret is required"));
    }

    let code_ok = totp::verify(&request.secret, &request.code, totp::DEFAULT_WINDOW_STEPS)
        .map_err(|e| AppError::internal(e.to_string()))?;
    if !code_ok {
        return Err(AppError::invalid_two_factor_code());
    }

    context
        .database
        .enable_admin_two_factor(admin.id, &request.secret)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    context
        .database
        .log_activity(
            Some(admin.id),
            Some(&admin.username),
            "admin_2fa_enabled",
            None,
            client_ip(&headers).as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    info!(admin_id = admin.id, "2FA enabled");
    Ok(MessageResponse::ok("2FA enabled successfully"))
}

/// Disabling requires a live code from the currently enrolled secret
async fn handle_2fa_disable(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
    headers: HeaderMap,
    Json(request): Json<TwoFactorDisableRequest>,
) -> AppResult<impl IntoResponse> {
    let admin = AuthService::load_admin(&context.database, identity.admin_id).await?;
    let Some(secret) = admin
        .two_factor_secret
        .as_deref()
        .filter(|_| admin.two_factor_enabled)
    else {
        return Err(AppError::invalid_input("2FA is not enabled"));
    };

    let code_ok = totp::verify(secret, &request.code, totp::DEFAULT_WINDOW_STEPS)
        .map_err(|e| AppError::internal(e.to_string()))?;
    if !code_ok {
        return Err(AppError::invalid_two_factor_code());
    }

    context
        .database
        .disable_admin_two_factor(admin.id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    context
        .database
        .log_activity(
            Some(admin.id),
            Some(&admin.username),
            "admin_2fa_disabled",
            None,
            client_ip(&headers).as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    info!(admin_id = admin.id, "2FA disabled");
    Ok(MessageResponse::ok("2FA disabled successfully"))
}

async fn handle_change_password(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
    headers: HeaderMap,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    if request.new_password.len() < 8 {
        return Err(AppError::invalid_input(
            "New password must be at least 8 characters",
        ));
    }

    let admin = AuthService::load_admin(&context.database, identity.admin_id).await?;

    let current_ok = verify_password_blocking(
        request.current_password.clone(),
        admin.password_hash.clone(),
    )
    .await
    .map_err(|e| AppError::internal(e.to_string()))?;
    if !current_ok {
        return Err(AppError::auth_invalid("Current password is incorrect"));
    }

    let new_hash = hash_password_blocking(request.new_password.clone())
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;

    context
        .database
        .update_admin_password(admin.id, &new_hash)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    context
        .database
        .log_activity(
            Some(admin.id),
            Some(&admin.username),
            "admin_password_changed",
            None,
            client_ip(&headers).as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    info!(admin_id = admin.id, "Admin password changed");
    Ok(MessageResponse::ok("Password changed successfully"))
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create the authentication router
    pub fn routes(context: Arc<ApiContext>) -> Router {
        let protected = Router::new()
            .route("/auth/2fa/enable", post(handle_2fa_enable))
            .route("/auth/2fa/verify", post(handle_2fa_verify))
            .route("/auth/2fa/disable", post(handle_2fa_disable))
            .route("/auth/change-password", post(handle_change_password))
            .layer(middleware::from_fn_with_state(
                context.clone(),
                admin_auth_middleware,
            ));

        Router::new()
            .route("/auth/login", post(handle_login))
            .merge(protected)
            .with_state(context)
    }
}
