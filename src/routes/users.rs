// ABOUTME: End user management routes - listing, creation, ban toggling, deletion
// ABOUTME: Responses carry sanitized summaries, never password hashes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use crate::crypto::password::hash_password_blocking;
use crate::errors::{AppError, AppResult};
use crate::middleware::{admin_auth_middleware, AdminIdentity};
use crate::models::{EndUser, UserSummary};
use crate::routes::{client_ip, ApiContext};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{middleware, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub hwid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanUserRequest {
    pub is_banned: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

async fn handle_list_users(
    State(context): State<Arc<ApiContext>>,
) -> AppResult<impl IntoResponse> {
    let users = context
        .database
        .list_users()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(UserListResponse {
        success: true,
        users: users.iter().map(EndUser::summary).collect(),
    }))
}

async fn handle_create_user(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
    headers: HeaderMap,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AppError::invalid_input("Username is required"));
    }
    if request.password.len() < 6 {
        return Err(AppError::invalid_input(
            "Password must be at least 6 characters",
        ));
    }

    if context
        .database
        .get_user_by_username(username)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .is_some()
    {
        return Err(AppError::already_exists("Username already exists"));
    }

    let password_hash = hash_password_blocking(request.password.clone())
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;

    let user_id = context
        .database
        .create_user(
            username,
            &password_hash,
            request.email.as_deref(),
            request.hwid.as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let user = context
        .database
        .get_user_by_id(user_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::internal("created user not found"))?;

    context
        .database
        .log_activity(
            Some(identity.admin_id),
            Some(&identity.username),
            "user_created",
            Some(&format!("Created user {username}")),
            client_ip(&headers).as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    info!(admin_id = identity.admin_id, user_id, "User created");

    Ok(Json(UserCreatedResponse {
        success: true,
        message: "User created successfully".into(),
        user: user.summary(),
    }))
}

async fn handle_ban_user(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
    Json(request): Json<BanUserRequest>,
) -> AppResult<impl IntoResponse> {
    let affected = context
        .database
        .set_user_banned(user_id, request.is_banned, request.reason.as_deref())
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    if affected == 0 {
        return Err(AppError::not_found("User"));
    }

    let (action, message) = if request.is_banned {
        ("user_banned", "User banned successfully")
    } else {
        ("user_unbanned", "User unbanned successfully")
    };

    context
        .database
        .log_activity(
            Some(identity.admin_id),
            Some(&identity.username),
            action,
            request.reason.as_deref(),
            client_ip(&headers).as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    info!(
        admin_id = identity.admin_id,
        user_id,
        banned = request.is_banned,
        "User ban state changed"
    );

    Ok(Json(ActionResponse {
        success: true,
        message: message.into(),
    }))
}

async fn handle_delete_user(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let affected = context
        .database
        .delete_user(user_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    if affected == 0 {
        return Err(AppError::not_found("User"));
    }

    context
        .database
        .log_activity(
            Some(identity.admin_id),
            Some(&identity.username),
            "user_deleted",
            Some(&format!("Deleted user id {user_id}")),
            client_ip(&headers).as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    info!(admin_id = identity.admin_id, user_id, "User deleted");

    Ok(Json(ActionResponse {
        success: true,
        message: "User deleted successfully".into(),
    }))
}

/// User management routes implementation
pub struct UserRoutes;

impl UserRoutes {
    /// Create the user management router
    pub fn routes(context: Arc<ApiContext>) -> Router {
        Router::new()
            .route("/users", get(handle_list_users).post(handle_create_user))
            .route("/users/:id", delete(handle_delete_user))
            .route("/users/:id/ban", post(handle_ban_user))
            .layer(middleware::from_fn_with_state(
                context.clone(),
                admin_auth_middleware,
            ))
            .with_state(context)
    }
}
