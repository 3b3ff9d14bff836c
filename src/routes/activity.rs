// ABOUTME: Activity log routes - paged listing with action filter and retention cleanup
// ABOUTME: The log is append-only through the storage layer; only cleanup removes rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use crate::errors::{AppError, AppResult};
use crate::middleware::{admin_auth_middleware, AdminIdentity};
use crate::models::ActivityLogEntry;
use crate::routes::{client_ip, ApiContext};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{middleware, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;
const DEFAULT_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListResponse {
    pub success: bool,
    pub logs: Vec<ActivityLogEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
    pub removed: u64,
}

async fn handle_list_activity(
    State(context): State<Arc<ApiContext>>,
    Query(query): Query<ActivityQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    let action = query.action.as_deref().map(str::trim).filter(|a| !a.is_empty());

    let total = context
        .database
        .count_activity(action)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    let logs = context
        .database
        .list_activity(limit, offset, action)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(ActivityListResponse {
        success: true,
        logs,
        total,
        limit,
        offset,
    }))
}

async fn handle_cleanup_activity(
    State(context): State<Arc<ApiContext>>,
    Extension(identity): Extension<AdminIdentity>,
    headers: HeaderMap,
    Query(query): Query<CleanupQuery>,
) -> AppResult<impl IntoResponse> {
    let days = query.days.unwrap_or(DEFAULT_RETENTION_DAYS);
    if days < 1 {
        return Err(AppError::invalid_input("Retention must be at least 1 day"));
    }

    let removed = context
        .database
        .cleanup_activity(days)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    context
        .database
        .log_activity(
            Some(identity.admin_id),
            Some(&identity.username),
            "activity_cleanup",
            Some(&format!("Removed {removed} entries older than {days} days")),
            client_ip(&headers).as_deref(),
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    info!(admin_id = identity.admin_id, removed, days, "Activity log cleaned up");

    Ok(Json(CleanupResponse {
        success: true,
        message: format!("{removed} entries removed"),
        removed,
    }))
}

/// Activity log routes implementation
pub struct ActivityRoutes;

impl ActivityRoutes {
    /// Create the activity log router
    pub fn routes(context: Arc<ApiContext>) -> Router {
        Router::new()
            .route("/activity", get(handle_list_activity))
            .route("/activity/cleanup", delete(handle_cleanup_activity))
            .layer(middleware::from_fn_with_state(
                context.clone(),
                admin_auth_middleware,
            ))
            .with_state(context)
    }
}
