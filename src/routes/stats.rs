// ABOUTME: Dashboard statistics route - aggregate counts and growth series in one payload
// ABOUTME: All numbers come from the reporting queries in the storage layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use crate::database::DashboardStats;
use crate::errors::{AppError, AppResult};
use crate::middleware::admin_auth_middleware;
use crate::routes::ApiContext;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub success: bool,
    pub stats: DashboardStats,
}

async fn handle_stats(State(context): State<Arc<ApiContext>>) -> AppResult<impl IntoResponse> {
    let stats = context
        .database
        .dashboard_stats()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

/// Statistics routes implementation
pub struct StatsRoutes;

impl StatsRoutes {
    /// Create the statistics router
    pub fn routes(context: Arc<ApiContext>) -> Router {
        Router::new()
            .route("/stats", get(handle_stats))
            .layer(middleware::from_fn_with_state(
                context.clone(),
                admin_auth_middleware,
            ))
            .with_state(context)
    }
}
