// ABOUTME: Liveness and readiness probes for load balancers and uptime checks
// ABOUTME: Readiness round-trips the database pool; liveness only proves the process serves
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! Unauthenticated health probes.
//!
//! `/health` answers as long as the process is serving requests.
//! `/ready` additionally pings the database and reports 503 when the
//! pool cannot serve a query, so orchestrators stop routing traffic to
//! an instance whose storage has gone away.

use crate::routes::ApiContext;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

async fn handle_health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn handle_ready(State(context): State<Arc<ApiContext>>) -> impl IntoResponse {
    match context.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "database": "ok",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        ),
        Err(e) => {
            warn!("Readiness check failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "database": "unreachable",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            )
        }
    }
}

/// Health probe routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health probe router
    #[must_use]
    pub fn routes(context: Arc<ApiContext>) -> Router {
        Router::new()
            .route("/health", get(handle_health))
            .route("/ready", get(handle_ready))
            .with_state(context)
    }
}
