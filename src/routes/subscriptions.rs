// ABOUTME: Subscription routes - read-only listing with owner usernames
// ABOUTME: Subscriptions are created by license redemption, not through this API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use crate::errors::{AppError, AppResult};
use crate::middleware::admin_auth_middleware;
use crate::models::Subscription;
use crate::routes::ApiContext;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListResponse {
    pub success: bool,
    pub subscriptions: Vec<Subscription>,
}

async fn handle_list_subscriptions(
    State(context): State<Arc<ApiContext>>,
) -> AppResult<impl IntoResponse> {
    let subscriptions = context
        .database
        .list_subscriptions()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(SubscriptionListResponse {
        success: true,
        subscriptions,
    }))
}

/// Subscription routes implementation
pub struct SubscriptionRoutes;

impl SubscriptionRoutes {
    /// Create the subscription router
    pub fn routes(context: Arc<ApiContext>) -> Router {
        Router::new()
            .route("/subscriptions", get(handle_list_subscriptions))
            .layer(middleware::from_fn_with_state(
                context.clone(),
                admin_auth_middleware,
            ))
            .with_state(context)
    }
}
