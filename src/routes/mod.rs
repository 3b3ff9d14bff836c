// ABOUTME: HTTP route organization - shared request context and router assembly
// ABOUTME: Nests the admin API under /api and keeps health probes unauthenticated
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # HTTP Routes
//!
//! Route handlers organized by resource. Everything under `/api` except
//! the login endpoint runs behind the bearer-token middleware; `/health`
//! and `/ready` stay open for load balancers.

pub mod activity;
pub mod auth;
pub mod health;
pub mod licenses;
pub mod stats;
pub mod subscriptions;
pub mod users;

use crate::auth::AuthManager;
use crate::database::Database;
use axum::http::HeaderMap;
use axum::Router;
use std::sync::Arc;

/// Shared state handed to every handler
pub struct ApiContext {
    pub database: Arc<Database>,
    pub auth: Arc<AuthManager>,
}

impl ApiContext {
    #[must_use]
    pub fn new(database: Arc<Database>, auth: Arc<AuthManager>) -> Self {
        Self { database, auth }
    }
}

/// Assemble the full application router
#[must_use]
pub fn router(context: Arc<ApiContext>) -> Router {
    let api = Router::new()
        .merge(auth::AuthRoutes::routes(context.clone()))
        .merge(users::UserRoutes::routes(context.clone()))
        .merge(licenses::LicenseRoutes::routes(context.clone()))
        .merge(subscriptions::SubscriptionRoutes::routes(context.clone()))
        .merge(stats::StatsRoutes::routes(context.clone()))
        .merge(activity::ActivityRoutes::routes(context.clone()));

    Router::new()
        .merge(health::HealthRoutes::routes(context))
        .nest("/api", api)
}

/// Best-effort client address for activity records
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
