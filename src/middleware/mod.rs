// ABOUTME: Request middleware module organization
// ABOUTME: Authentication and admin authorization gates for protected routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! Per-request gates applied to every protected route.

/// Bearer-token authentication and admin role authorization
pub mod auth;

pub use auth::{admin_auth_middleware, authenticate, authorize_admin, AdminIdentity};
