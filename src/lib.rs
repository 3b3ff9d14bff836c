// ABOUTME: Main library entry point for the Comet admin service
// ABOUTME: Provides admin authentication, user and license management over a REST API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # Comet Admin
//!
//! Administration backend for the Comet user and license platform.
//! Exposes a JSON API for operators to manage end-user accounts, license
//! keys, and subscriptions, with every mutation recorded in an
//! append-only activity log.
//!
//! ## Features
//!
//! - **Password + TOTP login**: bcrypt-hashed credentials with an
//!   optional authenticator-app second factor
//! - **JWT sessions**: stateless bearer tokens validated by middleware
//!   on every protected route
//! - **User management**: create, ban, unban, and delete end users
//! - **License keys**: batch generation, deletion, and CSV export
//! - **Dashboard**: aggregate statistics and a 30-day growth series
//!
//! ## Quick Start
//!
//! 1. Create the first operator account with `comet-admin create-admin`
//! 2. Start the API with `comet-admin serve`
//! 3. Log in at `POST /api/auth/login` and use the returned token as a
//!    `Bearer` header

pub mod auth;
pub mod config;
pub mod crypto;
pub mod database;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
