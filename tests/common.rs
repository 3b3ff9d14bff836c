// ABOUTME: Shared helpers for integration tests
// ABOUTME: In-memory database setup, seeded admin accounts, and request context builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

use chrono::Utc;
use comet_admin::auth::AuthManager;
use comet_admin::database::Database;
use comet_admin::models::{Admin, AdminRole};
use comet_admin::routes::ApiContext;
use std::sync::Arc;

pub const TEST_SIGNING_SECRET: &[u8] = b"integration-test-signing-secret-0123456789";

/// Low bcrypt cost keeps test seeding fast; never used outside tests
pub const TEST_BCRYPT_COST: u32 = 4;

pub async fn test_database() -> Database {
    Database::new("sqlite::memory:")
        .await
        .expect("in-memory database")
}

pub fn test_auth_manager() -> AuthManager {
    AuthManager::new(TEST_SIGNING_SECRET, 24)
}

pub async fn test_context() -> Arc<ApiContext> {
    let database = Arc::new(test_database().await);
    let auth = Arc::new(test_auth_manager());
    Arc::new(ApiContext::new(database, auth))
}

/// Insert an admin with the given password and return the stored row
pub async fn seed_admin(database: &Database, username: &str, password: &str) -> Admin {
    let hash = bcrypt::hash(password, TEST_BCRYPT_COST).unwrap();
    let id = database
        .create_admin(username, &hash, AdminRole::Admin, None)
        .await
        .unwrap();
    database.get_admin_by_id(id).await.unwrap().unwrap()
}

/// Enroll a TOTP secret for an admin and return the refreshed row
pub async fn enroll_two_factor(database: &Database, admin_id: i64, secret: &str) -> Admin {
    database
        .enable_admin_two_factor(admin_id, secret)
        .await
        .unwrap();
    database.get_admin_by_id(admin_id).await.unwrap().unwrap()
}

/// A six-digit code guaranteed not to verify for the secret right now,
/// even with the clock-skew window applied
pub fn wrong_code(secret: &str) -> String {
    let step = comet_admin::crypto::totp::STEP_SECONDS as i64;
    let now = unix_now();
    let valid: Vec<String> = (-3i64..=3)
        .map(|offset| {
            let t = now.wrapping_add_signed(offset * step);
            comet_admin::crypto::totp::code_at(secret, t).unwrap()
        })
        .collect();
    // More candidates than window slots, so one always survives
    ["000000", "111111", "222222", "333333", "444444", "555555", "666666", "777777"]
        .iter()
        .find(|candidate| !valid.iter().any(|v| v == *candidate))
        .map(|candidate| (*candidate).to_owned())
        .unwrap()
}

/// Build an admin struct without touching storage, for token tests
pub fn admin_fixture(id: i64, username: &str, role: AdminRole) -> Admin {
    Admin {
        id,
        username: username.to_owned(),
        password_hash: "irrelevant".to_owned(),
        role,
        email: None,
        two_factor_secret: None,
        two_factor_enabled: false,
        last_login: None,
        created_at: Utc::now(),
    }
}

pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
