// ABOUTME: Integration tests for the credential + TOTP login flow
// ABOUTME: Covers enumeration resistance, 2FA branching, and session side effects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use comet_admin::crypto::totp;
use comet_admin::errors::ErrorCode;
use comet_admin::routes::auth::{AuthService, LoginOutcome, LoginRequest};

fn login_request(username: &str, password: &str, code: Option<&str>) -> LoginRequest {
    LoginRequest {
        username: username.to_owned(),
        password: password.to_owned(),
        two_factor_code: code.map(str::to_owned),
    }
}

#[tokio::test]
async fn successful_login_issues_a_valid_token() {
    let context = common::test_context().await;
    let admin = common::seed_admin(&context.database, "alice", "correct-pass").await;

    let outcome = AuthService::login(
        &context,
        &login_request("alice", "correct-pass", None),
        Some("203.0.113.7"),
    )
    .await
    .unwrap();

    let LoginOutcome::Success { token, admin: profile } = outcome else {
        panic!("expected success");
    };
    assert_eq!(profile.id, admin.id);
    assert_eq!(profile.username, "alice");

    let claims = context.auth.validate_token(&token).unwrap();
    assert_eq!(claims.admin_id().unwrap(), admin.id);

    // Side effects: last_login is set and the login is recorded
    let refreshed = context
        .database
        .get_admin_by_id(admin.id)
        .await
        .unwrap()
        .unwrap();
    assert!(refreshed.last_login.is_some());

    let entries = context
        .database
        .list_activity(10, 0, Some("admin_login"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].ip_address.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn unknown_user_and_wrong_password_are_indistinguishable() {
    let context = common::test_context().await;
    common::seed_admin(&context.database, "alice", "correct-pass").await;

    let unknown = AuthService::login(&context, &login_request("nobody", "whatever", None), None)
        .await
        .unwrap_err();
    let wrong = AuthService::login(&context, &login_request("alice", "wrong-pass", None), None)
        .await
        .unwrap_err();

    assert_eq!(unknown.code, ErrorCode::InvalidCredentials);
    assert_eq!(wrong.code, ErrorCode::InvalidCredentials);
    assert_eq!(unknown.message, wrong.message);
}

#[tokio::test]
async fn failed_login_leaves_no_activity_entry() {
    let context = common::test_context().await;
    common::seed_admin(&context.database, "alice", "correct-pass").await;

    let _ = AuthService::login(&context, &login_request("alice", "wrong-pass", None), None).await;
    assert_eq!(context.database.count_activity(None).await.unwrap(), 0);
}

#[tokio::test]
async fn enabled_two_factor_without_code_asks_for_one() {
    let context = common::test_context().await;
    let admin = common::seed_admin(&context.database, "alice", "correct-pass").await;
    common::enroll_two_factor(&context.database, admin.id, "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP")
        .await;

    let outcome = AuthService::login(&context, &login_request("alice", "correct-pass", None), None)
        .await
        .unwrap();
    assert!(matches!(outcome, LoginOutcome::TwoFactorRequired));

    // A blank code counts as absent
    let outcome = AuthService::login(
        &context,
        &login_request("alice", "correct-pass", Some("  ")),
        None,
    )
    .await
    .unwrap();
    assert!(matches!(outcome, LoginOutcome::TwoFactorRequired));
}

#[tokio::test]
async fn two_factor_login_accepts_a_current_code_and_rejects_garbage() {
    let secret = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";
    let context = common::test_context().await;
    let admin = common::seed_admin(&context.database, "alice", "correct-pass").await;
    common::enroll_two_factor(&context.database, admin.id, secret).await;

    let code = totp::code_at(secret, common::unix_now()).unwrap();
    let outcome = AuthService::login(
        &context,
        &login_request("alice", "correct-pass", Some(&code)),
        None,
    )
    .await
    .unwrap();
    assert!(matches!(outcome, LoginOutcome::Success { .. }));

    let err = AuthService::login(
        &context,
        &login_request("alice", "correct-pass", Some("000000")),
        None,
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTwoFactorCode);
}

#[tokio::test]
async fn wrong_password_wins_over_two_factor_prompt() {
    // The password gate runs before the 2FA branch, so a bad password
    // never reveals that the account has 2FA enabled
    let context = common::test_context().await;
    let admin = common::seed_admin(&context.database, "alice", "correct-pass").await;
    common::enroll_two_factor(&context.database, admin.id, "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP")
        .await;

    let err = AuthService::login(&context, &login_request("alice", "wrong-pass", None), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidCredentials);
}
