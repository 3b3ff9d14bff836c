// ABOUTME: Unit tests for the authentication and authorization gates
// ABOUTME: Exercises header parsing and role checks without an HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::http::{HeaderMap, HeaderValue};
use comet_admin::errors::ErrorCode;
use comet_admin::middleware::{authenticate, authorize_admin, AdminIdentity};
use comet_admin::models::AdminRole;

fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

#[test]
fn valid_bearer_token_yields_identity() {
    let auth = common::test_auth_manager();
    let admin = common::admin_fixture(9, "carol", AdminRole::Superadmin);
    let token = auth.issue_token(&admin).unwrap();

    let identity = authenticate(&bearer_headers(&token), &auth).unwrap();
    assert_eq!(identity.admin_id, 9);
    assert_eq!(identity.username, "carol");
    assert_eq!(identity.role, AdminRole::Superadmin);
}

#[test]
fn missing_header_is_auth_required() {
    let auth = common::test_auth_manager();
    let err = authenticate(&HeaderMap::new(), &auth).unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthRequired);
}

#[test]
fn non_bearer_scheme_is_rejected() {
    let auth = common::test_auth_manager();
    let mut headers = HeaderMap::new();
    headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwdw=="));

    let err = authenticate(&headers, &auth).unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);
}

#[test]
fn garbage_token_is_rejected_with_generic_message() {
    let auth = common::test_auth_manager();
    let err = authenticate(&bearer_headers("garbage"), &auth).unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);
    assert_eq!(err.message, "Invalid or expired token");
}

#[test]
fn expired_token_gets_the_same_generic_message() {
    let auth = comet_admin::auth::AuthManager::new(common::TEST_SIGNING_SECRET, -1);
    let admin = common::admin_fixture(1, "dave", AdminRole::Admin);
    let token = auth.issue_token(&admin).unwrap();

    let err = authenticate(&bearer_headers(&token), &auth).unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);
    assert_eq!(err.message, "Invalid or expired token");
}

#[test]
fn admin_and_superadmin_pass_the_role_gate() {
    for role in [AdminRole::Admin, AdminRole::Superadmin] {
        let identity = AdminIdentity {
            admin_id: 1,
            username: "op".into(),
            role,
        };
        assert!(authorize_admin(&identity).is_ok());
    }
}
