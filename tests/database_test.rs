// ABOUTME: Integration tests for the SQLite storage layer
// ABOUTME: Covers admin credentials, 2FA persistence, users, licenses, activity, and stats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use comet_admin::models::{AdminRole, LicenseStatus, UserStatus};

#[tokio::test]
async fn admin_create_and_lookup() {
    let db = common::test_database().await;
    let admin = common::seed_admin(&db, "alice", "hunter2pass").await;

    assert_eq!(admin.username, "alice");
    assert_eq!(admin.role, AdminRole::Admin);
    assert!(!admin.two_factor_enabled);
    assert!(admin.two_factor_secret.is_none());
    assert!(admin.last_login.is_none());

    let by_name = db.get_admin_by_username("alice").await.unwrap().unwrap();
    assert_eq!(by_name.id, admin.id);
    assert!(db.get_admin_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_admin_username_is_rejected() {
    let db = common::test_database().await;
    common::seed_admin(&db, "alice", "hunter2pass").await;

    let result = db
        .create_admin("alice", "another-hash", AdminRole::Admin, None)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn touch_last_login_sets_timestamp() {
    let db = common::test_database().await;
    let admin = common::seed_admin(&db, "alice", "hunter2pass").await;

    db.touch_admin_last_login(admin.id).await.unwrap();
    let refreshed = db.get_admin_by_id(admin.id).await.unwrap().unwrap();
    assert!(refreshed.last_login.is_some());
}

#[tokio::test]
async fn two_factor_enable_persists_secret_and_flag_together() {
    let db = common::test_database().await;
    let admin = common::seed_admin(&db, "alice", "hunter2pass").await;

    let enrolled = common::enroll_two_factor(&db, admin.id, "JBSWY3DPEHPK3PXP").await;
    assert!(enrolled.two_factor_enabled);
    assert_eq!(enrolled.two_factor_secret.as_deref(), Some("JBSWY3DPEHPK3PXP"));

    db.disable_admin_two_factor(admin.id).await.unwrap();
    let cleared = db.get_admin_by_id(admin.id).await.unwrap().unwrap();
    assert!(!cleared.two_factor_enabled);
    assert!(cleared.two_factor_secret.is_none());
}

#[tokio::test]
async fn password_reset_by_username_reports_missing_account() {
    let db = common::test_database().await;
    common::seed_admin(&db, "alice", "hunter2pass").await;

    assert_eq!(
        db.update_admin_password_by_username("alice", "new-hash")
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        db.update_admin_password_by_username("nobody", "new-hash")
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn user_ban_and_unban_clears_reason() {
    let db = common::test_database().await;
    let user_id = db.create_user("player1", "hash", None, None).await.unwrap();

    db.set_user_banned(user_id, true, Some("cheating"))
        .await
        .unwrap();
    let user = db.get_user_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(user.status, UserStatus::Banned);
    assert_eq!(user.ban_reason.as_deref(), Some("cheating"));

    db.set_user_banned(user_id, false, None).await.unwrap();
    let user = db.get_user_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(user.status, UserStatus::Active);
    assert!(user.ban_reason.is_none());
}

#[tokio::test]
async fn deleting_a_user_removes_subscriptions_and_detaches_licenses() {
    let db = common::test_database().await;
    let user_id = db.create_user("player1", "hash", None, None).await.unwrap();

    let now = chrono::Utc::now();
    db.create_subscription(user_id, "Comet Pro", "pro", now, now + chrono::Duration::days(30))
        .await
        .unwrap();

    let keys = vec!["AAAAA-BBBBB-CCCCC-DDDDD".to_owned()];
    let licenses = db.insert_licenses(&keys, "pro", 30).await.unwrap();
    sqlx::query("UPDATE licenses SET used_by = ?, status = 'used' WHERE id = ?")
        .bind(user_id)
        .bind(licenses[0].id)
        .execute(db.pool())
        .await
        .unwrap();

    assert_eq!(db.delete_user(user_id).await.unwrap(), 1);
    assert!(db.get_user_by_id(user_id).await.unwrap().is_none());
    assert!(db.list_subscriptions().await.unwrap().is_empty());

    let remaining = db.list_licenses().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].used_by.is_none());
}

#[tokio::test]
async fn license_batch_insert_and_unique_collision_rolls_back() {
    let db = common::test_database().await;
    let keys = vec![
        "AAAAA-AAAAA-AAAAA-AAAAA".to_owned(),
        "BBBBB-BBBBB-BBBBB-BBBBB".to_owned(),
    ];
    let inserted = db.insert_licenses(&keys, "basic", 7).await.unwrap();
    assert_eq!(inserted.len(), 2);
    assert!(inserted.iter().all(|l| l.status == LicenseStatus::Unused));

    // Second batch reuses a key; the whole batch must roll back
    let colliding = vec![
        "CCCCC-CCCCC-CCCCC-CCCCC".to_owned(),
        "AAAAA-AAAAA-AAAAA-AAAAA".to_owned(),
    ];
    assert!(db.insert_licenses(&colliding, "basic", 7).await.is_err());

    let all = db.list_licenses().await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn activity_log_pages_and_filters() {
    let db = common::test_database().await;
    for i in 0..5 {
        db.log_activity(Some(1), Some("alice"), "admin_login", None, None)
            .await
            .unwrap();
        db.log_activity(Some(1), Some("alice"), "user_banned", Some(&format!("u{i}")), None)
            .await
            .unwrap();
    }

    assert_eq!(db.count_activity(None).await.unwrap(), 10);
    assert_eq!(db.count_activity(Some("admin_login")).await.unwrap(), 5);

    let page = db.list_activity(3, 0, None).await.unwrap();
    assert_eq!(page.len(), 3);

    let filtered = db.list_activity(50, 0, Some("user_banned")).await.unwrap();
    assert_eq!(filtered.len(), 5);
    assert!(filtered.iter().all(|e| e.action == "user_banned"));
}

#[tokio::test]
async fn activity_cleanup_only_removes_entries_past_the_cutoff() {
    let db = common::test_database().await;
    db.log_activity(Some(1), Some("alice"), "admin_login", None, None)
        .await
        .unwrap();

    // Backdate one entry beyond the retention window
    let old = chrono::Utc::now() - chrono::Duration::days(45);
    sqlx::query(
        "INSERT INTO activity_logs (user_id, username, action, timestamp) VALUES (1, 'alice', 'admin_login', ?)",
    )
    .bind(old)
    .execute(db.pool())
    .await
    .unwrap();

    assert_eq!(db.cleanup_activity(30).await.unwrap(), 1);
    assert_eq!(db.count_activity(None).await.unwrap(), 1);
}

#[tokio::test]
async fn dashboard_stats_reconcile_with_the_rows() {
    let db = common::test_database().await;
    let now = chrono::Utc::now();

    let u1 = db.create_user("p1", "hash", None, None).await.unwrap();
    let u2 = db.create_user("p2", "hash", None, None).await.unwrap();
    db.set_user_banned(u2, true, Some("abuse")).await.unwrap();

    // Active, expiring within a week
    db.create_subscription(u1, "Comet Pro", "pro", now, now + chrono::Duration::days(3))
        .await
        .unwrap();
    // Already expired
    db.create_subscription(
        u1,
        "Comet Basic",
        "basic",
        now - chrono::Duration::days(60),
        now - chrono::Duration::days(30),
    )
    .await
    .unwrap();

    let keys = vec![
        "AAAAA-AAAAA-AAAAA-AAAAA".to_owned(),
        "BBBBB-BBBBB-BBBBB-BBBBB".to_owned(),
    ];
    let licenses = db.insert_licenses(&keys, "pro", 30).await.unwrap();
    sqlx::query("UPDATE licenses SET status = 'used', used_by = ? WHERE id = ?")
        .bind(u1)
        .bind(licenses[0].id)
        .execute(db.pool())
        .await
        .unwrap();

    let stats = db.dashboard_stats().await.unwrap();

    assert_eq!(stats.users.total, 2);
    assert_eq!(stats.users.banned, 1);
    assert_eq!(stats.users.new_last_week, 2);

    assert_eq!(stats.subscriptions.active, 1);
    assert_eq!(stats.subscriptions.expired, 1);
    assert_eq!(stats.subscriptions.expiring_soon, 1);

    assert_eq!(stats.licenses.total, 2);
    assert_eq!(stats.licenses.used, 1);
    assert_eq!(stats.licenses.unused, 1);

    assert_eq!(stats.subscription_types.len(), 1);
    assert_eq!(stats.subscription_types[0].subscription_type, "pro");
    assert_eq!(stats.subscription_types[0].count, 1);

    // Both signups happened today
    assert_eq!(stats.user_growth.len(), 1);
    assert_eq!(stats.user_growth[0].count, 2);

    assert_eq!(stats.expiring_soon.len(), 1);
    assert_eq!(stats.expiring_soon[0].username.as_deref(), Some("p1"));
    assert_eq!(stats.expiring_soon[0].subscription_name, "Comet Pro");
}
