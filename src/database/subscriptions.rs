// ABOUTME: Subscription queries - listing with owner usernames joined in
// ABOUTME: Extends Database with the subscriptions-table operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use super::Database;
use crate::models::Subscription;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn row_to_subscription(row: &SqliteRow) -> Result<Subscription> {
    Ok(Subscription {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        subscription_name: row.try_get("subscription_name")?,
        subscription_type: row.try_get("subscription_type")?,
        is_active: row.try_get("is_active")?,
        start_date: row.try_get("start_date")?,
        expiry_date: row.try_get("expiry_date")?,
    })
}

impl Database {
    /// List all subscriptions with the owning username, newest expiry first
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        let rows = sqlx::query(
            r"
            SELECT s.*, u.username AS username
            FROM subscriptions s
            LEFT JOIN users u ON u.id = s.user_id
            ORDER BY s.expiry_date DESC
            ",
        )
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_to_subscription).collect()
    }

    /// Insert a subscription for a user
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn create_subscription(
        &self,
        user_id: i64,
        subscription_name: &str,
        subscription_type: &str,
        start_date: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
    ) -> Result<i64> {
        let result = sqlx::query(
            r"
            INSERT INTO subscriptions
                (user_id, subscription_name, subscription_type, is_active, start_date, expiry_date)
            VALUES (?, ?, ?, 1, ?, ?)
            ",
        )
        .bind(user_id)
        .bind(subscription_name)
        .bind(subscription_type)
        .bind(start_date)
        .bind(expiry_date)
        .execute(self.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }
}
