// ABOUTME: Activity log queries - append, filtered paging, and retention cleanup
// ABOUTME: Extends Database with the activity_logs-table operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use super::Database;
use crate::models::ActivityLogEntry;
use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn row_to_entry(row: &SqliteRow) -> Result<ActivityLogEntry> {
    Ok(ActivityLogEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        action: row.try_get("action")?,
        details: row.try_get("details")?,
        ip_address: row.try_get("ip_address")?,
        timestamp: row.try_get("timestamp")?,
    })
}

impl Database {
    /// Append an activity record; the username is denormalized so entries
    /// survive actor deletion
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn log_activity(
        &self,
        user_id: Option<i64>,
        username: Option<&str>,
        action: &str,
        details: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO activity_logs (user_id, username, action, details, ip_address, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(user_id)
        .bind(username)
        .bind(action)
        .bind(details)
        .bind(ip_address)
        .bind(Self::now())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch a page of activity entries, newest first, optionally filtered
    /// by exact action name
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn list_activity(
        &self,
        limit: i64,
        offset: i64,
        action: Option<&str>,
    ) -> Result<Vec<ActivityLogEntry>> {
        let rows = if let Some(action) = action {
            sqlx::query(
                r"
                SELECT * FROM activity_logs
                WHERE action = ?
                ORDER BY timestamp DESC
                LIMIT ? OFFSET ?
                ",
            )
            .bind(action)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query(
                r"
                SELECT * FROM activity_logs
                ORDER BY timestamp DESC
                LIMIT ? OFFSET ?
                ",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?
        };

        rows.iter().map(row_to_entry).collect()
    }

    /// Total entry count for the same optional action filter
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn count_activity(&self, action: Option<&str>) -> Result<i64> {
        let row = if let Some(action) = action {
            sqlx::query("SELECT COUNT(*) AS n FROM activity_logs WHERE action = ?")
                .bind(action)
                .fetch_one(self.pool())
                .await?
        } else {
            sqlx::query("SELECT COUNT(*) AS n FROM activity_logs")
                .fetch_one(self.pool())
                .await?
        };

        Ok(row.try_get("n")?)
    }

    /// Delete entries older than the retention window, returning the count
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn cleanup_activity(&self, retention_days: i64) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(retention_days);
        let result = sqlx::query("DELETE FROM activity_logs WHERE timestamp < ?")
            .bind(cutoff)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
