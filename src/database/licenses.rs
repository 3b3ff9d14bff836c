// ABOUTME: License key queries - listing, batch insertion, and deletion
// ABOUTME: Extends Database with the licenses-table operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use super::Database;
use crate::models::{License, LicenseStatus};
use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn row_to_license(row: &SqliteRow) -> Result<License> {
    let status_str: String = row.try_get("status")?;
    let status = LicenseStatus::parse(&status_str)
        .ok_or_else(|| anyhow!("unknown license status in store: {status_str}"))?;

    Ok(License {
        id: row.try_get("id")?,
        license_key: row.try_get("license_key")?,
        subscription_type: row.try_get("subscription_type")?,
        duration_days: row.try_get("duration_days")?,
        status,
        used_by: row.try_get("used_by")?,
        used_at: row.try_get("used_at")?,
        created_at: row.try_get("created_at")?,
    })
}

impl Database {
    /// List all licenses, newest first
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn list_licenses(&self) -> Result<Vec<License>> {
        let rows = sqlx::query("SELECT * FROM licenses ORDER BY created_at DESC")
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(row_to_license).collect()
    }

    /// Insert a batch of freshly generated keys in one transaction
    ///
    /// # Errors
    /// Returns an error on key collision or connection failure; a collision
    /// rolls back the whole batch.
    pub async fn insert_licenses(
        &self,
        keys: &[String],
        subscription_type: &str,
        duration_days: i64,
    ) -> Result<Vec<License>> {
        let mut tx = self.pool().begin().await?;
        let created_at = Self::now();
        let mut ids = Vec::with_capacity(keys.len());

        for key in keys {
            let result = sqlx::query(
                r"
                INSERT INTO licenses (license_key, subscription_type, duration_days, status, created_at)
                VALUES (?, ?, ?, 'unused', ?)
                ",
            )
            .bind(key)
            .bind(subscription_type)
            .bind(duration_days)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
            ids.push(result.last_insert_rowid());
        }

        tx.commit().await?;

        let mut inserted = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query("SELECT * FROM licenses WHERE id = ?")
                .bind(id)
                .fetch_one(self.pool())
                .await?;
            inserted.push(row_to_license(&row)?);
        }
        Ok(inserted)
    }

    /// Delete a license by id
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn delete_license(&self, license_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM licenses WHERE id = ?")
            .bind(license_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
