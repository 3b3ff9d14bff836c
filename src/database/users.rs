// ABOUTME: End user queries - listing, creation, ban management, and deletion
// ABOUTME: Extends Database with the users-table operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use super::Database;
use crate::models::{EndUser, UserStatus};
use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn row_to_user(row: &SqliteRow) -> Result<EndUser> {
    let is_banned: bool = row.try_get("is_banned")?;
    Ok(EndUser {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        email: row.try_get("email")?,
        hwid: row.try_get("hwid")?,
        status: UserStatus::from_banned(is_banned),
        ban_reason: row.try_get("ban_reason")?,
        created_at: row.try_get("created_at")?,
        last_login: row.try_get("last_login")?,
    })
}

impl Database {
    /// List all end users, newest first
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn list_users(&self) -> Result<Vec<EndUser>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(row_to_user).collect()
    }

    /// Look up an end user by id
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<EndUser>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Look up an end user by username
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<EndUser>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Insert a new end user
    ///
    /// # Errors
    /// Returns an error on constraint violation or connection failure.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        hwid: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query(
            r"
            INSERT INTO users (username, password_hash, email, hwid, created_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(hwid)
        .bind(Self::now())
        .execute(self.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Set or clear the banned flag; the reason is cleared on unban
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn set_user_banned(
        &self,
        user_id: i64,
        banned: bool,
        reason: Option<&str>,
    ) -> Result<u64> {
        let reason = if banned { reason } else { None };
        let result = sqlx::query("UPDATE users SET is_banned = ?, ban_reason = ? WHERE id = ?")
            .bind(banned)
            .bind(reason)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete a user along with their subscriptions; licenses they redeemed
    /// keep their history but drop the back-reference
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn delete_user(&self, user_id: i64) -> Result<u64> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM subscriptions WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE licenses SET used_by = NULL WHERE used_by = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
