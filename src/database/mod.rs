// ABOUTME: SQLite storage layer - connection pool, migrations, and admin credential queries
// ABOUTME: Domain-table queries live in the sibling modules as impl blocks on Database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # Database Management
//!
//! Parameterized-query wrapper over a `SqlitePool`. All timestamps are
//! stored as RFC 3339 UTC text and compared with bound parameters, never
//! with SQL date functions, so string comparison stays consistent.
//!
//! Single-row read-modify-write atomicity comes from issuing each state
//! change as one `UPDATE` statement; in particular the 2FA secret+flag
//! pair is always written (or cleared) in a single statement.

mod activity;
mod licenses;
mod stats;
mod subscriptions;
mod users;

pub use stats::{
    DashboardStats, ExpiringSubscription, GrowthPoint, LicenseStats, SubscriptionStats,
    TypeCount, UserStats,
};

use crate::models::{Admin, AdminRole};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::time::Duration as StdDuration;

/// Database manager for admin, user, license, and activity storage
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the database at the given URL
    ///
    /// # Errors
    /// Returns an error if the connection or migrations fail.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains(":memory:")
            && !database_url.contains('?')
        {
            if let Some(parent) = std::path::Path::new(
                database_url.trim_start_matches("sqlite:").trim_start_matches("//"),
            )
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            {
                std::fs::create_dir_all(parent)?;
            }
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        // An in-memory database exists per connection, so the pool must
        // hold exactly one and never recycle it
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<StdDuration>)
                .max_lifetime(None::<StdDuration>)
                .connect(&connection_options)
                .await?
        } else {
            SqlitePool::connect(&connection_options).await?
        };
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Access the underlying pool (tests and stats queries)
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run schema migrations
    ///
    /// # Errors
    /// Returns an error if any DDL statement fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'admin',
                email TEXT,
                two_factor_secret TEXT,
                two_factor_enabled INTEGER NOT NULL DEFAULT 0,
                last_login TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                email TEXT,
                hwid TEXT,
                is_banned INTEGER NOT NULL DEFAULT 0,
                ban_reason TEXT,
                created_at TEXT NOT NULL,
                last_login TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS licenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                license_key TEXT UNIQUE NOT NULL,
                subscription_type TEXT NOT NULL,
                duration_days INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'unused',
                used_by INTEGER REFERENCES users(id),
                used_at TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS subscriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                subscription_name TEXT NOT NULL,
                subscription_type TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                start_date TEXT NOT NULL,
                expiry_date TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS activity_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                username TEXT,
                action TEXT NOT NULL,
                details TEXT,
                ip_address TEXT,
                timestamp TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_licenses_key ON licenses(license_key)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_activity_timestamp ON activity_logs(timestamp)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn row_to_admin(row: &SqliteRow) -> Result<Admin> {
        let role_str: String = row.try_get("role")?;
        let role = AdminRole::parse(&role_str)
            .ok_or_else(|| anyhow!("unknown admin role in store: {role_str}"))?;

        Ok(Admin {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role,
            email: row.try_get("email")?,
            two_factor_secret: row.try_get("two_factor_secret")?,
            two_factor_enabled: row.try_get("two_factor_enabled")?,
            last_login: row.try_get("last_login")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Insert a new admin row
    ///
    /// # Errors
    /// Returns an error on constraint violation or connection failure.
    pub async fn create_admin(
        &self,
        username: &str,
        password_hash: &str,
        role: AdminRole,
        email: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query(
            r"
            INSERT INTO admins (username, password_hash, role, email, created_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Look up an admin by username
    ///
    /// # Errors
    /// Returns an error on query failure or an unparseable stored role.
    pub async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let row = sqlx::query("SELECT * FROM admins WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_admin).transpose()
    }

    /// Look up an admin by id
    ///
    /// # Errors
    /// Returns an error on query failure or an unparseable stored role.
    pub async fn get_admin_by_id(&self, admin_id: i64) -> Result<Option<Admin>> {
        let row = sqlx::query("SELECT * FROM admins WHERE id = ?")
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_admin).transpose()
    }

    /// Record a successful login timestamp
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn touch_admin_last_login(&self, admin_id: i64) -> Result<()> {
        sqlx::query("UPDATE admins SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace an admin's password hash
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn update_admin_password(&self, admin_id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE admins SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace an admin's password hash by username (bootstrap/reset path)
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn update_admin_password_by_username(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<u64> {
        let result = sqlx::query("UPDATE admins SET password_hash = ? WHERE username = ?")
            .bind(password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Persist a confirmed TOTP secret and set the enabled flag.
    ///
    /// One statement, so the secret and flag can never diverge.
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn enable_admin_two_factor(&self, admin_id: i64, secret: &str) -> Result<()> {
        sqlx::query(
            "UPDATE admins SET two_factor_secret = ?, two_factor_enabled = 1 WHERE id = ?",
        )
        .bind(secret)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Clear the TOTP secret and the enabled flag in one statement
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn disable_admin_two_factor(&self, admin_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE admins SET two_factor_secret = NULL, two_factor_enabled = 0 WHERE id = ?",
        )
        .bind(admin_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Round-trip a trivial query, proving the pool can serve requests
    ///
    /// # Errors
    /// Returns an error if no connection can be acquired.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Timestamp helper shared by the sibling modules
    pub(crate) fn now() -> DateTime<Utc> {
        Utc::now()
    }
}
