// ABOUTME: Dashboard statistics - aggregate counts, type breakdowns, and growth series
// ABOUTME: Extends Database with the read-only reporting queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

use super::Database;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::Row;

/// Aggregate dashboard payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users: UserStats,
    pub subscriptions: SubscriptionStats,
    pub licenses: LicenseStats,
    pub subscription_types: Vec<TypeCount>,
    pub user_growth: Vec<GrowthPoint>,
    pub expiring_soon: Vec<ExpiringSubscription>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: i64,
    /// Signups in the trailing seven days; serialized as `new`
    #[serde(rename = "new")]
    pub new_last_week: i64,
    pub banned: i64,
    pub recent_logins: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStats {
    pub active: i64,
    pub expired: i64,
    pub expiring_soon: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStats {
    pub total: i64,
    pub unused: i64,
    pub used: i64,
}

/// Redeemed-license count per subscription type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    pub subscription_type: String,
    pub count: i64,
}

/// Signups on one calendar day (UTC)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub date: String,
    pub count: i64,
}

/// Subscription within the seven-day expiry window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringSubscription {
    pub username: Option<String>,
    pub subscription_name: String,
    pub expiry_date: DateTime<Utc>,
}

impl Database {
    async fn count_query(&self, sql: &str) -> Result<i64> {
        let row = sqlx::query(sql).fetch_one(self.pool()).await?;
        Ok(row.try_get("n")?)
    }

    /// Compute the full dashboard payload
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let now = Utc::now();
        let week_ago = now - Duration::days(7);
        let day_ago = now - Duration::days(1);
        let week_ahead = now + Duration::days(7);
        let month_ago = now - Duration::days(30);

        let total_users = self.count_query("SELECT COUNT(*) AS n FROM users").await?;
        let banned_users = self
            .count_query("SELECT COUNT(*) AS n FROM users WHERE is_banned = 1")
            .await?;

        let new_last_week: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM users WHERE created_at >= ?")
                .bind(week_ago)
                .fetch_one(self.pool())
                .await?
                .try_get("n")?;

        let recent_logins: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM users WHERE last_login >= ?")
                .bind(day_ago)
                .fetch_one(self.pool())
                .await?
                .try_get("n")?;

        let active_subscriptions: i64 = sqlx::query(
            "SELECT COUNT(*) AS n FROM subscriptions WHERE is_active = 1 AND expiry_date > ?",
        )
        .bind(now)
        .fetch_one(self.pool())
        .await?
        .try_get("n")?;

        let expired_subscriptions: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM subscriptions WHERE expiry_date <= ?")
                .bind(now)
                .fetch_one(self.pool())
                .await?
                .try_get("n")?;

        let expiring_count: i64 = sqlx::query(
            r"
            SELECT COUNT(*) AS n FROM subscriptions
            WHERE is_active = 1 AND expiry_date > ? AND expiry_date <= ?
            ",
        )
        .bind(now)
        .bind(week_ahead)
        .fetch_one(self.pool())
        .await?
        .try_get("n")?;

        let total_licenses = self
            .count_query("SELECT COUNT(*) AS n FROM licenses")
            .await?;
        let unused_licenses = self
            .count_query("SELECT COUNT(*) AS n FROM licenses WHERE status = 'unused'")
            .await?;
        let used_licenses = self
            .count_query("SELECT COUNT(*) AS n FROM licenses WHERE status = 'used'")
            .await?;

        let type_rows = sqlx::query(
            r"
            SELECT subscription_type, COUNT(*) AS n
            FROM licenses
            WHERE status = 'used'
            GROUP BY subscription_type
            ORDER BY n DESC
            ",
        )
        .fetch_all(self.pool())
        .await?;
        let subscription_types = type_rows
            .iter()
            .map(|row| {
                Ok(TypeCount {
                    subscription_type: row.try_get("subscription_type")?,
                    count: row.try_get("n")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Timestamps are RFC 3339 text, so the first ten characters are the
        // UTC calendar date
        let growth_rows = sqlx::query(
            r"
            SELECT substr(created_at, 1, 10) AS day, COUNT(*) AS n
            FROM users
            WHERE created_at >= ?
            GROUP BY day
            ORDER BY day ASC
            ",
        )
        .bind(month_ago)
        .fetch_all(self.pool())
        .await?;
        let user_growth = growth_rows
            .iter()
            .map(|row| {
                Ok(GrowthPoint {
                    date: row.try_get("day")?,
                    count: row.try_get("n")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let expiring_rows = sqlx::query(
            r"
            SELECT u.username AS username, s.subscription_name, s.expiry_date
            FROM subscriptions s
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.is_active = 1 AND s.expiry_date > ? AND s.expiry_date <= ?
            ORDER BY s.expiry_date ASC
            ",
        )
        .bind(now)
        .bind(week_ahead)
        .fetch_all(self.pool())
        .await?;
        let expiring_soon = expiring_rows
            .iter()
            .map(|row| {
                Ok(ExpiringSubscription {
                    username: row.try_get("username")?,
                    subscription_name: row.try_get("subscription_name")?,
                    expiry_date: row.try_get("expiry_date")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DashboardStats {
            users: UserStats {
                total: total_users,
                new_last_week,
                banned: banned_users,
                recent_logins,
            },
            subscriptions: SubscriptionStats {
                active: active_subscriptions,
                expired: expired_subscriptions,
                expiring_soon: expiring_count,
            },
            licenses: LicenseStats {
                total: total_licenses,
                unused: unused_licenses,
                used: used_licenses,
            },
            subscription_types,
            user_growth,
            expiring_soon,
        })
    }
}
