// ABOUTME: Domain records for admins, end-users, licenses, subscriptions, and activity logs
// ABOUTME: Role and status fields are closed enums so invalid states are unrepresentable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # Domain Models
//!
//! Records persisted by the credential/domain store. Enumerated fields
//! (`role`, user/license status) are closed variants rather than free-form
//! strings; the database layer parses the stored text back into them and
//! rejects anything unknown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admin authorization tier. Both variants are members of the allowed
/// admin role set; `Superadmin` exists for out-of-band bootstrap accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    Superadmin,
}

impl AdminRole {
    /// Stored/serialized representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }

    /// Parse the stored representation; unknown strings are rejected
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "superadmin" => Some(Self::Superadmin),
            _ => None,
        }
    }

    /// Membership in the admin role set gating management routes
    #[must_use]
    pub const fn is_admin_or_higher(self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin identity as stored in the `admins` table.
///
/// Invariant: `two_factor_secret` is `Some` iff `two_factor_enabled`,
/// except during the enrollment window where a generated secret lives
/// only in the HTTP response until the paired code is confirmed.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub email: Option<String>,
    pub two_factor_secret: Option<String>,
    pub two_factor_enabled: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// Sanitized projection for API responses. Never carries the password
    /// hash or the TOTP secret.
    #[must_use]
    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            email: self.email.clone(),
        }
    }
}

/// What callers see of an admin after login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: i64,
    pub username: String,
    pub role: AdminRole,
    pub email: Option<String>,
}

/// End-user account status, derived from the ban flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Banned,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Banned => "banned",
        }
    }

    #[must_use]
    pub const fn from_banned(is_banned: bool) -> Self {
        if is_banned {
            Self::Banned
        } else {
            Self::Active
        }
    }
}

/// End-user account of the external product
#[derive(Debug, Clone)]
pub struct EndUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub hwid: Option<String>,
    pub status: UserStatus,
    pub ban_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl EndUser {
    /// Sanitized listing projection (no password hash)
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            hwid: self.hwid.clone(),
            status: self.status,
            is_banned: matches!(self.status, UserStatus::Banned),
            ban_reason: self.ban_reason.clone(),
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// End-user projection for list responses
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub hwid: Option<String>,
    pub status: UserStatus,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// License key redemption state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Unused,
    Used,
}

impl LicenseStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Used => "used",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unused" => Some(Self::Unused),
            "used" => Some(Self::Used),
            _ => None,
        }
    }
}

/// Time-limited license key. The key itself is an opaque generated string;
/// no cryptographic structure is implied.
#[derive(Debug, Clone, Serialize)]
pub struct License {
    pub id: i64,
    pub license_key: String,
    pub subscription_type: String,
    pub duration_days: i64,
    pub status: LicenseStatus,
    pub used_by: Option<i64>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Subscription record owned by an end-user
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    /// Owning username, joined in for list responses
    pub username: Option<String>,
    pub subscription_name: String,
    pub subscription_type: String,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

/// Append-only activity log entry. Optionally references a user; the
/// username is denormalized so entries survive user deletion.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub action: String,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [AdminRole::Admin, AdminRole::Superadmin] {
            assert_eq!(AdminRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(AdminRole::parse("root"), None);
        assert_eq!(AdminRole::parse(""), None);
    }

    #[test]
    fn test_both_roles_are_admin() {
        assert!(AdminRole::Admin.is_admin_or_higher());
        assert!(AdminRole::Superadmin.is_admin_or_higher());
    }

    #[test]
    fn test_license_status_rejects_unknown() {
        assert_eq!(LicenseStatus::parse("unused"), Some(LicenseStatus::Unused));
        assert_eq!(LicenseStatus::parse("used"), Some(LicenseStatus::Used));
        assert_eq!(LicenseStatus::parse("expired"), None);
    }

    #[test]
    fn test_profile_omits_sensitive_fields() {
        let admin = Admin {
            id: 1,
            username: "alice".into(),
            password_hash: "$2b$12$hash".into(),
            role: AdminRole::Admin,
            email: None,
            two_factor_secret: Some("JBSWY3DPEHPK3PXP".into()),
            two_factor_enabled: true,
            last_login: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&admin.profile()).unwrap();
        assert!(!json.contains("hash"));
        assert!(!json.contains("JBSWY3DPEHPK3PXP"));
    }
}
