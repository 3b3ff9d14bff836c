// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! Environment-based configuration management for production deployment

use crate::auth::DEFAULT_TOKEN_TTL_HOURS;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite:data/comet_admin.db";
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 900;
const DEFAULT_RATE_LIMIT_MAX: u32 = 100;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Environment type for security and logging configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// SQLite database with file path
    SQLite { path: PathBuf },
    /// In-memory SQLite (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    /// Returns an error for non-sqlite URLs.
    pub fn parse_url(s: &str) -> Result<Self> {
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            if path_str == ":memory:" {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str),
                })
            }
        } else {
            bail!("Unsupported database URL (expected sqlite:...): {s}")
        }
    }

    /// Connection string for the pool
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("data/comet_admin.db"),
        }
    }
}

/// Server configuration assembled from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub environment: Environment,
    pub log_level: LogLevel,
    pub database_url: DatabaseUrl,
    /// JWT signing secret; required in production, generated otherwise
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: i64,
    pub cors_origins: Vec<String>,
    /// Rate limit window carried for the fronting proxy layer
    pub rate_limit_window_secs: u64,
    /// Maximum requests per window, carried for the fronting proxy layer
    pub rate_limit_max: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error for unparseable values or a missing production
    /// signing secret.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let config = Self {
            http_port: env_var_or("HTTP_PORT", &DEFAULT_HTTP_PORT.to_string())?
                .parse()
                .context("Invalid HTTP_PORT value")?,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )?),
            log_level: LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info")?),
            database_url: DatabaseUrl::parse_url(&env_var_or(
                "DATABASE_URL",
                DEFAULT_DATABASE_URL,
            )?)?,
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            jwt_expiry_hours: env_var_or("JWT_EXPIRY_HOURS", &DEFAULT_TOKEN_TTL_HOURS.to_string())?
                .parse()
                .context("Invalid JWT_EXPIRY_HOURS value")?,
            cors_origins: parse_origins(&env_var_or("CORS_ORIGINS", "*")?),
            rate_limit_window_secs: env_var_or(
                "RATE_LIMIT_WINDOW_SECS",
                &DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string(),
            )?
            .parse()
            .context("Invalid RATE_LIMIT_WINDOW_SECS value")?,
            rate_limit_max: env_var_or("RATE_LIMIT_MAX", &DEFAULT_RATE_LIMIT_MAX.to_string())?
                .parse()
                .context("Invalid RATE_LIMIT_MAX value")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    /// Returns an error when a production deployment lacks a signing secret
    /// or the token lifetime is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_production() && self.jwt_secret.is_none() {
            bail!("JWT_SECRET must be set when ENVIRONMENT=production");
        }
        if self.jwt_expiry_hours <= 0 {
            bail!("JWT_EXPIRY_HOURS must be positive");
        }
        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "environment={} http_port={} log_level={} database={} jwt_expiry_hours={}",
            self.environment,
            self.http_port,
            self.log_level,
            self.database_url.to_connection_string(),
            self.jwt_expiry_hours,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}

/// Parse comma-separated CORS origins
fn parse_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parses_with_fallback() {
        assert_eq!(LogLevel::from_str_or_default("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("nonsense"), LogLevel::Info);
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!(
            Environment::from_str_or_default("prod"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("test"),
            Environment::Testing
        );
        assert_eq!(Environment::from_str_or_default(""), Environment::Development);
    }

    #[test]
    fn database_url_parses_memory_and_file() {
        assert_eq!(
            DatabaseUrl::parse_url("sqlite::memory:").ok(),
            Some(DatabaseUrl::Memory)
        );
        let file = DatabaseUrl::parse_url("sqlite:data/admin.db").ok();
        assert_eq!(
            file,
            Some(DatabaseUrl::SQLite {
                path: PathBuf::from("data/admin.db")
            })
        );
        assert!(DatabaseUrl::parse_url("postgres://x").is_err());
    }

    #[test]
    fn production_requires_jwt_secret() {
        let config = ServerConfig {
            http_port: 3001,
            environment: Environment::Production,
            log_level: LogLevel::Info,
            database_url: DatabaseUrl::Memory,
            jwt_secret: None,
            jwt_expiry_hours: 24,
            cors_origins: vec!["*".into()],
            rate_limit_window_secs: 900,
            rate_limit_max: 100,
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            jwt_secret: Some("secret".into()),
            ..config
        };
        assert!(config.validate().is_ok());
    }
}
