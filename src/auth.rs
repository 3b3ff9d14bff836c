// ABOUTME: JWT session token issuance and validation for admin authentication
// ABOUTME: HS256 symmetric signing with typed BadSignature/Expired/Malformed errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # Session Tokens
//!
//! Stateless, signed session tokens carrying admin identity and role.
//! The signing secret and lifetime are injected at construction; nothing
//! in this module reads the environment.
//!
//! There is no server-side revocation: a token stays valid until its
//! expiry passes, and rotating the signing secret is the only way to
//! invalidate outstanding tokens early. This is a documented limitation,
//! not an oversight.

use crate::models::{Admin, AdminRole};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default session lifetime in hours
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Token validation error with the reason a verifier cares about.
/// All variants collapse to an unauthorized response at the API boundary.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    /// Signature did not verify against the server secret
    #[error("token signature is invalid: {reason}")]
    BadSignature { reason: String },
    /// Expiry timestamp has passed
    #[error("token expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },
    /// Not a well-formed token at all
    #[error("token is malformed: {details}")]
    Malformed { details: String },
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin id, stringified per JWT convention
    pub sub: String,
    /// Admin username
    pub username: String,
    /// Admin role
    pub role: AdminRole,
    /// Issued-at (UNIX seconds)
    pub iat: i64,
    /// Expiry (UNIX seconds)
    pub exp: i64,
}

impl Claims {
    /// Admin id parsed back out of the subject
    ///
    /// # Errors
    /// Returns [`TokenError::Malformed`] if the subject is not a numeric id.
    pub fn admin_id(&self) -> Result<i64, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Malformed {
            details: format!("non-numeric subject: {}", self.sub),
        })
    }
}

/// Token issuer/verifier holding the injected signing material
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_hours: i64,
}

impl AuthManager {
    /// Create a manager from the configured signing secret and lifetime
    #[must_use]
    pub fn new(signing_secret: &[u8], token_ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_secret),
            decoding_key: DecodingKey::from_secret(signing_secret),
            token_ttl_hours,
        }
    }

    /// Configured token lifetime in hours
    #[must_use]
    pub const fn token_ttl_hours(&self) -> i64 {
        self.token_ttl_hours
    }

    /// Mint a signed session token for an admin
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails.
    pub fn issue_token(&self, admin: &Admin) -> Result<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_ttl_hours);

        let claims = Claims {
            sub: admin.id.to_string(),
            username: admin.username.clone(),
            role: admin.role,
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token's signature and expiry, returning its claims.
    ///
    /// Pure function of token + current time + key; no storage access.
    ///
    /// # Errors
    /// Returns [`TokenError::BadSignature`], [`TokenError::Expired`], or
    /// [`TokenError::Malformed`].
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        // Decode without expiry validation first so an expired token is
        // reported as Expired rather than a generic decode failure.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| Self::convert_jwt_error(&e))?;

        let claims = data.claims;
        let now = Utc::now().timestamp();
        if now > claims.exp {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
            tracing::debug!(sub = %claims.sub, %expired_at, "rejected expired token");
            return Err(TokenError::Expired { expired_at });
        }

        Ok(claims)
    }

    /// Map jsonwebtoken's error kinds onto the typed taxonomy
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> TokenError {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature {
                reason: "signature verification failed".into(),
            },
            ErrorKind::ExpiredSignature => TokenError::Expired {
                expired_at: Utc::now(),
            },
            ErrorKind::InvalidToken => TokenError::Malformed {
                details: "not a valid token format".into(),
            },
            ErrorKind::Base64(err) => TokenError::Malformed {
                details: format!("invalid base64: {err}"),
            },
            ErrorKind::Json(err) => TokenError::Malformed {
                details: format!("invalid claims JSON: {err}"),
            },
            ErrorKind::Utf8(err) => TokenError::Malformed {
                details: format!("invalid UTF-8: {err}"),
            },
            _ => TokenError::BadSignature {
                reason: e.to_string(),
            },
        }
    }
}

/// Generate a random signing secret for development runs.
///
/// Production deployments must supply `JWT_SECRET` instead; see
/// [`crate::config::environment::ServerConfig`].
#[must_use]
pub fn generate_signing_secret() -> String {
    use rand::{distributions::Alphanumeric, Rng};

    // 64 alphanumeric chars ~ 380 bits
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
