// ABOUTME: TOTP engine for two-factor enrollment and verification
// ABOUTME: Generates base32 secrets with provisioning QR codes, verifies codes in a clock-skew window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # TOTP Engine
//!
//! RFC 6238 time-based one-time passwords: 6 digits, 30-second step,
//! SHA-1 (the authenticator-app default). Secrets are 160-bit values
//! rendered as base32 plus an `otpauth://totp/...` provisioning URI and
//! a scannable QR image.
//!
//! Verification checks the submitted code against every counter in
//! `[current - window, current + window]` to absorb clock drift, and
//! compares each candidate with a constant-structure comparison. Nothing
//! here touches the network or the store.

use anyhow::{anyhow, Result};
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use totp_rs::{Algorithm, Secret, TOTP};

/// Code length presented by authenticator apps
pub const DIGITS: usize = 6;
/// Time step in seconds, UNIX epoch origin
pub const STEP_SECONDS: u64 = 30;
/// Accepted clock-skew tolerance in steps on either side
pub const DEFAULT_WINDOW_STEPS: u64 = 2;

/// Issuer label shown in authenticator apps
const ISSUER: &str = "Comet Admin";

/// A freshly generated secret awaiting confirmation. Held by the caller
/// only; nothing is persisted until the paired code is verified.
#[derive(Debug, Clone)]
pub struct PendingSecret {
    /// Base32-encoded shared secret (160 bits)
    pub secret: String,
    /// Standard `otpauth://totp/...` provisioning URI
    pub otpauth_url: String,
    /// QR rendering of the URI, base64-encoded PNG
    pub qr_png_base64: String,
}

fn build_totp(secret_b32: &str, account: &str) -> Result<TOTP> {
    let secret_bytes = Secret::Encoded(secret_b32.to_owned())
        .to_bytes()
        .map_err(|e| anyhow!("invalid base32 TOTP secret: {e:?}"))?;

    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        1,
        STEP_SECONDS,
        secret_bytes,
        Some(ISSUER.to_owned()),
        account.to_owned(),
    )
    .map_err(|e| anyhow!("TOTP construction failed: {e}"))
}

/// Generate a new random secret and its provisioning material for the
/// given account label. Pure generation; persists nothing.
///
/// # Errors
/// Returns an error if QR rendering fails.
pub fn generate_secret(account: &str) -> Result<PendingSecret> {
    let secret = Secret::generate_secret().to_encoded().to_string();
    let totp = build_totp(&secret, account)?;

    let otpauth_url = totp.get_url();
    let qr_png_base64 = totp
        .get_qr_base64()
        .map_err(|e| anyhow!("QR code generation failed: {e}"))?;

    Ok(PendingSecret {
        secret,
        otpauth_url,
        qr_png_base64,
    })
}

/// Code valid at an explicit UNIX timestamp. Used by the verifier and by
/// tests that need determinism.
///
/// # Errors
/// Returns an error if the secret is not valid base32.
pub fn code_at(secret_b32: &str, timestamp: u64) -> Result<String> {
    let totp = build_totp(secret_b32, "")?;
    Ok(totp.generate(timestamp))
}

/// Verify a submitted code against a secret at an explicit timestamp,
/// accepting any counter within `window_steps` of the current one.
///
/// Every candidate is compared with `subtle::ConstantTimeEq`; all
/// candidates are evaluated even after a match.
///
/// # Errors
/// Returns an error if the secret is not valid base32.
pub fn verify_at(
    secret_b32: &str,
    submitted_code: &str,
    window_steps: u64,
    timestamp: u64,
) -> Result<bool> {
    if submitted_code.len() != DIGITS || !submitted_code.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(false);
    }

    let totp = build_totp(secret_b32, "")?;
    let current_step = timestamp / STEP_SECONDS;

    let mut matched = false;
    let first = current_step.saturating_sub(window_steps);
    for step in first..=current_step + window_steps {
        let candidate = totp.generate(step * STEP_SECONDS);
        matched |= bool::from(candidate.as_bytes().ct_eq(submitted_code.as_bytes()));
    }
    Ok(matched)
}

/// Verify a submitted code against the current system time
///
/// # Errors
/// Returns an error if the secret is not valid base32 or the system
/// clock is before the UNIX epoch.
pub fn verify(secret_b32: &str, submitted_code: &str, window_steps: u64) -> Result<bool> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow!("system clock before UNIX epoch: {e}"))?
        .as_secs();
    verify_at(secret_b32, submitted_code, window_steps, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";
    const T0: u64 = 1_700_000_010;

    #[test]
    fn test_window_acceptance() {
        let code = code_at(SECRET, T0).unwrap();
        // same step and every step within +/-2
        for offset in [-2i64, -1, 0, 1, 2] {
            let t = T0.wrapping_add_signed(offset * STEP_SECONDS as i64);
            let shifted = code_at(SECRET, t).unwrap();
            assert!(
                verify_at(SECRET, &shifted, DEFAULT_WINDOW_STEPS, T0).unwrap(),
                "code at offset {offset} should verify"
            );
        }
        assert!(verify_at(SECRET, &code, 0, T0).unwrap());
    }

    #[test]
    fn test_window_rejection_beyond_skew() {
        for offset in [-3i64, 3, -10, 10] {
            let t = T0.wrapping_add_signed(offset * STEP_SECONDS as i64);
            let shifted = code_at(SECRET, t).unwrap();
            // Step collisions across distant counters are possible in
            // principle but do not occur for this fixed secret/time.
            assert!(
                !verify_at(SECRET, &shifted, DEFAULT_WINDOW_STEPS, T0).unwrap(),
                "code at offset {offset} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_malformed_codes() {
        assert!(!verify_at(SECRET, "12345", 2, T0).unwrap());
        assert!(!verify_at(SECRET, "1234567", 2, T0).unwrap());
        assert!(!verify_at(SECRET, "12a456", 2, T0).unwrap());
        assert!(!verify_at(SECRET, "", 2, T0).unwrap());
    }

    #[test]
    fn test_generated_secret_shape() {
        let pending = generate_secret("alice").unwrap();
        // 160-bit secret -> 32 base32 chars
        assert!(pending.secret.len() >= 32);
        assert!(pending
            .secret
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b)));
        assert!(pending.otpauth_url.starts_with("otpauth://totp/"));
        assert!(pending.otpauth_url.contains("Comet%20Admin"));
        assert!(!pending.qr_png_base64.is_empty());
    }

    #[test]
    fn test_invalid_secret_errors() {
        assert!(verify_at("not base32 !!!", "123456", 2, T0).is_err());
    }
}
