// ABOUTME: Salted one-way password hashing and verification via bcrypt
// ABOUTME: Verification never errors - malformed digests simply fail to match
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # Password Hashing
//!
//! Thin wrappers over bcrypt. The work factor is `bcrypt::DEFAULT_COST`
//! (12 rounds), comfortably above the 10-round floor stored hashes were
//! created with. Handlers run [`verify_password`] under
//! `tokio::task::spawn_blocking` so the hash work never stalls the
//! async executor.

use anyhow::Result;

/// Hash a plaintext password with a fresh salt
///
/// # Errors
/// Returns an error only if bcrypt itself fails, which does not happen
/// for ordinary UTF-8 input.
pub fn hash_password(plaintext: &str) -> Result<String> {
    Ok(bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)?)
}

/// Verify a plaintext password against a stored digest.
///
/// Returns `false` rather than erroring on a malformed digest; a broken
/// stored hash must read as "does not match", never as a server fault.
#[must_use]
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}

/// Async wrapper that moves verification onto the blocking thread pool
///
/// # Errors
/// Returns an error if the blocking task is cancelled or panics.
pub async fn verify_password_blocking(plaintext: String, digest: String) -> Result<bool> {
    let matched =
        tokio::task::spawn_blocking(move || verify_password(&plaintext, &digest)).await?;
    Ok(matched)
}

/// Async wrapper for hashing on the blocking thread pool
///
/// # Errors
/// Returns an error if hashing fails or the blocking task is cancelled.
pub async fn hash_password_blocking(plaintext: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext)).await?
}
