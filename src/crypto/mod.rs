// ABOUTME: Credential cryptography module organization
// ABOUTME: Password hashing and TOTP second-factor primitives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! Credential cryptography: one-way password hashing and the TOTP engine.

/// Salted one-way password hashing (bcrypt)
pub mod password;
/// Time-based one-time password generation and verification
pub mod totp;
