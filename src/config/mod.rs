// ABOUTME: Configuration module organization for server settings
// ABOUTME: Environment-variable driven configuration lives in the environment submodule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

pub mod environment;

pub use environment::{DatabaseUrl, Environment, LogLevel, ServerConfig};
