// ABOUTME: Configuration module organization
// ABOUTME: Environment-only configuration, no config files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Configuration management
//!
//! Consentry is configured entirely through environment variables; see
//! [`environment::ServerConfig::from_env`] for the full list.

/// Environment-based server configuration
pub mod environment;

pub use environment::{ConsentConfig, ServerConfig, TokenConfig};
