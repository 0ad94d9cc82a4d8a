// ABOUTME: Application-level error types for startup and operational failures
// ABOUTME: Protocol-visible OAuth2 errors live in oauth2::models, not here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Unified error handling for non-protocol failures
//!
//! Everything a client can observe goes through the RFC6749 vocabulary in
//! [`crate::oauth2::models::OAuth2Error`]. `AppError` covers the rest:
//! configuration loading, client-seed parsing, and server startup.

use thiserror::Error;

/// Result alias used throughout startup and configuration code
pub type AppResult<T> = Result<T, AppError>;

/// Non-protocol application error
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The client seed file could not be read or parsed
    #[error("client seed error: {0}")]
    ClientSeed(String),

    /// Filesystem or network I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Anything else that should abort the current operation
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Construct a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Construct a client-seed error
    pub fn client_seed(message: impl Into<String>) -> Self {
        Self::ClientSeed(message.into())
    }

    /// Construct an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
