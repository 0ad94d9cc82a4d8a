// ABOUTME: Production logging setup built on tracing-subscriber
// ABOUTME: Honors RUST_LOG, defaulting to info-level output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Structured logging initialization

use tracing_subscriber::EnvFilter;

use crate::errors::{AppError, AppResult};

/// Initialize the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise `info`.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init() -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| AppError::internal(format!("failed to install tracing subscriber: {e}")))
}
