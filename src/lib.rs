// ABOUTME: Main library entry point for the Consentry OAuth2 authorization server
// ABOUTME: Wires protocol handlers, grant engine, and consent delegation modules together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

#![deny(unsafe_code)]

//! # Consentry
//!
//! An OAuth2 authorization server that issues, validates, and revokes access
//! tokens on behalf of resource owners and clients. Consentry does not own a
//! login UI: the human approval step is delegated to an external consent
//! authority through signed, time-bounded challenge and response tokens.
//!
//! ## Architecture
//!
//! - **Routes**: thin axum handlers for `/oauth2/auth` and `/oauth2/token`
//! - **Grant engine**: client validation, authorization codes, JWT access
//!   tokens, behind the [`oauth2::OAuth2Provider`] trait so any conforming
//!   engine can be substituted
//! - **Consent delegation**: stateless challenge issuance and consent-response
//!   validation ([`consent::ConsentStrategy`])
//! - **Error translation**: RFC6749-normalized errors routed over the channel
//!   the requester's trust level permits ([`oauth2::translate`])
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use consentry::config::environment::ServerConfig;
//! use consentry::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("consentry configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Configuration management (environment-only)
pub mod config;

/// Consent delegation protocol: challenge issuance and response validation
pub mod consent;

/// Unified error handling for non-protocol failures
pub mod errors;

/// Production logging setup
pub mod logging;

/// OAuth2 protocol types, grant engine, and error translation
pub mod oauth2;

/// HTTP routes for the protocol endpoints
pub mod routes;

/// Per-request session model carried through grant processing
pub mod session;
