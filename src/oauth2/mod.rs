// ABOUTME: OAuth2 protocol module organization
// ABOUTME: Models, provider boundary, grant engine, client registry, error translation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! OAuth2 protocol core
//!
//! - [`models`]: request/response DTOs and the RFC6749 error vocabulary
//! - [`provider`]: the [`OAuth2Provider`] trait, the grant-engine boundary
//! - [`engine`]: the built-in [`GrantEngine`] implementation
//! - [`clients`]: registered clients and the read-only registry
//! - [`translate`]: the redirect-vs-direct error channel decision

/// Registered clients and the read-only registry
pub mod clients;

/// Built-in grant engine
pub mod engine;

/// Protocol request/response models and RFC6749 errors
pub mod models;

/// Grant-engine trait boundary
pub mod provider;

/// Error-channel decision and response rendering
pub mod translate;

pub use clients::{Client, ClientRegistry};
pub use engine::GrantEngine;
pub use models::{
    AccessRequest, AuthorizeFailure, AuthorizeRequest, AuthorizeResponse, OAuth2Error,
    TokenResponse,
};
pub use provider::OAuth2Provider;
