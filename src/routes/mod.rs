// ABOUTME: Route module organization for Consentry HTTP endpoints
// ABOUTME: Protocol endpoints plus core infrastructure routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Route modules
//!
//! Each module contains route definitions and thin handler functions that
//! delegate protocol work to the grant engine and the consent strategy.

/// Health check routes
pub mod health;

/// OAuth2 protocol endpoint routes
pub mod oauth2;

pub use health::HealthRoutes;
pub use oauth2::{OAuth2Context, OAuth2Routes};
