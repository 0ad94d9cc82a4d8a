// ABOUTME: Consent delegation protocol boundary and failure taxonomy
// ABOUTME: Bridges the authorization flow to an external, untrusted consent authority
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Consent delegation
//!
//! The consent authority authenticates the resource owner and records their
//! approval; this server only hands it a signed challenge and validates the
//! signed response. Nothing the authority returns is trusted until signature,
//! freshness, and binding checks all pass.
//!
//! `ConsentError` detail is for logs only. At the handler boundary every
//! variant collapses into a single `access_denied`, so a caller probing the
//! consent mechanism cannot distinguish "expired" from "forged" from "bound
//! to a different request".

use thiserror::Error;

use crate::oauth2::models::AuthorizeRequest;
use crate::session::Session;

/// Signed challenge/response strategy
pub mod strategy;

pub use strategy::{ChallengeClaims, ConsentResponseClaims, JwtConsentStrategy};

/// Internal consent-validation failure detail
#[derive(Debug, Error)]
pub enum ConsentError {
    /// The token is malformed or its signature does not verify
    #[error("consent token rejected: {0}")]
    Signature(jsonwebtoken::errors::Error),

    /// The token is expired or outside the freshness window
    #[error("consent token outside its freshness window")]
    Expired,

    /// The token is not bound to the presenting authorization request
    #[error("consent token binding mismatch: {0}")]
    Binding(&'static str),

    /// The token asserts approval for scopes that were never requested
    #[error("consent token approves scopes beyond the original request")]
    ScopeEscalation,

    /// A required claim is missing or empty
    #[error("consent token is missing the {0} claim")]
    MissingClaim(&'static str),

    /// The challenge could not be signed
    #[error("challenge issuance failed: {0}")]
    Mint(jsonwebtoken::errors::Error),
}

/// Challenge issuance and consent-response validation
pub trait ConsentStrategy: Send + Sync {
    /// Mint a challenge token binding the exact authorize request and the
    /// URL the consent authority must send the user agent back to.
    ///
    /// # Errors
    /// Returns an error when the challenge cannot be signed.
    fn issue_challenge(
        &self,
        request: &AuthorizeRequest,
        return_url: &str,
    ) -> Result<String, ConsentError>;

    /// Validate a consent response against the presenting request: signature,
    /// freshness window, anti-CSRF binding, and scope containment. Produces a
    /// populated [`Session`] only when every check passes; failures never
    /// yield a partial session.
    ///
    /// # Errors
    /// Returns the failure detail for internal logging; callers must collapse
    /// it to a generic access-denied signal before anything reaches a client.
    fn validate_response(
        &self,
        request: &AuthorizeRequest,
        consent_token: &str,
    ) -> Result<Session, ConsentError>;
}
