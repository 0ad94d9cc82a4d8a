// ABOUTME: Grant-engine trait boundary consumed by the protocol handlers
// ABOUTME: Any engine satisfying this capability set is substitutable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Grant-engine boundary
//!
//! The endpoint handlers depend only on this capability set, never on a
//! concrete engine. [`crate::oauth2::GrantEngine`] is the built-in
//! implementation; deployments with their own token storage or signing
//! strategy swap in another one.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::oauth2::models::{
    AccessRequest, AuthorizeFailure, AuthorizeRequest, AuthorizeResponse, OAuth2Error,
    TokenResponse,
};
use crate::session::Session;

/// Grant-type parsing, validation, and token issuance
#[async_trait]
pub trait OAuth2Provider: Send + Sync {
    /// Parse and validate an incoming authorize request.
    ///
    /// The redirect URI must be checked against the client's registration
    /// here; a request is only returned (in `Ok` or inside the failure) once
    /// that check passed, so redirect-based error reporting stays safe.
    ///
    /// # Errors
    /// Returns an [`AuthorizeFailure`] carrying the partial request when
    /// parsing got past redirect validation, and no request otherwise.
    async fn parse_authorize_request(
        &self,
        form: &HashMap<String, String>,
    ) -> Result<AuthorizeRequest, AuthorizeFailure>;

    /// Parse and validate an incoming token request, authenticating the
    /// client and consuming the presented grant. Restores the resource-owner
    /// subject into `session` for grants that carry one.
    ///
    /// # Errors
    /// Returns an RFC6749 error for authentication, validation, or grant
    /// consumption failures.
    async fn parse_access_request(
        &self,
        form: &HashMap<String, String>,
        session: &mut Session,
    ) -> Result<AccessRequest, OAuth2Error>;

    /// Produce the authorize response (code or implicit token) for a request
    /// whose consent has been proven.
    ///
    /// # Errors
    /// Returns an error when the session carries no subject or signing fails.
    async fn issue_authorize_response(
        &self,
        request: &AuthorizeRequest,
        session: &Session,
    ) -> Result<AuthorizeResponse, OAuth2Error>;

    /// Produce the access response for a validated token request.
    ///
    /// # Errors
    /// Returns an error when the session carries no subject or signing fails.
    async fn issue_access_response(
        &self,
        request: &AccessRequest,
        session: &Session,
    ) -> Result<TokenResponse, OAuth2Error>;
}
