// ABOUTME: OAuth2 request/response models and the RFC6749 error vocabulary
// ABOUTME: Implements RFC 6749 request parsing targets and error normalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Protocol data models
//!
//! Parsed request representations are created per request by the grant
//! engine, consumed by the endpoint handlers, and discarded at response time.

use std::collections::HashMap;

use serde::Serialize;

/// Error names this server is allowed to expose to clients (RFC 6749 §4.1.2.1,
/// §4.2.2.1, §5.2). Anything outside this vocabulary collapses to
/// `server_error` before it reaches a URL or body.
const RFC6749_ERRORS: &[&str] = &[
    "invalid_request",
    "invalid_client",
    "invalid_grant",
    "unauthorized_client",
    "access_denied",
    "unsupported_response_type",
    "unsupported_grant_type",
    "invalid_scope",
    "server_error",
    "temporarily_unavailable",
];

/// Parsed representation of an incoming `/oauth2/auth` request
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    /// Requesting client identifier
    pub client_id: String,
    /// Redirect URI the client asked for
    pub redirect_uri: String,
    /// Whether `redirect_uri` was validated against the client's registered
    /// URIs. Redirect-based error reporting to the client is forbidden until
    /// this is true.
    pub redirect_uri_valid: bool,
    /// Requested response type (`code` or `token`)
    pub response_type: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Client CSRF state, echoed back on every redirect
    pub state: Option<String>,
    /// Raw request form, including the optional consent proof
    pub form: HashMap<String, String>,
}

impl AuthorizeRequest {
    /// The signed consent token carried by the request, if any.
    #[must_use]
    pub fn consent_proof(&self) -> Option<&str> {
        self.form
            .get("consent")
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// A rejected authorize request, paired with whatever was parsed before the
/// rejection so the error translator can judge redirect-URI validity.
#[derive(Debug)]
pub struct AuthorizeFailure {
    /// Partial request, present when parsing got past redirect validation
    pub request: Option<AuthorizeRequest>,
    /// The protocol error to report
    pub error: OAuth2Error,
}

impl AuthorizeFailure {
    /// Failure with no usable request context.
    #[must_use]
    pub fn bare(error: OAuth2Error) -> Self {
        Self {
            request: None,
            error,
        }
    }

    /// Failure for a request whose redirect URI already validated.
    #[must_use]
    pub fn with_request(request: AuthorizeRequest, error: OAuth2Error) -> Self {
        Self {
            request: Some(request),
            error,
        }
    }
}

impl From<OAuth2Error> for AuthorizeFailure {
    fn from(error: OAuth2Error) -> Self {
        Self::bare(error)
    }
}

/// Parsed representation of an incoming `/oauth2/token` request
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// Grant type (`authorization_code`, `client_credentials`, `refresh_token`)
    pub grant_type: String,
    /// Authenticated client identifier
    pub client_id: String,
    /// Authorization code, for the `authorization_code` grant
    pub code: Option<String>,
    /// Refresh token presented with the `refresh_token` grant
    pub refresh_token: Option<String>,
    /// Redirect URI the code was bound to
    pub redirect_uri: Option<String>,
    /// Scopes the issued token will carry
    pub scopes: Vec<String>,
}

/// Successful authorize response, shaped by the requested response type
#[derive(Debug)]
pub enum AuthorizeResponse {
    /// `response_type=code`: an authorization code delivered via query
    Code {
        /// Single-use authorization code
        code: String,
        /// Client state echoed back
        state: Option<String>,
    },
    /// `response_type=token`: an access token delivered via URI fragment
    Token {
        /// The issued token
        token: TokenResponse,
        /// Client state echoed back
        state: Option<String>,
    },
}

/// Access token response per RFC 6749 §5.1
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// The issued access token
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Refresh token, when the grant type yields one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Granted scopes, space-separated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// RFC 6749 error response
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{error}")]
pub struct OAuth2Error {
    /// Error code from the RFC 6749 vocabulary
    pub error: String,
    /// Human-readable description; never internal detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Pointer into the RFC for this error class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
    /// HTTP status for direct (non-redirect) delivery
    #[serde(skip)]
    pub status: u16,
}

impl OAuth2Error {
    fn new(error: &str, description: &str, section: &str, status: u16) -> Self {
        Self {
            error: error.to_owned(),
            error_description: Some(description.to_owned()),
            error_uri: Some(format!(
                "https://datatracker.ietf.org/doc/html/rfc6749#section-{section}"
            )),
            status,
        }
    }

    /// The request is missing a parameter or is otherwise malformed.
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self::new("invalid_request", description, "4.1.2.1", 400)
    }

    /// Client authentication failed or the client is unknown.
    #[must_use]
    pub fn invalid_client() -> Self {
        Self::new("invalid_client", "Client authentication failed", "5.2", 401)
    }

    /// The presented grant (code, refresh token) is invalid or consumed.
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self::new("invalid_grant", description, "5.2", 400)
    }

    /// The client may not use this grant or response type.
    #[must_use]
    pub fn unauthorized_client() -> Self {
        Self::new(
            "unauthorized_client",
            "The client is not authorized to use this method",
            "4.1.2.1",
            400,
        )
    }

    /// The resource owner or the server denied the request. The description
    /// is fixed so consent failures stay indistinguishable from each other.
    #[must_use]
    pub fn access_denied() -> Self {
        Self::new(
            "access_denied",
            "The resource owner or authorization server denied the request",
            "4.1.2.1",
            403,
        )
    }

    /// The requested response type is not supported.
    #[must_use]
    pub fn unsupported_response_type() -> Self {
        Self::new(
            "unsupported_response_type",
            "The authorization server does not support this response type",
            "4.1.2.1",
            400,
        )
    }

    /// The requested grant type is not supported.
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self::new(
            "unsupported_grant_type",
            "The authorization server does not support this grant type",
            "5.2",
            400,
        )
    }

    /// The requested scope exceeds what the client may ask for.
    #[must_use]
    pub fn invalid_scope(description: &str) -> Self {
        Self::new("invalid_scope", description, "4.1.2.1", 400)
    }

    /// Unexpected internal failure. Carries no internal detail.
    #[must_use]
    pub fn server_error() -> Self {
        Self::new(
            "server_error",
            "The authorization server encountered an unexpected condition",
            "4.1.2.1",
            500,
        )
    }

    /// Normalize to the RFC 6749 vocabulary. Unknown names collapse to
    /// `server_error` so raw internal error text is never exposed.
    #[must_use]
    pub fn normalized(&self) -> Self {
        if RFC6749_ERRORS.contains(&self.error.as_str()) {
            self.clone()
        } else {
            Self::server_error()
        }
    }

    /// Description with a fallback for the pathological empty case.
    #[must_use]
    pub fn description(&self) -> &str {
        self.error_description
            .as_deref()
            .unwrap_or("The request could not be processed")
    }
}
