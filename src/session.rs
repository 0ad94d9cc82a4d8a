// ABOUTME: Per-request session model carried through grant processing
// ABOUTME: Pure data container; constructed fresh for every handler invocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Session model
//!
//! A [`Session`] is the mutable claims container attached to a request for the
//! duration of grant processing. It is owned exclusively by the handling
//! request and discarded when the response is written; concurrent requests
//! never share one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ID-token claims accumulated while processing a grant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Resource-owner subject identifier
    #[serde(default)]
    pub subject: String,
    /// Token issuer
    #[serde(default)]
    pub issuer: String,
    /// Intended audience (the client identifier)
    #[serde(default)]
    pub audience: String,
    /// When the resource owner last authenticated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<DateTime<Utc>>,
    /// Additional claims asserted by the consent authority
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Header metadata attached to tokens minted for this session
#[derive(Debug, Clone, Default)]
pub struct TokenHeaders {
    /// Extra header fields for the signing strategy
    pub extra: HashMap<String, String>,
}

/// Authentication context consumed by the signing strategy
#[derive(Debug, Clone, Default)]
pub struct AuthenticationContext {
    /// Scopes the resource owner (or client) actually granted
    pub granted_scopes: Vec<String>,
    /// When the approval was recorded
    pub authenticated_at: Option<DateTime<Utc>>,
}

/// Mutable claims container for a single request
///
/// `subject` must be set before response issuance. For the
/// `client_credentials` grant the token handler sets it to the authenticated
/// client's identifier, since no resource owner exists for that grant.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Resource-owner (or client) subject identifier
    pub subject: String,
    /// ID-token claims
    pub claims: IdTokenClaims,
    /// Token header metadata
    pub headers: TokenHeaders,
    /// Internal authentication context
    pub auth: AuthenticationContext,
}

impl Session {
    /// Fresh, empty session. One per request; never reused.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session pre-populated with a subject, as produced by consent validation.
    #[must_use]
    pub fn for_subject(subject: impl Into<String>) -> Self {
        let subject = subject.into();
        Self {
            claims: IdTokenClaims {
                subject: subject.clone(),
                ..IdTokenClaims::default()
            },
            subject,
            ..Self::default()
        }
    }
}
