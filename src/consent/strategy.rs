// ABOUTME: Stateless JWT challenge/response strategy for consent delegation
// ABOUTME: All consent state lives inside the signed tokens; no server-side session store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Signed consent tokens
//!
//! The challenge embeds everything the round trip needs: the requesting
//! client, the requested scopes, the client's CSRF state, and the URL to
//! return to. The consent authority echoes the binding claims back in its
//! response token, so validation needs no server-side lookup and any engine
//! instance can validate a response minted against another instance's
//! challenge.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::environment::ConsentConfig;
use crate::consent::{ConsentError, ConsentStrategy};
use crate::oauth2::models::AuthorizeRequest;
use crate::session::Session;

/// Claims inside an issued challenge token
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeClaims {
    /// Challenge identifier
    pub jti: String,
    /// Requesting client
    pub aud: String,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
    /// Scopes the client asked for
    pub scp: Vec<String>,
    /// Anti-CSRF state from the authorize request
    pub csrf: String,
    /// Absolute URL of the originating authorize request
    pub redir: String,
}

/// Claims the consent authority must return after approval
#[derive(Debug, Serialize, Deserialize)]
pub struct ConsentResponseClaims {
    /// Echo of the challenge identifier
    pub jti: String,
    /// Resource-owner subject the authority authenticated
    pub sub: String,
    /// Requesting client, echoed from the challenge
    pub aud: String,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry; must stay within the freshness window of `iat`
    pub exp: i64,
    /// Scopes the resource owner approved
    pub scp: Vec<String>,
    /// Anti-CSRF state echoed from the challenge
    pub csrf: String,
}

/// HS256 challenge/response strategy
pub struct JwtConsentStrategy {
    challenge_key: EncodingKey,
    response_key: DecodingKey,
    challenge_ttl: Duration,
    max_response_age: Duration,
}

impl JwtConsentStrategy {
    /// Strategy over raw secrets and windows (seconds).
    #[must_use]
    pub fn new(
        challenge_secret: &[u8],
        response_secret: &[u8],
        challenge_ttl_secs: i64,
        max_response_age_secs: i64,
    ) -> Self {
        Self {
            challenge_key: EncodingKey::from_secret(challenge_secret),
            response_key: DecodingKey::from_secret(response_secret),
            challenge_ttl: Duration::seconds(challenge_ttl_secs),
            max_response_age: Duration::seconds(max_response_age_secs),
        }
    }

    /// Strategy from the consent section of the server configuration.
    #[must_use]
    pub fn from_config(config: &ConsentConfig) -> Self {
        Self::new(
            config.challenge_secret.as_bytes(),
            config.response_secret.as_bytes(),
            config.challenge_ttl_secs,
            config.max_response_age_secs,
        )
    }

    fn decode_response(&self, token: &str) -> Result<ConsentResponseClaims, ConsentError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        decode::<ConsentResponseClaims>(token, &self.response_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ConsentError::Expired,
                _ => ConsentError::Signature(e),
            })
    }
}

impl ConsentStrategy for JwtConsentStrategy {
    fn issue_challenge(
        &self,
        request: &AuthorizeRequest,
        return_url: &str,
    ) -> Result<String, ConsentError> {
        let now = Utc::now();
        let claims = ChallengeClaims {
            jti: Uuid::new_v4().to_string(),
            aud: request.client_id.clone(),
            iat: now.timestamp(),
            exp: (now + self.challenge_ttl).timestamp(),
            scp: request.scopes.clone(),
            csrf: request.state.clone().unwrap_or_default(),
            redir: return_url.to_owned(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.challenge_key)
            .map_err(ConsentError::Mint)
    }

    fn validate_response(
        &self,
        request: &AuthorizeRequest,
        consent_token: &str,
    ) -> Result<Session, ConsentError> {
        let claims = self.decode_response(consent_token)?;

        if claims.sub.is_empty() {
            return Err(ConsentError::MissingClaim("sub"));
        }
        if claims.jti.is_empty() {
            return Err(ConsentError::MissingClaim("jti"));
        }

        // Freshness: the response must have been minted within the window,
        // and must not claim a validity longer than the window.
        let now = Utc::now().timestamp();
        let window = self.max_response_age.num_seconds();
        if claims.iat > now {
            return Err(ConsentError::Expired);
        }
        if now - claims.iat > window {
            return Err(ConsentError::Expired);
        }
        if claims.exp - claims.iat > window {
            return Err(ConsentError::Expired);
        }

        // Binding to the presenting request.
        if claims.aud != request.client_id {
            return Err(ConsentError::Binding("client"));
        }
        if claims.csrf != request.state.clone().unwrap_or_default() {
            return Err(ConsentError::Binding("state"));
        }

        // The authority may narrow the grant, never widen it.
        if !claims.scp.iter().all(|s| request.scopes.contains(s)) {
            return Err(ConsentError::ScopeEscalation);
        }

        let mut session = Session::for_subject(claims.sub);
        session.claims.audience = claims.aud;
        session.auth.granted_scopes = claims.scp;
        session.auth.authenticated_at = DateTime::<Utc>::from_timestamp(claims.iat, 0);
        session.claims.auth_time = session.auth.authenticated_at;
        Ok(session)
    }
}
