// ABOUTME: Shared test utilities for Consentry integration tests
// ABOUTME: Router assembly, consent-token minting, and HTTP helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code, missing_docs)]

//! Shared test utilities
//!
//! Tests exercise the assembled router in-process through
//! `tower::ServiceExt::oneshot`; no sockets are opened.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::ServiceExt;
use url::Url;

use consentry::config::environment::TokenConfig;
use consentry::consent::{ConsentStrategy, JwtConsentStrategy};
use consentry::oauth2::{ClientRegistry, GrantEngine, OAuth2Provider};
use consentry::routes::{OAuth2Context, OAuth2Routes};

pub const CHALLENGE_SECRET: &str = "challenge-secret-0123456789abcdef";
pub const CONSENT_SECRET: &str = "consent-secret-0123456789abcdefgh";
pub const SIGNING_SECRET: &str = "signing-secret-0123456789abcdefgh";

pub const ISSUER: &str = "https://auth.example";
pub const CONSENT_URL: &str = "https://consent.example/accept";
pub const CLIENT_REDIRECT: &str = "https://app1.example/cb";

pub const CHALLENGE_TTL_SECS: i64 = 300;
pub const RESPONSE_WINDOW_SECS: i64 = 10;

pub fn token_config() -> TokenConfig {
    TokenConfig {
        issuer: ISSUER.to_owned(),
        signing_secret: SIGNING_SECRET.to_owned(),
        access_token_ttl_secs: 3600,
        auth_code_ttl_secs: 600,
        refresh_token_ttl_secs: 2_592_000,
    }
}

/// Registry with one confidential client, `app1`.
pub fn test_registry() -> Arc<ClientRegistry> {
    let registry = ClientRegistry::from_json(
        r#"[{
            "client_id": "app1",
            "client_secret": "app1-secret",
            "redirect_uris": ["https://app1.example/cb"],
            "grant_types": ["authorization_code", "implicit", "client_credentials", "refresh_token"],
            "response_types": ["code", "token"],
            "scopes": ["core", "profile"]
        }]"#,
    )
    .unwrap();
    Arc::new(registry)
}

/// Assembled router over the built-in engine and JWT consent strategy.
pub fn test_router() -> Router {
    let provider: Arc<dyn OAuth2Provider> =
        Arc::new(GrantEngine::new(test_registry(), token_config()));
    let consent: Arc<dyn ConsentStrategy> = Arc::new(JwtConsentStrategy::new(
        CHALLENGE_SECRET.as_bytes(),
        CONSENT_SECRET.as_bytes(),
        CHALLENGE_TTL_SECS,
        RESPONSE_WINDOW_SECS,
    ));

    OAuth2Routes::routes(OAuth2Context {
        provider,
        consent,
        consent_url: Url::parse(CONSENT_URL).unwrap(),
        public_url: Url::parse(ISSUER).unwrap(),
        issuer: ISSUER.to_owned(),
    })
}

/// Mint a consent-response token the way the external authority would.
pub fn mint_consent_token(
    subject: &str,
    client_id: &str,
    csrf: &str,
    scopes: &[&str],
    iat: i64,
    exp: i64,
) -> String {
    let claims = serde_json::json!({
        "jti": "challenge-1",
        "sub": subject,
        "aud": client_id,
        "iat": iat,
        "exp": exp,
        "scp": scopes,
        "csrf": csrf,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(CONSENT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Same claims, signed with a key the server does not trust.
pub fn mint_forged_consent_token(
    subject: &str,
    client_id: &str,
    csrf: &str,
    scopes: &[&str],
    iat: i64,
    exp: i64,
) -> String {
    let claims = serde_json::json!({
        "jti": "challenge-1",
        "sub": subject,
        "aud": client_id,
        "iat": iat,
        "exp": exp,
        "scp": scopes,
        "csrf": csrf,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"attacker-key-0123456789abcdefghi"),
    )
    .unwrap()
}

/// `/oauth2/auth` URI with the given query parameters encoded.
pub fn authorize_uri(params: &[(&str, &str)]) -> String {
    format!(
        "/oauth2/auth?{}",
        serde_urlencoded::to_string(params).unwrap()
    )
}

/// Decode a JWT minted by the server, skipping audience validation.
pub fn decode_claims<T: serde::de::DeserializeOwned>(token: &str, secret: &str) -> T {
    let mut validation = jsonwebtoken::Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    jsonwebtoken::decode::<T>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .unwrap()
    .claims
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn form_request(uri: &str, params: &[(&str, &str)]) -> Request<Body> {
    let body = serde_urlencoded::to_string(params).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// The `Location` header of a redirect, parsed.
pub fn location_url(response: &Response) -> Url {
    let raw = response
        .headers()
        .get(header::LOCATION)
        .expect("response carries no Location header")
        .to_str()
        .unwrap();
    Url::parse(raw).unwrap()
}

pub fn query_map(url: &Url) -> HashMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
