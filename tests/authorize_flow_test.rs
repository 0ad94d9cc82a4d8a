// ABOUTME: Integration tests for the authorize endpoint and the consent round trip
// ABOUTME: Covers challenge hand-off, grant finalization, denial indistinguishability, and open-redirect prevention
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

//! Authorize endpoint tests
//!
//! The consent authority is simulated by minting response tokens with the
//! shared consent secret; a forged authority is simulated with a different
//! key.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::Utc;

use common::{
    authorize_uri, body_json, decode_claims, form_request, get_request, location_url,
    mint_consent_token, mint_forged_consent_token, query_map, send, test_router,
    CHALLENGE_SECRET, CLIENT_REDIRECT, CONSENT_URL, SIGNING_SECRET,
};
use consentry::consent::ChallengeClaims;
use consentry::oauth2::engine::AccessTokenClaims;

fn base_params<'a>() -> Vec<(&'a str, &'a str)> {
    vec![
        ("client_id", "app1"),
        ("redirect_uri", CLIENT_REDIRECT),
        ("response_type", "code"),
        ("scope", "core"),
        ("state", "xyz"),
    ]
}

#[tokio::test]
async fn authorize_without_consent_redirects_to_consent_authority() {
    let router = test_router();
    let response = send(&router, get_request(&authorize_uri(&base_params()))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = location_url(&response);
    assert!(location.as_str().starts_with(CONSENT_URL));

    let params = query_map(&location);
    let challenge = params.get("challenge").expect("challenge parameter missing");
    assert!(params.get("code").is_none());

    let claims: ChallengeClaims = decode_claims(challenge, CHALLENGE_SECRET);
    assert_eq!(claims.aud, "app1");
    assert_eq!(claims.scp, vec!["core"]);
    assert_eq!(claims.csrf, "xyz");
    assert!(claims.redir.starts_with("https://auth.example/oauth2/auth"));
    assert!(!claims.jti.is_empty());
}

#[tokio::test]
async fn post_authorize_is_handled_like_get() {
    let router = test_router();
    let response = send(&router, form_request("/oauth2/auth", &base_params())).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = location_url(&response);
    assert!(location.as_str().starts_with(CONSENT_URL));
    assert!(query_map(&location).contains_key("challenge"));
}

#[tokio::test]
async fn valid_consent_proof_yields_code_then_token() -> Result<()> {
    let router = test_router();
    let now = Utc::now().timestamp();
    let proof = mint_consent_token("user-42", "app1", "xyz", &["core"], now, now + 10);

    let mut params = base_params();
    params.push(("consent", proof.as_str()));
    let response = send(&router, get_request(&authorize_uri(&params))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = location_url(&response);
    assert!(location.as_str().starts_with(CLIENT_REDIRECT));

    let redirect_params = query_map(&location);
    let code = redirect_params.get("code").expect("code missing");
    assert_eq!(redirect_params.get("state").map(String::as_str), Some("xyz"));
    assert!(redirect_params.get("error").is_none());

    // Redeem the code the way the client's backend would.
    let token_response = send(
        &router,
        form_request(
            "/oauth2/token",
            &[
                ("grant_type", "authorization_code"),
                ("client_id", "app1"),
                ("client_secret", "app1-secret"),
                ("code", code),
                ("redirect_uri", CLIENT_REDIRECT),
            ],
        ),
    )
    .await;

    assert_eq!(token_response.status(), StatusCode::OK);
    let body = body_json(token_response).await;
    assert_eq!(body["token_type"], "Bearer");

    let claims: AccessTokenClaims =
        decode_claims(body["access_token"].as_str().unwrap(), SIGNING_SECRET);
    assert_eq!(claims.sub, "user-42");
    assert_eq!(claims.aud, "app1");
    assert_eq!(claims.scp, vec!["core"]);
    Ok(())
}

#[tokio::test]
async fn implicit_flow_delivers_token_in_fragment() {
    let router = test_router();
    let now = Utc::now().timestamp();
    let proof = mint_consent_token("user-42", "app1", "xyz", &["core"], now, now + 10);

    let params = vec![
        ("client_id", "app1"),
        ("redirect_uri", CLIENT_REDIRECT),
        ("response_type", "token"),
        ("scope", "core"),
        ("state", "xyz"),
        ("consent", proof.as_str()),
    ];
    let response = send(&router, get_request(&authorize_uri(&params))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = location_url(&response);
    assert!(location.as_str().starts_with(CLIENT_REDIRECT));

    let fragment = location.fragment().expect("fragment missing");
    assert!(fragment.contains("access_token="));
    assert!(fragment.contains("token_type=Bearer"));
    assert!(fragment.contains("state=xyz"));
    // The token travels only in the fragment, never the query.
    assert!(location.query().is_none());
}

#[tokio::test]
async fn expired_and_forged_proofs_are_indistinguishable() {
    let router = test_router();
    let now = Utc::now().timestamp();

    // Presented one second past the freshness window.
    let expired = mint_consent_token("user-42", "app1", "xyz", &["core"], now - 11, now - 1);
    // Fresh, but signed by a key the server does not trust.
    let forged = mint_forged_consent_token("user-42", "app1", "xyz", &["core"], now, now + 10);

    let mut observed = Vec::new();
    for proof in [&expired, &forged] {
        let mut params = base_params();
        params.push(("consent", proof));
        let response = send(&router, get_request(&authorize_uri(&params))).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = location_url(&response);
        assert!(location.as_str().starts_with(CLIENT_REDIRECT));
        observed.push(query_map(&location));
    }

    assert_eq!(
        observed[0].get("error").map(String::as_str),
        Some("access_denied")
    );
    // Same error, same description, same everything.
    assert_eq!(observed[0], observed[1]);
}

#[tokio::test]
async fn unregistered_redirect_uri_never_reaches_client() {
    let router = test_router();
    let params = vec![
        ("client_id", "app1"),
        ("redirect_uri", "https://evil.example/cb"),
        ("response_type", "code"),
        ("scope", "core"),
    ];
    let response = send(&router, get_request(&authorize_uri(&params))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = location_url(&response);
    assert_eq!(location.host_str(), Some("consent.example"));
    assert!(!location.as_str().contains("evil.example"));

    let error_params = query_map(&location);
    assert_eq!(
        error_params.get("error").map(String::as_str),
        Some("invalid_request")
    );
}

#[tokio::test]
async fn consent_approving_unrequested_scopes_is_denied() {
    let router = test_router();
    let now = Utc::now().timestamp();
    // The request asks for "core"; the authority claims approval for more.
    let proof = mint_consent_token("user-42", "app1", "xyz", &["core", "profile"], now, now + 10);

    let mut params = base_params();
    params.push(("consent", proof.as_str()));
    let response = send(&router, get_request(&authorize_uri(&params))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let error_params = query_map(&location_url(&response));
    assert_eq!(
        error_params.get("error").map(String::as_str),
        Some("access_denied")
    );
}

#[tokio::test]
async fn consent_bound_to_other_state_is_denied() {
    let router = test_router();
    let now = Utc::now().timestamp();
    let proof = mint_consent_token("user-42", "app1", "other-state", &["core"], now, now + 10);

    let mut params = base_params();
    params.push(("consent", proof.as_str()));
    let response = send(&router, get_request(&authorize_uri(&params))).await;

    let error_params = query_map(&location_url(&response));
    assert_eq!(
        error_params.get("error").map(String::as_str),
        Some("access_denied")
    );
}

#[tokio::test]
async fn unknown_client_is_reported_via_consent_channel() {
    let router = test_router();
    let params = vec![
        ("client_id", "ghost"),
        ("redirect_uri", CLIENT_REDIRECT),
        ("response_type", "code"),
    ];
    let response = send(&router, get_request(&authorize_uri(&params))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = location_url(&response);
    assert_eq!(location.host_str(), Some("consent.example"));
    assert_eq!(
        query_map(&location).get("error").map(String::as_str),
        Some("invalid_client")
    );
}

#[tokio::test]
async fn unsupported_response_type_redirects_to_validated_client() {
    let router = test_router();
    let params = vec![
        ("client_id", "app1"),
        ("redirect_uri", CLIENT_REDIRECT),
        ("response_type", "id_token"),
        ("state", "xyz"),
    ];
    let response = send(&router, get_request(&authorize_uri(&params))).await;

    // The redirect URI validated, so per RFC 6749 the error goes to the client.
    let location = location_url(&response);
    assert!(location.as_str().starts_with(CLIENT_REDIRECT));

    let error_params = query_map(&location);
    assert_eq!(
        error_params.get("error").map(String::as_str),
        Some("unsupported_response_type")
    );
    assert_eq!(error_params.get("state").map(String::as_str), Some("xyz"));
}

#[tokio::test]
async fn discovery_advertises_protocol_endpoints() {
    let router = test_router();
    let response = send(
        &router,
        get_request("/.well-known/oauth-authorization-server"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["issuer"], "https://auth.example");
    assert_eq!(
        body["authorization_endpoint"],
        "https://auth.example/oauth2/auth"
    );
    assert_eq!(body["token_endpoint"], "https://auth.example/oauth2/token");
}
