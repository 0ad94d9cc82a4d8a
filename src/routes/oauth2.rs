// ABOUTME: OAuth2 protocol route handlers for the authorize and token endpoints
// ABOUTME: Orchestrates parse, consent delegation, and issuance; exactly one response per invocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Protocol endpoints
//!
//! `/oauth2/auth` (GET and POST, handled identically) drives the consent
//! round trip: a request without a consent proof is answered with a redirect
//! to the consent authority carrying a signed challenge; a request returning
//! with a proof is validated and, on success, granted. `/oauth2/token`
//! exchanges codes, refresh tokens, and client credentials for access tokens
//! and never redirects.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use axum::{
    extract::{Form, OriginalUri, Query, RawQuery, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error, info, warn};
use url::Url;
use urlencoding::encode;

use crate::consent::ConsentStrategy;
use crate::oauth2::models::{AuthorizeRequest, AuthorizeResponse, OAuth2Error};
use crate::oauth2::provider::OAuth2Provider;
use crate::oauth2::translate::{access_error_response, authorize_error_response, found};
use crate::session::Session;

/// Shared, read-mostly context for the protocol handlers. Fixed at
/// construction; safe for unsynchronized concurrent reads.
#[derive(Clone)]
pub struct OAuth2Context {
    /// Grant engine handle
    pub provider: Arc<dyn OAuth2Provider>,
    /// Consent challenge/response strategy
    pub consent: Arc<dyn ConsentStrategy>,
    /// Consent-authority URL the user agent is sent to
    pub consent_url: Url,
    /// Externally visible base URL of this server
    pub public_url: Url,
    /// Issuer advertised by discovery
    pub issuer: String,
}

/// OAuth2 protocol routes
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Build the protocol router.
    #[must_use]
    pub fn routes(context: OAuth2Context) -> Router {
        Router::new()
            // RFC 8414 authorization server metadata
            .route(
                "/.well-known/oauth-authorization-server",
                get(Self::handle_discovery),
            )
            .route(
                "/oauth2/auth",
                get(Self::handle_authorize_query).post(Self::handle_authorize_form),
            )
            .route("/oauth2/token", post(Self::handle_token))
            .with_state(context)
    }

    /// Handle OAuth2 discovery (RFC 8414)
    async fn handle_discovery(State(context): State<OAuth2Context>) -> Json<serde_json::Value> {
        let issuer = &context.issuer;
        Json(serde_json::json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{issuer}/oauth2/auth"),
            "token_endpoint": format!("{issuer}/oauth2/token"),
            "grant_types_supported": [
                "authorization_code",
                "implicit",
                "client_credentials",
                "refresh_token",
            ],
            "response_types_supported": ["code", "token"],
            "token_endpoint_auth_methods_supported": ["client_secret_post"],
            "response_modes_supported": ["query", "fragment"],
        }))
    }

    /// Handle authorization request (GET /oauth2/auth)
    async fn handle_authorize_query(
        State(context): State<OAuth2Context>,
        OriginalUri(uri): OriginalUri,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        Self::authorize(&context, &uri, params).await
    }

    /// Handle authorization request (POST /oauth2/auth); query and body
    /// parameters are merged, body taking precedence.
    async fn handle_authorize_form(
        State(context): State<OAuth2Context>,
        OriginalUri(uri): OriginalUri,
        RawQuery(query): RawQuery,
        Form(mut params): Form<HashMap<String, String>>,
    ) -> Response {
        if let Some(query) = query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                params
                    .entry(key.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        Self::authorize(&context, &uri, params).await
    }

    async fn authorize(
        context: &OAuth2Context,
        uri: &Uri,
        params: HashMap<String, String>,
    ) -> Response {
        let request = match context.provider.parse_authorize_request(&params).await {
            Ok(request) => request,
            Err(failure) => {
                warn!("authorize request rejected: {}", failure.error);
                return authorize_error_response(
                    &context.consent_url,
                    failure.request.as_ref(),
                    &failure.error,
                );
            }
        };

        // A consent proof is present once the user agent comes back from the
        // consent authority; until then, hand off.
        let Some(proof) = request.consent_proof() else {
            return Self::redirect_to_consent(context, uri, &request);
        };

        let session = match context.consent.validate_response(&request, proof) {
            Ok(session) => session,
            Err(err) => {
                // Detail stays in the logs; the client sees one fixed error
                // regardless of why validation failed.
                warn!(client_id = %request.client_id, "consent validation failed: {err}");
                return authorize_error_response(
                    &context.consent_url,
                    Some(&request),
                    &OAuth2Error::access_denied(),
                );
            }
        };

        match context.provider.issue_authorize_response(&request, &session).await {
            Ok(response) => {
                info!(
                    client_id = %request.client_id,
                    response_type = %request.response_type,
                    "authorization granted"
                );
                Self::write_authorize_response(context, &request, response)
            }
            Err(err) => {
                error!(client_id = %request.client_id, "authorize issuance failed: {err}");
                authorize_error_response(&context.consent_url, Some(&request), &err)
            }
        }
    }

    fn redirect_to_consent(
        context: &OAuth2Context,
        uri: &Uri,
        request: &AuthorizeRequest,
    ) -> Response {
        let return_url = Self::reconstruct_return_url(&context.public_url, uri);
        match context.consent.issue_challenge(request, &return_url) {
            Ok(challenge) => {
                debug!(client_id = %request.client_id, "delegating to consent authority");
                let mut target = context.consent_url.clone();
                target
                    .query_pairs_mut()
                    .append_pair("challenge", &challenge);
                found(target.as_str())
            }
            Err(err) => {
                error!(client_id = %request.client_id, "challenge issuance failed: {err}");
                authorize_error_response(
                    &context.consent_url,
                    Some(request),
                    &OAuth2Error::server_error(),
                )
            }
        }
    }

    /// Absolute URL of the in-flight authorize request, for the consent
    /// authority to send the user agent back to. Scheme and authority come
    /// from the configured public base URL.
    fn reconstruct_return_url(public_url: &Url, uri: &Uri) -> String {
        let base = public_url.as_str().trim_end_matches('/');
        let path_and_query = uri
            .path_and_query()
            .map_or_else(|| uri.path(), |pq| pq.as_str());
        format!("{base}{path_and_query}")
    }

    fn write_authorize_response(
        context: &OAuth2Context,
        request: &AuthorizeRequest,
        response: AuthorizeResponse,
    ) -> Response {
        let Ok(mut target) = Url::parse(&request.redirect_uri) else {
            error!(client_id = %request.client_id, "validated redirect URI failed to parse");
            return authorize_error_response(
                &context.consent_url,
                Some(request),
                &OAuth2Error::server_error(),
            );
        };

        match response {
            AuthorizeResponse::Code { code, state } => {
                {
                    let mut pairs = target.query_pairs_mut();
                    pairs.append_pair("code", &code);
                    if let Some(state) = &state {
                        pairs.append_pair("state", state);
                    }
                }
                found(target.as_str())
            }
            AuthorizeResponse::Token { token, state } => {
                // Implicit grant: the token travels in the fragment, RFC 6749 §4.2.2.
                let mut fragment = format!(
                    "access_token={}&token_type={}&expires_in={}",
                    encode(&token.access_token),
                    encode(&token.token_type),
                    token.expires_in
                );
                if let Some(scope) = &token.scope {
                    write!(fragment, "&scope={}", encode(scope)).ok();
                }
                if let Some(state) = &state {
                    write!(fragment, "&state={}", encode(state)).ok();
                }
                target.set_fragment(Some(&fragment));
                found(target.as_str())
            }
        }
    }

    /// Handle token request (POST /oauth2/token)
    async fn handle_token(
        State(context): State<OAuth2Context>,
        Form(form): Form<HashMap<String, String>>,
    ) -> Response {
        // Fresh claims containers per request; concurrent requests must never
        // observe each other's session.
        let mut session = Session::new();

        let request = match context.provider.parse_access_request(&form, &mut session).await {
            Ok(request) => request,
            Err(err) => {
                warn!(
                    grant_type = form.get("grant_type").map_or("", String::as_str),
                    "token request rejected: {err}"
                );
                return access_error_response(&err);
            }
        };

        // No resource owner exists for this grant; the token's subject is the
        // authenticated client itself.
        if request.grant_type == "client_credentials" {
            session.subject.clone_from(&request.client_id);
        }

        match context.provider.issue_access_response(&request, &session).await {
            Ok(token) => {
                info!(
                    client_id = %request.client_id,
                    grant_type = %request.grant_type,
                    "access token issued"
                );
                (StatusCode::OK, Json(token)).into_response()
            }
            Err(err) => {
                warn!(client_id = %request.client_id, "token issuance failed: {err}");
                access_error_response(&err)
            }
        }
    }
}
