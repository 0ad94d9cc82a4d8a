// ABOUTME: Error-channel decision and RFC6749 error rendering for both endpoints
// ABOUTME: Guards against open redirects by refusing unvalidated client redirect URIs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Error translation
//!
//! The authorize path has two trust boundaries: until the client's redirect
//! URI is validated as registered, redirecting an error there would hand an
//! open redirect to whoever crafted the request. The channel decision is a
//! pure function over `(error, redirect-URI validity)`, kept separate from
//! the HTTP plumbing so it can be tested in isolation.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use url::Url;

use crate::oauth2::models::{AuthorizeRequest, OAuth2Error};

/// Where a failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorChannel {
    /// Redirect to the operator-controlled consent authority
    ConsentAuthority,
    /// Redirect to the client's validated redirect URI
    Client,
    /// Direct HTTP response; the token endpoint has no redirect concept
    Direct,
}

/// Decide the reporting channel for an authorize-path failure.
///
/// Only a request whose redirect URI passed registration validation may have
/// errors delivered to that URI; everything else goes to the consent
/// authority, which the operator controls.
#[must_use]
pub fn authorize_error_channel(request: Option<&AuthorizeRequest>) -> ErrorChannel {
    match request {
        Some(r) if r.redirect_uri_valid => ErrorChannel::Client,
        _ => ErrorChannel::ConsentAuthority,
    }
}

/// Render an authorize-path failure on the channel the request's trust level
/// permits. The error is normalized first; raw internal text never reaches a
/// URL.
#[must_use]
pub fn authorize_error_response(
    consent_url: &Url,
    request: Option<&AuthorizeRequest>,
    error: &OAuth2Error,
) -> Response {
    let rfc = error.normalized();
    match authorize_error_channel(request) {
        ErrorChannel::Client => {
            // Channel choice guarantees the request is present here.
            let Some(request) = request else {
                return redirect_with_error(consent_url.clone(), &rfc, None);
            };
            match Url::parse(&request.redirect_uri) {
                Ok(target) => redirect_with_error(target, &rfc, request.state.as_deref()),
                Err(_) => redirect_with_error(consent_url.clone(), &rfc, None),
            }
        }
        ErrorChannel::ConsentAuthority | ErrorChannel::Direct => {
            redirect_with_error(consent_url.clone(), &rfc, None)
        }
    }
}

/// Render a token-endpoint failure as a direct RFC 6749 §5.2 JSON body.
#[must_use]
pub fn access_error_response(error: &OAuth2Error) -> Response {
    let rfc = error.normalized();
    let status = StatusCode::from_u16(rfc.status).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(rfc)).into_response()
}

/// HTTP 302 with `error` and `error_description` query parameters appended,
/// plus the client's `state` when it supplied one.
fn redirect_with_error(mut target: Url, error: &OAuth2Error, state: Option<&str>) -> Response {
    {
        let mut pairs = target.query_pairs_mut();
        pairs.append_pair("error", &error.error);
        pairs.append_pair("error_description", error.description());
        if let Some(state) = state {
            pairs.append_pair("state", state);
        }
    }
    found(target.as_str())
}

/// HTTP 302 Found. axum's `Redirect` emits 303/307/308, so the header is set
/// directly.
pub(crate) fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_owned())],
    )
        .into_response()
}
