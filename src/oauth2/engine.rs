// ABOUTME: Built-in grant engine: client authentication, authorization codes, JWT access tokens
// ABOUTME: Implements the OAuth2Provider boundary for code, implicit, client-credentials, and refresh grants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Grant engine
//!
//! Codes and refresh tokens are held in memory; persistence backends are a
//! deployment concern outside this server. Consent state never lands here at
//! all, it travels inside the signed challenge/response tokens.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::environment::TokenConfig;
use crate::oauth2::clients::ClientRegistry;
use crate::oauth2::models::{
    AccessRequest, AuthorizeFailure, AuthorizeRequest, AuthorizeResponse, OAuth2Error,
    TokenResponse,
};
use crate::oauth2::provider::OAuth2Provider;
use crate::session::Session;

/// Claims carried by issued access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer
    pub iss: String,
    /// Subject: resource owner, or the client itself for `client_credentials`
    pub sub: String,
    /// Audience: the client the token was issued to
    pub aud: String,
    /// Token identifier
    pub jti: String,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
    /// Granted scopes
    #[serde(default)]
    pub scp: Vec<String>,
}

/// Stored single-use authorization code
#[derive(Debug, Clone)]
struct AuthorizationCode {
    client_id: String,
    subject: String,
    redirect_uri: String,
    scopes: Vec<String>,
    expires_at: DateTime<Utc>,
}

/// Stored refresh token; rotated on every use
#[derive(Debug, Clone)]
struct RefreshToken {
    client_id: String,
    subject: String,
    scopes: Vec<String>,
    expires_at: DateTime<Utc>,
}

/// Built-in grant engine
pub struct GrantEngine {
    clients: Arc<ClientRegistry>,
    codes: DashMap<String, AuthorizationCode>,
    refresh_tokens: DashMap<String, RefreshToken>,
    tokens: TokenConfig,
}

impl GrantEngine {
    /// Engine over a client registry and token configuration.
    #[must_use]
    pub fn new(clients: Arc<ClientRegistry>, tokens: TokenConfig) -> Self {
        Self {
            clients,
            codes: DashMap::new(),
            refresh_tokens: DashMap::new(),
            tokens,
        }
    }

    /// 32 bytes of OS randomness, URL-safe base64.
    fn generate_opaque_token() -> Result<String, OAuth2Error> {
        let mut bytes = [0_u8; 32];
        rand::rngs::OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            error!("system RNG failure, cannot mint secure tokens: {e}");
            OAuth2Error::server_error()
        })?;
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn sign_access_token(
        &self,
        client_id: &str,
        subject: &str,
        scopes: &[String],
    ) -> Result<String, OAuth2Error> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            iss: self.tokens.issuer.clone(),
            sub: subject.to_owned(),
            aud: client_id.to_owned(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.tokens.access_token_ttl_secs)).timestamp(),
            scp: scopes.to_vec(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.tokens.signing_secret.as_bytes()),
        )
        .map_err(|e| {
            error!(client_id, "access token signing failed: {e}");
            OAuth2Error::server_error()
        })
    }

    fn mint_code(&self, request: &AuthorizeRequest, session: &Session) -> Result<String, OAuth2Error> {
        let now = Utc::now();
        self.codes.retain(|_, c| c.expires_at > now);

        let code = Self::generate_opaque_token()?;
        self.codes.insert(
            code.clone(),
            AuthorizationCode {
                client_id: request.client_id.clone(),
                subject: session.subject.clone(),
                redirect_uri: request.redirect_uri.clone(),
                scopes: session.auth.granted_scopes.clone(),
                expires_at: now + Duration::seconds(self.tokens.auth_code_ttl_secs),
            },
        );
        Ok(code)
    }

    fn consume_code(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
    ) -> Result<AuthorizationCode, OAuth2Error> {
        let (_, stored) = self
            .codes
            .remove(code)
            .ok_or_else(|| OAuth2Error::invalid_grant("Invalid or already consumed code"))?;

        if stored.client_id != client_id {
            return Err(OAuth2Error::invalid_grant(
                "Code was issued to a different client",
            ));
        }
        if stored.redirect_uri != redirect_uri {
            return Err(OAuth2Error::invalid_grant("Redirect URI mismatch"));
        }
        if Utc::now() > stored.expires_at {
            return Err(OAuth2Error::invalid_grant("Authorization code expired"));
        }
        Ok(stored)
    }

    fn mint_refresh_token(
        &self,
        client_id: &str,
        subject: &str,
        scopes: &[String],
    ) -> Result<String, OAuth2Error> {
        let token = Self::generate_opaque_token()?;
        self.refresh_tokens.insert(
            token.clone(),
            RefreshToken {
                client_id: client_id.to_owned(),
                subject: subject.to_owned(),
                scopes: scopes.to_vec(),
                expires_at: Utc::now() + Duration::seconds(self.tokens.refresh_token_ttl_secs),
            },
        );
        Ok(token)
    }

    /// Rotation: the presented token is removed before a replacement exists,
    /// so a replayed token can never succeed twice.
    fn consume_refresh_token(
        &self,
        token: &str,
        client_id: &str,
    ) -> Result<RefreshToken, OAuth2Error> {
        let (_, stored) = self
            .refresh_tokens
            .remove(token)
            .ok_or_else(|| OAuth2Error::invalid_grant("Invalid or revoked refresh token"))?;

        if stored.client_id != client_id {
            return Err(OAuth2Error::invalid_grant(
                "Refresh token was issued to a different client",
            ));
        }
        if Utc::now() > stored.expires_at {
            return Err(OAuth2Error::invalid_grant("Refresh token expired"));
        }
        Ok(stored)
    }

    fn join_scopes(scopes: &[String]) -> Option<String> {
        if scopes.is_empty() {
            None
        } else {
            Some(scopes.join(" "))
        }
    }
}

fn param<'a>(form: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    form.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

fn parse_scope(form: &HashMap<String, String>) -> Vec<String> {
    param(form, "scope")
        .map(|raw| raw.split_whitespace().map(ToOwned::to_owned).collect())
        .unwrap_or_default()
}

#[async_trait]
impl OAuth2Provider for GrantEngine {
    async fn parse_authorize_request(
        &self,
        form: &HashMap<String, String>,
    ) -> Result<AuthorizeRequest, AuthorizeFailure> {
        let client_id = param(form, "client_id")
            .ok_or_else(|| OAuth2Error::invalid_request("client_id is required"))?
            .to_owned();
        let client = self
            .clients
            .get(&client_id)
            .ok_or_else(OAuth2Error::invalid_client)?;

        let redirect_uri = param(form, "redirect_uri")
            .ok_or_else(|| OAuth2Error::invalid_request("redirect_uri is required"))?
            .to_owned();
        if !client.redirect_uri_registered(&redirect_uri) {
            return Err(AuthorizeFailure::bare(OAuth2Error::invalid_request(
                "redirect_uri is not registered for this client",
            )));
        }

        // Redirect URI validated; from here on failures carry the request so
        // they can be reported to the client's own redirect URI.
        let mut request = AuthorizeRequest {
            client_id,
            redirect_uri,
            redirect_uri_valid: true,
            response_type: String::new(),
            scopes: parse_scope(form),
            state: param(form, "state").map(ToOwned::to_owned),
            form: form.clone(),
        };

        let Some(response_type) = param(form, "response_type").map(ToOwned::to_owned) else {
            return Err(AuthorizeFailure::with_request(
                request,
                OAuth2Error::invalid_request("response_type is required"),
            ));
        };
        if !matches!(response_type.as_str(), "code" | "token") {
            return Err(AuthorizeFailure::with_request(
                request,
                OAuth2Error::unsupported_response_type(),
            ));
        }
        if !client.allows_response_type(&response_type) {
            return Err(AuthorizeFailure::with_request(
                request,
                OAuth2Error::unauthorized_client(),
            ));
        }
        if !client.allows_scopes(&request.scopes) {
            return Err(AuthorizeFailure::with_request(
                request,
                OAuth2Error::invalid_scope("Requested scope exceeds the client registration"),
            ));
        }

        request.response_type = response_type;
        Ok(request)
    }

    async fn parse_access_request(
        &self,
        form: &HashMap<String, String>,
        session: &mut Session,
    ) -> Result<AccessRequest, OAuth2Error> {
        let grant_type = param(form, "grant_type")
            .ok_or_else(|| OAuth2Error::invalid_request("grant_type is required"))?
            .to_owned();
        let client_id = param(form, "client_id")
            .ok_or_else(|| OAuth2Error::invalid_request("client_id is required"))?
            .to_owned();
        let client = self
            .clients
            .get(&client_id)
            .ok_or_else(OAuth2Error::invalid_client)?;

        // client_secret_post authentication; public clients carry no secret
        // and are limited to redeeming codes.
        if client.public {
            if grant_type == "client_credentials" {
                return Err(OAuth2Error::invalid_client());
            }
        } else {
            let secret = param(form, "client_secret")
                .ok_or_else(|| OAuth2Error::invalid_request("client_secret is required"))?;
            if !client.verify_secret(secret) {
                debug!(%client_id, "client secret verification failed");
                return Err(OAuth2Error::invalid_client());
            }
        }

        if !client.allows_grant_type(&grant_type) {
            return Err(OAuth2Error::unauthorized_client());
        }

        match grant_type.as_str() {
            "authorization_code" => {
                let code = param(form, "code")
                    .ok_or_else(|| OAuth2Error::invalid_request("code is required"))?
                    .to_owned();
                let redirect_uri = param(form, "redirect_uri")
                    .ok_or_else(|| OAuth2Error::invalid_request("redirect_uri is required"))?
                    .to_owned();

                let stored = self.consume_code(&code, &client_id, &redirect_uri)?;
                session.subject.clone_from(&stored.subject);
                session.auth.granted_scopes.clone_from(&stored.scopes);

                Ok(AccessRequest {
                    grant_type,
                    client_id,
                    code: Some(code),
                    refresh_token: None,
                    redirect_uri: Some(redirect_uri),
                    scopes: stored.scopes,
                })
            }
            "client_credentials" => {
                let scopes = parse_scope(form);
                if !client.allows_scopes(&scopes) {
                    return Err(OAuth2Error::invalid_scope(
                        "Requested scope exceeds the client registration",
                    ));
                }
                Ok(AccessRequest {
                    grant_type,
                    client_id,
                    code: None,
                    refresh_token: None,
                    redirect_uri: None,
                    scopes,
                })
            }
            "refresh_token" => {
                let token = param(form, "refresh_token")
                    .ok_or_else(|| OAuth2Error::invalid_request("refresh_token is required"))?
                    .to_owned();

                let stored = self.consume_refresh_token(&token, &client_id)?;
                session.subject.clone_from(&stored.subject);
                session.auth.granted_scopes.clone_from(&stored.scopes);

                Ok(AccessRequest {
                    grant_type,
                    client_id,
                    code: None,
                    refresh_token: Some(token),
                    redirect_uri: None,
                    scopes: stored.scopes,
                })
            }
            _ => Err(OAuth2Error::unsupported_grant_type()),
        }
    }

    async fn issue_authorize_response(
        &self,
        request: &AuthorizeRequest,
        session: &Session,
    ) -> Result<AuthorizeResponse, OAuth2Error> {
        if session.subject.is_empty() {
            error!("authorize issuance reached with an empty subject");
            return Err(OAuth2Error::server_error());
        }

        match request.response_type.as_str() {
            "code" => {
                let code = self.mint_code(request, session)?;
                debug!(client_id = %request.client_id, "authorization code issued");
                Ok(AuthorizeResponse::Code {
                    code,
                    state: request.state.clone(),
                })
            }
            "token" => {
                let scopes = &session.auth.granted_scopes;
                let access_token =
                    self.sign_access_token(&request.client_id, &session.subject, scopes)?;
                Ok(AuthorizeResponse::Token {
                    token: TokenResponse {
                        access_token,
                        token_type: "Bearer".to_owned(),
                        expires_in: self.tokens.access_token_ttl_secs,
                        refresh_token: None,
                        scope: Self::join_scopes(scopes),
                    },
                    state: request.state.clone(),
                })
            }
            _ => Err(OAuth2Error::unsupported_response_type()),
        }
    }

    async fn issue_access_response(
        &self,
        request: &AccessRequest,
        session: &Session,
    ) -> Result<TokenResponse, OAuth2Error> {
        if session.subject.is_empty() {
            error!("access issuance reached with an empty subject");
            return Err(OAuth2Error::server_error());
        }

        let access_token =
            self.sign_access_token(&request.client_id, &session.subject, &request.scopes)?;

        let rotates_refresh = matches!(
            request.grant_type.as_str(),
            "authorization_code" | "refresh_token"
        ) && self
            .clients
            .get(&request.client_id)
            .is_some_and(|c| c.allows_grant_type("refresh_token"));

        let refresh_token = if rotates_refresh {
            Some(self.mint_refresh_token(&request.client_id, &session.subject, &request.scopes)?)
        } else {
            None
        };

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_owned(),
            expires_in: self.tokens.access_token_ttl_secs,
            refresh_token,
            scope: Self::join_scopes(&request.scopes),
        })
    }
}
