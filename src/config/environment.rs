// ABOUTME: Environment-based server configuration with typed sub-configs
// ABOUTME: Validates secrets and URLs once at startup, then read-only for the process lifetime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Server configuration loaded from environment variables
//!
//! | Variable | Default | Purpose |
//! |---|---|---|
//! | `CONSENTRY_HTTP_PORT` | `4444` | Listen port |
//! | `CONSENTRY_PUBLIC_URL` | `http://localhost:<port>` | Externally visible base URL; supplies the scheme for reconstructed return URLs |
//! | `CONSENTRY_CONSENT_URL` | required | Consent-authority endpoint the user agent is redirected to |
//! | `CONSENTRY_CHALLENGE_SECRET` | required | HS256 key for challenge tokens |
//! | `CONSENTRY_CONSENT_SECRET` | required | HS256 key consent responses are verified with |
//! | `CONSENTRY_SIGNING_SECRET` | required | HS256 key for access tokens |
//! | `CONSENTRY_CHALLENGE_TTL_SECS` | `300` | Challenge lifetime (time allowed for the approval step) |
//! | `CONSENTRY_CONSENT_MAX_AGE_SECS` | `10` | Consent-response freshness window (anti-replay) |
//! | `CONSENTRY_ISSUER` | public URL | `iss` claim on access tokens |
//! | `CONSENTRY_ACCESS_TOKEN_TTL_SECS` | `3600` | Access-token lifetime |
//! | `CONSENTRY_AUTH_CODE_TTL_SECS` | `600` | Authorization-code lifetime |
//! | `CONSENTRY_REFRESH_TOKEN_TTL_SECS` | `2592000` | Refresh-token lifetime |
//! | `CONSENTRY_CLIENTS_PATH` | unset | JSON seed file for the client registry |

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use url::Url;

use crate::errors::{AppError, AppResult};

/// Minimum length accepted for any signing secret
const MIN_SECRET_LEN: usize = 32;

/// Consent-delegation configuration
#[derive(Debug, Clone)]
pub struct ConsentConfig {
    /// Consent-authority URL the user agent is redirected to with a challenge
    pub authority_url: Url,
    /// HS256 secret challenges are signed with
    pub challenge_secret: String,
    /// HS256 secret consent responses must verify against
    pub response_secret: String,
    /// Challenge token lifetime in seconds
    pub challenge_ttl_secs: i64,
    /// Maximum age of a consent response before it is rejected as a replay
    pub max_response_age_secs: i64,
}

/// Token issuance configuration consumed by the grant engine
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Value of the `iss` claim on issued access tokens
    pub issuer: String,
    /// HS256 secret access tokens are signed with
    pub signing_secret: String,
    /// Access-token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Authorization-code lifetime in seconds
    pub auth_code_ttl_secs: i64,
    /// Refresh-token lifetime in seconds
    pub refresh_token_ttl_secs: i64,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Externally visible base URL of this server
    pub public_url: Url,
    /// Consent-delegation settings
    pub consent: ConsentConfig,
    /// Token issuance settings
    pub tokens: TokenConfig,
    /// Optional path to the client registry seed file
    pub clients_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    /// Returns an error when a required variable is missing, a URL or number
    /// fails to parse, or a secret is shorter than 32 bytes.
    pub fn from_env() -> AppResult<Self> {
        let http_port = parsed_or("CONSENTRY_HTTP_PORT", 4444_u16)?;

        let public_url = parse_url(&env_or(
            "CONSENTRY_PUBLIC_URL",
            format!("http://localhost:{http_port}"),
        ))?;

        let consent = ConsentConfig {
            authority_url: parse_url(&required("CONSENTRY_CONSENT_URL")?)?,
            challenge_secret: secret("CONSENTRY_CHALLENGE_SECRET")?,
            response_secret: secret("CONSENTRY_CONSENT_SECRET")?,
            challenge_ttl_secs: parsed_or("CONSENTRY_CHALLENGE_TTL_SECS", 300_i64)?,
            max_response_age_secs: parsed_or("CONSENTRY_CONSENT_MAX_AGE_SECS", 10_i64)?,
        };

        let issuer = env_or(
            "CONSENTRY_ISSUER",
            public_url.as_str().trim_end_matches('/').to_owned(),
        );
        let tokens = TokenConfig {
            issuer,
            signing_secret: secret("CONSENTRY_SIGNING_SECRET")?,
            access_token_ttl_secs: parsed_or("CONSENTRY_ACCESS_TOKEN_TTL_SECS", 3600_i64)?,
            auth_code_ttl_secs: parsed_or("CONSENTRY_AUTH_CODE_TTL_SECS", 600_i64)?,
            refresh_token_ttl_secs: parsed_or("CONSENTRY_REFRESH_TOKEN_TTL_SECS", 2_592_000_i64)?,
        };

        let clients_path = env::var("CONSENTRY_CLIENTS_PATH").ok().map(PathBuf::from);

        Ok(Self {
            http_port,
            public_url,
            consent,
            tokens,
            clients_path,
        })
    }
}

fn required(name: &str) -> AppResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::config(format!("{name} must be set"))),
    }
}

fn secret(name: &str) -> AppResult<String> {
    let value = required(name)?;
    if value.len() < MIN_SECRET_LEN {
        return Err(AppError::config(format!(
            "{name} must be at least {MIN_SECRET_LEN} bytes"
        )));
    }
    Ok(value)
}

fn env_or(name: &str, default: String) -> String {
    env::var(name).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn parsed_or<T>(name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) if !raw.is_empty() => raw
            .parse()
            .map_err(|e| AppError::config(format!("{name} is invalid: {e}"))),
        _ => Ok(default),
    }
}

fn parse_url(raw: &str) -> AppResult<Url> {
    Url::parse(raw).map_err(|e| AppError::config(format!("invalid URL {raw:?}: {e}")))
}
