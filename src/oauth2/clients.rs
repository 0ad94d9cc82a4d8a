// ABOUTME: Registered OAuth2 client model and the read-only client registry
// ABOUTME: Client CRUD lives outside this server; the registry is seeded once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Client registry
//!
//! Clients are owned and mutated by an external management service. This
//! server only reads them: the registry is loaded from a JSON seed file at
//! startup and is safe for unsynchronized concurrent reads afterwards.

use std::path::Path;

use dashmap::DashMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, AppResult};

/// Registered OAuth2 client
#[derive(Debug, Clone)]
pub struct Client {
    /// Client identifier
    pub client_id: String,
    /// SHA-256 digest of the client secret, hex-encoded. Empty for public
    /// clients, which cannot authenticate.
    pub client_secret_hash: String,
    /// Redirect URIs registered for this client
    pub redirect_uris: Vec<String>,
    /// Grant types this client may use
    pub grant_types: Vec<String>,
    /// Response types this client may request
    pub response_types: Vec<String>,
    /// Scopes this client may request
    pub scopes: Vec<String>,
    /// Public clients have no secret and cannot use `client_credentials`
    pub public: bool,
}

impl Client {
    /// Hash a plaintext secret for storage.
    #[must_use]
    pub fn hash_secret(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Verify a presented secret in constant time.
    #[must_use]
    pub fn verify_secret(&self, presented: &str) -> bool {
        if self.public || self.client_secret_hash.is_empty() {
            return false;
        }
        let presented_hash = Self::hash_secret(presented);
        presented_hash
            .as_bytes()
            .ct_eq(self.client_secret_hash.as_bytes())
            .into()
    }

    /// Whether `uri` exactly matches a registered redirect URI.
    #[must_use]
    pub fn redirect_uri_registered(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }

    /// Whether the client may use the given grant type.
    #[must_use]
    pub fn allows_grant_type(&self, grant_type: &str) -> bool {
        self.grant_types.iter().any(|g| g == grant_type)
    }

    /// Whether the client may request the given response type.
    #[must_use]
    pub fn allows_response_type(&self, response_type: &str) -> bool {
        self.response_types.iter().any(|r| r == response_type)
    }

    /// Whether every requested scope is within the client's registration.
    #[must_use]
    pub fn allows_scopes(&self, requested: &[String]) -> bool {
        requested.iter().all(|s| self.scopes.contains(s))
    }
}

/// Seed-file entry: a client with its plaintext secret, hashed on load
#[derive(Debug, Deserialize)]
struct ClientSeed {
    client_id: String,
    #[serde(default)]
    client_secret: String,
    redirect_uris: Vec<String>,
    #[serde(default = "default_grant_types")]
    grant_types: Vec<String>,
    #[serde(default = "default_response_types")]
    response_types: Vec<String>,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    public: bool,
}

fn default_grant_types() -> Vec<String> {
    vec!["authorization_code".to_owned()]
}

fn default_response_types() -> Vec<String> {
    vec!["code".to_owned()]
}

impl From<ClientSeed> for Client {
    fn from(seed: ClientSeed) -> Self {
        let client_secret_hash = if seed.public || seed.client_secret.is_empty() {
            String::new()
        } else {
            Self::hash_secret(&seed.client_secret)
        };
        Self {
            client_id: seed.client_id,
            client_secret_hash,
            redirect_uris: seed.redirect_uris,
            grant_types: seed.grant_types,
            response_types: seed.response_types,
            scopes: seed.scopes,
            public: seed.public,
        }
    }
}

/// Read-only registry of registered clients
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<String, Client>,
}

impl ClientRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client. Intended for startup seeding and tests.
    pub fn register(&self, client: Client) {
        self.clients.insert(client.client_id.clone(), client);
    }

    /// Look up a client by identifier.
    #[must_use]
    pub fn get(&self, client_id: &str) -> Option<Client> {
        self.clients.get(client_id).map(|c| c.clone())
    }

    /// Number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Parse a registry from a JSON array of client seeds.
    ///
    /// # Errors
    /// Returns an error when the JSON is malformed or a client entry is
    /// missing required fields.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let seeds: Vec<ClientSeed> = serde_json::from_str(json)
            .map_err(|e| AppError::client_seed(format!("invalid client seed JSON: {e}")))?;
        let registry = Self::new();
        for seed in seeds {
            if seed.redirect_uris.is_empty() {
                return Err(AppError::client_seed(format!(
                    "client {:?} has no redirect URIs",
                    seed.client_id
                )));
            }
            registry.register(Client::from(seed));
        }
        Ok(registry)
    }

    /// Load a registry from a JSON seed file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
