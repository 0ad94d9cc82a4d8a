// ABOUTME: Consentry server binary: config load, router assembly, graceful serve
// ABOUTME: All behavior is configured through the environment; flags only override the basics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Consentry server entry point

use std::net::Ipv4Addr;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use consentry::config::environment::ServerConfig;
use consentry::consent::{ConsentStrategy, JwtConsentStrategy};
use consentry::errors::AppResult;
use consentry::logging;
use consentry::oauth2::{ClientRegistry, GrantEngine, OAuth2Provider};
use consentry::routes::{HealthRoutes, OAuth2Context, OAuth2Routes};

/// OAuth2 authorization server with delegated consent
#[derive(Debug, Parser)]
#[command(name = "consentry", version, about)]
struct Args {
    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    logging::init()?;
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    let registry = Arc::new(match &config.clients_path {
        Some(path) => {
            let registry = ClientRegistry::load(path)?;
            info!(clients = registry.len(), "client registry loaded");
            registry
        }
        None => {
            warn!("no client seed configured; every request will be rejected");
            ClientRegistry::new()
        }
    });

    let provider: Arc<dyn OAuth2Provider> =
        Arc::new(GrantEngine::new(registry, config.tokens.clone()));
    let consent: Arc<dyn ConsentStrategy> =
        Arc::new(JwtConsentStrategy::from_config(&config.consent));

    let context = OAuth2Context {
        provider,
        consent,
        consent_url: config.consent.authority_url.clone(),
        public_url: config.public_url.clone(),
        issuer: config.tokens.issuer.clone(),
    };

    let app = Router::new()
        .merge(OAuth2Routes::routes(context))
        .merge(HealthRoutes::routes())
        .layer(TraceLayer::new_for_http());

    let listener =
        tokio::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.http_port)).await?;
    info!(port = config.http_port, "consentry listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
