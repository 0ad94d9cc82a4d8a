// ABOUTME: Health check route for liveness probes
// ABOUTME: No dependencies on protocol state; always answers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

//! Health check routes

use axum::{routing::get, Json, Router};

/// Health route handlers
pub struct HealthRoutes;

impl HealthRoutes {
    /// Build the health router.
    #[must_use]
    pub fn routes() -> Router {
        Router::new().route("/health", get(Self::handle_health))
    }

    async fn handle_health() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "status": "ok",
            "service": "consentry",
            "version": env!("CARGO_PKG_VERSION"),
        }))
    }
}
