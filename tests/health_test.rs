// ABOUTME: Integration test for the liveness endpoint
// ABOUTME: Health answers without any protocol state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Consentry Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::http::StatusCode;

use common::{body_json, get_request, send};
use consentry::routes::HealthRoutes;

#[tokio::test]
async fn health_reports_ok() {
    let router = HealthRoutes::routes();
    let response = send(&router, get_request("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "consentry");
}
