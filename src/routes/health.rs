// ABOUTME: Liveness endpoint
// ABOUTME: Reports ok plus the crate version; no database round trip
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::resources::ServerResources;

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the server is up
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Health routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(resources)
    }

    #[allow(clippy::unused_async)]
    async fn handle_health() -> Response {
        let response = HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        };
        (StatusCode::OK, Json(response)).into_response()
    }
}
