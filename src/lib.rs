// ABOUTME: Main library entry point for the Tipple recipe catalog server
// ABOUTME: Exposes the REST API for ingredients, recipes, collections, and annotations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

#![deny(unsafe_code)]

//! # Tipple Server
//!
//! A cocktail and recipe catalog backend. Users register ingredients with
//! their strength, compose recipes from ingredients or other recipes (with a
//! server-computed alcohol-by-volume figure), curate collections, and attach
//! a threaded rating/comment system to recipes, ingredients, ratings, and
//! other comments.
//!
//! ## Architecture
//!
//! - **models**: the stored document types
//! - **database**: SQLite used as a document store, one manager per entity
//! - **composition**: the pure recipe-resolution and ABV engine
//! - **routes**: axum handlers, one module per resource
//! - **auth**: JWT bearer tokens and bcrypt password hashing
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tipple_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Tipple server configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// JWT authentication and password hashing
pub mod auth;
/// Recipe composition and ABV engine
pub mod composition;
/// Environment-driven server configuration
pub mod config;
/// SQLite-backed document store
pub mod database;
/// Unified error taxonomy
pub mod errors;
/// Tracing initialization
pub mod logging;
/// Stored document types
pub mod models;
/// Shared handler state
pub mod resources;
/// HTTP route handlers
pub mod routes;

use resources::ServerResources;
use routes::{
    CollectionsRoutes, CommentsRoutes, HealthRoutes, IngredientsRoutes, RatingsRoutes,
    RecipesRoutes, UsersRoutes,
};

/// Assemble the full application router
#[must_use]
pub fn app(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(UsersRoutes::routes(resources.clone()))
        .merge(IngredientsRoutes::routes(resources.clone()))
        .merge(RecipesRoutes::routes(resources.clone()))
        .merge(CollectionsRoutes::routes(resources.clone()))
        .merge(RatingsRoutes::routes(resources.clone()))
        .merge(CommentsRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
