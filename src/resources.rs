// ABOUTME: Shared server state handed to every route handler behind an Arc
// ABOUTME: Bundles the document store, the auth manager, and the loaded config
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;

/// Shared state for all route handlers
pub struct ServerResources {
    /// The document store
    pub database: Database,
    /// JWT validation and issuance
    pub auth: AuthManager,
    /// Loaded server configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the server's shared components
    #[must_use]
    pub fn new(database: Database, auth: AuthManager, config: ServerConfig) -> Self {
        Self {
            database,
            auth,
            config,
        }
    }
}
