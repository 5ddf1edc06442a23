// ABOUTME: Server binary: loads config, opens the store, and serves the REST API
// ABOUTME: CLI flags override the environment for port and database URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use tipple_server::auth::AuthManager;
use tipple_server::config::ServerConfig;
use tipple_server::database::Database;
use tipple_server::resources::ServerResources;
use tipple_server::{app, logging};

#[derive(Parser)]
#[command(name = "tipple-server", about = "Cocktail and recipe catalog server")]
struct Args {
    /// HTTP listen port (overrides HTTP_PORT)
    #[arg(long)]
    http_port: Option<u16>,

    /// Database connection string (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    if let Some(url) = args.database_url {
        config.database_url = url;
    }

    logging::init(&config.log_level)?;
    tracing::info!("starting tipple-server: {}", config.summary());
    if config.jwt_secret_generated {
        tracing::warn!("JWT_SECRET not set, using an ephemeral secret; tokens will not survive a restart");
    }

    let database = Database::connect(&config.database_url)
        .await
        .context("failed to open database")?;
    let auth = AuthManager::new(config.jwt_secret.clone(), config.jwt_expiry_hours);
    let resources = Arc::new(ServerResources::new(database, auth, config.clone()));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.http_port))?;
    tracing::info!(port = config.http_port, "listening");

    axum::serve(listener, app(resources))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install shutdown handler: {e}");
    }
    tracing::info!("shutting down");
}
