// ABOUTME: Structured logging setup built on tracing-subscriber
// ABOUTME: Env-driven level filter with pretty output for development, JSON for production
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format for production logging
    Json,
    /// Pretty format for development
    Pretty,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Initialize the global tracing subscriber
///
/// The filter is taken from `RUST_LOG` when set, otherwise from the supplied
/// default level. Call once; a second call returns an error.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tipple_server={default_level},tower_http=info")));

    match LogFormat::from_env() {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .try_init()?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .try_init()?;
        }
    }

    Ok(())
}
