// ABOUTME: Environment-driven server configuration
// ABOUTME: Port, database URL, JWT settings, and log level with sane defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::env;

use anyhow::Result;

use crate::auth::generate_jwt_secret;

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection string (`sqlite:...` or `sqlite::memory:`)
    pub database_url: String,
    /// Secret used to sign and verify JWT tokens
    pub jwt_secret: String,
    /// True when `JWT_SECRET` was absent and an ephemeral secret was generated
    pub jwt_secret_generated: bool,
    /// Token lifetime in hours
    pub jwt_expiry_hours: i64,
    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable fails to parse (e.g. a non-numeric
    /// `HTTP_PORT`).
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(port) => port.parse::<u16>()?,
            Err(_) => 8686,
        };
        let jwt_expiry_hours = match env::var("JWT_EXPIRY_HOURS") {
            Ok(hours) => hours.parse::<i64>()?,
            Err(_) => 24,
        };
        // Logging may not be initialized yet, so the caller reports the
        // ephemeral-secret case via `jwt_secret_generated`.
        let (jwt_secret, jwt_secret_generated) = match env::var("JWT_SECRET") {
            Ok(secret) => (secret, false),
            Err(_) => (generate_jwt_secret(), true),
        };

        Ok(Self {
            http_port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:tipple.db?mode=rwc".into()),
            jwt_secret,
            jwt_secret_generated,
            jwt_expiry_hours,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        })
    }

    /// One-line summary for startup logging (never includes secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} database={} token_expiry={}h log={}",
            self.http_port, self.database_url, self.jwt_expiry_hours, self.log_level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_hides_secret() {
        let config = ServerConfig {
            http_port: 8686,
            database_url: "sqlite::memory:".into(),
            jwt_secret: "super-secret".into(),
            jwt_secret_generated: false,
            jwt_expiry_hours: 24,
            log_level: "info".into(),
        };
        assert!(!config.summary().contains("super-secret"));
    }

    #[test]
    fn test_from_env_flags_generated_secret() {
        env::remove_var("JWT_SECRET");
        let config = ServerConfig::from_env().unwrap();
        assert!(config.jwt_secret_generated);
        assert!(!config.jwt_secret.is_empty());

        env::set_var("JWT_SECRET", "configured-secret");
        let config = ServerConfig::from_env().unwrap();
        assert!(!config.jwt_secret_generated);
        assert_eq!(config.jwt_secret, "configured-secret");
        env::remove_var("JWT_SECRET");
    }
}
