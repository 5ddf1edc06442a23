// ABOUTME: JWT-based authentication and password hashing
// ABOUTME: Token generation/validation plus per-request bearer extraction helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

//! # Authentication
//!
//! HS256 bearer tokens carry the owner's internal key, public id, and role.
//! Mutating endpoints require a valid token; GET endpoints accept anonymous
//! callers, whose reads are filtered by visibility rules downstream.

use chrono::{Duration, Utc};
use http::HeaderMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::user::{User, UserRole};

/// JWT claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Owner's internal key (used for all stored references)
    pub sub: String,
    /// Owner's public id (exposed over HTTP)
    pub uid: String,
    /// User role
    pub role: UserRole,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Identity of an authenticated caller
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Internal key, matches `owner_key` columns
    pub key: Uuid,
    /// Public id
    pub id: Uuid,
    /// Role for permission checks
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Whether this caller has the admin role
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether this caller owns the resource created by `owner_key`, or is an admin
    #[must_use]
    pub fn owns_or_admin(&self, owner_key: Uuid) -> bool {
        self.is_admin() || self.key == owner_key
    }
}

/// Authentication manager for JWT tokens and password hashing
#[derive(Clone)]
pub struct AuthManager {
    secret: String,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub fn new(secret: impl Into<String>, token_expiry_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            token_expiry_hours,
        }
    }

    /// Generate a signed token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.key.to_string(),
            uid: user.id.to_string(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.token_expiry_hours)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns an `Unauthenticated` error if the token is expired, malformed,
    /// or its signature does not verify.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::unauthenticated("Authentication failed"))?;

        Ok(data.claims)
    }

    /// Authenticate a request from its headers; the token is mandatory
    ///
    /// # Errors
    ///
    /// Returns an `Unauthenticated` error if the `Authorization` header is
    /// missing, is not a bearer token, or fails validation.
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthenticatedUser> {
        let header = headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::unauthenticated("Authentication failed"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthenticated("Authentication failed"))?;

        let claims = self.validate_token(token)?;
        let key = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthenticated("Authentication failed"))?;
        let id = Uuid::parse_str(&claims.uid)
            .map_err(|_| AppError::unauthenticated("Authentication failed"))?;

        Ok(AuthenticatedUser {
            key,
            id,
            role: claims.role,
        })
    }

    /// Authenticate a request whose token is optional (anonymous GETs)
    ///
    /// A missing header yields `None`; a present but invalid token is still
    /// an authentication failure.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthenticated` error for a present but invalid token.
    pub fn authenticate_optional(&self, headers: &HeaderMap) -> AppResult<Option<AuthenticatedUser>> {
        if headers.get(http::header::AUTHORIZATION).is_none() {
            return Ok(None);
        }
        self.authenticate(headers).map(Some)
    }
}

/// Hash a password for storage
///
/// # Errors
///
/// Returns an error if bcrypt hashing fails.
pub fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against its stored hash
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Generate a random secret suitable for signing tokens
#[must_use]
pub fn generate_jwt_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::User;

    fn test_user() -> User {
        User::new(
            "mixmaster".into(),
            "mix@example.com".into(),
            "hash".into(),
            None,
        )
    }

    #[test]
    fn test_token_round_trip() {
        let manager = AuthManager::new("test-secret", 24);
        let user = test_user();
        let token = manager.generate_token(&user).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.key.to_string());
        assert_eq!(claims.uid, user.id.to_string());
        assert_eq!(claims.role, UserRole::User);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let manager = AuthManager::new("test-secret", 24);
        let token = manager.generate_token(&test_user()).unwrap();

        let other = AuthManager::new("other-secret", 24);
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        let manager = AuthManager::new("test-secret", 24);
        let headers = HeaderMap::new();
        assert!(manager.authenticate_optional(&headers).unwrap().is_none());
        assert!(manager.authenticate(&headers).is_err());
    }

    #[test]
    fn test_malformed_bearer_rejected() {
        let manager = AuthManager::new("test-secret", 24);
        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(manager.authenticate_optional(&headers).is_err());
    }

    #[test]
    fn test_password_hash_verify() {
        let hash = hash_password("negroni").unwrap();
        assert!(verify_password("negroni", &hash));
        assert!(!verify_password("martini", &hash));
    }
}
