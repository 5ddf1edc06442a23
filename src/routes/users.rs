// ABOUTME: Route handlers for account registration, login, and public profiles
// ABOUTME: Passwords are bcrypt-hashed; login returns a signed bearer token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::errors::AppError;
use crate::models::User;
use crate::resources::ServerResources;
use crate::routes::require_json;

/// Registration request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterBody {
    /// Unique display name
    pub username: String,
    /// Unique login email
    pub email: String,
    /// Plaintext password, hashed before storage
    pub password: String,
    /// Optional profile text
    pub bio: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginBody {
    /// Login email
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// User projection; never carries the password hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Public id
    pub id: String,
    /// Display name
    pub username: String,
    /// Login email
    pub email: String,
    /// Profile text
    pub bio: Option<String>,
    /// Role
    pub role: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub last_updated: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            bio: user.bio,
            role: user.role.as_str().to_owned(),
            created_at: user.created_at.to_rfc3339(),
            last_updated: user.last_updated.to_rfc3339(),
        }
    }
}

/// Registration and login response: the user plus a signed token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Signed bearer token
    pub token: String,
    /// The authenticated user
    pub user: UserResponse,
}

/// User routes
pub struct UsersRoutes;

impl UsersRoutes {
    /// Create all user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/users", post(Self::handle_register))
            .route("/users/login", post(Self::handle_login))
            .route("/users/:id", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle POST /users
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<RegisterBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let body = require_json(body)?;
        if body.username.trim().is_empty() {
            return Err(AppError::validation("Username is required"));
        }
        if body.email.trim().is_empty() {
            return Err(AppError::validation("Email is required"));
        }
        if body.password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }

        let password_hash = hash_password(&body.password)?;
        let user = User::new(body.username, body.email, password_hash, body.bio);
        resources.database.users().create(&user).await?;

        let token = resources.auth.generate_token(&user)?;
        tracing::info!(username = %user.username, "registered user");

        let response = AuthResponse {
            token,
            user: user.into(),
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle POST /users/login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<LoginBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let body = require_json(body)?;

        let user = resources
            .database
            .users()
            .find_by_email(&body.email)
            .await?
            .ok_or_else(|| AppError::unauthenticated("Invalid email or password"))?;

        if !verify_password(&body.password, &user.password_hash) {
            return Err(AppError::unauthenticated("Invalid email or password"));
        }

        let token = resources.auth.generate_token(&user)?;
        let response = AuthResponse {
            token,
            user: user.into(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /users/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let user = resources
            .database
            .users()
            .find_by_id(id)
            .await?
            .filter(|u| !u.is_deleted)
            .ok_or_else(|| AppError::not_found("User", id))?;

        let response: UserResponse = user.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
