// ABOUTME: HTTP route modules, one per resource, plus shared response shapes
// ABOUTME: All handlers use bearer-token auth; GETs accept anonymous callers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

/// Collection endpoints
pub mod collections;
/// Comment endpoints
pub mod comments;
/// Liveness endpoint
pub mod health;
/// Ingredient catalog endpoints
pub mod ingredients;
/// Rating endpoints
pub mod ratings;
/// Recipe endpoints
pub mod recipes;
/// Registration, login, and profile endpoints
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Serialize;

use crate::database::OwnerRef;
use crate::errors::{AppError, AppResult};

pub use collections::CollectionsRoutes;
pub use comments::CommentsRoutes;
pub use health::HealthRoutes;
pub use ingredients::IngredientsRoutes;
pub use ratings::RatingsRoutes;
pub use recipes::RecipesRoutes;
pub use users::UsersRoutes;

/// Owner projection embedded in resource responses
#[derive(Debug, Serialize)]
pub struct OwnerResponse {
    /// Owner's public id
    pub id: String,
    /// Owner's username
    pub username: String,
}

impl From<OwnerRef> for OwnerResponse {
    fn from(owner: OwnerRef) -> Self {
        Self {
            id: owner.id.to_string(),
            username: owner.username,
        }
    }
}

/// Acknowledgement body for deletes and other side-effect-only operations
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Unwrap a JSON body extraction, downgrading rejections to a 400
///
/// axum's default rejection status is 422; the API contract uses 400 for
/// every malformed or out-of-contract body, including unknown fields.
pub(crate) fn require_json<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(AppError::validation(rejection.body_text())),
    }
}
