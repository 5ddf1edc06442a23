// ABOUTME: Route handlers for the ingredient catalog
// ABOUTME: Soft-delete only; deleted ingredients stay referenceable by old recipes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::OwnerRef;
use crate::errors::AppError;
use crate::models::{Ingredient, IngredientKind};
use crate::resources::ServerResources;
use crate::routes::{require_json, MessageResponse, OwnerResponse};

/// Create request for an ingredient
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateIngredientBody {
    /// Unique display name
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Category, one of the ingredient kinds
    #[serde(rename = "type")]
    pub kind: String,
    /// Strength, percent alcohol by volume; defaults to 0
    pub abv: Option<f64>,
}

/// Update request; every field optional, merged over the stored document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateIngredientBody {
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New category
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// New strength
    pub abv: Option<f64>,
}

/// Ingredient projection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientResponse {
    /// Public id
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Category
    #[serde(rename = "type")]
    pub kind: String,
    /// Strength, percent alcohol by volume
    pub abv: f64,
    /// Soft-delete flag
    pub is_deleted: bool,
    /// Owner projection
    pub owner: OwnerResponse,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub last_updated: String,
}

impl From<(Ingredient, OwnerRef)> for IngredientResponse {
    fn from((ingredient, owner): (Ingredient, OwnerRef)) -> Self {
        Self {
            id: ingredient.id.to_string(),
            name: ingredient.name,
            description: ingredient.description,
            kind: ingredient.kind.as_str().to_owned(),
            abv: ingredient.abv,
            is_deleted: ingredient.is_deleted,
            owner: owner.into(),
            created_at: ingredient.created_at.to_rfc3339(),
            last_updated: ingredient.last_updated.to_rfc3339(),
        }
    }
}

fn validate_abv(abv: f64) -> Result<(), AppError> {
    if !(0.0..=100.0).contains(&abv) {
        return Err(AppError::validation(format!(
            "Abv must be between 0 and 100, got {abv}"
        )));
    }
    Ok(())
}

/// Ingredient routes
pub struct IngredientsRoutes;

impl IngredientsRoutes {
    /// Create all ingredient routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/ingredients", get(Self::handle_list))
            .route("/ingredients", post(Self::handle_create))
            .route("/ingredients/:id", get(Self::handle_get))
            .route("/ingredients/:id", patch(Self::handle_update))
            .route("/ingredients/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Handle GET /ingredients
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let ingredients = resources.database.ingredients().list_active().await?;
        let response: Vec<IngredientResponse> =
            ingredients.into_iter().map(Into::into).collect();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /ingredients/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let found = resources
            .database
            .ingredients()
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient", id))?;

        let response: IngredientResponse = found.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /ingredients
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateIngredientBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;

        if body.name.trim().is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        let kind = IngredientKind::from_str(&body.kind)?;
        let abv = body.abv.unwrap_or(0.0);
        validate_abv(abv)?;

        let ingredient = Ingredient::new(body.name, body.description, kind, abv, caller.key);
        resources.database.ingredients().create(&ingredient).await?;
        tracing::info!(name = %ingredient.name, "created ingredient");

        let owner = resources
            .database
            .users()
            .find_by_key(caller.key)
            .await?
            .map(|u| OwnerRef {
                id: u.id,
                username: u.username,
            })
            .ok_or_else(|| AppError::internal("Owner vanished during create"))?;

        let response: IngredientResponse = (ingredient, owner).into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle PATCH /ingredients/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        body: Result<Json<UpdateIngredientBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;

        let (mut ingredient, owner) = resources
            .database
            .ingredients()
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient", id))?;

        if !caller.owns_or_admin(ingredient.owner_key) {
            return Err(AppError::unauthorized("You do not have permission to update this ingredient"));
        }

        if let Some(name) = body.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("Name is required"));
            }
            ingredient.name = name;
        }
        if let Some(description) = body.description {
            ingredient.description = Some(description);
        }
        if let Some(kind) = body.kind {
            ingredient.kind = IngredientKind::from_str(&kind)?;
        }
        if let Some(abv) = body.abv {
            validate_abv(abv)?;
            ingredient.abv = abv;
        }
        ingredient.last_updated = Utc::now();

        resources.database.ingredients().update(&ingredient).await?;

        let response: IngredientResponse = (ingredient, owner).into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /ingredients/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;

        let (ingredient, _) = resources
            .database
            .ingredients()
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient", id))?;

        if !caller.owns_or_admin(ingredient.owner_key) {
            return Err(AppError::unauthorized("You do not have permission to delete this ingredient"));
        }

        resources
            .database
            .ingredients()
            .soft_delete(ingredient.key)
            .await?;
        tracing::info!(name = %ingredient.name, "deleted ingredient");

        let response = MessageResponse::new("Ingredient deleted");
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
