// ABOUTME: Route handlers for recipes: CRUD, preview listing, and restore
// ABOUTME: ABV is recomputed server-side whenever lines or method change
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

use crate::auth::AuthenticatedUser;
use crate::composition::{compute_abv, format_lines, LineInput, ResolvedTarget};
use crate::database::OwnerRef;
use crate::errors::AppError;
use crate::models::recipe::{IngredientLine, MixMethod, Recipe, RecipeKind};
use crate::resources::ServerResources;
use crate::routes::{require_json, MessageResponse, OwnerResponse};

/// One requested ingredient line
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LineBody {
    /// Public id of the referenced ingredient or recipe
    pub id: Uuid,
    /// Quantity in `unit`
    pub quantity: f64,
    /// Measurement unit
    pub unit: String,
    /// True when the line references a sub-recipe
    #[serde(default)]
    pub is_recipe: bool,
}

impl From<LineBody> for LineInput {
    fn from(body: LineBody) -> Self {
        Self {
            id: body.id,
            quantity: body.quantity,
            unit: body.unit,
            is_recipe: body.is_recipe,
        }
    }
}

/// Create request for a recipe
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRecipeBody {
    /// Category; defaults to cocktail
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Display name
    pub name: String,
    /// Short description
    pub description: Option<String>,
    /// Preparation instructions
    pub instructions: Option<String>,
    /// Preparation method; defaults to shaken
    pub method: Option<String>,
    /// Ordered ingredient lines
    #[serde(default)]
    pub ingredients: Vec<LineBody>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether this recipe is meant for use inside other recipes
    #[serde(default)]
    pub is_subrecipe: bool,
    /// Whether anonymous and non-owner reads are allowed
    pub is_public: Option<bool>,
}

/// Update request; every field optional, merged over the stored document
///
/// Neither `abv` nor `isDeleted` is accepted here: the former is always
/// server-computed and the latter only changes via delete and restore.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateRecipeBody {
    /// New category
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New instructions
    pub instructions: Option<String>,
    /// New preparation method
    pub method: Option<String>,
    /// Replacement ingredient lines
    pub ingredients: Option<Vec<LineBody>>,
    /// Replacement tags
    pub tags: Option<Vec<String>>,
    /// New sub-recipe flag
    pub is_subrecipe: Option<bool>,
    /// New visibility
    pub is_public: Option<bool>,
}

/// Expanded ingredient line in a full recipe response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResponse {
    /// Target's public id
    pub id: String,
    /// Quantity in `unit`
    pub quantity: f64,
    /// Measurement unit
    pub unit: String,
    /// Target's display name
    pub name: String,
    /// Target's category
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the target is a sub-recipe
    pub is_recipe: bool,
    /// Whether the target has since been soft-deleted
    pub is_deleted: bool,
}

/// Full recipe projection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    /// Public id
    pub id: String,
    /// Category
    #[serde(rename = "type")]
    pub kind: String,
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// Preparation instructions
    pub instructions: String,
    /// Preparation method
    pub method: String,
    /// Expanded ingredient lines, input order preserved
    pub ingredients: Vec<LineResponse>,
    /// Computed alcohol by volume
    pub abv: f64,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Sub-recipe flag
    pub is_subrecipe: bool,
    /// Visibility
    pub is_public: bool,
    /// Soft-delete flag
    pub is_deleted: bool,
    /// Owner projection
    pub owner: OwnerResponse,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub last_updated: String,
}

/// Reduced projection for list views: lines collapse to target names
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Public id
    pub id: String,
    /// Category
    #[serde(rename = "type")]
    pub kind: String,
    /// Display name
    pub name: String,
    /// Preparation method
    pub method: String,
    /// Target names of the ingredient lines, input order preserved
    pub ingredients: Vec<String>,
    /// Computed alcohol by volume
    pub abv: f64,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Owner projection
    pub owner: OwnerResponse,
}

/// Expand stored lines against their fetched targets, preserving order
fn expand_lines(
    lines: &[IngredientLine],
    targets: &[ResolvedTarget],
) -> Result<Vec<LineResponse>, AppError> {
    lines
        .iter()
        .map(|line| {
            let target = targets
                .iter()
                .find(|t| t.key == line.target_key && t.is_recipe == line.is_recipe)
                .ok_or_else(|| {
                    AppError::internal(format!(
                        "Stored line target {} is missing",
                        line.target_key
                    ))
                })?;
            Ok(LineResponse {
                id: target.id.to_string(),
                quantity: line.quantity,
                unit: line.unit.clone(),
                name: target.name.clone(),
                kind: target.type_name.clone(),
                is_recipe: line.is_recipe,
                is_deleted: target.is_deleted,
            })
        })
        .collect()
}

fn to_full_response(
    recipe: Recipe,
    owner: OwnerRef,
    targets: &[ResolvedTarget],
) -> Result<RecipeResponse, AppError> {
    let ingredients = expand_lines(&recipe.ingredients, targets)?;
    Ok(RecipeResponse {
        id: recipe.id.to_string(),
        kind: recipe.kind.as_str().to_owned(),
        name: recipe.name,
        description: recipe.description,
        instructions: recipe.instructions,
        method: recipe.method.as_str().to_owned(),
        ingredients,
        abv: recipe.abv,
        tags: recipe.tags,
        is_subrecipe: recipe.is_subrecipe,
        is_public: recipe.is_public,
        is_deleted: recipe.is_deleted,
        owner: owner.into(),
        created_at: recipe.created_at.to_rfc3339(),
        last_updated: recipe.last_updated.to_rfc3339(),
    })
}

fn to_preview_response(
    recipe: Recipe,
    owner: OwnerRef,
    targets: &[ResolvedTarget],
) -> Result<PreviewResponse, AppError> {
    let ingredients = expand_lines(&recipe.ingredients, targets)?
        .into_iter()
        .map(|line| line.name)
        .collect();
    Ok(PreviewResponse {
        id: recipe.id.to_string(),
        kind: recipe.kind.as_str().to_owned(),
        name: recipe.name,
        method: recipe.method.as_str().to_owned(),
        ingredients,
        abv: recipe.abv,
        tags: recipe.tags,
        owner: owner.into(),
    })
}

/// Recipe routes
pub struct RecipesRoutes;

impl RecipesRoutes {
    /// Create all recipe routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/recipes", get(Self::handle_list))
            .route("/recipes", post(Self::handle_create))
            .route("/recipes/preview", get(Self::handle_preview))
            .route("/recipes/:id", get(Self::handle_get))
            .route("/recipes/:id", patch(Self::handle_update))
            .route("/recipes/:id", delete(Self::handle_delete))
            .route("/recipes/:id/restore", post(Self::handle_restore))
            .with_state(resources)
    }

    /// Fetch the line targets of several recipes in one batched lookup
    async fn batch_targets(
        resources: &Arc<ServerResources>,
        recipes: &[(Recipe, OwnerRef)],
    ) -> Result<Vec<ResolvedTarget>, AppError> {
        let all_lines: Vec<IngredientLine> = recipes
            .iter()
            .flat_map(|(r, _)| r.ingredients.iter().cloned())
            .collect();
        resources
            .database
            .recipes()
            .fetch_line_targets(&all_lines)
            .await
    }

    fn check_visibility(
        recipe: &Recipe,
        caller: Option<&AuthenticatedUser>,
    ) -> Result<(), AppError> {
        if recipe.is_public || caller.is_some_and(|c| c.owns_or_admin(recipe.owner_key)) {
            Ok(())
        } else {
            Err(AppError::unauthorized("You do not have permission to view this recipe"))
        }
    }

    /// Handle GET /recipes
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let recipes = resources.database.recipes().list_public().await?;
        let targets = Self::batch_targets(&resources, &recipes).await?;

        let response: Vec<RecipeResponse> = recipes
            .into_iter()
            .map(|(recipe, owner)| to_full_response(recipe, owner, &targets))
            .collect::<Result<_, _>>()?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /recipes/preview
    async fn handle_preview(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let recipes = resources.database.recipes().list_public().await?;
        let targets = Self::batch_targets(&resources, &recipes).await?;

        let response: Vec<PreviewResponse> = recipes
            .into_iter()
            .map(|(recipe, owner)| to_preview_response(recipe, owner, &targets))
            .collect::<Result<_, _>>()?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /recipes/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate_optional(&headers)?;

        let (recipe, owner) = resources
            .database
            .recipes()
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe", id))?;
        Self::check_visibility(&recipe, caller.as_ref())?;

        let targets = resources
            .database
            .recipes()
            .fetch_line_targets(&recipe.ingredients)
            .await?;

        let response = to_full_response(recipe, owner, &targets)?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /recipes
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateRecipeBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;

        if body.name.trim().is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        let kind = body
            .kind
            .as_deref()
            .map(RecipeKind::from_str)
            .transpose()?
            .unwrap_or_default();
        let method = body
            .method
            .as_deref()
            .map(MixMethod::from_str)
            .transpose()?
            .unwrap_or_default();

        let lines: Vec<LineInput> = body.ingredients.into_iter().map(Into::into).collect();
        let resolved = resources
            .database
            .recipes()
            .resolve_targets_for_write(&lines)
            .await?;
        let stored = format_lines(&resolved, &lines)?;
        let abv = compute_abv(&resolved, &lines, method)?;

        let now = Utc::now();
        let recipe = Recipe {
            key: Uuid::new_v4(),
            id: Uuid::new_v4(),
            kind,
            name: body.name,
            description: body.description.unwrap_or_default(),
            instructions: body.instructions.unwrap_or_default(),
            method,
            ingredients: stored,
            abv,
            tags: body.tags,
            is_subrecipe: body.is_subrecipe,
            is_public: body.is_public.unwrap_or(true),
            is_deleted: false,
            owner_key: caller.key,
            created_at: now,
            last_updated: now,
        };
        resources.database.recipes().create(&recipe).await?;
        tracing::info!(name = %recipe.name, abv = recipe.abv, "created recipe");

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

        let response = to_full_response(recipe, owner, &resolved)?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle PATCH /recipes/:id
    ///
    /// ABV is recomputed when `ingredients` or `method` is supplied;
    /// otherwise the stored value is kept as-is.
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        body: Result<Json<UpdateRecipeBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;

        let (mut recipe, owner) = resources
            .database
            .recipes()
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe", id))?;

        if !caller.owns_or_admin(recipe.owner_key) {
            return Err(AppError::unauthorized("You do not have permission to update this recipe"));
        }

        if let Some(kind) = body.kind {
            recipe.kind = RecipeKind::from_str(&kind)?;
        }
        if let Some(name) = body.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("Name is required"));
            }
            recipe.name = name;
        }
        if let Some(description) = body.description {
            recipe.description = description;
        }
        if let Some(instructions) = body.instructions {
            recipe.instructions = instructions;
        }
        let method_changed = body.method.is_some();
        if let Some(method) = body.method {
            recipe.method = MixMethod::from_str(&method)?;
        }
        if let Some(tags) = body.tags {
            recipe.tags = tags;
        }
        if let Some(is_subrecipe) = body.is_subrecipe {
            recipe.is_subrecipe = is_subrecipe;
        }
        if let Some(is_public) = body.is_public {
            recipe.is_public = is_public;
        }

        let targets = if let Some(ingredients) = body.ingredients {
            // Replacement lines: resolve against current non-deleted entities.
            let lines: Vec<LineInput> = ingredients.into_iter().map(Into::into).collect();
            let resolved = resources
                .database
                .recipes()
                .resolve_targets_for_write(&lines)
                .await?;
            recipe.ingredients = format_lines(&resolved, &lines)?;
            recipe.abv = compute_abv(&resolved, &lines, recipe.method)?;
            resolved
        } else {
            let targets = resources
                .database
                .recipes()
                .fetch_line_targets(&recipe.ingredients)
                .await?;
            if method_changed {
                // Rebuild inputs from the stored lines so the engine can
                // recompute with the new dilution multiplier.
                let lines: Vec<LineInput> = recipe
                    .ingredients
                    .iter()
                    .map(|line| {
                        let target = targets
                            .iter()
                            .find(|t| t.key == line.target_key && t.is_recipe == line.is_recipe)
                            .ok_or_else(|| {
                                AppError::internal(format!(
                                    "Stored line target {} is missing",
                                    line.target_key
                                ))
                            })?;
                        Ok(LineInput {
                            id: target.id,
                            quantity: line.quantity,
                            unit: line.unit.clone(),
                            is_recipe: line.is_recipe,
                        })
                    })
                    .collect::<Result<_, AppError>>()?;
                recipe.abv = compute_abv(&targets, &lines, recipe.method)?;
            }
            targets
        };

        recipe.last_updated = Utc::now();
        resources.database.recipes().update(&recipe).await?;

        let response = to_full_response(recipe, owner, &targets)?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /recipes/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;

        let (recipe, _) = resources
            .database
            .recipes()
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe", id))?;

        if !caller.owns_or_admin(recipe.owner_key) {
            return Err(AppError::unauthorized("You do not have permission to delete this recipe"));
        }

        resources
            .database
            .recipes()
            .soft_delete_and_cascade(recipe.key)
            .await?;
        tracing::info!(name = %recipe.name, "deleted recipe");

        let response = MessageResponse::new("Recipe deleted");
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /recipes/:id/restore
    async fn handle_restore(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;

        let (recipe, _) = resources
            .database
            .recipes()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe", id))?;

        if !caller.owns_or_admin(recipe.owner_key) {
            return Err(AppError::unauthorized("You do not have permission to restore this recipe"));
        }

        resources.database.recipes().restore(recipe.key).await?;
        tracing::info!(name = %recipe.name, "restored recipe");

        let response = MessageResponse::new("Recipe restored");
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
