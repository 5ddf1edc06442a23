// ABOUTME: Route handlers for collections: ordered recipe lists with named sections
// ABOUTME: Recipe references are validated on write and expanded to previews on read
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

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
use crate::database::{OwnerRef, RefTarget};
use crate::errors::AppError;
use crate::models::{Collection, CollectionSection};
use crate::resources::ServerResources;
use crate::routes::{require_json, MessageResponse, OwnerResponse};

/// One requested section: a named slice of recipe references
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SectionBody {
    /// Section heading
    pub name: String,
    /// Optional section text
    pub description: Option<String>,
    /// Public ids of the section's recipes, ordered
    #[serde(default)]
    pub recipes: Vec<Uuid>,
}

/// Create request for a collection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCollectionBody {
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Public ids of the flat recipe list, ordered
    #[serde(default)]
    pub recipes: Vec<Uuid>,
    /// Ordered named sections
    #[serde(default)]
    pub sections: Vec<SectionBody>,
    /// Visibility
    pub is_public: Option<bool>,
    /// Whether this collection renders as a menu
    #[serde(default)]
    pub is_menu: bool,
}

/// Update request; every field optional, merged over the stored document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCollectionBody {
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// Replacement flat recipe list
    pub recipes: Option<Vec<Uuid>>,
    /// Replacement sections
    pub sections: Option<Vec<SectionBody>>,
    /// New visibility
    pub is_public: Option<bool>,
    /// New menu flag
    pub is_menu: Option<bool>,
}

/// Reduced recipe reference inside a collection response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRefResponse {
    /// Public id
    pub id: String,
    /// Display name
    pub name: String,
    /// Computed alcohol by volume
    pub abv: f64,
    /// Soft-delete flag; weak references may point at deleted recipes
    pub is_deleted: bool,
}

/// Section projection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionResponse {
    /// Section heading
    pub name: String,
    /// Section text
    pub description: Option<String>,
    /// The section's recipes, order preserved
    pub recipes: Vec<RecipeRefResponse>,
}

/// Collection projection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResponse {
    /// Public id
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Flat recipe list, order preserved
    pub recipes: Vec<RecipeRefResponse>,
    /// Named sections, order preserved
    pub sections: Vec<SectionResponse>,
    /// Visibility
    pub is_public: bool,
    /// Menu flag
    pub is_menu: bool,
    /// Owner projection
    pub owner: OwnerResponse,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub last_updated: String,
}

/// Map public ids through the resolved reference set into stored keys
fn ids_to_keys(ids: &[Uuid], resolved: &[RefTarget]) -> Result<Vec<Uuid>, AppError> {
    ids.iter()
        .map(|id| {
            resolved
                .iter()
                .find(|t| t.id == *id)
                .map(|t| t.key)
                .ok_or_else(|| AppError::reference_not_found("Recipe", *id))
        })
        .collect()
}

/// Collection routes
pub struct CollectionsRoutes;

impl CollectionsRoutes {
    /// Create all collection routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/collections", get(Self::handle_list))
            .route("/collections", post(Self::handle_create))
            .route("/collections/:id", get(Self::handle_get))
            .route("/collections/:id", patch(Self::handle_update))
            .route("/collections/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    fn check_visibility(
        collection: &Collection,
        caller: Option<&AuthenticatedUser>,
    ) -> Result<(), AppError> {
        if collection.is_public || caller.is_some_and(|c| c.owns_or_admin(collection.owner_key)) {
            Ok(())
        } else {
            Err(AppError::unauthorized("You do not have permission to view this collection"))
        }
    }

    /// Expand stored recipe keys (flat list plus sections) in one batch
    async fn to_response(
        resources: &Arc<ServerResources>,
        collection: Collection,
        owner: OwnerRef,
    ) -> Result<CollectionResponse, AppError> {
        let mut all_keys: Vec<Uuid> = collection.recipes.clone();
        for section in &collection.sections {
            all_keys.extend(section.recipes.iter().copied());
        }
        let recipes = resources.database.recipes().fetch_by_keys(&all_keys).await?;

        let expand = |keys: &[Uuid]| -> Vec<RecipeRefResponse> {
            // Keys that no longer resolve are skipped (weak references).
            keys.iter()
                .filter_map(|key| recipes.iter().find(|r| r.key == *key))
                .map(|r| RecipeRefResponse {
                    id: r.id.to_string(),
                    name: r.name.clone(),
                    abv: r.abv,
                    is_deleted: r.is_deleted,
                })
                .collect()
        };

        Ok(CollectionResponse {
            id: collection.id.to_string(),
            name: collection.name,
            description: collection.description,
            recipes: expand(&collection.recipes),
            sections: collection
                .sections
                .iter()
                .map(|s| SectionResponse {
                    name: s.name.clone(),
                    description: s.description.clone(),
                    recipes: expand(&s.recipes),
                })
                .collect(),
            is_public: collection.is_public,
            is_menu: collection.is_menu,
            owner: owner.into(),
            created_at: collection.created_at.to_rfc3339(),
            last_updated: collection.last_updated.to_rfc3339(),
        })
    }

    /// Resolve every referenced recipe id across the flat list and sections
    async fn resolve_all_refs(
        resources: &Arc<ServerResources>,
        recipes: &[Uuid],
        sections: &[SectionBody],
    ) -> Result<Vec<RefTarget>, AppError> {
        let mut all_ids: Vec<Uuid> = recipes.to_vec();
        for section in sections {
            all_ids.extend(section.recipes.iter().copied());
        }
        resources
            .database
            .collections()
            .resolve_recipe_refs(&all_ids)
            .await
    }

    /// Handle GET /collections
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let collections = resources.database.collections().list_public().await?;

        let mut response = Vec::with_capacity(collections.len());
        for (collection, owner) in collections {
            response.push(Self::to_response(&resources, collection, owner).await?);
        }
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /collections/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate_optional(&headers)?;

        let (collection, owner) = resources
            .database
            .collections()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Collection", id))?;
        Self::check_visibility(&collection, caller.as_ref())?;

        let response = Self::to_response(&resources, collection, owner).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /collections
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateCollectionBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;

        if body.name.trim().is_empty() {
            return Err(AppError::validation("Name is required"));
        }

        let resolved = Self::resolve_all_refs(&resources, &body.recipes, &body.sections).await?;
        let recipes = ids_to_keys(&body.recipes, &resolved)?;
        let sections: Vec<CollectionSection> = body
            .sections
            .iter()
            .map(|s| {
                Ok(CollectionSection {
                    name: s.name.clone(),
                    description: s.description.clone(),
                    recipes: ids_to_keys(&s.recipes, &resolved)?,
                })
            })
            .collect::<Result<_, AppError>>()?;

        let now = Utc::now();
        let collection = Collection {
            key: Uuid::new_v4(),
            id: Uuid::new_v4(),
            name: body.name,
            description: body.description,
            recipes,
            sections,
            is_public: body.is_public.unwrap_or(true),
            is_menu: body.is_menu,
            owner_key: caller.key,
            created_at: now,
            last_updated: now,
        };
        resources.database.collections().create(&collection).await?;
        tracing::info!(name = %collection.name, "created collection");

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

        let response = Self::to_response(&resources, collection, owner).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle PATCH /collections/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        body: Result<Json<UpdateCollectionBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;

        let (mut collection, owner) = resources
            .database
            .collections()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Collection", id))?;

        if !caller.owns_or_admin(collection.owner_key) {
            return Err(AppError::unauthorized("You do not have permission to update this collection"));
        }

        if let Some(name) = body.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("Name is required"));
            }
            collection.name = name;
        }
        if let Some(description) = body.description {
            collection.description = Some(description);
        }
        if let Some(is_public) = body.is_public {
            collection.is_public = is_public;
        }
        if let Some(is_menu) = body.is_menu {
            collection.is_menu = is_menu;
        }

        if body.recipes.is_some() || body.sections.is_some() {
            let empty_sections: Vec<SectionBody> = Vec::new();
            let resolved = Self::resolve_all_refs(
                &resources,
                body.recipes.as_deref().unwrap_or(&[]),
                body.sections.as_deref().unwrap_or(&empty_sections),
            )
            .await?;
            if let Some(flat) = body.recipes {
                collection.recipes = ids_to_keys(&flat, &resolved)?;
            }
            if let Some(sections) = body.sections {
                collection.sections = sections
                    .iter()
                    .map(|s| {
                        Ok(CollectionSection {
                            name: s.name.clone(),
                            description: s.description.clone(),
                            recipes: ids_to_keys(&s.recipes, &resolved)?,
                        })
                    })
                    .collect::<Result<_, AppError>>()?;
            }
        }

        collection.last_updated = Utc::now();
        resources.database.collections().update(&collection).await?;

        let response = Self::to_response(&resources, collection, owner).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /collections/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;

        let (collection, _) = resources
            .database
            .collections()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Collection", id))?;

        if !caller.owns_or_admin(collection.owner_key) {
            return Err(AppError::unauthorized("You do not have permission to delete this collection"));
        }

        resources
            .database
            .collections()
            .delete(collection.key)
            .await?;
        tracing::info!(name = %collection.name, "deleted collection");

        let response = MessageResponse::new("Collection deleted");
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
