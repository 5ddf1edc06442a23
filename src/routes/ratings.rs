// ABOUTME: Route handlers for ratings: scored annotations on recipes
// ABOUTME: Deleting a rating cascades to the comment tree rooted at it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::OwnerRef;
use crate::errors::AppError;
use crate::models::rating::{Rating, RATING_MAX, RATING_MIN};
use crate::resources::ServerResources;
use crate::routes::{require_json, MessageResponse, OwnerResponse};

/// Create request for a rating
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRatingBody {
    /// Public id of the rated recipe
    pub parent: Uuid,
    /// Score, 0 to 5
    pub rating: f64,
    /// Optional review text
    pub comment: Option<String>,
}

/// Update request; the parent reference is immutable and not accepted
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateRatingBody {
    /// New score
    pub rating: Option<f64>,
    /// New review text
    pub comment: Option<String>,
}

/// List query: ratings attached to one recipe
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRatingsQuery {
    /// Public id of the parent recipe
    pub parent: Uuid,
}

/// Rating projection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    /// Public id
    pub id: String,
    /// Public id of the rated recipe
    pub parent: String,
    /// Score
    pub rating: f64,
    /// Review text
    pub comment: Option<String>,
    /// Public ids of direct comment replies, ordered oldest first
    pub replies: Vec<String>,
    /// Whether the rating was edited after creation
    pub is_edited: bool,
    /// Owner projection
    pub owner: OwnerResponse,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub last_updated: String,
}

fn validate_rating(value: f64) -> Result<(), AppError> {
    if !(RATING_MIN..=RATING_MAX).contains(&value) {
        return Err(AppError::validation(format!(
            "Rating must be between {RATING_MIN} and {RATING_MAX}, got {value}"
        )));
    }
    Ok(())
}

/// Rating routes
pub struct RatingsRoutes;

impl RatingsRoutes {
    /// Create all rating routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/ratings", get(Self::handle_list))
            .route("/ratings", post(Self::handle_create))
            .route("/ratings/:id", get(Self::handle_get))
            .route("/ratings/:id", patch(Self::handle_update))
            .route("/ratings/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Build the response projection, dereferencing parent and replies
    async fn to_response(
        resources: &Arc<ServerResources>,
        rating: Rating,
        owner: OwnerRef,
    ) -> Result<RatingResponse, AppError> {
        let parent = resources
            .database
            .recipes()
            .find_by_key(rating.parent_key)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!("Rating parent {} is missing", rating.parent_key))
            })?;

        let reply_comments = resources
            .database
            .comments()
            .fetch_by_keys(&rating.replies)
            .await?;
        // Preserve the stored reply order.
        let replies = rating
            .replies
            .iter()
            .filter_map(|key| reply_comments.iter().find(|(c, _)| c.key == *key))
            .map(|(c, _)| c.id.to_string())
            .collect();

        Ok(RatingResponse {
            id: rating.id.to_string(),
            parent: parent.id.to_string(),
            rating: rating.rating,
            comment: rating.comment,
            replies,
            is_edited: rating.is_edited,
            owner: owner.into(),
            created_at: rating.created_at.to_rfc3339(),
            last_updated: rating.last_updated.to_rfc3339(),
        })
    }

    /// Handle GET /ratings?parent=:recipeId
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListRatingsQuery>,
    ) -> Result<Response, AppError> {
        let (recipe, _) = resources
            .database
            .recipes()
            .find_active_by_id(query.parent)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe", query.parent))?;

        let ratings = resources
            .database
            .ratings()
            .list_for_parent(recipe.key)
            .await?;

        let mut response = Vec::with_capacity(ratings.len());
        for (rating, owner) in ratings {
            response.push(Self::to_response(&resources, rating, owner).await?);
        }
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /ratings/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let (rating, owner) = resources
            .database
            .ratings()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Rating", id))?;

        let response = Self::to_response(&resources, rating, owner).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /ratings
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateRatingBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;
        validate_rating(body.rating)?;

        // The rated recipe must exist and not be soft-deleted.
        let (recipe, _) = resources
            .database
            .recipes()
            .find_active_by_id(body.parent)
            .await?
            .ok_or_else(|| AppError::reference_not_found("Recipe", body.parent))?;

        let rating = Rating::new(recipe.key, caller.key, body.rating, body.comment);
        resources.database.ratings().create(&rating).await?;
        tracing::info!(recipe = %recipe.name, score = rating.rating, "created rating");

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

        let response = Self::to_response(&resources, rating, owner).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle PATCH /ratings/:id
    ///
    /// Owner-only: unlike delete, editing someone else's rating is not an
    /// admin capability.
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        body: Result<Json<UpdateRatingBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;

        let (mut rating, owner) = resources
            .database
            .ratings()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Rating", id))?;

        if caller.key != rating.owner_key {
            return Err(AppError::unauthorized("You do not have permission to update this rating"));
        }

        if let Some(value) = body.rating {
            validate_rating(value)?;
            rating.rating = value;
        }
        if let Some(comment) = body.comment {
            rating.comment = Some(comment);
        }
        rating.is_edited = true;
        rating.last_updated = Utc::now();

        resources.database.ratings().update(&rating).await?;

        let response = Self::to_response(&resources, rating, owner).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /ratings/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;

        let (rating, _) = resources
            .database
            .ratings()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Rating", id))?;

        if !caller.owns_or_admin(rating.owner_key) {
            return Err(AppError::unauthorized("You do not have permission to delete this rating"));
        }

        resources
            .database
            .ratings()
            .delete_and_cascade(rating.key)
            .await?;
        tracing::info!(rating = %rating.id, "deleted rating");

        let response = MessageResponse::new("Rating deleted");
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
