// ABOUTME: Route handlers for threaded comments on recipes, ingredients, ratings, comments
// ABOUTME: Derives the thread root at creation; linkage fields are immutable afterwards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::str::FromStr;
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

use crate::database::{Database, OwnerRef};
use crate::errors::AppError;
use crate::models::comment::{Comment, RefKind};
use crate::resources::ServerResources;
use crate::routes::{require_json, MessageResponse, OwnerResponse};

/// Create request for a comment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCommentBody {
    /// Public id of the parent entity
    pub parent: Uuid,
    /// Kind of the parent: recipes, ingredients, ratings, or comments
    pub parent_type: String,
    /// Comment text
    pub comment: String,
}

/// Update request; linkage fields are immutable and rejected as unknown
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCommentBody {
    /// New comment text
    pub comment: String,
}

/// List query: comments directly attached to one parent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsQuery {
    /// Public id of the parent entity
    pub parent: Uuid,
    /// Kind of the parent
    pub parent_type: String,
}

/// Comment projection
///
/// Linkage (`root`, `parent` and their kinds) and the reply list are only
/// populated on direct fetches; list views carry the base fields. A dangling
/// linkage reference (an orphaned reply) renders as a missing field.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    /// Public id
    pub id: String,
    /// Comment text
    pub comment: String,
    /// Whether the comment was edited after creation
    pub is_edited: bool,
    /// Owner projection
    pub owner: OwnerResponse,
    /// Public id of the thread root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Kind of the thread root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_type: Option<String>,
    /// Public id of the immediate parent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Kind of the immediate parent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    /// Public ids of direct replies, ordered oldest first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<String>>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub last_updated: String,
}

/// Comment routes
pub struct CommentsRoutes;

impl CommentsRoutes {
    /// Create all comment routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/comments", get(Self::handle_list))
            .route("/comments", post(Self::handle_create))
            .route("/comments/:id", get(Self::handle_get))
            .route("/comments/:id", patch(Self::handle_update))
            .route("/comments/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Build the response projection with the requested detail level
    async fn to_response(
        database: &Database,
        comment: Comment,
        owner: OwnerRef,
        show_refs: bool,
        show_replies: bool,
    ) -> Result<CommentResponse, AppError> {
        let (root, root_type, parent, parent_type) = if show_refs {
            let root = database
                .find_annotation_target_by_key(comment.root_kind, comment.root_key)
                .await?
                .map(|t| t.id.to_string());
            let parent = database
                .find_annotation_target_by_key(comment.parent_kind, comment.parent_key)
                .await?
                .map(|t| t.id.to_string());
            (
                root,
                Some(comment.root_kind.as_str().to_owned()),
                parent,
                Some(comment.parent_kind.as_str().to_owned()),
            )
        } else {
            (None, None, None, None)
        };

        let replies = if show_replies {
            let reply_comments = database.comments().fetch_by_keys(&comment.replies).await?;
            Some(
                comment
                    .replies
                    .iter()
                    .filter_map(|key| reply_comments.iter().find(|(c, _)| c.key == *key))
                    .map(|(c, _)| c.id.to_string())
                    .collect(),
            )
        } else {
            None
        };

        Ok(CommentResponse {
            id: comment.id.to_string(),
            comment: comment.comment,
            is_edited: comment.is_edited,
            owner: owner.into(),
            root,
            root_type,
            parent,
            parent_type,
            replies,
            created_at: comment.created_at.to_rfc3339(),
            last_updated: comment.last_updated.to_rfc3339(),
        })
    }

    /// Handle GET /comments?parent=:id&parentType=:kind
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListCommentsQuery>,
    ) -> Result<Response, AppError> {
        let kind = RefKind::from_str(&query.parent_type)?;
        let parent = resources
            .database
            .find_annotation_target(kind, query.parent)
            .await?
            .ok_or_else(|| AppError::not_found(kind.label(), query.parent))?;

        let comments = resources
            .database
            .comments()
            .list_for_parent(parent.key)
            .await?;

        let mut response = Vec::with_capacity(comments.len());
        for (comment, owner) in comments {
            response
                .push(Self::to_response(&resources.database, comment, owner, false, false).await?);
        }
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /comments/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let (comment, owner) = resources
            .database
            .comments()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", id))?;

        let response =
            Self::to_response(&resources.database, comment, owner, true, true).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /comments
    ///
    /// The thread root is derived here: direct for non-comment parents,
    /// inherited from the parent comment otherwise. An inherited root is
    /// re-resolved to confirm the chain is intact.
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<CreateCommentBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;

        if body.comment.trim().is_empty() {
            return Err(AppError::validation("Comment text is required"));
        }
        let parent_kind = RefKind::from_str(&body.parent_type)?;

        let parent = resources
            .database
            .find_annotation_target(parent_kind, body.parent)
            .await?
            .ok_or_else(|| AppError::reference_not_found(parent_kind.label(), body.parent))?;

        let (root_key, root_kind) = if parent_kind.is_root_kind() {
            (parent.key, parent_kind)
        } else {
            let parent_comment = resources
                .database
                .comments()
                .find_by_key(parent.key)
                .await?
                .ok_or_else(|| AppError::reference_not_found("Comment", body.parent))?;
            // Confirm the inherited root still exists before linking to it.
            resources
                .database
                .find_annotation_target_by_key(parent_comment.root_kind, parent_comment.root_key)
                .await?
                .ok_or_else(|| {
                    AppError::reference_not_found(
                        parent_comment.root_kind.label(),
                        parent_comment.root_key,
                    )
                })?;
            (parent_comment.root_key, parent_comment.root_kind)
        };

        let now = Utc::now();
        let comment = Comment {
            key: Uuid::new_v4(),
            id: Uuid::new_v4(),
            root_key,
            root_kind,
            parent_key: parent.key,
            parent_kind,
            owner_key: caller.key,
            comment: body.comment,
            replies: Vec::new(),
            is_edited: false,
            created_at: now,
            last_updated: now,
        };
        resources.database.comments().create_threaded(&comment).await?;
        tracing::info!(parent_kind = parent_kind.as_str(), "created comment");

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

        let response =
            Self::to_response(&resources.database, comment, owner, true, true).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle PATCH /comments/:id
    ///
    /// Owner-only; admins may delete but not edit someone else's words.
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        body: Result<Json<UpdateCommentBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;
        let body = require_json(body)?;

        if body.comment.trim().is_empty() {
            return Err(AppError::validation("Comment text is required"));
        }

        let (mut comment, owner) = resources
            .database
            .comments()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", id))?;

        if caller.key != comment.owner_key {
            return Err(AppError::unauthorized("You do not have permission to update this comment"));
        }

        comment.comment = body.comment;
        comment.is_edited = true;
        comment.last_updated = Utc::now();
        resources.database.comments().update(&comment).await?;

        let response =
            Self::to_response(&resources.database, comment, owner, true, true).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /comments/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let caller = resources.auth.authenticate(&headers)?;

        let (comment, _) = resources
            .database
            .comments()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", id))?;

        if !caller.owns_or_admin(comment.owner_key) {
            return Err(AppError::unauthorized("You do not have permission to delete this comment"));
        }

        resources.database.comments().delete(&comment).await?;
        tracing::info!(comment = %comment.id, "deleted comment");

        let response = MessageResponse::new("Comment deleted");
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
