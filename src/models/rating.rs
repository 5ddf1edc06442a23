// ABOUTME: Rating model: a score with optional text, attached to a recipe
// ABOUTME: Carries the ordered reply list maintained by the comment engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest accepted rating value
pub const RATING_MIN: f64 = 0.0;
/// Highest accepted rating value
pub const RATING_MAX: f64 = 5.0;

/// A rating attached to a recipe
///
/// `parent_key` is immutable after creation. Comments replying to this
/// rating are registered in `replies` (internal comment keys, in creation
/// order) by the annotation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    /// Internal surrogate key
    pub key: Uuid,
    /// Public id
    pub id: Uuid,
    /// Rated recipe's internal key, immutable
    pub parent_key: Uuid,
    /// Rating author's internal key
    pub owner_key: Uuid,
    /// Score in [0, 5]
    pub rating: f64,
    /// Optional review text
    pub comment: Option<String>,
    /// Ordered keys of comments replying to this rating
    pub replies: Vec<Uuid>,
    /// Set on every successful update
    pub is_edited: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub last_updated: DateTime<Utc>,
}

impl Rating {
    /// Create a new rating of `parent_key` by `owner_key`
    #[must_use]
    pub fn new(parent_key: Uuid, owner_key: Uuid, rating: f64, comment: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            key: Uuid::new_v4(),
            id: Uuid::new_v4(),
            parent_key,
            owner_key,
            rating,
            comment,
            replies: Vec::new(),
            is_edited: false,
            created_at: now,
            last_updated: now,
        }
    }
}
