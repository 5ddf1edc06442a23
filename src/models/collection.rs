// ABOUTME: Curated collection model grouping recipe references into sections
// ABOUTME: Recipe references are weak; deleting a recipe does not touch collections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named group of recipes inside a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSection {
    /// Section heading
    pub name: String,
    /// Optional section description
    pub description: Option<String>,
    /// Ordered recipe keys
    pub recipes: Vec<Uuid>,
}

/// A curated, ordered set of recipe references
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Internal surrogate key
    pub key: Uuid,
    /// Public id
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Ordered flat recipe keys
    pub recipes: Vec<Uuid>,
    /// Ordered named sections
    pub sections: Vec<CollectionSection>,
    /// Whether anonymous and non-owner reads are allowed
    pub is_public: bool,
    /// Whether this collection renders as a menu
    pub is_menu: bool,
    /// Owning user's internal key
    pub owner_key: Uuid,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub last_updated: DateTime<Utc>,
}
