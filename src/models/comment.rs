// ABOUTME: Threaded comment model with polymorphic root/parent references
// ABOUTME: RefKind is the tag of the four-way reference union used for dispatch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// The kind tag of a polymorphic annotation reference
///
/// A comment's parent may be any of the four kinds; its root is always one
/// of the first three (the nearest non-comment ancestor).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Recipes,
    Ingredients,
    Ratings,
    Comments,
}

impl RefKind {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recipes => "recipes",
            Self::Ingredients => "ingredients",
            Self::Ratings => "ratings",
            Self::Comments => "comments",
        }
    }

    /// Singular label used in error messages
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Recipes => "Recipe",
            Self::Ingredients => "Ingredient",
            Self::Ratings => "Rating",
            Self::Comments => "Comment",
        }
    }

    /// Whether parents of this kind track their replies bidirectionally
    ///
    /// Only ratings and comments carry a `replies` list; recipes and
    /// ingredients expose their annotations by query instead.
    #[must_use]
    pub const fn tracks_replies(&self) -> bool {
        matches!(self, Self::Ratings | Self::Comments)
    }

    /// Whether this kind may serve as a comment root
    #[must_use]
    pub const fn is_root_kind(&self) -> bool {
        !matches!(self, Self::Comments)
    }
}

impl Display for RefKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RefKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recipes" => Ok(Self::Recipes),
            "ingredients" => Ok(Self::Ingredients),
            "ratings" => Ok(Self::Ratings),
            "comments" => Ok(Self::Comments),
            _ => Err(AppError::validation(format!("Invalid reference type: {s}"))),
        }
    }
}

/// A comment in a reply tree
///
/// `parent` is the immediate ancestor; `root` is the nearest non-comment
/// ancestor. Both references and their kind tags are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Internal surrogate key
    pub key: Uuid,
    /// Public id
    pub id: Uuid,
    /// Root entity's internal key, immutable
    pub root_key: Uuid,
    /// Root kind: recipes, ingredients, or ratings, immutable
    pub root_kind: RefKind,
    /// Immediate ancestor's internal key, immutable
    pub parent_key: Uuid,
    /// Parent kind: any of the four, immutable
    pub parent_kind: RefKind,
    /// Comment author's internal key
    pub owner_key: Uuid,
    /// Comment text
    pub comment: String,
    /// Ordered keys of comments replying to this one
    pub replies: Vec<Uuid>,
    /// Set on every successful update
    pub is_edited: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_kind_parse() {
        assert_eq!(RefKind::from_str("ratings").unwrap(), RefKind::Ratings);
        assert!(RefKind::from_str("users").is_err());
    }

    #[test]
    fn test_reply_tracking_kinds() {
        assert!(RefKind::Ratings.tracks_replies());
        assert!(RefKind::Comments.tracks_replies());
        assert!(!RefKind::Recipes.tracks_replies());
        assert!(!RefKind::Ingredients.tracks_replies());
    }

    #[test]
    fn test_root_kinds() {
        assert!(RefKind::Recipes.is_root_kind());
        assert!(RefKind::Ingredients.is_root_kind());
        assert!(RefKind::Ratings.is_root_kind());
        assert!(!RefKind::Comments.is_root_kind());
    }
}
