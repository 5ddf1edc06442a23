// ABOUTME: Base ingredient catalog model with strength (ABV) attribute
// ABOUTME: Soft-deleted so historical recipe references stay resolvable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Ingredient category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IngredientKind {
    Syrup,
    Juice,
    Liquor,
    Liqueur,
    Bitters,
    Soda,
    Other,
}

impl IngredientKind {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Syrup => "syrup",
            Self::Juice => "juice",
            Self::Liquor => "liquor",
            Self::Liqueur => "liqueur",
            Self::Bitters => "bitters",
            Self::Soda => "soda",
            Self::Other => "other",
        }
    }
}

impl Display for IngredientKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IngredientKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "syrup" => Ok(Self::Syrup),
            "juice" => Ok(Self::Juice),
            "liquor" => Ok(Self::Liquor),
            "liqueur" => Ok(Self::Liqueur),
            "bitters" => Ok(Self::Bitters),
            "soda" => Ok(Self::Soda),
            "other" => Ok(Self::Other),
            _ => Err(AppError::validation(format!("Invalid ingredient type: {s}"))),
        }
    }
}

/// A base ingredient in the flat catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Internal surrogate key
    pub key: Uuid,
    /// Public id
    pub id: Uuid,
    /// Unique name (case-insensitive sort key for listings)
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Category
    pub kind: IngredientKind,
    /// Alcohol by volume, percent in [0, 100]
    pub abv: f64,
    /// Soft-delete flag; deleted ingredients stay resolvable by key
    pub is_deleted: bool,
    /// Owning user's internal key
    pub owner_key: Uuid,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub last_updated: DateTime<Utc>,
}

impl Ingredient {
    /// Create a new ingredient owned by `owner_key`
    #[must_use]
    pub fn new(
        name: String,
        description: Option<String>,
        kind: IngredientKind,
        abv: f64,
        owner_key: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            key: Uuid::new_v4(),
            id: Uuid::new_v4(),
            name,
            description,
            kind,
            abv,
            is_deleted: false,
            owner_key,
            created_at: now,
            last_updated: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            IngredientKind::from_str("liqueur").unwrap(),
            IngredientKind::Liqueur
        );
        assert!(IngredientKind::from_str("garnish").is_err());
    }
}
