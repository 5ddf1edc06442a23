// ABOUTME: Recipe model with ordered ingredient lines and computed ABV
// ABOUTME: Lines reference ingredients or other recipes (sub-recipes) by internal key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Recipe category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecipeKind {
    #[default]
    Cocktail,
    Mocktail,
    Juice,
    Syrup,
    Garnish,
    Other,
}

impl RecipeKind {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cocktail => "cocktail",
            Self::Mocktail => "mocktail",
            Self::Juice => "juice",
            Self::Syrup => "syrup",
            Self::Garnish => "garnish",
            Self::Other => "other",
        }
    }
}

impl Display for RecipeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecipeKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cocktail" => Ok(Self::Cocktail),
            "mocktail" => Ok(Self::Mocktail),
            "juice" => Ok(Self::Juice),
            "syrup" => Ok(Self::Syrup),
            "garnish" => Ok(Self::Garnish),
            "other" => Ok(Self::Other),
            _ => Err(AppError::validation(format!("Invalid recipe type: {s}"))),
        }
    }
}

/// Preparation method; determines the ice-melt dilution multiplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MixMethod {
    #[default]
    Shaken,
    Stirred,
    Other,
}

impl MixMethod {
    /// Dilution multiplier applied to total volume before the ABV division
    ///
    /// Models water added by ice melt during preparation.
    #[must_use]
    pub const fn dilution_factor(&self) -> f64 {
        match self {
            Self::Shaken => 1.25,
            Self::Stirred => 1.15,
            Self::Other => 1.0,
        }
    }

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shaken => "shaken",
            Self::Stirred => "stirred",
            Self::Other => "other",
        }
    }
}

impl Display for MixMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MixMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shaken" => Ok(Self::Shaken),
            "stirred" => Ok(Self::Stirred),
            "other" => Ok(Self::Other),
            _ => Err(AppError::validation(format!("Invalid recipe method: {s}"))),
        }
    }
}

/// One line of a recipe: a quantity of an ingredient or of a sub-recipe
///
/// `target_key` is a tagged reference: it resolves against the ingredient
/// table when `is_recipe` is false and against the recipe table otherwise.
/// Stored as JSON inside the recipe document, order-preserving.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientLine {
    /// Quantity in `unit`, non-negative
    pub quantity: f64,
    /// Measurement unit; only `"oz"` lines participate in ABV math
    pub unit: String,
    /// Internal key of the referenced ingredient or recipe
    pub target_key: Uuid,
    /// Discriminant of the tagged reference
    pub is_recipe: bool,
}

/// A recipe composed of ingredient lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Internal surrogate key
    pub key: Uuid,
    /// Public id
    pub id: Uuid,
    /// Category
    pub kind: RecipeKind,
    /// Display name (case-insensitive sort key for listings)
    pub name: String,
    /// Short description
    pub description: String,
    /// Preparation instructions
    pub instructions: String,
    /// Preparation method
    pub method: MixMethod,
    /// Ordered ingredient lines
    pub ingredients: Vec<IngredientLine>,
    /// Computed alcohol by volume; always server-derived from the lines
    pub abv: f64,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Whether this recipe is meant to be used inside other recipes
    pub is_subrecipe: bool,
    /// Whether anonymous and non-owner reads are allowed
    pub is_public: bool,
    /// Soft-delete flag
    pub is_deleted: bool,
    /// Owning user's internal key
    pub owner_key: Uuid,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dilution_factors() {
        assert!(MixMethod::Shaken.dilution_factor() > MixMethod::Stirred.dilution_factor());
        assert!((MixMethod::Other.dilution_factor() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(MixMethod::from_str("stirred").unwrap(), MixMethod::Stirred);
        assert!(MixMethod::from_str("blended").is_err());
    }

    #[test]
    fn test_line_json_round_trip() {
        let line = IngredientLine {
            quantity: 0.75,
            unit: "oz".into(),
            target_key: Uuid::new_v4(),
            is_recipe: false,
        };
        let json = serde_json::to_string(&line).unwrap();
        assert_eq!(serde_json::from_str::<IngredientLine>(&json).unwrap(), line);
    }
}
