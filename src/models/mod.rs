// ABOUTME: Domain model modules for the tipple catalog
// ABOUTME: Users, ingredients, recipes, collections, and annotation types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

/// Curated recipe collections
pub mod collection;
/// Threaded comments and polymorphic references
pub mod comment;
/// Base ingredient catalog types
pub mod ingredient;
/// Ratings attached to recipes
pub mod rating;
/// Recipes and ingredient lines
pub mod recipe;
/// User accounts and roles
pub mod user;

pub use collection::{Collection, CollectionSection};
pub use comment::{Comment, RefKind};
pub use ingredient::{Ingredient, IngredientKind};
pub use rating::Rating;
pub use recipe::{IngredientLine, MixMethod, Recipe, RecipeKind};
pub use user::{User, UserRole};
