// ABOUTME: Recipe persistence: batched line-reference resolution and soft-delete cascade
// ABOUTME: Cascade hard-deletes the ratings and comment trees rooted at the recipe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_json, parse_owner, parse_timestamp, parse_uuid, placeholders, to_json, OwnerRef};
use crate::composition::{partition_line_refs, LineInput, ResolvedTarget};
use crate::errors::{AppError, AppResult};
use crate::models::recipe::{IngredientLine, MixMethod, Recipe, RecipeKind};

const SELECT_WITH_OWNER: &str = r"
    SELECT r.*, u.id AS owner_id, u.username AS owner_username
    FROM recipes r
    JOIN users u ON u.key = r.owner_key
";

/// Database operations for recipes
pub struct RecipeManager {
    pool: SqlitePool,
}

pub(crate) fn row_to_recipe(row: &SqliteRow) -> AppResult<Recipe> {
    let kind: String = row
        .try_get("kind")
        .map_err(|e| AppError::database(e.to_string()))?;
    let method: String = row
        .try_get("method")
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Recipe {
        key: parse_uuid(row, "key")?,
        id: parse_uuid(row, "id")?,
        kind: kind
            .parse::<RecipeKind>()
            .map_err(|e| AppError::database(format!("Corrupt kind column: {e}")))?,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database(e.to_string()))?,
        description: row
            .try_get("description")
            .map_err(|e| AppError::database(e.to_string()))?,
        instructions: row
            .try_get("instructions")
            .map_err(|e| AppError::database(e.to_string()))?,
        method: method
            .parse::<MixMethod>()
            .map_err(|e| AppError::database(format!("Corrupt method column: {e}")))?,
        ingredients: parse_json(row, "ingredients")?,
        abv: row
            .try_get("abv")
            .map_err(|e| AppError::database(e.to_string()))?,
        tags: parse_json(row, "tags")?,
        is_subrecipe: row
            .try_get::<i64, _>("is_subrecipe")
            .map_err(|e| AppError::database(e.to_string()))?
            != 0,
        is_public: row
            .try_get::<i64, _>("is_public")
            .map_err(|e| AppError::database(e.to_string()))?
            != 0,
        is_deleted: row
            .try_get::<i64, _>("is_deleted")
            .map_err(|e| AppError::database(e.to_string()))?
            != 0,
        owner_key: parse_uuid(row, "owner_key")?,
        created_at: parse_timestamp(row, "created_at")?,
        last_updated: parse_timestamp(row, "last_updated")?,
    })
}

/// Build a [`ResolvedTarget`] from an ingredient or recipe row
fn row_to_target(row: &SqliteRow, is_recipe: bool) -> AppResult<ResolvedTarget> {
    Ok(ResolvedTarget {
        key: parse_uuid(row, "key")?,
        id: parse_uuid(row, "id")?,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database(e.to_string()))?,
        type_name: row
            .try_get("kind")
            .map_err(|e| AppError::database(e.to_string()))?,
        abv: row
            .try_get("abv")
            .map_err(|e| AppError::database(e.to_string()))?,
        is_deleted: row
            .try_get::<i64, _>("is_deleted")
            .map_err(|e| AppError::database(e.to_string()))?
            != 0,
        is_recipe,
    })
}

impl RecipeManager {
    /// Create a new manager over the given pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new recipe
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub async fn create(&self, recipe: &Recipe) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO recipes (key, id, kind, name, description, instructions, method,
                                 ingredients, abv, tags, is_subrecipe, is_public, is_deleted,
                                 owner_key, created_at, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(recipe.key.to_string())
        .bind(recipe.id.to_string())
        .bind(recipe.kind.as_str())
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(&recipe.instructions)
        .bind(recipe.method.as_str())
        .bind(to_json(&recipe.ingredients)?)
        .bind(recipe.abv)
        .bind(to_json(&recipe.tags)?)
        .bind(i64::from(recipe.is_subrecipe))
        .bind(i64::from(recipe.is_public))
        .bind(i64::from(recipe.is_deleted))
        .bind(recipe.owner_key.to_string())
        .bind(recipe.created_at.to_rfc3339())
        .bind(recipe.last_updated.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create recipe: {e}")))?;

        Ok(())
    }

    /// List public, non-deleted recipes sorted case-insensitively by name
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_public(&self) -> AppResult<Vec<(Recipe, OwnerRef)>> {
        let rows = sqlx::query(&format!(
            "{SELECT_WITH_OWNER} WHERE r.is_deleted = 0 AND r.is_public = 1 \
             ORDER BY r.name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list recipes: {e}")))?;

        rows.iter()
            .map(|r| Ok((row_to_recipe(r)?, parse_owner(r)?)))
            .collect()
    }

    /// Fetch a non-deleted recipe by public id
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_active_by_id(&self, id: Uuid) -> AppResult<Option<(Recipe, OwnerRef)>> {
        let row = sqlx::query(&format!(
            "{SELECT_WITH_OWNER} WHERE r.id = ? AND r.is_deleted = 0"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;

        row.map(|r| Ok((row_to_recipe(&r)?, parse_owner(&r)?)))
            .transpose()
    }

    /// Fetch a recipe by public id regardless of deletion state
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<(Recipe, OwnerRef)>> {
        let row = sqlx::query(&format!("{SELECT_WITH_OWNER} WHERE r.id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;

        row.map(|r| Ok((row_to_recipe(&r)?, parse_owner(&r)?)))
            .transpose()
    }

    /// Fetch a recipe by internal key regardless of deletion state
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_key(&self, key: Uuid) -> AppResult<Option<Recipe>> {
        let row = sqlx::query("SELECT * FROM recipes WHERE key = ?")
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;
        row.map(|r| row_to_recipe(&r)).transpose()
    }

    /// Fetch recipes by internal key, in no particular order
    ///
    /// Used by collections to expand stored references; deletion state is
    /// not filtered (collection references are weak).
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn fetch_by_keys(&self, keys: &[Uuid]) -> AppResult<Vec<Recipe>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM recipes WHERE key IN ({})",
            placeholders(keys.len())
        );
        let mut query = sqlx::query(&sql);
        for key in keys {
            query = query.bind(key.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch recipes: {e}")))?;
        rows.iter().map(row_to_recipe).collect()
    }

    /// Persist the mutable fields of a recipe
    ///
    /// `is_deleted` is deliberately not part of the update: restoration is
    /// a separate explicit operation.
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub async fn update(&self, recipe: &Recipe) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE recipes
            SET kind = ?, name = ?, description = ?, instructions = ?, method = ?,
                ingredients = ?, abv = ?, tags = ?, is_subrecipe = ?, is_public = ?,
                last_updated = ?
            WHERE key = ?
            ",
        )
        .bind(recipe.kind.as_str())
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(&recipe.instructions)
        .bind(recipe.method.as_str())
        .bind(to_json(&recipe.ingredients)?)
        .bind(recipe.abv)
        .bind(to_json(&recipe.tags)?)
        .bind(i64::from(recipe.is_subrecipe))
        .bind(i64::from(recipe.is_public))
        .bind(recipe.last_updated.to_rfc3339())
        .bind(recipe.key.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update recipe: {e}")))?;

        Ok(())
    }

    /// Clear the soft-delete flag of a recipe
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub async fn restore(&self, key: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE recipes SET is_deleted = 0, last_updated = ? WHERE key = ?")
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(key.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to restore recipe: {e}")))?;
        Ok(())
    }

    /// Soft-delete a recipe and hard-delete its annotation trees
    ///
    /// Two phases in one transaction: collect the root-key set (the recipe
    /// plus every rating attached to it), delete all comments whose root is
    /// in that set, then delete the ratings.
    ///
    /// # Errors
    ///
    /// Returns a database error if any statement fails; the transaction is
    /// rolled back and nothing is deleted.
    pub async fn soft_delete_and_cascade(&self, recipe_key: Uuid) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query("UPDATE recipes SET is_deleted = 1, last_updated = ? WHERE key = ?")
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(recipe_key.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete recipe: {e}")))?;

        let rating_rows = sqlx::query("SELECT key FROM ratings WHERE parent_key = ?")
            .bind(recipe_key.to_string())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to collect ratings: {e}")))?;

        let mut root_keys = vec![recipe_key.to_string()];
        for row in &rating_rows {
            root_keys.push(
                row.try_get::<String, _>("key")
                    .map_err(|e| AppError::database(e.to_string()))?,
            );
        }

        let sql = format!(
            "DELETE FROM comments WHERE root_key IN ({})",
            placeholders(root_keys.len())
        );
        let mut query = sqlx::query(&sql);
        for key in &root_keys {
            query = query.bind(key);
        }
        query
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete comments: {e}")))?;

        sqlx::query("DELETE FROM ratings WHERE parent_key = ?")
            .bind(recipe_key.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete ratings: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit cascade: {e}")))?;

        Ok(())
    }

    /// Resolve requested line references for a create or update
    ///
    /// Issues at most two batched lookups (one per kind) against non-deleted
    /// entities, then reports the first individually missing id.
    ///
    /// # Errors
    ///
    /// Fails with `ReferenceNotFound` naming the first id that does not
    /// resolve to a non-deleted entity of the declared kind.
    pub async fn resolve_targets_for_write(
        &self,
        lines: &[LineInput],
    ) -> AppResult<Vec<ResolvedTarget>> {
        let (ingredient_ids, subrecipe_ids) = partition_line_refs(lines);
        let mut resolved = Vec::with_capacity(ingredient_ids.len() + subrecipe_ids.len());

        if !ingredient_ids.is_empty() {
            let sql = format!(
                "SELECT key, id, name, kind, abv, is_deleted FROM ingredients \
                 WHERE is_deleted = 0 AND id IN ({})",
                placeholders(ingredient_ids.len())
            );
            let mut query = sqlx::query(&sql);
            for id in &ingredient_ids {
                query = query.bind(id.to_string());
            }
            let rows = query
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to resolve ingredients: {e}")))?;
            for row in &rows {
                resolved.push(row_to_target(row, false)?);
            }
        }

        if !subrecipe_ids.is_empty() {
            let sql = format!(
                "SELECT key, id, name, kind, abv, is_deleted FROM recipes \
                 WHERE is_deleted = 0 AND id IN ({})",
                placeholders(subrecipe_ids.len())
            );
            let mut query = sqlx::query(&sql);
            for id in &subrecipe_ids {
                query = query.bind(id.to_string());
            }
            let rows = query
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to resolve subrecipes: {e}")))?;
            for row in &rows {
                resolved.push(row_to_target(row, true)?);
            }
        }

        // Report the first missing reference by its requested id and kind.
        for line in lines {
            if !resolved
                .iter()
                .any(|t| t.id == line.id && t.is_recipe == line.is_recipe)
            {
                return Err(AppError::reference_not_found(line.kind_label(), line.id));
            }
        }

        Ok(resolved)
    }

    /// Fetch the targets of stored ingredient lines by internal key
    ///
    /// Unlike write-time resolution this includes soft-deleted targets:
    /// recipes may keep referencing deleted entities after the fact.
    ///
    /// # Errors
    ///
    /// Returns a database error if a query fails.
    pub async fn fetch_line_targets(
        &self,
        lines: &[IngredientLine],
    ) -> AppResult<Vec<ResolvedTarget>> {
        let mut ingredient_keys = Vec::new();
        let mut recipe_keys = Vec::new();
        for line in lines {
            let bucket = if line.is_recipe {
                &mut recipe_keys
            } else {
                &mut ingredient_keys
            };
            if !bucket.contains(&line.target_key) {
                bucket.push(line.target_key);
            }
        }

        let mut resolved = Vec::with_capacity(ingredient_keys.len() + recipe_keys.len());

        if !ingredient_keys.is_empty() {
            let sql = format!(
                "SELECT key, id, name, kind, abv, is_deleted FROM ingredients WHERE key IN ({})",
                placeholders(ingredient_keys.len())
            );
            let mut query = sqlx::query(&sql);
            for key in &ingredient_keys {
                query = query.bind(key.to_string());
            }
            let rows = query
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to fetch line targets: {e}")))?;
            for row in &rows {
                resolved.push(row_to_target(row, false)?);
            }
        }

        if !recipe_keys.is_empty() {
            let sql = format!(
                "SELECT key, id, name, kind, abv, is_deleted FROM recipes WHERE key IN ({})",
                placeholders(recipe_keys.len())
            );
            let mut query = sqlx::query(&sql);
            for key in &recipe_keys {
                query = query.bind(key.to_string());
            }
            let rows = query
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to fetch line targets: {e}")))?;
            for row in &rows {
                resolved.push(row_to_target(row, true)?);
            }
        }

        Ok(resolved)
    }
}
