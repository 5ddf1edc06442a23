// ABOUTME: Ingredient catalog persistence
// ABOUTME: Case-insensitive ordered listings and soft deletes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{map_insert_error, parse_owner, parse_timestamp, parse_uuid, OwnerRef};
use crate::errors::{AppError, AppResult};
use crate::models::ingredient::{Ingredient, IngredientKind};

const SELECT_WITH_OWNER: &str = r"
    SELECT i.*, u.id AS owner_id, u.username AS owner_username
    FROM ingredients i
    JOIN users u ON u.key = i.owner_key
";

/// Database operations for the ingredient catalog
pub struct IngredientManager {
    pool: SqlitePool,
}

pub(crate) fn row_to_ingredient(row: &SqliteRow) -> AppResult<Ingredient> {
    let kind: String = row
        .try_get("kind")
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Ingredient {
        key: parse_uuid(row, "key")?,
        id: parse_uuid(row, "id")?,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database(e.to_string()))?,
        description: row
            .try_get("description")
            .map_err(|e| AppError::database(e.to_string()))?,
        kind: kind
            .parse::<IngredientKind>()
            .map_err(|e| AppError::database(format!("Corrupt kind column: {e}")))?,
        abv: row
            .try_get("abv")
            .map_err(|e| AppError::database(e.to_string()))?,
        is_deleted: row
            .try_get::<i64, _>("is_deleted")
            .map_err(|e| AppError::database(e.to_string()))?
            != 0,
        owner_key: parse_uuid(row, "owner_key")?,
        created_at: parse_timestamp(row, "created_at")?,
        last_updated: parse_timestamp(row, "last_updated")?,
    })
}

impl IngredientManager {
    /// Create a new manager over the given pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new ingredient
    ///
    /// # Errors
    ///
    /// Returns a validation error when the name is already taken, a
    /// database error otherwise.
    pub async fn create(&self, ingredient: &Ingredient) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO ingredients (key, id, name, description, kind, abv,
                                     is_deleted, owner_key, created_at, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(ingredient.key.to_string())
        .bind(ingredient.id.to_string())
        .bind(&ingredient.name)
        .bind(&ingredient.description)
        .bind(ingredient.kind.as_str())
        .bind(ingredient.abv)
        .bind(i64::from(ingredient.is_deleted))
        .bind(ingredient.owner_key.to_string())
        .bind(ingredient.created_at.to_rfc3339())
        .bind(ingredient.last_updated.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "An ingredient with this name already exists"))?;

        Ok(())
    }

    /// List non-deleted ingredients, sorted case-insensitively by name
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_active(&self) -> AppResult<Vec<(Ingredient, OwnerRef)>> {
        let rows = sqlx::query(&format!(
            "{SELECT_WITH_OWNER} WHERE i.is_deleted = 0 ORDER BY i.name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list ingredients: {e}")))?;

        rows.iter()
            .map(|r| Ok((row_to_ingredient(r)?, parse_owner(r)?)))
            .collect()
    }

    /// Fetch a non-deleted ingredient by public id
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_active_by_id(&self, id: Uuid) -> AppResult<Option<(Ingredient, OwnerRef)>> {
        let row = sqlx::query(&format!(
            "{SELECT_WITH_OWNER} WHERE i.id = ? AND i.is_deleted = 0"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get ingredient: {e}")))?;

        row.map(|r| Ok((row_to_ingredient(&r)?, parse_owner(&r)?)))
            .transpose()
    }

    /// Persist the mutable fields of an ingredient
    ///
    /// The key, owner, and creation time never change.
    ///
    /// # Errors
    ///
    /// Returns a validation error on a name conflict, a database error
    /// otherwise.
    pub async fn update(&self, ingredient: &Ingredient) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE ingredients
            SET name = ?, description = ?, kind = ?, abv = ?, last_updated = ?
            WHERE key = ?
            ",
        )
        .bind(&ingredient.name)
        .bind(&ingredient.description)
        .bind(ingredient.kind.as_str())
        .bind(ingredient.abv)
        .bind(ingredient.last_updated.to_rfc3339())
        .bind(ingredient.key.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "An ingredient with this name already exists"))?;

        Ok(())
    }

    /// Soft-delete an ingredient
    ///
    /// The document is retained: historical recipe lines keep resolving.
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub async fn soft_delete(&self, key: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE ingredients SET is_deleted = 1, last_updated = ? WHERE key = ?")
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(key.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete ingredient: {e}")))?;
        Ok(())
    }
}
