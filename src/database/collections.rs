// ABOUTME: Collection persistence: recipe-list documents with optional named sections
// ABOUTME: Recipe references are validated on write but stored as weak links
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{
    parse_json, parse_owner, parse_timestamp, parse_uuid, placeholders, to_json, OwnerRef,
    RefTarget,
};
use crate::errors::{AppError, AppResult};
use crate::models::collection::Collection;

const SELECT_WITH_OWNER: &str = r"
    SELECT c.*, u.id AS owner_id, u.username AS owner_username
    FROM collections c
    JOIN users u ON u.key = c.owner_key
";

/// Database operations for collections
pub struct CollectionManager {
    pool: SqlitePool,
}

fn row_to_collection(row: &SqliteRow) -> AppResult<Collection> {
    Ok(Collection {
        key: parse_uuid(row, "key")?,
        id: parse_uuid(row, "id")?,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database(e.to_string()))?,
        description: row
            .try_get("description")
            .map_err(|e| AppError::database(e.to_string()))?,
        recipes: parse_json(row, "recipes")?,
        sections: parse_json(row, "sections")?,
        is_public: row
            .try_get::<i64, _>("is_public")
            .map_err(|e| AppError::database(e.to_string()))?
            != 0,
        is_menu: row
            .try_get::<i64, _>("is_menu")
            .map_err(|e| AppError::database(e.to_string()))?
            != 0,
        owner_key: parse_uuid(row, "owner_key")?,
        created_at: parse_timestamp(row, "created_at")?,
        last_updated: parse_timestamp(row, "last_updated")?,
    })
}

impl CollectionManager {
    /// Create a new manager over the given pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new collection
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub async fn create(&self, collection: &Collection) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO collections (key, id, name, description, recipes, sections,
                                     is_public, is_menu, owner_key, created_at, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(collection.key.to_string())
        .bind(collection.id.to_string())
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(to_json(&collection.recipes)?)
        .bind(to_json(&collection.sections)?)
        .bind(i64::from(collection.is_public))
        .bind(i64::from(collection.is_menu))
        .bind(collection.owner_key.to_string())
        .bind(collection.created_at.to_rfc3339())
        .bind(collection.last_updated.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create collection: {e}")))?;

        Ok(())
    }

    /// List public collections sorted case-insensitively by name
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_public(&self) -> AppResult<Vec<(Collection, OwnerRef)>> {
        let rows = sqlx::query(&format!(
            "{SELECT_WITH_OWNER} WHERE c.is_public = 1 ORDER BY c.name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list collections: {e}")))?;

        rows.iter()
            .map(|r| Ok((row_to_collection(r)?, parse_owner(r)?)))
            .collect()
    }

    /// Fetch a collection by public id
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<(Collection, OwnerRef)>> {
        let row = sqlx::query(&format!("{SELECT_WITH_OWNER} WHERE c.id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get collection: {e}")))?;

        row.map(|r| Ok((row_to_collection(&r)?, parse_owner(&r)?)))
            .transpose()
    }

    /// Persist the mutable fields of a collection
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub async fn update(&self, collection: &Collection) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE collections
            SET name = ?, description = ?, recipes = ?, sections = ?,
                is_public = ?, is_menu = ?, last_updated = ?
            WHERE key = ?
            ",
        )
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(to_json(&collection.recipes)?)
        .bind(to_json(&collection.sections)?)
        .bind(i64::from(collection.is_public))
        .bind(i64::from(collection.is_menu))
        .bind(collection.last_updated.to_rfc3339())
        .bind(collection.key.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update collection: {e}")))?;

        Ok(())
    }

    /// Hard-delete a collection
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub async fn delete(&self, key: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM collections WHERE key = ?")
            .bind(key.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete collection: {e}")))?;
        Ok(())
    }

    /// Resolve public recipe ids to key/id pairs for storage
    ///
    /// Every id must name an existing, non-deleted recipe. One batched
    /// lookup regardless of list size.
    ///
    /// # Errors
    ///
    /// Fails with `ReferenceNotFound` naming the first missing id.
    pub async fn resolve_recipe_refs(&self, ids: &[Uuid]) -> AppResult<Vec<RefTarget>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut unique: Vec<Uuid> = Vec::new();
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        let sql = format!(
            "SELECT key, id FROM recipes WHERE is_deleted = 0 AND id IN ({})",
            placeholders(unique.len())
        );
        let mut query = sqlx::query(&sql);
        for id in &unique {
            query = query.bind(id.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to verify recipes: {e}")))?;

        let mut resolved = Vec::with_capacity(rows.len());
        for row in &rows {
            resolved.push(RefTarget {
                key: parse_uuid(row, "key")?,
                id: parse_uuid(row, "id")?,
            });
        }
        for id in &unique {
            if !resolved.iter().any(|t| t.id == *id) {
                return Err(AppError::reference_not_found("Recipe", *id));
            }
        }
        Ok(resolved)
    }
}
