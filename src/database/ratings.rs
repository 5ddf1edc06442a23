// ABOUTME: Rating persistence: scored annotations attached to recipes or ingredients
// ABOUTME: Deleting a rating removes the comment tree rooted at it in one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_json, parse_owner, parse_timestamp, parse_uuid, to_json, OwnerRef};
use crate::errors::{AppError, AppResult};
use crate::models::rating::Rating;

const SELECT_WITH_OWNER: &str = r"
    SELECT r.*, u.id AS owner_id, u.username AS owner_username
    FROM ratings r
    JOIN users u ON u.key = r.owner_key
";

/// Database operations for ratings
pub struct RatingManager {
    pool: SqlitePool,
}

pub(crate) fn row_to_rating(row: &SqliteRow) -> AppResult<Rating> {
    Ok(Rating {
        key: parse_uuid(row, "key")?,
        id: parse_uuid(row, "id")?,
        parent_key: parse_uuid(row, "parent_key")?,
        owner_key: parse_uuid(row, "owner_key")?,
        rating: row
            .try_get("rating")
            .map_err(|e| AppError::database(e.to_string()))?,
        comment: row
            .try_get("comment")
            .map_err(|e| AppError::database(e.to_string()))?,
        replies: parse_json(row, "replies")?,
        is_edited: row
            .try_get::<i64, _>("is_edited")
            .map_err(|e| AppError::database(e.to_string()))?
            != 0,
        created_at: parse_timestamp(row, "created_at")?,
        last_updated: parse_timestamp(row, "last_updated")?,
    })
}

impl RatingManager {
    /// Create a new manager over the given pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new rating
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub async fn create(&self, rating: &Rating) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO ratings (key, id, parent_key, owner_key, rating, comment,
                                 replies, is_edited, created_at, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(rating.key.to_string())
        .bind(rating.id.to_string())
        .bind(rating.parent_key.to_string())
        .bind(rating.owner_key.to_string())
        .bind(rating.rating)
        .bind(&rating.comment)
        .bind(to_json(&rating.replies)?)
        .bind(i64::from(rating.is_edited))
        .bind(rating.created_at.to_rfc3339())
        .bind(rating.last_updated.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create rating: {e}")))?;

        Ok(())
    }

    /// Fetch a rating by public id
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<(Rating, OwnerRef)>> {
        let row = sqlx::query(&format!("{SELECT_WITH_OWNER} WHERE r.id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get rating: {e}")))?;

        row.map(|r| Ok((row_to_rating(&r)?, parse_owner(&r)?)))
            .transpose()
    }

    /// Fetch a rating by internal key
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_key(&self, key: Uuid) -> AppResult<Option<Rating>> {
        let row = sqlx::query("SELECT * FROM ratings WHERE key = ?")
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get rating: {e}")))?;
        row.map(|r| row_to_rating(&r)).transpose()
    }

    /// List ratings attached to a parent, newest first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_for_parent(&self, parent_key: Uuid) -> AppResult<Vec<(Rating, OwnerRef)>> {
        let rows = sqlx::query(&format!(
            "{SELECT_WITH_OWNER} WHERE r.parent_key = ? ORDER BY r.created_at DESC"
        ))
        .bind(parent_key.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list ratings: {e}")))?;

        rows.iter()
            .map(|r| Ok((row_to_rating(r)?, parse_owner(r)?)))
            .collect()
    }

    /// Persist the mutable fields of a rating
    ///
    /// The parent reference never changes after creation.
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub async fn update(&self, rating: &Rating) -> AppResult<()> {
        sqlx::query(
            "UPDATE ratings SET rating = ?, comment = ?, is_edited = ?, last_updated = ? \
             WHERE key = ?",
        )
        .bind(rating.rating)
        .bind(&rating.comment)
        .bind(i64::from(rating.is_edited))
        .bind(rating.last_updated.to_rfc3339())
        .bind(rating.key.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update rating: {e}")))?;

        Ok(())
    }

    /// Hard-delete a rating and the comment tree rooted at it
    ///
    /// # Errors
    ///
    /// Returns a database error if any statement fails; the transaction is
    /// rolled back and nothing is deleted.
    pub async fn delete_and_cascade(&self, rating_key: Uuid) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query("DELETE FROM comments WHERE root_key = ?")
            .bind(rating_key.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete comments: {e}")))?;

        sqlx::query("DELETE FROM ratings WHERE key = ?")
            .bind(rating_key.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete rating: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit cascade: {e}")))?;

        Ok(())
    }
}
