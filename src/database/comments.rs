// ABOUTME: Comment persistence: threaded annotations under recipes, ingredients or ratings
// ABOUTME: Creation and deletion maintain the parent's reply list in the same transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_json, parse_owner, parse_timestamp, parse_uuid, placeholders, to_json, OwnerRef};
use crate::errors::{AppError, AppResult};
use crate::models::comment::{Comment, RefKind};

const SELECT_WITH_OWNER: &str = r"
    SELECT c.*, u.id AS owner_id, u.username AS owner_username
    FROM comments c
    JOIN users u ON u.key = c.owner_key
";

/// Database operations for comments
pub struct CommentManager {
    pool: SqlitePool,
}

pub(crate) fn row_to_comment(row: &SqliteRow) -> AppResult<Comment> {
    let root_kind: String = row
        .try_get("root_kind")
        .map_err(|e| AppError::database(e.to_string()))?;
    let parent_kind: String = row
        .try_get("parent_kind")
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Comment {
        key: parse_uuid(row, "key")?,
        id: parse_uuid(row, "id")?,
        root_key: parse_uuid(row, "root_key")?,
        root_kind: root_kind
            .parse::<RefKind>()
            .map_err(|e| AppError::database(format!("Corrupt root_kind column: {e}")))?,
        parent_key: parse_uuid(row, "parent_key")?,
        parent_kind: parent_kind
            .parse::<RefKind>()
            .map_err(|e| AppError::database(format!("Corrupt parent_kind column: {e}")))?,
        owner_key: parse_uuid(row, "owner_key")?,
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

impl CommentManager {
    /// Create a new manager over the given pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a comment and register it on its parent's reply list
    ///
    /// Both writes happen in one transaction. Parents that do not track
    /// replies (recipes, ingredients) only get the insert.
    ///
    /// # Errors
    ///
    /// Returns a database error if any statement fails; the transaction is
    /// rolled back and nothing is written.
    pub async fn create_threaded(&self, comment: &Comment) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO comments (key, id, root_key, root_kind, parent_key, parent_kind,
                                  owner_key, comment, replies, is_edited, created_at,
                                  last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(comment.key.to_string())
        .bind(comment.id.to_string())
        .bind(comment.root_key.to_string())
        .bind(comment.root_kind.as_str())
        .bind(comment.parent_key.to_string())
        .bind(comment.parent_kind.as_str())
        .bind(comment.owner_key.to_string())
        .bind(&comment.comment)
        .bind(to_json(&comment.replies)?)
        .bind(i64::from(comment.is_edited))
        .bind(comment.created_at.to_rfc3339())
        .bind(comment.last_updated.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create comment: {e}")))?;

        if comment.parent_kind.tracks_replies() {
            let sql = format!(
                "UPDATE {} SET replies = json_insert(replies, '$[#]', ?) WHERE key = ?",
                comment.parent_kind.as_str()
            );
            sqlx::query(&sql)
                .bind(comment.key.to_string())
                .bind(comment.parent_key.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to register reply: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit comment: {e}")))?;

        Ok(())
    }

    /// Fetch a comment by public id
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<(Comment, OwnerRef)>> {
        let row = sqlx::query(&format!("{SELECT_WITH_OWNER} WHERE c.id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get comment: {e}")))?;

        row.map(|r| Ok((row_to_comment(&r)?, parse_owner(&r)?)))
            .transpose()
    }

    /// Fetch a comment by internal key
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_key(&self, key: Uuid) -> AppResult<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE key = ?")
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get comment: {e}")))?;
        row.map(|r| row_to_comment(&r)).transpose()
    }

    /// Fetch comments by internal key, in no particular order
    ///
    /// Keys that no longer resolve are silently skipped; reply lists may
    /// briefly reference comments deleted by a concurrent cascade.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn fetch_by_keys(&self, keys: &[Uuid]) -> AppResult<Vec<(Comment, OwnerRef)>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{SELECT_WITH_OWNER} WHERE c.key IN ({})",
            placeholders(keys.len())
        );
        let mut query = sqlx::query(&sql);
        for key in keys {
            query = query.bind(key.to_string());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch comments: {e}")))?;

        rows.iter()
            .map(|r| Ok((row_to_comment(r)?, parse_owner(r)?)))
            .collect()
    }

    /// List comments directly attached to a parent, newest first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_for_parent(&self, parent_key: Uuid) -> AppResult<Vec<(Comment, OwnerRef)>> {
        let rows = sqlx::query(&format!(
            "{SELECT_WITH_OWNER} WHERE c.parent_key = ? ORDER BY c.created_at DESC"
        ))
        .bind(parent_key.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list comments: {e}")))?;

        rows.iter()
            .map(|r| Ok((row_to_comment(r)?, parse_owner(r)?)))
            .collect()
    }

    /// Persist the mutable fields of a comment
    ///
    /// Root and parent references never change after creation.
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub async fn update(&self, comment: &Comment) -> AppResult<()> {
        sqlx::query(
            "UPDATE comments SET comment = ?, is_edited = ?, last_updated = ? WHERE key = ?",
        )
        .bind(&comment.comment)
        .bind(i64::from(comment.is_edited))
        .bind(comment.last_updated.to_rfc3339())
        .bind(comment.key.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update comment: {e}")))?;

        Ok(())
    }

    /// Hard-delete a comment and unregister it from its parent's reply list
    ///
    /// Replies of the deleted comment are left in place; they become
    /// unreachable through the thread but remain fetchable by id.
    ///
    /// # Errors
    ///
    /// Returns a database error if any statement fails; the transaction is
    /// rolled back and nothing is deleted.
    pub async fn delete(&self, comment: &Comment) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query("DELETE FROM comments WHERE key = ?")
            .bind(comment.key.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete comment: {e}")))?;

        if comment.parent_kind.tracks_replies() {
            let sql = format!(
                "UPDATE {} SET replies = \
                 (SELECT json_group_array(value) FROM json_each(replies) WHERE value <> ?) \
                 WHERE key = ?",
                comment.parent_kind.as_str()
            );
            sqlx::query(&sql)
                .bind(comment.key.to_string())
                .bind(comment.parent_key.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to unregister reply: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit delete: {e}")))?;

        Ok(())
    }
}
