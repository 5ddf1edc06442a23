// ABOUTME: User account persistence
// ABOUTME: Registration inserts, login lookup by email, and public-id reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{map_insert_error, parse_timestamp, parse_uuid};
use crate::errors::{AppError, AppResult};
use crate::models::user::{User, UserRole};

/// Database operations for user accounts
pub struct UserManager {
    pool: SqlitePool,
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    use sqlx::Row;
    let role: String = row
        .try_get("role")
        .map_err(|e| AppError::database(format!("Missing column role: {e}")))?;
    Ok(User {
        key: parse_uuid(row, "key")?,
        id: parse_uuid(row, "id")?,
        username: row
            .try_get("username")
            .map_err(|e| AppError::database(e.to_string()))?,
        email: row
            .try_get("email")
            .map_err(|e| AppError::database(e.to_string()))?,
        password_hash: row
            .try_get("password_hash")
            .map_err(|e| AppError::database(e.to_string()))?,
        bio: row
            .try_get("bio")
            .map_err(|e| AppError::database(e.to_string()))?,
        role: role
            .parse::<UserRole>()
            .map_err(|e| AppError::database(format!("Corrupt role column: {e}")))?,
        is_deleted: row
            .try_get::<i64, _>("is_deleted")
            .map_err(|e| AppError::database(e.to_string()))?
            != 0,
        created_at: parse_timestamp(row, "created_at")?,
        last_updated: parse_timestamp(row, "last_updated")?,
    })
}

impl UserManager {
    /// Create a new manager over the given pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    ///
    /// # Errors
    ///
    /// Returns a validation error when the username or email is already
    /// taken, a database error otherwise.
    pub async fn create(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (key, id, username, email, password_hash, bio, role,
                               is_deleted, created_at, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(user.key.to_string())
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(i64::from(user.is_deleted))
        .bind(user.created_at.to_rfc3339())
        .bind(user.last_updated.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Username or email is already taken"))?;

        Ok(())
    }

    /// Fetch a user by public id
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Fetch a user by internal key
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_key(&self, key: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE key = ?")
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Fetch a non-deleted user by email, for login
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ? AND is_deleted = 0")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;
        row.map(|r| row_to_user(&r)).transpose()
    }
}
