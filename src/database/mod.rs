// ABOUTME: SQLite-backed document store: schema bootstrap and per-entity managers
// ABOUTME: Also hosts the kind-dispatched lookup for polymorphic annotation references
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

//! # Document store
//!
//! SQLite is used as a generic document store: one table per entity kind,
//! list-valued fields (ingredient lines, tags, sections, replies) stored as
//! JSON text columns. Every document carries an internal surrogate `key`
//! (used by all inter-document references) and a public `id` (exposed over
//! HTTP). All list-append/remove operations on reply lists are single
//! atomic `UPDATE` statements; multi-entity cascades run in transactions.

/// Collection CRUD and recipe-reference resolution
pub mod collections;
/// Threaded comment persistence with bidirectional reply maintenance
pub mod comments;
/// Ingredient catalog persistence
pub mod ingredients;
/// Rating persistence and cascade deletion
pub mod ratings;
/// Recipe persistence, line resolution, and soft-delete cascade
pub mod recipes;
/// User account persistence
pub mod users;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::comment::RefKind;

pub use collections::CollectionManager;
pub use comments::CommentManager;
pub use ingredients::IngredientManager;
pub use ratings::RatingManager;
pub use recipes::RecipeManager;
pub use users::UserManager;

/// Schema bootstrap, applied in order at connect time
const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS users (
        key TEXT PRIMARY KEY,
        id TEXT UNIQUE NOT NULL,
        username TEXT UNIQUE NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        bio TEXT,
        role TEXT NOT NULL DEFAULT 'user',
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        last_updated TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS ingredients (
        key TEXT PRIMARY KEY,
        id TEXT UNIQUE NOT NULL,
        name TEXT UNIQUE NOT NULL COLLATE NOCASE,
        description TEXT,
        kind TEXT NOT NULL,
        abv REAL NOT NULL DEFAULT 0,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        owner_key TEXT NOT NULL REFERENCES users(key),
        created_at TEXT NOT NULL,
        last_updated TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS recipes (
        key TEXT PRIMARY KEY,
        id TEXT UNIQUE NOT NULL,
        kind TEXT NOT NULL DEFAULT 'cocktail',
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        instructions TEXT NOT NULL,
        method TEXT NOT NULL DEFAULT 'shaken',
        ingredients TEXT NOT NULL DEFAULT '[]',
        abv REAL NOT NULL DEFAULT 0,
        tags TEXT NOT NULL DEFAULT '[]',
        is_subrecipe INTEGER NOT NULL DEFAULT 0,
        is_public INTEGER NOT NULL DEFAULT 1,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        owner_key TEXT NOT NULL REFERENCES users(key),
        created_at TEXT NOT NULL,
        last_updated TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS collections (
        key TEXT PRIMARY KEY,
        id TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        recipes TEXT NOT NULL DEFAULT '[]',
        sections TEXT NOT NULL DEFAULT '[]',
        is_public INTEGER NOT NULL DEFAULT 1,
        is_menu INTEGER NOT NULL DEFAULT 0,
        owner_key TEXT NOT NULL REFERENCES users(key),
        created_at TEXT NOT NULL,
        last_updated TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS ratings (
        key TEXT PRIMARY KEY,
        id TEXT UNIQUE NOT NULL,
        parent_key TEXT NOT NULL,
        owner_key TEXT NOT NULL REFERENCES users(key),
        rating REAL NOT NULL,
        comment TEXT,
        replies TEXT NOT NULL DEFAULT '[]',
        is_edited INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        last_updated TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS comments (
        key TEXT PRIMARY KEY,
        id TEXT UNIQUE NOT NULL,
        root_key TEXT NOT NULL,
        root_kind TEXT NOT NULL,
        parent_key TEXT NOT NULL,
        parent_kind TEXT NOT NULL,
        owner_key TEXT NOT NULL REFERENCES users(key),
        comment TEXT NOT NULL,
        replies TEXT NOT NULL DEFAULT '[]',
        is_edited INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        last_updated TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_ratings_parent ON ratings(parent_key)",
    "CREATE INDEX IF NOT EXISTS idx_comments_root ON comments(root_key)",
];

/// The document store handle; cheap to clone (pool is reference-counted)
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

/// A resolved polymorphic reference: the keys of an entity of some [`RefKind`]
#[derive(Debug, Clone, Copy)]
pub struct RefTarget {
    /// Internal surrogate key
    pub key: Uuid,
    /// Public id
    pub id: Uuid,
}

/// Owner projection joined into read queries (public id + username)
#[derive(Debug, Clone)]
pub struct OwnerRef {
    /// Owner's public id
    pub id: Uuid,
    /// Owner's username
    pub username: String,
}

impl Database {
    /// Connect to the store and apply the schema bootstrap
    ///
    /// In-memory databases are pinned to a single pooled connection so the
    /// schema and data survive across acquires.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or any schema statement fails.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to {database_url}: {e}")))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| AppError::database(format!("Schema bootstrap failed: {e}")))?;
        }

        Ok(Self { pool })
    }

    /// The underlying pool, for managers and tests
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// User account manager
    #[must_use]
    pub fn users(&self) -> UserManager {
        UserManager::new(self.pool.clone())
    }

    /// Ingredient catalog manager
    #[must_use]
    pub fn ingredients(&self) -> IngredientManager {
        IngredientManager::new(self.pool.clone())
    }

    /// Recipe manager
    #[must_use]
    pub fn recipes(&self) -> RecipeManager {
        RecipeManager::new(self.pool.clone())
    }

    /// Collection manager
    #[must_use]
    pub fn collections(&self) -> CollectionManager {
        CollectionManager::new(self.pool.clone())
    }

    /// Rating manager
    #[must_use]
    pub fn ratings(&self) -> RatingManager {
        RatingManager::new(self.pool.clone())
    }

    /// Comment manager
    #[must_use]
    pub fn comments(&self) -> CommentManager {
        CommentManager::new(self.pool.clone())
    }

    /// Resolve a polymorphic reference by public id
    ///
    /// Dispatches to the table named by `kind`. Lookup is by id only:
    /// soft-deleted recipes and ingredients remain valid comment parents.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_annotation_target(
        &self,
        kind: RefKind,
        id: Uuid,
    ) -> AppResult<Option<RefTarget>> {
        self.find_ref(kind, "id", id).await
    }

    /// Resolve a polymorphic reference by internal key
    ///
    /// Used to confirm that an inherited comment root still exists.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_annotation_target_by_key(
        &self,
        kind: RefKind,
        key: Uuid,
    ) -> AppResult<Option<RefTarget>> {
        self.find_ref(kind, "key", key).await
    }

    async fn find_ref(&self, kind: RefKind, column: &str, value: Uuid) -> AppResult<Option<RefTarget>> {
        // kind -> table dispatch; the four table names are fixed
        let table = kind.as_str();
        let row = sqlx::query(&format!("SELECT key, id FROM {table} WHERE {column} = ?"))
            .bind(value.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to resolve {table} reference: {e}")))?;

        row.map(|r| {
            Ok(RefTarget {
                key: parse_uuid(&r, "key")?,
                id: parse_uuid(&r, "id")?,
            })
        })
        .transpose()
    }
}

/// Read a uuid column
pub(crate) fn parse_uuid(row: &SqliteRow, column: &str) -> AppResult<Uuid> {
    let value: String = row
        .try_get(column)
        .map_err(|e| AppError::database(format!("Missing column {column}: {e}")))?;
    Uuid::parse_str(&value).map_err(|e| AppError::database(format!("Corrupt uuid in {column}: {e}")))
}

/// Read an RFC 3339 timestamp column
pub(crate) fn parse_timestamp(row: &SqliteRow, column: &str) -> AppResult<DateTime<Utc>> {
    let value: String = row
        .try_get(column)
        .map_err(|e| AppError::database(format!("Missing column {column}: {e}")))?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Corrupt timestamp in {column}: {e}")))
}

/// Read a JSON-encoded column into a deserializable value
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    row: &SqliteRow,
    column: &str,
) -> AppResult<T> {
    let value: String = row
        .try_get(column)
        .map_err(|e| AppError::database(format!("Missing column {column}: {e}")))?;
    serde_json::from_str(&value)
        .map_err(|e| AppError::database(format!("Corrupt JSON in {column}: {e}")))
}

/// Encode a value into a JSON column
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string(value)
        .map_err(|e| AppError::database(format!("Failed to encode JSON column: {e}")))
}

/// Read the owner projection columns added by `JOIN users`
pub(crate) fn parse_owner(row: &SqliteRow) -> AppResult<OwnerRef> {
    let username: String = row
        .try_get("owner_username")
        .map_err(|e| AppError::database(format!("Missing column owner_username: {e}")))?;
    Ok(OwnerRef {
        id: parse_uuid(row, "owner_id")?,
        username,
    })
}

/// Map an insert error, converting unique violations into a 400
pub(crate) fn map_insert_error(error: sqlx::Error, conflict_message: &str) -> AppError {
    if error
        .as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
    {
        AppError::validation(conflict_message)
    } else {
        AppError::database(format!("Insert failed: {error}"))
    }
}

/// Build `?, ?, ...` placeholder lists for `IN` clauses
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
