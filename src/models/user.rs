// ABOUTME: User account model with role-based permissions
// ABOUTME: Users own every other entity; admins bypass ownership checks on deletes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// User role for the permission system
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular user: owns and manages their own resources
    #[default]
    User,
    /// Admin: may update or delete any resource
    Admin,
}

impl UserRole {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::validation(format!("Invalid user role: {s}"))),
        }
    }
}

/// A registered user
///
/// `key` is the internal surrogate key used by every stored reference;
/// `id` is the public identifier exposed over HTTP. Tokens carry both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Internal surrogate key
    pub key: Uuid,
    /// Public id
    pub id: Uuid,
    /// Unique display name
    pub username: String,
    /// Unique email address, used for login
    pub email: String,
    /// bcrypt password hash
    pub password_hash: String,
    /// Optional profile text
    pub bio: Option<String>,
    /// Role for permission checks
    pub role: UserRole,
    /// Soft-delete flag
    pub is_deleted: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub last_updated: DateTime<Utc>,
}

impl User {
    /// Create a new user with the given credentials
    #[must_use]
    pub fn new(username: String, email: String, password_hash: String, bio: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            key: Uuid::new_v4(),
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            bio,
            role: UserRole::User,
            is_deleted: false,
            created_at: now,
            last_updated: now,
        }
    }
}
