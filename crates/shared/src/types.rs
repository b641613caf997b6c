//! Common types used across Petly

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ID Wrappers
// =============================================================================

/// User ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account as stored in the `users` table.
///
/// Deliberately not `Serialize`: the digest must never leave the server.
/// Use [`UserProfile`] for anything sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
}

/// Fields for a user that has not been persisted yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl NewUser {
    /// Build a new regular user, normalizing the username and email
    pub fn new(username: &str, email: &str, password_hash: String) -> Self {
        Self {
            username: normalize_username(username),
            email: normalize_email(email),
            password_hash,
            is_admin: false,
        }
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// Public view of a user (never includes the password digest)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Emails are the login identifier and compare case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_string()
}
