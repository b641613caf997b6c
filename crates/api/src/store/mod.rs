//! User persistence
//!
//! Handlers only see the [`UserStore`] trait; the binary picks Postgres or the
//! in-memory store at startup.

mod memory;
mod postgres;

use async_trait::async_trait;
use petly_shared::{NewUser, StoreError, User, UserId};

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// Storage backend for user records.
///
/// Implementations must be thread-safe (`Send + Sync`) as they are shared by
/// every request handler. `create` must enforce username and email uniqueness
/// atomically, not through a separate existence check.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Lookup by email (normalized before comparison)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// True if any user has this value as username or as email
    async fn exists(&self, username_or_email: &str) -> Result<bool, StoreError>;

    /// Insert a user, failing with [`StoreError::Duplicate`] on a collision
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// All users, oldest first
    async fn list_all(&self) -> Result<Vec<User>, StoreError>;

    async fn count_admins(&self) -> Result<i64, StoreError>;

    /// Connectivity check for health probes
    async fn ping(&self) -> Result<(), StoreError>;
}
