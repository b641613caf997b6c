//! Postgres-backed user store

use async_trait::async_trait;
use petly_shared::{normalize_email, normalize_username, NewUser, StoreError, User, UserId};
use sqlx::PgPool;

use super::UserStore;

/// User store over the `users` table.
///
/// Uniqueness is guaranteed by the `users_username_key` and `users_email_key`
/// constraints, so concurrent `create` calls for the same identity cannot
/// both succeed.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(normalize_username(username))
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn exists(&self, username_or_email: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(normalize_username(username_or_email))
        .bind(normalize_email(username_or_email))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, is_admin, created_at
            "#,
        )
        .bind(UserId::new())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.is_admin)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, is_admin = user.is_admin, "User created");

        Ok(user)
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            ORDER BY created_at ASC, username ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn count_admins(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_admin")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
