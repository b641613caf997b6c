//! In-memory user store

use async_trait::async_trait;
use petly_shared::{
    normalize_email, normalize_username, DuplicateField, NewUser, StoreError, User, UserId,
};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::UserStore;

/// User store kept in process memory.
///
/// Suitable for local development and tests. The uniqueness check and the
/// insert happen under one write lock, which gives the same guarantee as the
/// unique indexes in Postgres.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let username = normalize_username(username);
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn exists(&self, username_or_email: &str) -> Result<bool, StoreError> {
        let username = normalize_username(username_or_email);
        let email = normalize_email(username_or_email);
        let users = self.users.read().await;
        Ok(users
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.username == new_user.username) {
            return Err(StoreError::Duplicate(DuplicateField::Username));
        }
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::Duplicate(DuplicateField::Email));
        }

        let user = User {
            id: UserId::new(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_admin: new_user.is_admin,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());

        tracing::info!(user_id = %user.id, is_admin = user.is_admin, "User created");

        Ok(user)
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        // Insertion order is creation order
        Ok(self.users.read().await.clone())
    }

    async fn count_admins(&self) -> Result<i64, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| u.is_admin).count() as i64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser::new(username, email, "$argon2id$v=19$placeholder".to_string())
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = InMemoryUserStore::new();
        let alice = store.create(new_user("alice", "Alice@X.com")).await.unwrap();

        assert_eq!(alice.email, "alice@x.com");
        assert!(!alice.is_admin);
        assert_eq!(store.find_by_id(alice.id).await.unwrap(), Some(alice.clone()));
        assert_eq!(
            store.find_by_email("ALICE@x.com ").await.unwrap(),
            Some(alice.clone())
        );
        assert_eq!(store.find_by_username("alice").await.unwrap(), Some(alice));
        assert_eq!(store.find_by_username("Alice").await.unwrap(), None);
        assert_eq!(store.find_by_email("bob@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_exists_matches_either_identity() {
        let store = InMemoryUserStore::new();
        store.create(new_user("alice", "alice@x.com")).await.unwrap();

        assert!(store.exists("alice").await.unwrap());
        assert!(store.exists("alice@x.com").await.unwrap());
        assert!(store.exists("ALICE@X.COM").await.unwrap());
        assert!(!store.exists("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicates_are_rejected() {
        let store = InMemoryUserStore::new();
        store.create(new_user("alice", "alice@x.com")).await.unwrap();

        let err = store.create(new_user("alice2", "alice@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(DuplicateField::Email)));

        let err = store.create(new_user("alice", "other@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(DuplicateField::Username)));

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_admit_one() {
        let store = Arc::new(InMemoryUserStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create(new_user(&format!("user{}", i), "same@x.com"))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_and_count_admins() {
        let store = InMemoryUserStore::new();
        store.create(new_user("root", "root@x.com").admin()).await.unwrap();
        store.create(new_user("alice", "alice@x.com")).await.unwrap();

        let users = store.list_all().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "root");
        assert_eq!(store.count_admins().await.unwrap(), 1);
    }
}
