//! Account records.
//!
//! # Layout
//!
//! ```text
//! user:<email>     -> { "id", "email", "name", "password_hash", "created_at" }
//! user_id:<id>     -> <email>
//! ```
//!
//! Emails are normalized (trimmed, lower-cased) before they become keys.
//! The id is minted once at signup and never changes.

use chrono::{DateTime, Utc};
use repbook_core::User;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::password;
use super::store::{keys, SharedStore, StoreError};

/// A user as persisted, including the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    /// Public view, without credentials.
    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User already exists")]
    AlreadyExists,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Trims and lower-cases an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reads and writes account records in the key-value store.
#[derive(Clone)]
pub struct UserStore {
    store: SharedStore,
}

impl UserStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Creates an account. Fails if the email is already registered.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<StoredUser, UserError> {
        let email = normalize_email(email);
        if self.store.get(&keys::user(&email)).await?.is_some() {
            return Err(UserError::AlreadyExists);
        }

        let user = StoredUser {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name: name.trim().to_string(),
            password_hash: password::hash(password),
            created_at: Utc::now(),
        };

        let record = serde_json::to_string(&user).map_err(StoreError::from)?;
        self.store.set(&keys::user(&user.email), &record).await?;
        self.store.set(&keys::user_id(&user.id), &user.email).await?;

        tracing::info!(user_id = %user.id, "Created user {}", user.email);
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let email = normalize_email(email);
        match self.store.get(&keys::user(&email)).await? {
            Some(record) => Ok(Some(serde_json::from_str(&record)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        match self.store.get(&keys::user_id(id)).await? {
            Some(email) => self.find_by_email(&email).await,
            None => Ok(None),
        }
    }

    /// Returns the user if `password` matches, `None` for an unknown email
    /// or a wrong password.
    pub async fn verify(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<StoredUser>, StoreError> {
        let user = self.find_by_email(email).await?;
        Ok(user.filter(|u| password::verify(password, &u.password_hash)))
    }

    /// Lists all users, sorted by email. Unreadable records are skipped.
    pub async fn list(&self) -> Result<Vec<StoredUser>, StoreError> {
        let mut users = Vec::new();
        for key in self.store.keys(keys::USER_PREFIX).await? {
            let Some(record) = self.store.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<StoredUser>(&record) {
                Ok(user) => users.push(user),
                Err(e) => tracing::warn!("Skipping unreadable record {}: {}", key, e),
            }
        }
        Ok(users)
    }

    /// Deletes an account together with its id mapping and its workouts.
    /// Returns false if no such user exists.
    pub async fn remove(&self, email: &str) -> Result<bool, StoreError> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(false);
        };

        self.store.delete(&keys::workouts(&user.id)).await?;
        self.store.delete(&keys::user_id(&user.id)).await?;
        self.store.delete(&keys::user(&user.email)).await?;

        tracing::info!(user_id = %user.id, "Removed user {}", user.email);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::store::MemoryStore;
    use std::sync::Arc;

    fn user_store() -> (UserStore, SharedStore) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        (UserStore::new(store.clone()), store)
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (users, _) = user_store();

        let created = users
            .create("Ann@Example.com", "Ann", "secret")
            .await
            .unwrap();
        assert_eq!(created.email, "ann@example.com");
        assert_ne!(created.password_hash, "secret");

        let by_email = users.find_by_email("ann@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = users.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ann@example.com");

        assert!(users.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (users, _) = user_store();
        users.create("ann@example.com", "Ann", "a").await.unwrap();

        let err = users
            .create(" ANN@example.com", "Other", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::AlreadyExists));
        assert_eq!(err.to_string(), "User already exists");
    }

    #[tokio::test]
    async fn test_verify_password() {
        let (users, _) = user_store();
        users.create("ann@example.com", "Ann", "right").await.unwrap();

        assert!(users.verify("ann@example.com", "right").await.unwrap().is_some());
        assert!(users.verify("ann@example.com", "wrong").await.unwrap().is_none());
        assert!(users.verify("bob@example.com", "right").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_clears_all_keys() {
        let (users, store) = user_store();
        let ann = users.create("ann@example.com", "Ann", "pw").await.unwrap();
        store.set(&keys::workouts(&ann.id), "[]").await.unwrap();

        assert!(users.remove("ann@example.com").await.unwrap());
        assert!(!users.remove("ann@example.com").await.unwrap());

        assert!(store.get(&keys::user("ann@example.com")).await.unwrap().is_none());
        assert!(store.get(&keys::user_id(&ann.id)).await.unwrap().is_none());
        assert!(store.get(&keys::workouts(&ann.id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_records() {
        let (users, store) = user_store();
        users.create("b@example.com", "B", "pw").await.unwrap();
        users.create("a@example.com", "A", "pw").await.unwrap();
        store.set(&keys::user("broken@example.com"), "{").await.unwrap();

        let emails: Vec<String> = users
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.email)
            .collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
    }
}
