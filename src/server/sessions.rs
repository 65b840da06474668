//! Login sessions.
//!
//! A session is an opaque random token mapped to its owner under
//! `session:<token>`, stored with an expiry so the store drops it on its own.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::store::{keys, SharedStore, StoreError};
use super::users::StoredUser;

/// Owner of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

#[derive(Clone)]
pub struct SessionStore {
    store: SharedStore,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(store: SharedStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a new session for `user` and returns its token.
    pub async fn create(&self, user: &StoredUser) -> Result<String, StoreError> {
        let token = generate_token();
        let session = Session {
            user_id: user.id.clone(),
            email: user.email.clone(),
        };
        let record = serde_json::to_string(&session)?;
        self.store
            .set_ex(&keys::session(&token), &record, self.ttl)
            .await?;
        Ok(token)
    }

    /// Looks up a live session. Unknown, expired and unreadable tokens all
    /// resolve to `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let Some(record) = self.store.get(&keys::session(token)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&record) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Discarding unreadable session record: {}", e);
                Ok(None)
            }
        }
    }

    /// Ends a session. Returns whether it existed.
    pub async fn delete(&self, token: &str) -> Result<bool, StoreError> {
        self.store.delete(&keys::session(token)).await
    }
}

/// Generates a secure random token.
///
/// Returns 32 random bytes encoded as base64url (no padding).
fn generate_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::store::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    fn ann() -> StoredUser {
        StoredUser {
            id: "u-1".to_string(),
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn sessions(ttl: Duration) -> (SessionStore, SharedStore) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        (SessionStore::new(store.clone(), ttl), store)
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let (sessions, _) = sessions(Duration::from_secs(60));

        let token = sessions.create(&ann()).await.unwrap();
        assert_eq!(token.len(), 43); // 32 bytes base64url = 43 chars

        let session = sessions.resolve(&token).await.unwrap().unwrap();
        assert_eq!(session.user_id, "u-1");
        assert_eq!(session.email, "ann@example.com");
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let (sessions, _) = sessions(Duration::from_secs(60));
        let a = sessions.create(&ann()).await.unwrap();
        let b = sessions.create(&ann()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (sessions, _) = sessions(Duration::from_secs(60));
        assert!(sessions.resolve("nonexistent").await.unwrap().is_none());
        assert!(!sessions.delete("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_ends_session() {
        let (sessions, _) = sessions(Duration::from_secs(60));
        let token = sessions.create(&ann()).await.unwrap();

        assert!(sessions.delete(&token).await.unwrap());
        assert!(sessions.resolve(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_expires() {
        let (sessions, _) = sessions(Duration::from_millis(20));
        let token = sessions.create(&ann()).await.unwrap();

        std::thread::sleep(Duration::from_millis(60));
        assert!(sessions.resolve(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_record_resolves_to_none() {
        let (sessions, store) = sessions(Duration::from_secs(60));
        store.set(&keys::session("bad"), "not json").await.unwrap();
        assert!(sessions.resolve("bad").await.unwrap().is_none());
    }
}
