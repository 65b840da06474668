//! Key-value store backing the server.
//!
//! All server state lives under string keys:
//!
//! ```text
//! user:<email>       -> user record (JSON)
//! user_id:<id>       -> email
//! session:<token>    -> session record (JSON), expires
//! workouts:<id>      -> JSON array of workouts
//! ```
//!
//! Backends:
//! - [`MemoryStore`]: process-local, for tests and throwaway runs
//! - [`SqliteStore`]: a single `kv` table in a SQLite file (default)
//! - [`RedisStore`]: any Redis-compatible server

mod memory;
mod redis_store;
mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;
pub use self::sqlite::SqliteStore;

use super::config::{ServerConfig, StoreBackend};

/// Errors returned by a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("SQLite migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// String key-value store with optional per-key expiry.
///
/// Expired keys are invisible to every operation. There are no
/// transactions: each call stands alone.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key` without expiry, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Removes `key`. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Lists live keys starting with `prefix`, sorted.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Shared handle to the configured store.
pub type SharedStore = Arc<dyn KvStore>;

/// Opens the backend selected by the configuration.
pub async fn open(config: &ServerConfig) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost when the server stops");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sqlite => {
            let path = config.data_dir.join("repbook.db");
            tracing::info!("Using SQLite store at {}", path.display());
            Arc::new(SqliteStore::open(&path).await?)
        }
        StoreBackend::Redis => {
            tracing::info!("Using Redis store");
            Arc::new(RedisStore::connect(&config.redis_url).await?)
        }
    };
    Ok(store)
}

/// Key builders, so the layout lives in one place.
pub mod keys {
    pub const USER_PREFIX: &str = "user:";
    pub const WORKOUTS_PREFIX: &str = "workouts:";

    pub fn user(email: &str) -> String {
        format!("{}{}", USER_PREFIX, email)
    }

    pub fn user_id(id: &str) -> String {
        format!("user_id:{}", id)
    }

    pub fn session(token: &str) -> String {
        format!("session:{}", token)
    }

    pub fn workouts(user_id: &str) -> String {
        format!("{}{}", WORKOUTS_PREFIX, user_id)
    }
}

/// Behaviour every backend must share.
#[cfg(test)]
pub(crate) mod conformance {
    use super::KvStore;
    use std::time::Duration;

    pub async fn check_set_get_delete(store: &dyn KvStore) {
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    pub async fn check_keys_by_prefix(store: &dyn KvStore) {
        store.set("workouts:2", "[]").await.unwrap();
        store.set("workouts:1", "[]").await.unwrap();
        store.set("user:a@example.com", "{}").await.unwrap();
        store.set("user_id:1", "a@example.com").await.unwrap();

        assert_eq!(
            store.keys("workouts:").await.unwrap(),
            vec!["workouts:1".to_string(), "workouts:2".to_string()]
        );
        assert_eq!(
            store.keys("user:").await.unwrap(),
            vec!["user:a@example.com".to_string()]
        );
        assert!(store.keys("nothing:").await.unwrap().is_empty());
    }

    pub async fn check_expiry(store: &dyn KvStore) {
        store
            .set_ex("session:short", "x", Duration::from_millis(50))
            .await
            .unwrap();
        store
            .set_ex("session:long", "y", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(store.get("session:short").await.unwrap().as_deref(), Some("x"));

        std::thread::sleep(Duration::from_millis(120));

        assert_eq!(store.get("session:short").await.unwrap(), None);
        assert_eq!(store.get("session:long").await.unwrap().as_deref(), Some("y"));
        assert_eq!(
            store.keys("session:").await.unwrap(),
            vec!["session:long".to_string()]
        );

        // A plain set clears a previous expiry.
        store
            .set_ex("k", "v", Duration::from_millis(50))
            .await
            .unwrap();
        store.set("k", "v2").await.unwrap();
        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }
}

#[cfg(test)]
mod tests {
    use super::keys;

    #[test]
    fn test_key_layout() {
        assert_eq!(keys::user("a@example.com"), "user:a@example.com");
        assert_eq!(keys::user_id("42"), "user_id:42");
        assert_eq!(keys::session("tok"), "session:tok");
        assert_eq!(keys::workouts("42"), "workouts:42");
    }

    #[test]
    fn test_user_prefix_does_not_match_user_id_keys() {
        assert!(!keys::user_id("42").starts_with(keys::USER_PREFIX));
    }
}
