//! Server-side modules for the Repbook server.

pub mod auth;
pub mod config;
pub mod error;
mod manifest;
mod password;
pub mod routes;
pub mod sessions;
pub mod store;
pub mod users;

pub use config::{ConfigError, ServerConfig, StoreBackend};
pub use error::ApiError;
pub use routes::{app, AppState};
pub use sessions::{Session, SessionStore};
pub use store::{KvStore, SharedStore, StoreError};
pub use users::{normalize_email, StoredUser, UserError, UserStore};
