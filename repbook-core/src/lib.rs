//! Repbook Core Library
//!
//! Workout models, the stored document format, and the client-side sync
//! engine shared by the Repbook binaries.

pub mod document;
pub mod entity_id;
pub mod models;
pub mod mutation;
pub mod sync;

pub use document::{WorkoutsDocument, WorkoutsDocumentRef};
pub use entity_id::{EntityId, EntityIdError};
pub use models::{Exercise, Set, User, Workout};
pub use mutation::{move_item, Mutation, MutationError};
pub use sync::{
    check_server, HttpRemote, SyncEngine, SyncError, SyncStatus, WorkoutRemote, DEFAULT_DEBOUNCE,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
