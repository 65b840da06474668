//! Synchronization of the workout collection with the server.
//!
//! - [`SyncEngine`]: optimistic in-memory state with debounced writes
//! - [`WorkoutRemote`]: where the document is read from and written to
//! - [`HttpRemote`]: the `/api/workouts` implementation used by the CLI

pub mod client;
pub mod engine;
pub mod error;
pub mod remote;

pub use client::{build_url, check_server, check_status, HttpRemote};
pub use engine::{SyncEngine, SyncStatus, DEFAULT_DEBOUNCE};
pub use error::SyncError;
pub use remote::WorkoutRemote;
