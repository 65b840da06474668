//! Sync error types.

use thiserror::Error;

/// Errors that can occur while talking to the workouts resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No valid session; the user has to sign in.
    #[error("Not authenticated. Run `repbook auth login` first.")]
    Unauthenticated,

    /// Transport-level failure (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with an error status.
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body could not be read.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl SyncError {
    /// Whether the failure is worth trying again later.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Http(_) => true,
            SyncError::Server { status, .. } => *status >= 500,
            SyncError::Unauthenticated | SyncError::Decode(_) => false,
        }
    }
}
