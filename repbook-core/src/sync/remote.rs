use async_trait::async_trait;

use super::error::SyncError;
use crate::models::Workout;

/// Where the sync engine reads and writes the workouts document.
///
/// `fetch` returns an empty collection when nothing has been stored yet.
/// `push` replaces the stored collection wholesale.
#[async_trait]
pub trait WorkoutRemote: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Vec<Workout>, SyncError>;

    async fn push(&self, workouts: &[Workout]) -> Result<(), SyncError>;
}
