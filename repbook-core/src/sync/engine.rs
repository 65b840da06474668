//! Optimistic local state with debounced full-snapshot writes.
//!
//! The engine owns the in-memory workout collection. Every edit is applied
//! to it synchronously and becomes visible to readers immediately; the
//! network write happens later, on a spawned task:
//!
//! - each edit (re)arms a debounce timer, so a burst of edits produces a
//!   single write of the final state;
//! - creating or deleting a workout additionally writes right away;
//! - a write always sends the collection as it is *when the write runs*,
//!   never a queued copy.
//!
//! Writes replace the stored document wholesale. Failed writes are logged
//! and otherwise ignored; nothing is retried.
//!
//! All methods that schedule work must be called from within a Tokio
//! runtime.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::error::SyncError;
use super::remote::WorkoutRemote;
use crate::entity_id::EntityId;
use crate::models::Workout;
use crate::mutation::{Mutation, MutationError};

/// Quiet period after the last edit before the timer path writes.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Approximate view of where the engine stands relative to the remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// Whether a load has succeeded. Writes are refused until it has.
    pub loaded: bool,
    /// Writes currently waiting on the network.
    pub in_flight: usize,
    /// Local state has edits the remote has not acknowledged.
    pub dirty: bool,
    /// Message of the most recent failed load or write, cleared on success.
    pub last_error: Option<String>,
}

impl SyncStatus {
    pub fn is_syncing(&self) -> bool {
        self.in_flight > 0
    }
}

#[derive(Debug, Default)]
struct State {
    workouts: Vec<Workout>,
    /// Bumped on every successful edit.
    revision: u64,
    /// Revision of the snapshot the remote holds, as of the most recently
    /// completed write. Writes can complete out of order, so this may go
    /// backwards.
    synced_revision: u64,
    loaded: bool,
    in_flight: usize,
    last_error: Option<String>,
}

struct Inner<R> {
    remote: R,
    debounce: Duration,
    state: Mutex<State>,
    timer: Mutex<Option<JoinHandle<()>>>,
    writes: Mutex<Vec<JoinHandle<()>>>,
}

/// Client-side owner of a user's workouts.
pub struct SyncEngine<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for SyncEngine<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<R: WorkoutRemote> SyncEngine<R> {
    pub fn new(remote: R) -> Self {
        Self::with_debounce(remote, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(remote: R, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                debounce,
                state: Mutex::new(State::default()),
                timer: Mutex::new(None),
                writes: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn remote(&self) -> &R {
        &self.inner.remote
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }

    /// Replaces local state with the stored collection.
    ///
    /// A pending debounced write is cancelled: unsynced local edits are
    /// discarded, as on a page reload. On failure the local collection is
    /// left empty and the engine refuses to write until a later load
    /// succeeds, so a failed read can never overwrite the stored document.
    pub async fn load(&self) -> Result<usize, SyncError> {
        self.cancel_timer();

        match self.inner.remote.fetch().await {
            Ok(workouts) => {
                let count = workouts.len();
                let mut state = lock(&self.inner.state);
                state.workouts = workouts;
                state.loaded = true;
                state.synced_revision = state.revision;
                state.last_error = None;
                tracing::info!(count, "Loaded workouts");
                Ok(count)
            }
            Err(e) => {
                let mut state = lock(&self.inner.state);
                state.workouts.clear();
                state.loaded = false;
                state.synced_revision = state.revision;
                state.last_error = Some(e.to_string());
                tracing::warn!("Failed to load workouts: {}", e);
                Err(e)
            }
        }
    }

    /// Applies `transform` to the collection and schedules a debounced write.
    pub fn mutate<F, T>(&self, transform: F) -> T
    where
        F: FnOnce(&mut Vec<Workout>) -> T,
    {
        let output = {
            let mut state = lock(&self.inner.state);
            let output = transform(&mut state.workouts);
            state.revision += 1;
            output
        };
        self.schedule_sync();
        output
    }

    /// Applies a catalogued edit.
    ///
    /// Structural edits (creating or deleting a workout) are also written
    /// immediately. A rejected edit changes nothing and schedules nothing.
    pub fn apply(&self, mutation: Mutation) -> Result<Option<EntityId>, MutationError> {
        let created = {
            let mut state = lock(&self.inner.state);
            let created = mutation.apply(&mut state.workouts)?;
            state.revision += 1;
            created
        };

        tracing::debug!(?mutation, "Applied mutation");
        self.schedule_sync();
        if mutation.is_structural() {
            self.spawn_sync();
        }

        Ok(created)
    }

    /// Arms the debounce timer, replacing any pending one.
    pub fn schedule_sync(&self) {
        let engine = self.clone();
        let delay = self.inner.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detach the write so that re-arming the timer cannot cancel a
            // request that is already on the wire.
            engine.spawn_sync();
        });

        if let Some(previous) = lock(&self.inner.timer).replace(timer) {
            previous.abort();
        }
    }

    fn cancel_timer(&self) {
        if let Some(timer) = lock(&self.inner.timer).take() {
            timer.abort();
        }
    }

    fn spawn_sync(&self) {
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            engine.sync().await;
        });

        let mut writes = lock(&self.inner.writes);
        writes.retain(|h| !h.is_finished());
        writes.push(handle);
    }

    /// Writes the current collection to the remote.
    ///
    /// Returns whether the write succeeded. Failures are logged and
    /// recorded in [`SyncStatus::last_error`], never retried.
    pub async fn sync(&self) -> bool {
        let (snapshot, revision) = {
            let mut state = lock(&self.inner.state);
            if !state.loaded {
                tracing::warn!("Skipping sync: workouts have not been loaded");
                return false;
            }
            state.in_flight += 1;
            (state.workouts.clone(), state.revision)
        };

        tracing::debug!(revision, count = snapshot.len(), "Syncing workouts");
        let result = self.inner.remote.push(&snapshot).await;

        let mut state = lock(&self.inner.state);
        state.in_flight -= 1;
        match result {
            Ok(()) => {
                // The last write to complete is the one the remote kept.
                state.synced_revision = revision;
                state.last_error = None;
                tracing::debug!(revision, "Workouts synced");
                true
            }
            Err(e) => {
                tracing::warn!("Failed to sync workouts: {}", e);
                state.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Cancels the pending timer, waits for writes in flight, and writes
    /// once more if local state is still ahead of the remote.
    ///
    /// Returns true when the remote holds the latest local state.
    pub async fn flush(&self) -> bool {
        self.cancel_timer();

        let pending: Vec<JoinHandle<()>> = std::mem::take(&mut *lock(&self.inner.writes));
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::debug!("Write task ended abnormally: {}", e);
            }
        }

        let (loaded, dirty) = {
            let state = lock(&self.inner.state);
            (state.loaded, state.revision > state.synced_revision)
        };

        if !loaded {
            return false;
        }
        if !dirty {
            return true;
        }
        self.sync().await
    }

    /// A copy of the current collection.
    pub fn workouts(&self) -> Vec<Workout> {
        lock(&self.inner.state).workouts.clone()
    }

    /// Runs `f` against the current collection without copying it.
    pub fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&[Workout]) -> T,
    {
        f(&lock(&self.inner.state).workouts)
    }

    pub fn status(&self) -> SyncStatus {
        let state = lock(&self.inner.state);
        SyncStatus {
            loaded: state.loaded,
            in_flight: state.in_flight,
            dirty: state.revision > state.synced_revision,
            last_error: state.last_error.clone(),
        }
    }
}
