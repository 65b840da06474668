//! Edits to a workout collection.
//!
//! Every user action is expressed as a [`Mutation`] and applied to the whole
//! in-memory collection. A mutation either succeeds completely or leaves the
//! collection untouched.

use thiserror::Error;

use crate::entity_id::EntityId;
use crate::models::{Exercise, Set, Workout};

/// Errors returned when a mutation cannot be applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Weight must be a non-negative number, got {0}")]
    InvalidWeight(f64),

    #[error("Workout not found: {0}")]
    WorkoutNotFound(EntityId),

    #[error("Exercise not found: {0}")]
    ExerciseNotFound(EntityId),

    #[error("Set not found: {0}")]
    SetNotFound(EntityId),

    #[error("Position {index} is out of range (have {len})")]
    OutOfRange { index: usize, len: usize },
}

/// A single edit to the workout collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateWorkout {
        name: String,
    },
    RenameWorkout {
        workout_id: EntityId,
        name: String,
    },
    DeleteWorkout {
        workout_id: EntityId,
    },
    MoveWorkout {
        from: usize,
        to: usize,
    },
    CreateExercise {
        workout_id: EntityId,
        name: String,
    },
    RenameExercise {
        workout_id: EntityId,
        exercise_id: EntityId,
        name: String,
    },
    DeleteExercise {
        workout_id: EntityId,
        exercise_id: EntityId,
    },
    MoveExercise {
        workout_id: EntityId,
        from: usize,
        to: usize,
    },
    AddSet {
        workout_id: EntityId,
        exercise_id: EntityId,
        weight: f64,
        reps: u32,
    },
    UpdateSet {
        workout_id: EntityId,
        exercise_id: EntityId,
        set_id: EntityId,
        weight: f64,
        reps: u32,
    },
    DeleteSet {
        workout_id: EntityId,
        exercise_id: EntityId,
        set_id: EntityId,
    },
    MoveSet {
        workout_id: EntityId,
        exercise_id: EntityId,
        from: usize,
        to: usize,
    },
}

impl Mutation {
    /// Creating or deleting a workout is persisted right away instead of
    /// waiting for the debounce window.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::CreateWorkout { .. } | Mutation::DeleteWorkout { .. }
        )
    }

    /// Checks everything that can be checked without the collection.
    pub fn validate(&self) -> Result<(), MutationError> {
        match self {
            Mutation::CreateWorkout { name }
            | Mutation::RenameWorkout { name, .. }
            | Mutation::CreateExercise { name, .. }
            | Mutation::RenameExercise { name, .. } => {
                if name.trim().is_empty() {
                    return Err(MutationError::EmptyName);
                }
            }
            Mutation::AddSet { weight, .. } | Mutation::UpdateSet { weight, .. } => {
                if !weight.is_finite() || *weight < 0.0 {
                    return Err(MutationError::InvalidWeight(*weight));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Applies the mutation.
    ///
    /// Returns the id of the entity created by the mutation, if any.
    pub fn apply(&self, workouts: &mut Vec<Workout>) -> Result<Option<EntityId>, MutationError> {
        self.validate()?;

        match self {
            Mutation::CreateWorkout { name } => {
                let workout = Workout::new(name.trim());
                let id = workout.id.clone();
                workouts.push(workout);
                Ok(Some(id))
            }
            Mutation::RenameWorkout { workout_id, name } => {
                find_workout(workouts, workout_id)?.name = name.trim().to_string();
                Ok(None)
            }
            Mutation::DeleteWorkout { workout_id } => {
                let before = workouts.len();
                workouts.retain(|w| &w.id != workout_id);
                if workouts.len() == before {
                    return Err(MutationError::WorkoutNotFound(workout_id.clone()));
                }
                Ok(None)
            }
            Mutation::MoveWorkout { from, to } => {
                move_item(workouts, *from, *to)?;
                Ok(None)
            }
            Mutation::CreateExercise { workout_id, name } => {
                let exercise = Exercise::new(name.trim());
                let id = exercise.id.clone();
                find_workout(workouts, workout_id)?.exercises.push(exercise);
                Ok(Some(id))
            }
            Mutation::RenameExercise {
                workout_id,
                exercise_id,
                name,
            } => {
                find_exercise(workouts, workout_id, exercise_id)?.name = name.trim().to_string();
                Ok(None)
            }
            Mutation::DeleteExercise {
                workout_id,
                exercise_id,
            } => {
                let workout = find_workout(workouts, workout_id)?;
                let before = workout.exercises.len();
                workout.exercises.retain(|e| &e.id != exercise_id);
                if workout.exercises.len() == before {
                    return Err(MutationError::ExerciseNotFound(exercise_id.clone()));
                }
                Ok(None)
            }
            Mutation::MoveExercise {
                workout_id,
                from,
                to,
            } => {
                move_item(&mut find_workout(workouts, workout_id)?.exercises, *from, *to)?;
                Ok(None)
            }
            Mutation::AddSet {
                workout_id,
                exercise_id,
                weight,
                reps,
            } => {
                let set = Set::new(*weight, *reps);
                let id = set.id.clone();
                find_exercise(workouts, workout_id, exercise_id)?
                    .sets
                    .push(set);
                Ok(Some(id))
            }
            Mutation::UpdateSet {
                workout_id,
                exercise_id,
                set_id,
                weight,
                reps,
            } => {
                let set = find_exercise(workouts, workout_id, exercise_id)?
                    .set_mut(set_id)
                    .ok_or_else(|| MutationError::SetNotFound(set_id.clone()))?;
                set.weight = *weight;
                set.reps = *reps;
                Ok(None)
            }
            Mutation::DeleteSet {
                workout_id,
                exercise_id,
                set_id,
            } => {
                let exercise = find_exercise(workouts, workout_id, exercise_id)?;
                let before = exercise.sets.len();
                exercise.sets.retain(|s| &s.id != set_id);
                if exercise.sets.len() == before {
                    return Err(MutationError::SetNotFound(set_id.clone()));
                }
                Ok(None)
            }
            Mutation::MoveSet {
                workout_id,
                exercise_id,
                from,
                to,
            } => {
                move_item(
                    &mut find_exercise(workouts, workout_id, exercise_id)?.sets,
                    *from,
                    *to,
                )?;
                Ok(None)
            }
        }
    }
}

fn find_workout<'a>(
    workouts: &'a mut [Workout],
    id: &EntityId,
) -> Result<&'a mut Workout, MutationError> {
    workouts
        .iter_mut()
        .find(|w| &w.id == id)
        .ok_or_else(|| MutationError::WorkoutNotFound(id.clone()))
}

fn find_exercise<'a>(
    workouts: &'a mut [Workout],
    workout_id: &EntityId,
    exercise_id: &EntityId,
) -> Result<&'a mut Exercise, MutationError> {
    find_workout(workouts, workout_id)?
        .exercise_mut(exercise_id)
        .ok_or_else(|| MutationError::ExerciseNotFound(exercise_id.clone()))
}

/// Removes the item at `from` and reinserts it at `to`.
///
/// Both positions index the list as it was before the move, matching a
/// drag from one slot to another.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), MutationError> {
    let len = items.len();
    if from >= len {
        return Err(MutationError::OutOfRange { index: from, len });
    }
    if to >= len {
        return Err(MutationError::OutOfRange { index: to, len });
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}
