use serde::{Deserialize, Serialize};
use std::fmt;

use super::exercise::Exercise;
use crate::entity_id::EntityId;

/// A named, ordered list of exercises belonging to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Workout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            exercises: Vec::new(),
        }
    }

    pub fn with_exercises(mut self, exercises: Vec<Exercise>) -> Self {
        self.exercises = exercises;
        self
    }

    pub fn exercise(&self, id: &EntityId) -> Option<&Exercise> {
        self.exercises.iter().find(|e| &e.id == id)
    }

    pub fn exercise_mut(&mut self, id: &EntityId) -> Option<&mut Exercise> {
        self.exercises.iter_mut().find(|e| &e.id == id)
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workout: {}", self.name)?;
        writeln!(f, "{}", "=".repeat(30))?;
        writeln!(f, "ID: {}", self.id)?;

        if self.exercises.is_empty() {
            writeln!(f, "\nNo exercises yet.")?;
            return Ok(());
        }

        for exercise in &self.exercises {
            writeln!(f)?;
            write!(f, "{}", exercise)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Set;

    #[test]
    fn test_workout_new() {
        let workout = Workout::new("Legs");
        assert_eq!(workout.name, "Legs");
        assert!(workout.exercises.is_empty());
        assert_eq!(workout.set_count(), 0);
    }

    #[test]
    fn test_exercise_lookup() {
        let squat = Exercise::new("Squat");
        let squat_id = squat.id.clone();
        let mut workout = Workout::new("Legs").with_exercises(vec![squat, Exercise::new("Lunge")]);

        assert_eq!(workout.exercise(&squat_id).unwrap().name, "Squat");
        workout.exercise_mut(&squat_id).unwrap().name = "Front Squat".to_string();
        assert_eq!(workout.exercises[0].name, "Front Squat");
        assert!(workout.exercise(&EntityId::new()).is_none());
    }

    #[test]
    fn test_set_count() {
        let workout = Workout::new("Push").with_exercises(vec![
            Exercise::new("Bench").with_sets(vec![Set::new(60.0, 8), Set::new(60.0, 8)]),
            Exercise::new("Dips").with_sets(vec![Set::new(0.0, 12)]),
        ]);
        assert_eq!(workout.set_count(), 3);
    }

    #[test]
    fn test_display() {
        let workout = Workout::new("Pull").with_exercises(vec![Exercise::new("Row")]);
        let output = format!("{}", workout);
        assert!(output.contains("Workout: Pull"));
        assert!(output.contains("Row"));
    }
}
