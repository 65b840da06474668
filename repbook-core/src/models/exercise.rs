use serde::{Deserialize, Serialize};
use std::fmt;

use super::set::Set;
use crate::entity_id::EntityId;

/// A named, ordered list of sets within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<Set>,
}

impl Exercise {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            sets: Vec::new(),
        }
    }

    pub fn with_sets(mut self, sets: Vec<Set>) -> Self {
        self.sets = sets;
        self
    }

    pub fn set(&self, id: &EntityId) -> Option<&Set> {
        self.sets.iter().find(|s| &s.id == id)
    }

    pub fn set_mut(&mut self, id: &EntityId) -> Option<&mut Set> {
        self.sets.iter_mut().find(|s| &s.id == id)
    }

    /// Heaviest weight recorded across all sets.
    pub fn best_weight(&self) -> Option<f64> {
        self.sets.iter().map(|s| s.weight).reduce(f64::max)
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        if self.sets.is_empty() {
            writeln!(f, "  (no sets)")?;
        }
        for (i, set) in self.sets.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, set)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_new() {
        let exercise = Exercise::new("Squat");
        assert_eq!(exercise.name, "Squat");
        assert!(exercise.sets.is_empty());
    }

    #[test]
    fn test_missing_sets_defaults_to_empty() {
        let exercise: Exercise = serde_json::from_str(r#"{"id":"e1","name":"Row"}"#).unwrap();
        assert!(exercise.sets.is_empty());
    }

    #[test]
    fn test_best_weight() {
        let exercise = Exercise::new("Bench").with_sets(vec![
            Set::new(60.0, 10),
            Set::new(80.0, 3),
            Set::new(70.0, 6),
        ]);
        assert_eq!(exercise.best_weight(), Some(80.0));
        assert_eq!(Exercise::new("Empty").best_weight(), None);
    }

    #[test]
    fn test_display_numbers_sets() {
        let exercise = Exercise::new("Deadlift").with_sets(vec![Set::new(140.0, 5)]);
        let output = format!("{}", exercise);
        assert!(output.starts_with("Deadlift"));
        assert!(output.contains("1. 140 x 5"));
    }
}
