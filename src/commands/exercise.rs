use clap::{Args, Subcommand};
use repbook_core::{EntityId, Mutation};

use super::lookup::{find, position_to_index};
use super::{CmdResult, Engine, OutputFormat};

#[derive(Args)]
pub struct ExerciseCommand {
    #[command(subcommand)]
    pub command: ExerciseSubcommand,
}

#[derive(Subcommand)]
pub enum ExerciseSubcommand {
    /// List the exercises in a workout
    List {
        /// Workout ID or name
        workout: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add an exercise to a workout
    Add {
        /// Workout ID or name
        workout: String,

        /// Name of the exercise
        name: String,
    },

    /// Rename an exercise
    Rename {
        /// Workout ID or name
        workout: String,

        /// Exercise ID or name
        exercise: String,

        /// New name
        name: String,
    },

    /// Delete an exercise and its sets
    #[command(alias = "delete")]
    Rm {
        /// Workout ID or name
        workout: String,

        /// Exercise ID or name
        exercise: String,
    },

    /// Move an exercise to another position within its workout
    Mv {
        /// Workout ID or name
        workout: String,

        /// Exercise ID or name
        exercise: String,

        /// New position (1 = first)
        position: usize,
    },
}

/// Ids and display names of a resolved workout/exercise pair.
struct Target {
    workout_id: EntityId,
    exercise_id: EntityId,
    index: usize,
    count: usize,
    name: String,
}

type TargetResult = Result<Target, Box<dyn std::error::Error>>;

fn resolve(engine: &Engine, workout: &str, exercise: &str) -> TargetResult {
    engine.read(|workouts| -> TargetResult {
        let (_, w) = find(workouts, workout)?;
        let (index, e) = find(&w.exercises, exercise)?;
        Ok(Target {
            workout_id: w.id.clone(),
            exercise_id: e.id.clone(),
            index,
            count: w.exercises.len(),
            name: e.name.clone(),
        })
    })
}

fn list(engine: &Engine, workout: &str, format: &OutputFormat) -> CmdResult {
    engine.read(|workouts| -> CmdResult {
        let (_, workout) = find(workouts, workout)?;

        if workout.exercises.is_empty() {
            println!("No exercises in '{}'", workout.name);
            return Ok(());
        }

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&workout.exercises)?);
            }
            OutputFormat::Text => {
                println!(
                    "{:<3} {:<8}  {:<30}  {:>5}  {:>6}",
                    "#", "ID", "NAME", "SETS", "BEST"
                );
                println!("{}", "-".repeat(58));
                for (i, exercise) in workout.exercises.iter().enumerate() {
                    let best = exercise
                        .best_weight()
                        .map(|w| w.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<3} {:<8}  {:<30}  {:>5}  {:>6}",
                        i + 1,
                        exercise.id.short(),
                        exercise.name,
                        exercise.sets.len(),
                        best
                    );
                }
            }
        }
        Ok(())
    })
}

impl ExerciseCommand {
    pub fn run(&self, engine: &Engine) -> CmdResult {
        match &self.command {
            ExerciseSubcommand::List { workout, format } => list(engine, workout, format),

            ExerciseSubcommand::Add { workout, name } => {
                let (workout_id, workout_name) = engine.read(|workouts| {
                    find(workouts, workout).map(|(_, w)| (w.id.clone(), w.name.clone()))
                })?;

                engine.apply(Mutation::CreateExercise {
                    workout_id,
                    name: name.clone(),
                })?;
                println!("Added exercise '{}' to '{}'", name.trim(), workout_name);
                Ok(())
            }

            ExerciseSubcommand::Rename {
                workout,
                exercise,
                name,
            } => {
                let target = resolve(engine, workout, exercise)?;
                engine.apply(Mutation::RenameExercise {
                    workout_id: target.workout_id,
                    exercise_id: target.exercise_id,
                    name: name.clone(),
                })?;
                println!("Renamed exercise '{}' to '{}'", target.name, name.trim());
                Ok(())
            }

            ExerciseSubcommand::Rm { workout, exercise } => {
                let target = resolve(engine, workout, exercise)?;
                engine.apply(Mutation::DeleteExercise {
                    workout_id: target.workout_id,
                    exercise_id: target.exercise_id,
                })?;
                println!("Deleted exercise: {}", target.name);
                Ok(())
            }

            ExerciseSubcommand::Mv {
                workout,
                exercise,
                position,
            } => {
                let target = resolve(engine, workout, exercise)?;
                let to = position_to_index(*position, target.count)?;
                engine.apply(Mutation::MoveExercise {
                    workout_id: target.workout_id,
                    from: target.index,
                    to,
                })?;
                println!("Moved exercise '{}' to position {}", target.name, position);
                Ok(())
            }
        }
    }
}
