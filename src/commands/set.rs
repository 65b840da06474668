use clap::{Args, Subcommand};
use repbook_core::{EntityId, Mutation, Set};

use super::lookup::{find, find_set, position_to_index};
use super::{CmdResult, Engine, OutputFormat};

#[derive(Args)]
pub struct SetCommand {
    #[command(subcommand)]
    pub command: SetSubcommand,
}

#[derive(Subcommand)]
pub enum SetSubcommand {
    /// List the sets of an exercise
    List {
        /// Workout ID or name
        workout: String,

        /// Exercise ID or name
        exercise: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Log a set
    Add {
        /// Workout ID or name
        workout: String,

        /// Exercise ID or name
        exercise: String,

        /// Weight lifted
        #[arg(long, short)]
        weight: f64,

        /// Repetitions
        #[arg(long, short)]
        reps: u32,
    },

    /// Change the weight or reps of a set
    Edit {
        /// Workout ID or name
        workout: String,

        /// Exercise ID or name
        exercise: String,

        /// Set position (1 = first) or ID
        set: String,

        /// New weight
        #[arg(long, short)]
        weight: Option<f64>,

        /// New repetitions
        #[arg(long, short)]
        reps: Option<u32>,
    },

    /// Delete a set
    #[command(alias = "delete")]
    Rm {
        /// Workout ID or name
        workout: String,

        /// Exercise ID or name
        exercise: String,

        /// Set position (1 = first) or ID
        set: String,
    },

    /// Move a set to another position within its exercise
    Mv {
        /// Workout ID or name
        workout: String,

        /// Exercise ID or name
        exercise: String,

        /// Set position (1 = first) or ID
        set: String,

        /// New position (1 = first)
        position: usize,
    },
}

type LookupResult<T> = Result<T, Box<dyn std::error::Error>>;

/// The exercise a set command operates on.
struct Parent {
    workout_id: EntityId,
    exercise_id: EntityId,
    exercise_name: String,
    sets: Vec<Set>,
}

fn parent(engine: &Engine, workout: &str, exercise: &str) -> LookupResult<Parent> {
    engine.read(|workouts| -> LookupResult<Parent> {
        let (_, w) = find(workouts, workout)?;
        let (_, e) = find(&w.exercises, exercise)?;
        Ok(Parent {
            workout_id: w.id.clone(),
            exercise_id: e.id.clone(),
            exercise_name: e.name.clone(),
            sets: e.sets.clone(),
        })
    })
}

impl SetCommand {
    pub fn run(&self, engine: &Engine) -> CmdResult {
        match &self.command {
            SetSubcommand::List {
                workout,
                exercise,
                format,
            } => {
                let parent = parent(engine, workout, exercise)?;

                if parent.sets.is_empty() {
                    println!("No sets logged for '{}'", parent.exercise_name);
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&parent.sets)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<3} {:<8}  {:>8}  {:>5}  LOGGED",
                            "#", "ID", "WEIGHT", "REPS"
                        );
                        println!("{}", "-".repeat(50));
                        for (i, set) in parent.sets.iter().enumerate() {
                            println!(
                                "{:<3} {:<8}  {:>8}  {:>5}  {}",
                                i + 1,
                                set.id.short(),
                                set.weight,
                                set.reps,
                                set.timestamp.format("%Y-%m-%d %H:%M")
                            );
                        }
                    }
                }
                Ok(())
            }

            SetSubcommand::Add {
                workout,
                exercise,
                weight,
                reps,
            } => {
                let parent = parent(engine, workout, exercise)?;
                engine.apply(Mutation::AddSet {
                    workout_id: parent.workout_id,
                    exercise_id: parent.exercise_id,
                    weight: *weight,
                    reps: *reps,
                })?;
                println!(
                    "Logged {} x {} for '{}'",
                    weight, reps, parent.exercise_name
                );
                Ok(())
            }

            SetSubcommand::Edit {
                workout,
                exercise,
                set,
                weight,
                reps,
            } => {
                if weight.is_none() && reps.is_none() {
                    return Err("Nothing to update. Provide --weight and/or --reps.".into());
                }

                let parent = parent(engine, workout, exercise)?;
                let (_, current) = find_set(&parent.sets, set)?;
                let weight = weight.unwrap_or(current.weight);
                let reps = reps.unwrap_or(current.reps);

                engine.apply(Mutation::UpdateSet {
                    workout_id: parent.workout_id.clone(),
                    exercise_id: parent.exercise_id.clone(),
                    set_id: current.id.clone(),
                    weight,
                    reps,
                })?;
                println!("Updated set: {} x {}", weight, reps);
                Ok(())
            }

            SetSubcommand::Rm {
                workout,
                exercise,
                set,
            } => {
                let parent = parent(engine, workout, exercise)?;
                let (_, current) = find_set(&parent.sets, set)?;

                engine.apply(Mutation::DeleteSet {
                    workout_id: parent.workout_id.clone(),
                    exercise_id: parent.exercise_id.clone(),
                    set_id: current.id.clone(),
                })?;
                println!("Deleted set: {} x {}", current.weight, current.reps);
                Ok(())
            }

            SetSubcommand::Mv {
                workout,
                exercise,
                set,
                position,
            } => {
                let parent = parent(engine, workout, exercise)?;
                let (from, _) = find_set(&parent.sets, set)?;
                let to = position_to_index(*position, parent.sets.len())?;

                engine.apply(Mutation::MoveSet {
                    workout_id: parent.workout_id,
                    exercise_id: parent.exercise_id,
                    from,
                    to,
                })?;
                println!("Moved set to position {}", position);
                Ok(())
            }
        }
    }
}
