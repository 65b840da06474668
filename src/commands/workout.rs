use clap::{Args, Subcommand};
use repbook_core::Mutation;

use super::lookup::{find, position_to_index};
use super::{CmdResult, Engine, OutputFormat};

#[derive(Args)]
pub struct WorkoutCommand {
    #[command(subcommand)]
    pub command: WorkoutSubcommand,
}

#[derive(Subcommand)]
pub enum WorkoutSubcommand {
    /// List all workouts
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a workout with its exercises and sets
    Show {
        /// Workout ID or name
        workout: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a new workout
    Add {
        /// Name of the workout
        name: String,
    },

    /// Rename a workout
    Rename {
        /// Workout ID or name
        workout: String,

        /// New name
        name: String,
    },

    /// Delete a workout and everything in it
    #[command(alias = "delete")]
    Rm {
        /// Workout ID or name
        workout: String,
    },

    /// Move a workout to another position in the list
    Mv {
        /// Workout ID or name
        workout: String,

        /// New position (1 = first)
        position: usize,
    },
}

impl WorkoutCommand {
    pub fn run(&self, engine: &Engine) -> CmdResult {
        match &self.command {
            WorkoutSubcommand::List { format } => {
                let workouts = engine.workouts();

                if workouts.is_empty() {
                    println!("No workouts yet");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&workouts)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<3} {:<8}  {:<30}  {:>9}  {:>5}",
                            "#", "ID", "NAME", "EXERCISES", "SETS"
                        );
                        println!("{}", "-".repeat(62));
                        for (i, workout) in workouts.iter().enumerate() {
                            println!(
                                "{:<3} {:<8}  {:<30}  {:>9}  {:>5}",
                                i + 1,
                                workout.id.short(),
                                workout.name,
                                workout.exercises.len(),
                                workout.set_count()
                            );
                        }
                        println!("\nTotal: {} workout(s)", workouts.len());
                    }
                }
                Ok(())
            }

            WorkoutSubcommand::Show { workout, format } => engine.read(|workouts| -> CmdResult {
                let (_, workout) = find(workouts, workout)?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(workout)?),
                    OutputFormat::Text => print!("{}", workout),
                }
                Ok(())
            }),

            WorkoutSubcommand::Add { name } => {
                engine.apply(Mutation::CreateWorkout { name: name.clone() })?;
                println!("Created workout: {}", name.trim());
                Ok(())
            }

            WorkoutSubcommand::Rename { workout, name } => {
                let (workout_id, old_name) = engine.read(|workouts| {
                    find(workouts, workout).map(|(_, w)| (w.id.clone(), w.name.clone()))
                })?;

                engine.apply(Mutation::RenameWorkout {
                    workout_id,
                    name: name.clone(),
                })?;
                println!("Renamed workout '{}' to '{}'", old_name, name.trim());
                Ok(())
            }

            WorkoutSubcommand::Rm { workout } => {
                let (workout_id, name) = engine.read(|workouts| {
                    find(workouts, workout).map(|(_, w)| (w.id.clone(), w.name.clone()))
                })?;

                engine.apply(Mutation::DeleteWorkout { workout_id })?;
                println!("Deleted workout: {}", name);
                Ok(())
            }

            WorkoutSubcommand::Mv { workout, position } => {
                let (from, to, name) = engine.read(|workouts| {
                    let (from, w) = find(workouts, workout)?;
                    let to = position_to_index(*position, workouts.len())?;
                    Ok::<_, Box<dyn std::error::Error>>((from, to, w.name.clone()))
                })?;

                engine.apply(Mutation::MoveWorkout { from, to })?;
                println!("Moved workout '{}' to position {}", name, position);
                Ok(())
            }
        }
    }
}
