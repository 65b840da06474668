use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod session;

use commands::{
    connect, finish, AuthCommand, ConfigCommand, ExerciseCommand, SetCommand, ShellCommand,
    WorkoutCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "repbook")]
#[command(version)]
#[command(about = "Track workouts, exercises and sets", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, log in and out
    Auth(AuthCommand),

    /// Manage workouts
    Workout(WorkoutCommand),

    /// Manage exercises within a workout
    Exercise(ExerciseCommand),

    /// Log and edit sets
    Set(SetCommand),

    /// Interactive shell that keeps one session open
    Shell(ShellCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Auth(cmd)) => {
            cmd.run(&config).await?;
        }
        Some(Commands::Workout(cmd)) => {
            let engine = connect(&config).await?;
            cmd.run(&engine)?;
            finish(&engine).await?;
        }
        Some(Commands::Exercise(cmd)) => {
            let engine = connect(&config).await?;
            cmd.run(&engine)?;
            finish(&engine).await?;
        }
        Some(Commands::Set(cmd)) => {
            let engine = connect(&config).await?;
            cmd.run(&engine)?;
            finish(&engine).await?;
        }
        Some(Commands::Shell(cmd)) => {
            cmd.run(&config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
