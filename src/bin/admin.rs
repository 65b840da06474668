//! Repbook Admin CLI
//!
//! Administration tool that works directly against the server's store.
//!
//! # Usage
//!
//! ```bash
//! repbook-admin user list
//! repbook-admin user remove erik@example.com
//! repbook-admin workouts dump erik@example.com
//! repbook-admin store check
//! ```
//!
//! Reads the same configuration as `repbook-server` (`REPBOOK_STORE`,
//! `REPBOOK_DATA_DIR`, `REPBOOK_REDIS_URL`, `REPBOOK_CONFIG`).

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use repbook::server::store::{self, keys, SharedStore};
use repbook::server::{ServerConfig, UserStore};
use repbook_core::document;

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "repbook-admin")]
#[command(version)]
#[command(about = "Repbook server administration tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User(UserCommand),
    /// Inspect stored workouts
    Workouts(WorkoutsCommand),
    /// Check the configured store
    Store(StoreCommand),
}

#[derive(Args)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand)]
enum UserSubcommand {
    /// List all users
    List,
    /// Remove a user and everything they stored
    Remove {
        /// User's email address
        email: String,
    },
}

#[derive(Args)]
struct WorkoutsCommand {
    #[command(subcommand)]
    command: WorkoutsSubcommand,
}

#[derive(Subcommand)]
enum WorkoutsSubcommand {
    /// Print a user's stored workouts as JSON
    Dump {
        /// User's email address
        email: String,
    },
}

#[derive(Args)]
struct StoreCommand {
    #[command(subcommand)]
    command: StoreSubcommand,
}

#[derive(Subcommand)]
enum StoreSubcommand {
    /// Write, read back and delete a test key
    Check,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

// ============================================================================
// Commands
// ============================================================================

async fn list_users(store: SharedStore) -> CliResult {
    let users = UserStore::new(store).list().await?;

    if users.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("{:<40} {:<20} {:<36}", "EMAIL", "NAME", "ID");
    println!("{}", "-".repeat(98));

    for user in &users {
        println!("{:<40} {:<20} {:<36}", user.email, user.name, user.id);
    }

    println!();
    println!("Total: {} user(s)", users.len());

    Ok(())
}

async fn remove_user(store: SharedStore, email: String) -> CliResult {
    if !UserStore::new(store).remove(&email).await? {
        return Err(format!("User '{}' not found", email).into());
    }

    println!("Removed user: {}", email);
    Ok(())
}

async fn dump_workouts(store: SharedStore, email: String) -> CliResult {
    let user = UserStore::new(store.clone())
        .find_by_email(&email)
        .await?
        .ok_or_else(|| format!("User '{}' not found", email))?;

    let workouts = match store.get(&keys::workouts(&user.id)).await? {
        Some(raw) => document::decode_lenient(&raw),
        None => Vec::new(),
    };

    println!("{}", serde_json::to_string_pretty(&workouts)?);
    Ok(())
}

async fn check_store(store: SharedStore) -> CliResult {
    const KEY: &str = "repbook-admin:check";

    store.set_ex(KEY, "ok", Duration::from_secs(60)).await?;
    let value = store.get(KEY).await?;
    store.delete(KEY).await?;

    if value.as_deref() != Some("ok") {
        return Err(format!("Read back {:?} instead of the written value", value).into());
    }

    println!("Store OK");
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

async fn run(cli: Cli) -> CliResult {
    let config = ServerConfig::from_env()?;
    let store = store::open(&config).await?;

    match cli.command {
        Commands::User(user_cmd) => match user_cmd.command {
            UserSubcommand::List => list_users(store).await,
            UserSubcommand::Remove { email } => remove_user(store, email).await,
        },
        Commands::Workouts(cmd) => match cmd.command {
            WorkoutsSubcommand::Dump { email } => dump_workouts(store, email).await,
        },
        Commands::Store(cmd) => match cmd.command {
            StoreSubcommand::Check => check_store(store).await,
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
