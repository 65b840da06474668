mod auth;
mod config_cmd;
mod exercise;
mod lookup;
mod set;
mod shell;
mod workout;

pub use auth::AuthCommand;
pub use config_cmd::ConfigCommand;
pub use exercise::ExerciseCommand;
pub use set::SetCommand;
pub use shell::ShellCommand;
pub use workout::WorkoutCommand;

use clap::ValueEnum;
use repbook_core::{HttpRemote, SyncEngine, SyncError};

use crate::config::Config;
use crate::session::SessionFile;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// The sync engine as the CLI uses it.
pub type Engine = SyncEngine<HttpRemote>;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Builds an engine for the saved session and loads the workout collection.
pub async fn connect(config: &Config) -> Result<Engine, Box<dyn std::error::Error>> {
    let token = SessionFile::new(config.session_path())
        .load()?
        .ok_or(SyncError::Unauthenticated)?;

    let remote = HttpRemote::new(config.server_url.value.clone(), Some(token))?;
    let engine = SyncEngine::with_debounce(remote, config.debounce());
    engine.load().await?;
    Ok(engine)
}

/// Writes out anything still pending. Fails if the server does not end up
/// with the latest local state.
pub async fn finish(engine: &Engine) -> CmdResult {
    if engine.flush().await {
        return Ok(());
    }

    let reason = engine
        .status()
        .last_error
        .unwrap_or_else(|| "unknown error".to_string());
    Err(format!("Changes were not saved: {}", reason).into())
}
