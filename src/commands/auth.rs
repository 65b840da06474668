//! Authentication commands for the Repbook CLI.
//!
//! Signing up or logging in stores the session token issued by the server
//! in the data directory. Every other command sends it as a bearer token.

use clap::{Args, Subcommand};
use repbook_core::sync::{build_url, check_server, check_status};
use repbook_core::{SyncError, User};
use serde::Deserialize;
use std::io::{self, Write};

use super::CmdResult;
use crate::config::Config;
use crate::session::SessionFile;

/// Authentication commands
#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Create an account and log in
    Signup {
        /// Email address (prompted if omitted)
        #[arg(long)]
        email: Option<String>,

        /// Display name (prompted if omitted)
        #[arg(long)]
        name: Option<String>,
    },
    /// Log in with email and password
    Login {
        /// Email address (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
    },
    /// Log out and forget the session
    Logout,
    /// Show authentication status
    Status,
}

/// Body returned by signup and login.
#[derive(Deserialize)]
struct AuthResponse {
    user: User,
    token: String,
}

#[derive(Deserialize)]
struct MeResponse {
    user: User,
}

impl AuthCommand {
    pub async fn run(&self, config: &Config) -> CmdResult {
        match &self.command {
            AuthSubcommand::Signup { email, name } => signup(config, email, name).await,
            AuthSubcommand::Login { email } => login(config, email).await,
            AuthSubcommand::Logout => logout(config).await,
            AuthSubcommand::Status => status(config).await,
        }
    }
}

/// Reads a line from stdin after printing `label`.
fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn value_or_prompt(value: &Option<String>, label: &str) -> io::Result<String> {
    match value {
        Some(v) => Ok(v.clone()),
        None => prompt(label),
    }
}

fn http_error(e: reqwest::Error) -> SyncError {
    SyncError::Http(e.to_string())
}

/// Posts credentials to `path` and saves the returned session.
async fn start_session(
    config: &Config,
    path: &str,
    body: serde_json::Value,
) -> Result<User, Box<dyn std::error::Error>> {
    let response = reqwest::Client::new()
        .post(build_url(&config.server_url.value, path))
        .json(&body)
        .send()
        .await
        .map_err(http_error)?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err("Invalid email or password".into());
    }
    let response = check_status(response).await?;
    let auth: AuthResponse = response
        .json()
        .await
        .map_err(|e| SyncError::Decode(e.to_string()))?;

    SessionFile::new(config.session_path()).save(&auth.token)?;
    Ok(auth.user)
}

async fn signup(config: &Config, email: &Option<String>, name: &Option<String>) -> CmdResult {
    let email = value_or_prompt(email, "Email: ")?;
    let name = value_or_prompt(name, "Name: ")?;
    let password = prompt("Password: ")?;

    let user = start_session(
        config,
        "/api/auth/signup",
        serde_json::json!({ "email": email, "password": password, "name": name }),
    )
    .await?;

    println!("Account created. Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

async fn login(config: &Config, email: &Option<String>) -> CmdResult {
    let email = value_or_prompt(email, "Email: ")?;
    let password = prompt("Password: ")?;

    let user = start_session(
        config,
        "/api/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await?;

    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

async fn logout(config: &Config) -> CmdResult {
    let session = SessionFile::new(config.session_path());
    let Some(token) = session.load()? else {
        println!("Already logged out.");
        return Ok(());
    };

    // The local token is dropped even if the server cannot be reached.
    let result = reqwest::Client::new()
        .post(build_url(&config.server_url.value, "/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await;
    if let Err(e) = result {
        tracing::warn!("Could not end the session on the server: {}", e);
    }

    session.clear()?;
    println!("Logged out.");
    Ok(())
}

async fn status(config: &Config) -> CmdResult {
    let server_url = &config.server_url.value;
    println!("Server: {}", server_url);

    let Some(token) = SessionFile::new(config.session_path()).load()? else {
        println!("Not logged in. Run 'repbook auth login' to authenticate.");
        return Ok(());
    };

    if !check_server(server_url).await {
        println!("Server is not reachable.");
        return Ok(());
    }

    let response = reqwest::Client::new()
        .get(build_url(server_url, "/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .map_err(http_error)?;

    match check_status(response).await {
        Ok(response) => {
            let me: MeResponse = response
                .json()
                .await
                .map_err(|e| SyncError::Decode(e.to_string()))?;
            println!("Logged in as {} <{}>", me.user.name, me.user.email);
        }
        Err(SyncError::Unauthenticated) => {
            println!("Session expired. Run 'repbook auth login' to log in again.");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
