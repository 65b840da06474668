//! Interactive shell.
//!
//! Keeps one engine alive across commands, so edits are written in the
//! background after the debounce delay instead of once per command. Pending
//! edits are flushed on `exit` or end of input.

use clap::{Args, Parser, Subcommand};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{connect, finish, CmdResult, Engine};
use super::{ExerciseCommand, SetCommand, WorkoutCommand};
use crate::config::Config;

#[derive(Args)]
pub struct ShellCommand {}

/// One line typed at the shell prompt.
#[derive(Parser)]
#[command(name = "repbook", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: LineCommand,
}

#[derive(Subcommand)]
enum LineCommand {
    /// Manage workouts
    Workout(WorkoutCommand),
    /// Manage exercises
    Exercise(ExerciseCommand),
    /// Log and edit sets
    Set(SetCommand),
    /// Show sync status
    Status,
    /// Write pending changes now
    Sync,
    /// Reload workouts from the server, dropping unsaved changes
    Reload,
    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

enum Flow {
    Continue,
    Exit,
}

impl ShellCommand {
    pub async fn run(&self, config: &Config) -> CmdResult {
        let engine = connect(config).await?;
        let count = engine.read(|workouts| workouts.len());
        println!(
            "Loaded {} workout(s) from {}. Type 'help' for commands, 'exit' to leave.",
            count, config.server_url.value
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print_prompt(&engine)?;
            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };

            let args = match split_args(&line) {
                Ok(args) if args.is_empty() => continue,
                Ok(args) => args,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    continue;
                }
            };

            let parsed = match Line::try_parse_from(args) {
                Ok(parsed) => parsed,
                Err(e) => {
                    e.print()?;
                    continue;
                }
            };

            match execute(&engine, parsed.command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        finish(&engine).await
    }
}

fn print_prompt(engine: &Engine) -> std::io::Result<()> {
    let marker = if engine.status().dirty { "*" } else { "" };
    print!("repbook{}> ", marker);
    std::io::stdout().flush()
}

async fn execute(engine: &Engine, command: LineCommand) -> Result<Flow, Box<dyn std::error::Error>> {
    match command {
        LineCommand::Workout(cmd) => cmd.run(engine)?,
        LineCommand::Exercise(cmd) => cmd.run(engine)?,
        LineCommand::Set(cmd) => cmd.run(engine)?,
        LineCommand::Status => {
            let status = engine.status();
            println!("Workouts: {}", engine.read(|w| w.len()));
            println!("Unsaved changes: {}", if status.dirty { "yes" } else { "no" });
            println!("Writes in flight: {}", status.in_flight);
            if let Some(error) = status.last_error {
                println!("Last error: {}", error);
            }
        }
        LineCommand::Sync => {
            finish(engine).await?;
            println!("Saved.");
        }
        LineCommand::Reload => {
            let count = engine.load().await?;
            println!("Reloaded {} workout(s).", count);
        }
        LineCommand::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

/// Splits a command line into words. Single and double quotes group words;
/// a backslash escapes the next character outside single quotes.
fn split_args(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                let escaped = chars.next().ok_or("Trailing backslash")?;
                current.push(escaped);
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '\'') | (None, '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("Unterminated quote".to_string());
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_words() {
        assert_eq!(
            split_args("  set add Legs Squat -w 100 -r 5 ").unwrap(),
            vec!["set", "add", "Legs", "Squat", "-w", "100", "-r", "5"]
        );
        assert!(split_args("   ").unwrap().is_empty());
    }

    #[test]
    fn test_split_quotes_and_escapes() {
        assert_eq!(
            split_args(r#"workout add "Upper Body" 'Day 2' Leg\ Day """#).unwrap(),
            vec!["workout", "add", "Upper Body", "Day 2", "Leg Day", ""]
        );
        assert_eq!(
            split_args(r#"exercise add Legs "Bulgarian \"split\" squat""#).unwrap(),
            vec!["exercise", "add", "Legs", "Bulgarian \"split\" squat"]
        );
    }

    #[test]
    fn test_split_errors() {
        assert!(split_args("workout add \"Legs").is_err());
        assert!(split_args("workout add Legs\\").is_err());
    }

    #[test]
    fn test_parse_shell_lines() {
        let line = Line::try_parse_from(["workout", "mv", "Legs", "2"]).unwrap();
        assert!(matches!(line.command, LineCommand::Workout(_)));

        let line = Line::try_parse_from(["quit"]).unwrap();
        assert!(matches!(line.command, LineCommand::Exit));

        assert!(Line::try_parse_from(["set", "add", "Legs"]).is_err());
        assert!(Line::try_parse_from(["bogus"]).is_err());
    }
}
