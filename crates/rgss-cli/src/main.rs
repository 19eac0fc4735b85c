//! RGSS script workspace CLI
//!
//! Extracts an RPG Maker script container into editable files, keeps the
//! script index in sync while they are edited, and packs them back.

mod cli;
mod commands;
mod context;
mod error;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {}", e)))?;
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Some(cmd) => execute_command(cmd, cli.project.as_deref()),
        None => {
            println!("{} RGSS script workspace", "rgss".green().bold());
            println!();
            println!("Run {} for available commands.", "rgss --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, project: Option<&Path>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let layout = || context::load_layout(project, &cwd);

    match cmd {
        Commands::Init {
            game_folder,
            naming,
            rgss_version,
            scripts_dir,
            force,
        } => commands::run_init(
            project.unwrap_or(cwd.as_path()),
            commands::InitOptions {
                game_folder: &game_folder,
                naming,
                version: rgss_version,
                scripts_dir: &scripts_dir,
                force,
            },
        ),
        Commands::Unpack => commands::run_unpack(&layout()?),
        Commands::Pack { output } => commands::run_pack(&layout()?, output.as_deref()),
        Commands::List { json } => commands::run_list(&layout()?, json),
        Commands::Add { name, after } => commands::run_add(&layout()?, after.as_deref(), &name),
        Commands::Duplicate { target } => commands::run_duplicate(&layout()?, &target),
        Commands::Rename { target, new_name } => {
            commands::run_rename(&layout()?, &target, &new_name)
        }
        Commands::Delete { target, yes } => commands::run_delete(&layout()?, &target, yes),
        Commands::Check => commands::run_check(&layout()?),
        Commands::RestoreIndex => commands::run_restore_index(&layout()?),
        Commands::Watch => commands::run_watch(&layout()?),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }
}
