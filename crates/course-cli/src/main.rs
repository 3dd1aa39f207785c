//! Course Sync CLI
//!
//! Mirrors course curricula from a content workspace export into a local
//! curriculum store.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::{Context, SyncArgs};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    if let Err(e) = course_core::logging::init(Some(level)) {
        eprintln!("{}: could not set up logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    let ctx = Context {
        working_dir: std::env::current_dir()?,
        config: cli.config,
        store: cli.store,
        source: cli.source,
    };

    match cli.command {
        Some(cmd) => execute_command(&ctx, cmd),
        None => {
            println!("{} Course curriculum sync", "course-sync".green().bold());
            println!();
            println!("Run {} for available commands.", "course-sync --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Sync {
            course,
            dry_run,
            force_full,
            json,
        } => commands::run_sync(
            ctx,
            SyncArgs {
                course,
                dry_run,
                force_full,
                json,
            },
        ),
        Commands::Status { json } => commands::run_status(ctx, json),
        Commands::Courses => commands::run_courses(ctx),
    }
}
