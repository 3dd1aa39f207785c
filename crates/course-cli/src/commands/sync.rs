//! Sync command implementation
//!
//! Runs one orchestrated sync from the content snapshot into the file store
//! and prints the result.

use std::sync::Arc;

use colored::Colorize;

use course_core::{
    SnapshotSource, SyncCoordinator, SyncOptions, SyncOrchestrator, SyncResult, SyncScope,
};

use super::Context;
use crate::error::{CliError, Result};

/// Flags of the `sync` subcommand
#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub course: Option<String>,
    pub dry_run: bool,
    pub force_full: bool,
    pub json: bool,
}

/// Run the sync command
///
/// `--course` wins over `[sync] default_scope`; with neither, every enabled
/// course is synced. Exits with an error when the run reports `success: false`.
pub fn run_sync(ctx: &Context, args: SyncArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let settings = config.settings();

    let scope = match args.course.as_deref().or(settings.default_scope.as_deref()) {
        Some(key) => SyncScope::parse(key),
        None => SyncScope::All,
    };

    let source_path = ctx.source_path();
    if !source_path.is_file() {
        return Err(CliError::user(format!(
            "Content snapshot not found: {}",
            source_path.display()
        )));
    }
    let source = SnapshotSource::load(&source_path)?.with_page_size(settings.page_size);
    let store = ctx.open_store()?;

    if !args.json {
        let mode = if args.dry_run { " (dry run)" } else { "" };
        println!(
            "{} Synchronizing {}{}...",
            "=>".blue().bold(),
            describe_scope(&scope),
            mode
        );
    }

    let orchestrator = SyncOrchestrator::new(
        Arc::new(source),
        Arc::new(store),
        config,
        Arc::new(SyncCoordinator::new()),
    );
    let options = SyncOptions {
        scope,
        force_full_sync: args.force_full,
        dry_run: args.dry_run,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(orchestrator.sync_curriculum(options));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    if result.success {
        Ok(())
    } else {
        Err(CliError::user("Synchronization failed"))
    }
}

fn describe_scope(scope: &SyncScope) -> String {
    match scope {
        SyncScope::All => "all enabled courses".to_string(),
        SyncScope::Course(key) => format!("course '{}'", key),
    }
}

fn print_result(result: &SyncResult) {
    for action in &result.actions {
        println!("   {} {}", "+".green(), action);
    }

    for issue in &result.errors {
        let marker = if issue.recoverable {
            "~".yellow()
        } else {
            "!".red()
        };
        println!(
            "   {} {} {}: {}",
            marker,
            issue.level,
            issue.external_id.cyan(),
            issue.message
        );
    }

    println!(
        "   processed: {} courses, {} modules, {} lessons ({} unchanged), {} blocks",
        result.courses_processed,
        result.modules_processed,
        result.lessons_processed,
        result.lessons_skipped,
        result.blocks_processed
    );
    println!(
        "   created {}, updated {}, deleted {} in {} ms",
        result.created.total(),
        result.updated.total(),
        result.deleted.total(),
        result.duration_ms
    );

    if !result.success {
        println!("{} Sync finished with errors.", "FAILED".red().bold());
    } else if result.dry_run {
        println!("{} Dry run complete. Nothing was written.", "OK".green().bold());
    } else if result.has_issues() {
        println!(
            "{} Sync complete with {} recoverable issue(s).",
            "OK".yellow().bold(),
            result.errors.len()
        );
    } else {
        println!("{} Sync complete.", "OK".green().bold());
    }
}
