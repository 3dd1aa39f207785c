//! Status command implementation

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use course_core::{CurriculumState, LevelCounts, SyncStatus};

use super::Context;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    #[serde(flatten)]
    status: SyncStatus,
    store: String,
    records: LevelCounts,
}

/// Run the status command
///
/// A CLI process never overlaps another run, so `running` is always false;
/// the last sync time is the newest course stamp in the store.
pub fn run_status(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let state = store.snapshot();

    let report = StatusReport {
        status: SyncStatus {
            running: false,
            last_sync_time: last_sync_time(&state),
        },
        store: store.path().display().to_string(),
        records: LevelCounts {
            courses: state.courses.len(),
            modules: state.modules.len(),
            lessons: state.lessons.len(),
            blocks: state.blocks.len(),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} Course sync status", "=>".blue().bold());
    println!("   Store:     {}", report.store.cyan());
    match report.status.last_sync_time {
        Some(at) => println!("   Last sync: {}", at.to_rfc3339()),
        None => println!("   Last sync: {}", "never".yellow()),
    }
    println!(
        "   Records:   {} courses, {} modules, {} lessons, {} blocks",
        report.records.courses, report.records.modules, report.records.lessons, report.records.blocks
    );

    Ok(())
}

fn last_sync_time(state: &CurriculumState) -> Option<DateTime<Utc>> {
    state.courses.values().map(|c| c.synced_at).max()
}
