//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Store file used when `--store` is not given
pub const DEFAULT_STORE_FILE: &str = "course-store.json";

/// Content snapshot used when `--source` is not given
pub const DEFAULT_SOURCE_FILE: &str = "course-snapshot.json";

/// Course Sync - Mirror course curricula from a content workspace into a local store
#[derive(Parser, Debug)]
#[command(name = "course-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ./course-sync.toml, then the user config dir)
    #[arg(short, long, global = true, env = "COURSE_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Curriculum store file
    #[arg(long, global = true, env = "COURSE_SYNC_STORE", default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    /// Content snapshot to sync from (JSON export of pages, structures and blocks)
    #[arg(long, global = true, env = "COURSE_SYNC_SOURCE", default_value = DEFAULT_SOURCE_FILE)]
    pub source: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Synchronize courses from the content snapshot into the store
    ///
    /// Examples:
    ///   course-sync sync                     # All enabled courses
    ///   course-sync sync --course joinery    # One course, by slug or page id
    ///   course-sync sync --dry-run           # Report without writing
    Sync {
        /// Course slug or page id (defaults to `[sync] default_scope`, then all)
        #[arg(long)]
        course: Option<String>,

        /// Preview changes without writing to the store
        #[arg(long)]
        dry_run: bool,

        /// Re-fetch every lesson's blocks even when unchanged
        #[arg(long)]
        force_full: bool,

        /// Output the sync result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the last sync time and stored record counts
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List configured courses
    Courses,
}
