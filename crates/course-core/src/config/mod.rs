//! Sync configuration
//!
//! Configuration is a single TOML file, `course-sync.toml`, with an optional
//! `course-sync.local.toml` overlay next to it:
//!
//! ```toml
//! [sync]
//! max_block_depth = 3
//! page_size = 100
//! default_scope = "all"
//!
//! [[courses]]
//! slug = "joinery"
//! page_id = "0f3c..."
//! title = "Joinery Level 2"
//! ```

mod manifest;
mod resolver;

pub use manifest::{CourseConfig, DEFAULT_MAX_BLOCK_DEPTH, DEFAULT_PAGE_SIZE, SyncConfig, SyncSettings};
pub use resolver::{CONFIG_FILE_NAME, ConfigResolver};
