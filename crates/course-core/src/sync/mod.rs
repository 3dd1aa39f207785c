//! Sync runs
//!
//! - [`SyncOrchestrator`] drives one run across the configured courses
//! - [`SyncCoordinator`] keeps runs single-flight and remembers the last one
//! - [`SyncResult`] is what every run returns, degraded or not

mod coordinator;
mod orchestrator;
mod report;

pub use coordinator::{SyncCoordinator, SyncGuard, SyncStatus};
pub use orchestrator::{SyncOptions, SyncOrchestrator, SyncScope};
pub use report::{IssueKind, LevelCounts, SyncIssue, SyncResult};
