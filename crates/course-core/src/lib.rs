//! Reconciliation engine and sync orchestration for Course Sync
//!
//! This crate pulls course content from an external content source and
//! reconciles it into the persisted course → module → lesson → block model:
//!
//! - **Configuration**: which courses to sync and how deep to walk block trees
//! - **Sources**: the [`ContentSource`] seam plus the depth-bounded tree walk
//! - **Stores**: the per-level [`EntityStore`] seam, in-memory and file-backed
//! - **Reconciliation**: create/update/delete of one level against the store
//! - **Orchestration**: single-flight runs producing a [`SyncResult`]
//!
//! # Architecture
//!
//! ```text
//!            CLI / scheduled trigger
//!                      |
//!              SyncOrchestrator ---- SyncCoordinator
//!               /            \
//!   ContentSource    ReconciliationEngine -- EntityStore
//!        |                   |
//!   ExternalNode -> course-blocks pipeline
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod sync;

pub use config::{ConfigResolver, CourseConfig, SyncConfig, SyncSettings};
pub use error::{Error, Result};
pub use model::{
    BlockFields, COURSE_ROOT, CourseFields, EntityFields, LessonFields, Level, ModuleFields, Record,
    derive_week_number,
};
pub use reconcile::{Candidate, LevelOutcome, OrphanPolicy, ReconciliationEngine};
pub use source::{
    BlockPage, BlockPager, ContentSource, CourseStructure, LessonOutline, ModuleOutline,
    PageMetadata, SnapshotSource, SourceError, SourceResult, drain_block_tree,
};
pub use store::{
    CurriculumState, CurriculumStore, EntityStore, FileStore, MemoryStore, StoreError, StoreResult,
    UpsertRequest,
};
pub use sync::{
    IssueKind, LevelCounts, SyncCoordinator, SyncGuard, SyncIssue, SyncOptions, SyncOrchestrator,
    SyncResult, SyncScope, SyncStatus,
};
