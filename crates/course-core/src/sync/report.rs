//! Run results

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Level;
use crate::reconcile::LevelOutcome;

/// Classification of an issue recorded during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// Another run holds the lock; nothing was processed
    LockContention,
    /// A page, structure, or block tree could not be fetched
    SourceFetch,
    /// A store write failed for one entity
    ReconciliationWrite,
    /// The course has no module/lesson structure
    StructureMissing,
    /// The requested course is not configured
    CourseUnavailable,
}

/// One error entry of a [`SyncResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncIssue {
    pub level: Level,
    pub external_id: String,
    pub kind: IssueKind,
    pub message: String,
    pub recoverable: bool,
}

impl SyncIssue {
    pub fn recoverable(
        level: Level,
        external_id: impl Into<String>,
        kind: IssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            external_id: external_id.into(),
            kind,
            message: message.into(),
            recoverable: true,
        }
    }

    pub fn fatal(
        level: Level,
        external_id: impl Into<String>,
        kind: IssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recoverable: false,
            ..Self::recoverable(level, external_id, kind, message)
        }
    }
}

/// Per-level counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub courses: usize,
    pub modules: usize,
    pub lessons: usize,
    pub blocks: usize,
}

impl LevelCounts {
    pub fn get(&self, level: Level) -> usize {
        match level {
            Level::Course => self.courses,
            Level::Module => self.modules,
            Level::Lesson => self.lessons,
            Level::Block => self.blocks,
        }
    }

    fn add(&mut self, level: Level, n: usize) {
        let slot = match level {
            Level::Course => &mut self.courses,
            Level::Module => &mut self.modules,
            Level::Lesson => &mut self.lessons,
            Level::Block => &mut self.blocks,
        };
        *slot += n;
    }

    pub fn total(&self) -> usize {
        self.courses + self.modules + self.lessons + self.blocks
    }
}

/// Outcome of one `sync_curriculum` call
///
/// `success` is false only when a non-recoverable issue was recorded.
/// Recoverable issues leave `success` true with entries in `errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub courses_processed: usize,
    pub modules_processed: usize,
    pub lessons_processed: usize,
    pub blocks_processed: usize,
    /// Lessons whose block tree was left as stored because the source
    /// reported no edit since the last sync
    pub lessons_skipped: usize,
    pub created: LevelCounts,
    pub updated: LevelCounts,
    pub deleted: LevelCounts,
    pub errors: Vec<SyncIssue>,
    /// Intended writes, recorded on dry runs
    pub actions: Vec<String>,
}

impl SyncResult {
    pub fn new(dry_run: bool) -> Self {
        Self {
            success: true,
            dry_run,
            started_at: Utc::now(),
            duration_ms: 0,
            courses_processed: 0,
            modules_processed: 0,
            lessons_processed: 0,
            blocks_processed: 0,
            lessons_skipped: 0,
            created: LevelCounts::default(),
            updated: LevelCounts::default(),
            deleted: LevelCounts::default(),
            errors: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Result of a run turned away because another run holds the lock
    pub fn rejected(dry_run: bool) -> Self {
        let mut result = Self::new(dry_run);
        result.push_issue(SyncIssue::recoverable(
            Level::Course,
            "",
            IssueKind::LockContention,
            "Sync already in progress",
        ));
        result
    }

    pub fn push_issue(&mut self, issue: SyncIssue) {
        if !issue.recoverable {
            self.success = false;
        }
        self.errors.push(issue);
    }

    /// Fold one level's reconciliation outcome into the totals.
    pub fn absorb(&mut self, level: Level, outcome: &LevelOutcome) {
        self.created.add(level, outcome.created);
        self.updated.add(level, outcome.updated);
        self.deleted.add(level, outcome.deleted);
        self.add_processed(level, outcome.upserted.len());
        self.actions.extend(outcome.actions.iter().cloned());
        for issue in &outcome.issues {
            self.push_issue(issue.clone());
        }
    }

    fn add_processed(&mut self, level: Level, n: usize) {
        let slot = match level {
            Level::Course => &mut self.courses_processed,
            Level::Module => &mut self.modules_processed,
            Level::Lesson => &mut self.lessons_processed,
            Level::Block => &mut self.blocks_processed,
        };
        *slot += n;
    }

    pub fn is_rejected(&self) -> bool {
        self.errors
            .iter()
            .any(|issue| issue.kind == IssueKind::LockContention)
    }

    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }
}
