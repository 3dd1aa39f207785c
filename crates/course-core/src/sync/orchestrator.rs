//! One sync run, top-down across the configured courses

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use course_blocks::{BlockClassifier, DomainBlock, transform_lesson};
use tracing::Instrument;

use super::coordinator::{SyncCoordinator, SyncStatus};
use super::report::{IssueKind, SyncIssue, SyncResult};
use crate::config::{CourseConfig, SyncConfig};
use crate::model::{
    BlockFields, COURSE_ROOT, CourseFields, EntityFields, LessonFields, Level, ModuleFields, Record,
};
use crate::reconcile::{Candidate, OrphanPolicy, ReconciliationEngine};
use crate::source::{ContentSource, CourseStructure, LessonOutline, SourceError};
use crate::store::{CurriculumStore, EntityStore, UpsertRequest};

/// Which courses a run covers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncScope {
    /// Every enabled course, in configured order
    #[default]
    All,
    /// One course, by slug or page id
    Course(String),
}

impl SyncScope {
    /// `"all"` or a course key
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Course(value.to_string())
        }
    }
}

/// Options for a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub scope: SyncScope,
    /// Re-fetch every lesson's block tree even when the source reports no
    /// edit since the last sync
    pub force_full_sync: bool,
    /// If true, compute everything but skip all store writes.
    /// Intended writes are recorded as "[dry-run] Would ..." actions.
    pub dry_run: bool,
}

/// Drives sync runs against one source and one store
///
/// Runs are single-flight per [`SyncCoordinator`]: a call made while another
/// run holds the coordinator returns at once with a lock-contention issue.
pub struct SyncOrchestrator<C: ?Sized, S: ?Sized> {
    source: Arc<C>,
    store: Arc<S>,
    coordinator: Arc<SyncCoordinator>,
    config: SyncConfig,
    classifier: BlockClassifier,
}

impl<C, S> SyncOrchestrator<C, S>
where
    C: ContentSource + ?Sized,
    S: CurriculumStore + ?Sized,
{
    pub fn new(
        source: Arc<C>,
        store: Arc<S>,
        config: SyncConfig,
        coordinator: Arc<SyncCoordinator>,
    ) -> Self {
        Self {
            source,
            store,
            coordinator,
            config,
            classifier: BlockClassifier::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: BlockClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_sync_running(&self) -> bool {
        self.coordinator.is_running()
    }

    pub fn last_sync_time(&self) -> Option<chrono::DateTime<Utc>> {
        self.coordinator.last_sync_time()
    }

    pub fn status(&self) -> SyncStatus {
        self.coordinator.status()
    }

    /// Run one sync. Never fails: every problem is recorded in the result.
    pub async fn sync_curriculum(&self, options: SyncOptions) -> SyncResult {
        let Some(guard) = self.coordinator.try_acquire() else {
            tracing::warn!("Sync already in progress, rejecting run");
            return SyncResult::rejected(options.dry_run);
        };

        let started = Instant::now();
        let mut result = SyncResult::new(options.dry_run);
        let span = tracing::info_span!(
            "sync_run",
            dry_run = options.dry_run,
            force_full = options.force_full_sync
        );
        self.run(&options, &mut result).instrument(span).await;
        result.finish(started.elapsed());

        tracing::info!(
            success = result.success,
            courses = result.courses_processed,
            modules = result.modules_processed,
            lessons = result.lessons_processed,
            blocks = result.blocks_processed,
            skipped = result.lessons_skipped,
            issues = result.errors.len(),
            duration_ms = result.duration_ms,
            "Sync finished"
        );

        guard.complete(Utc::now());
        result
    }

    async fn run(&self, options: &SyncOptions, result: &mut SyncResult) {
        let courses = match self.resolve_scope(&options.scope) {
            Ok(courses) => courses,
            Err(issue) => {
                tracing::error!(key = %issue.external_id, "{}", issue.message);
                result.push_issue(issue);
                return;
            }
        };

        let engine = ReconciliationEngine::new(&*self.store, options.dry_run, result.started_at);
        for course in &courses {
            let span = tracing::info_span!("course", slug = %course.slug);
            self.sync_course(&engine, course, options, result)
                .instrument(span)
                .await;
        }
    }

    fn resolve_scope(&self, scope: &SyncScope) -> Result<Vec<CourseConfig>, SyncIssue> {
        match scope {
            SyncScope::All => Ok(self.config.enabled_courses().cloned().collect()),
            SyncScope::Course(key) => self
                .config
                .find_course(key)
                .map(|course| vec![course.clone()])
                .ok_or_else(|| {
                    SyncIssue::fatal(
                        Level::Course,
                        key.as_str(),
                        IssueKind::CourseUnavailable,
                        format!("course '{}' is not configured", key),
                    )
                }),
        }
    }

    async fn sync_course(
        &self,
        engine: &ReconciliationEngine<'_, S>,
        course: &CourseConfig,
        options: &SyncOptions,
        result: &mut SyncResult,
    ) {
        let page = match self.source.fetch_page(&course.page_id).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(page_id = %course.page_id, error = %e, "Course page unavailable");
                result.push_issue(SyncIssue::fatal(
                    Level::Course,
                    course.page_id.as_str(),
                    IssueKind::CourseUnavailable,
                    format!("failed to fetch course page: {e}"),
                ));
                return;
            }
        };

        let Some(persisted) = self.load_children::<CourseFields>(COURSE_ROOT, result).await else {
            return;
        };
        let title = if page.title.trim().is_empty() {
            course.title.clone().unwrap_or_else(|| course.slug.clone())
        } else {
            page.title
        };
        let fields = CourseFields {
            slug: course.slug.clone(),
            title,
            url: page.url,
        };
        let outcome = engine
            .reconcile(
                COURSE_ROOT,
                vec![Candidate::ready(course.page_id.as_str(), fields)],
                persisted,
                OrphanPolicy::Keep,
            )
            .await;
        result.absorb(Level::Course, &outcome);
        if outcome.upserted.is_empty() {
            return;
        }

        let structure = match self.source.fetch_course_structure(course).await {
            Ok(structure) => structure,
            Err(e) => {
                let kind = match e {
                    SourceError::StructureMissing { .. } => IssueKind::StructureMissing,
                    _ => IssueKind::SourceFetch,
                };
                tracing::warn!(error = %e, "Course structure unavailable, modules left as stored");
                result.push_issue(SyncIssue::recoverable(
                    Level::Course,
                    course.page_id.as_str(),
                    kind,
                    e.to_string(),
                ));
                return;
            }
        };

        self.sync_modules(engine, &course.page_id, structure, options, result)
            .await;
    }

    async fn sync_modules(
        &self,
        engine: &ReconciliationEngine<'_, S>,
        course_id: &str,
        structure: CourseStructure,
        options: &SyncOptions,
        result: &mut SyncResult,
    ) {
        let Some(persisted) = self.load_children::<ModuleFields>(course_id, result).await else {
            return;
        };

        let candidates = structure
            .modules
            .iter()
            .enumerate()
            .map(|(index, module)| {
                Candidate::ready(module.id.as_str(), ModuleFields::new(module.title.as_str(), index))
            })
            .collect();
        let outcome = engine
            .reconcile(course_id, candidates, persisted, OrphanPolicy::Delete)
            .await;
        result.absorb(Level::Module, &outcome);

        for module_id in &outcome.upserted {
            let Some(module) = structure.modules.iter().find(|m| &m.id == module_id) else {
                continue;
            };
            self.sync_lessons(engine, module_id, &module.lessons, options, result)
                .await;
        }
    }

    async fn sync_lessons(
        &self,
        engine: &ReconciliationEngine<'_, S>,
        module_id: &str,
        lessons: &[LessonOutline],
        options: &SyncOptions,
        result: &mut SyncResult,
    ) {
        let Some(persisted) = self.load_children::<LessonFields>(module_id, result).await else {
            return;
        };
        let max_depth = self.config.settings().max_block_depth;

        let stored: HashMap<&str, &Record<LessonFields>> = persisted
            .iter()
            .map(|r| (r.external_id.as_str(), r))
            .collect();
        let mut candidates = Vec::with_capacity(lessons.len());
        let mut unchanged: HashSet<String> = HashSet::new();
        let mut transformed: HashMap<String, Vec<DomainBlock>> = HashMap::new();
        // Fetched lessons are written unstamped; the source stamp is only
        // recorded once their blocks reconcile cleanly.
        let mut pending_stamps: HashMap<String, LessonFields> = HashMap::new();

        for (index, lesson) in lessons.iter().enumerate() {
            if !options.force_full_sync
                && let Some(previous) = stored.get(lesson.id.as_str())
                && previous.fields.source_edited_at.is_some()
                && previous.fields.source_edited_at == lesson.edited_at
            {
                tracing::debug!(lesson = %lesson.id, "Lesson unchanged since last sync, blocks kept");
                candidates.push(Candidate::ready(
                    lesson.id.as_str(),
                    LessonFields {
                        title: lesson.title.clone(),
                        sort_order: index,
                        ..previous.fields.clone()
                    },
                ));
                unchanged.insert(lesson.id.clone());
                continue;
            }

            match self.source.fetch_block_children(&lesson.id, max_depth).await {
                Ok(nodes) => {
                    let lesson_blocks = transform_lesson(&self.classifier, &nodes);
                    tracing::debug!(
                        lesson = %lesson.id,
                        nodes = nodes.len(),
                        blocks = lesson_blocks.blocks.len(),
                        "Transformed lesson"
                    );
                    let fields = LessonFields {
                        title: lesson.title.clone(),
                        sort_order: index,
                        duration_mins: lesson_blocks.aggregates.duration_mins,
                        criteria: lesson_blocks.aggregates.criteria,
                        source_edited_at: None,
                    };
                    if lesson.edited_at.is_some() {
                        pending_stamps.insert(
                            lesson.id.clone(),
                            LessonFields {
                                source_edited_at: lesson.edited_at,
                                ..fields.clone()
                            },
                        );
                    }
                    candidates.push(Candidate::ready(lesson.id.as_str(), fields));
                    transformed
                        .entry(lesson.id.clone())
                        .or_insert(lesson_blocks.blocks);
                }
                Err(e) => candidates.push(Candidate::failed(lesson.id.as_str(), e)),
            }
        }
        drop(stored);

        let outcome = engine
            .reconcile(module_id, candidates, persisted, OrphanPolicy::Delete)
            .await;
        result.absorb(Level::Lesson, &outcome);

        for lesson_id in &outcome.upserted {
            if unchanged.contains(lesson_id) {
                result.lessons_skipped += 1;
                continue;
            }
            let Some(blocks) = transformed.remove(lesson_id) else {
                continue;
            };
            let clean = self.sync_blocks(engine, lesson_id, blocks, result).await;
            if clean
                && !engine.is_dry_run()
                && let Some(fields) = pending_stamps.remove(lesson_id)
            {
                self.stamp_lesson(module_id, lesson_id, fields, result).await;
            }
        }
    }

    /// Record the source stamp of a lesson whose blocks are fully stored.
    async fn stamp_lesson(
        &self,
        module_id: &str,
        lesson_id: &str,
        fields: LessonFields,
        result: &mut SyncResult,
    ) {
        let request = UpsertRequest {
            external_id: lesson_id.to_string(),
            parent_id: module_id.to_string(),
            fields,
            synced_at: result.started_at,
        };
        let written = match EntityStore::<LessonFields>::upsert(&*self.store, request).await {
            Ok(()) => EntityStore::<LessonFields>::flush(&*self.store).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            tracing::warn!(lesson = lesson_id, error = %e, "Failed to record lesson source stamp");
            result.push_issue(SyncIssue::recoverable(
                Level::Lesson,
                lesson_id,
                IssueKind::ReconciliationWrite,
                format!("failed to record source stamp: {e}"),
            ));
        }
    }

    async fn sync_blocks(
        &self,
        engine: &ReconciliationEngine<'_, S>,
        lesson_id: &str,
        blocks: Vec<DomainBlock>,
        result: &mut SyncResult,
    ) -> bool {
        let Some(persisted) = self.load_children::<BlockFields>(lesson_id, result).await else {
            return false;
        };

        let candidates = blocks
            .iter()
            .map(|block| Candidate::ready(block.id.as_str(), BlockFields::from(block)))
            .collect();
        let outcome = engine
            .reconcile(lesson_id, candidates, persisted, OrphanPolicy::Delete)
            .await;
        result.absorb(Level::Block, &outcome);
        outcome.issues.is_empty()
    }

    /// Stored children of `parent_id`, or `None` after recording the failure.
    async fn load_children<F>(
        &self,
        parent_id: &str,
        result: &mut SyncResult,
    ) -> Option<Vec<Record<F>>>
    where
        F: EntityFields,
        S: EntityStore<F>,
    {
        match EntityStore::<F>::find_children(&*self.store, parent_id).await {
            Ok(records) => Some(records),
            Err(e) => {
                let level = F::LEVEL;
                tracing::warn!(%level, parent = parent_id, error = %e, "Failed to load stored children");
                result.push_issue(SyncIssue::recoverable(
                    level,
                    parent_id,
                    IssueKind::ReconciliationWrite,
                    format!("failed to load stored {level}s: {e}"),
                ));
                None
            }
        }
    }
}
