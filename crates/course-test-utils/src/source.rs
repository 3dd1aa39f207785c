//! [`ScriptedSource`]: an in-memory [`ContentSource`] for orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use course_blocks::ExternalNode;
use course_core::{
    ContentSource, CourseConfig, CourseStructure, PageMetadata, SourceError, SourceResult,
};
use tokio::sync::Semaphore;

/// Holds a run inside `fetch_page` until the test releases it.
#[derive(Debug)]
pub struct RunGate {
    entered: Semaphore,
    release: Semaphore,
}

impl RunGate {
    fn new() -> Self {
        Self {
            entered: Semaphore::new(0),
            release: Semaphore::new(0),
        }
    }

    /// Wait until a run has reached the gate.
    pub async fn wait_entered(&self) {
        self.entered
            .acquire()
            .await
            .unwrap_or_else(|e| panic!("RunGate::wait_entered: {e}"))
            .forget();
    }

    /// Let one waiting run continue.
    pub fn release(&self) {
        self.release.add_permits(1);
    }

    async fn pass(&self) {
        self.entered.add_permits(1);
        self.release
            .acquire()
            .await
            .unwrap_or_else(|e| panic!("RunGate::pass: {e}"))
            .forget();
    }
}

#[derive(Debug, Default)]
struct Script {
    pages: HashMap<String, PageMetadata>,
    structures: HashMap<String, CourseStructure>,
    lessons: HashMap<String, Vec<ExternalNode>>,
    failing_pages: HashSet<String>,
    failing_structures: HashSet<String>,
    failing_lessons: HashSet<String>,
    block_fetches: Vec<String>,
}

/// Scriptable content source
///
/// Content can be changed between runs through `&self`, so one source can be
/// shared with an orchestrator behind an `Arc`.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<Script>,
    gate: Option<Arc<RunGate>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `fetch_page` wait on the returned gate.
    pub fn gated() -> (Self, Arc<RunGate>) {
        let gate = Arc::new(RunGate::new());
        let source = Self {
            script: Mutex::default(),
            gate: Some(gate.clone()),
        };
        (source, gate)
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a course page and its structure.
    pub fn add_course(&self, page_id: &str, title: &str, structure: CourseStructure) {
        let mut script = self.script();
        script.pages.insert(
            page_id.to_string(),
            PageMetadata {
                id: page_id.to_string(),
                title: title.to_string(),
                url: None,
                last_edited_at: None,
            },
        );
        script.structures.insert(page_id.to_string(), structure);
    }

    pub fn set_structure(&self, page_id: &str, structure: CourseStructure) {
        self.script()
            .structures
            .insert(page_id.to_string(), structure);
    }

    pub fn remove_structure(&self, page_id: &str) {
        self.script().structures.remove(page_id);
    }

    pub fn set_lesson(&self, lesson_id: &str, nodes: Vec<ExternalNode>) {
        self.script().lessons.insert(lesson_id.to_string(), nodes);
    }

    pub fn fail_page(&self, page_id: &str) {
        self.script().failing_pages.insert(page_id.to_string());
    }

    pub fn fail_structure(&self, page_id: &str) {
        self.script().failing_structures.insert(page_id.to_string());
    }

    pub fn fail_lesson(&self, lesson_id: &str) {
        self.script().failing_lessons.insert(lesson_id.to_string());
    }

    pub fn heal_lesson(&self, lesson_id: &str) {
        self.script().failing_lessons.remove(lesson_id);
    }

    /// Lesson ids whose blocks were fetched, in call order.
    pub fn block_fetches(&self) -> Vec<String> {
        self.script().block_fetches.clone()
    }

    pub fn clear_block_fetches(&self) {
        self.script().block_fetches.clear();
    }
}

/// Drop children below `max_depth`, keeping the `has_children` flag.
fn prune(nodes: &mut [ExternalNode], max_depth: usize) {
    let mut stack: Vec<(&mut ExternalNode, usize)> = nodes.iter_mut().map(|n| (n, 1)).collect();
    while let Some((node, depth)) = stack.pop() {
        if depth >= max_depth {
            node.children.clear();
        } else {
            stack.extend(node.children.iter_mut().map(|c| (c, depth + 1)));
        }
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn fetch_page(&self, page_id: &str) -> SourceResult<PageMetadata> {
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }

        let script = self.script();
        if script.failing_pages.contains(page_id) {
            return Err(SourceError::fetch(page_id, "scripted page failure"));
        }
        script
            .pages
            .get(page_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                id: page_id.to_string(),
            })
    }

    async fn fetch_block_children(
        &self,
        block_id: &str,
        max_depth: usize,
    ) -> SourceResult<Vec<ExternalNode>> {
        let mut script = self.script();
        script.block_fetches.push(block_id.to_string());
        if script.failing_lessons.contains(block_id) {
            return Err(SourceError::fetch(block_id, "scripted lesson failure"));
        }

        let mut nodes = script.lessons.get(block_id).cloned().unwrap_or_default();
        prune(&mut nodes, max_depth);
        Ok(nodes)
    }

    async fn fetch_course_structure(&self, course: &CourseConfig) -> SourceResult<CourseStructure> {
        let script = self.script();
        let key = course.structure_key();
        if script.failing_structures.contains(key) {
            return Err(SourceError::fetch(key, "scripted structure failure"));
        }
        script
            .structures
            .get(key)
            .cloned()
            .ok_or_else(|| SourceError::StructureMissing {
                course: course.slug.clone(),
            })
    }
}
