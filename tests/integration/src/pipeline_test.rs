//! End-to-end runs through the on-disk pieces
//!
//! Config files resolved from a working directory, a JSON content snapshot
//! served in small pages, and the JSON file store reopened between runs the
//! way separate CLI invocations would.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use course_blocks::BlockContent;
use course_core::{
    ConfigResolver, CurriculumState, FileStore, LevelCounts, SnapshotSource, SyncConfig,
    SyncCoordinator, SyncOptions, SyncOrchestrator, SyncResult,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const CONFIG: &str = r#"
[sync]
max_block_depth = 2
page_size = 1

[[courses]]
slug = "joinery"
page_id = "page-j"

[[courses]]
slug = "pottery"
page_id = "page-p"
"#;

const LOCAL_OVERLAY: &str = r#"
[[courses]]
slug = "pottery"
page_id = "page-p"
enabled = false
"#;

const SNAPSHOT: &str = r#"{
    "pages": {
        "page-j": { "id": "page-j", "title": "Joinery" },
        "page-p": { "id": "page-p", "title": "Pottery" }
    },
    "structures": {
        "page-j": { "modules": [
            { "id": "m1", "title": "Week 2: Marking out", "lessons": [
                { "id": "l1", "title": "Gauges" },
                { "id": "l2", "title": "Squares" }
            ] }
        ] },
        "page-p": { "modules": [
            { "id": "pm1", "title": "Clay", "lessons": [ { "id": "pl1", "title": "Wedging" } ] }
        ] }
    },
    "children": {
        "l1": [
            { "id": "b1", "type": "callout", "rich_text": [{ "plain_text": "Intro - 15 minutes" }] },
            { "id": "b2", "type": "toggle", "has_children": true, "rich_text": [{ "plain_text": "Going further" }] },
            { "id": "b3", "type": "to_do", "checked": false, "rich_text": [{ "plain_text": "Marking gauge" }] },
            { "id": "b4", "type": "to_do", "checked": false, "rich_text": [{ "plain_text": "Pencil" }] }
        ],
        "b2": [
            { "id": "b5", "type": "toggle", "has_children": true, "rich_text": [{ "plain_text": "Deeper" }] },
            { "id": "b6", "type": "paragraph", "rich_text": [{ "plain_text": "Try a cutting gauge." }] }
        ],
        "b5": [
            { "id": "b7", "type": "paragraph", "rich_text": [{ "plain_text": "Past the depth limit." }] }
        ],
        "l2": [
            { "id": "b8", "type": "paragraph", "rich_text": [{ "plain_text": "Check for square." }] },
            { "id": "b9", "type": "callout", "rich_text": [{ "plain_text": "Practice 20 mins" }] }
        ],
        "pl1": [
            { "id": "pb1", "type": "paragraph", "rich_text": [{ "plain_text": "Knead the clay." }] }
        ]
    }
}"#;

/// `l1` dropped from the structure, `l2` unchanged.
const SNAPSHOT_WITHOUT_L1: &str = r#"{
    "pages": { "page-j": { "id": "page-j", "title": "Joinery" } },
    "structures": {
        "page-j": { "modules": [
            { "id": "m1", "title": "Week 2: Marking out", "lessons": [ { "id": "l2", "title": "Squares" } ] }
        ] }
    },
    "children": {
        "l2": [
            { "id": "b8", "type": "paragraph", "rich_text": [{ "plain_text": "Check for square." }] },
            { "id": "b9", "type": "callout", "rich_text": [{ "plain_text": "Practice 20 mins" }] }
        ]
    }
}"#;

fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("course-sync.toml"), CONFIG).unwrap();
    fs::write(dir.path().join("course-sync.local.toml"), LOCAL_OVERLAY).unwrap();
    dir
}

fn load_config(dir: &Path) -> SyncConfig {
    ConfigResolver::with_global_config_dir(dir, dir.join("global"))
        .resolve(None)
        .unwrap()
}

/// One run as a fresh process would do it: reopen everything from disk.
async fn run(dir: &Path, snapshot: &str) -> SyncResult {
    let config = load_config(dir);
    let source = SnapshotSource::from_json(snapshot)
        .unwrap()
        .with_page_size(config.settings().page_size);
    let store = FileStore::open(dir.join("store.json")).unwrap();

    SyncOrchestrator::new(
        Arc::new(source),
        Arc::new(store),
        config,
        Arc::new(SyncCoordinator::new()),
    )
    .sync_curriculum(SyncOptions::default())
    .await
}

fn stored(dir: &Path) -> CurriculumState {
    FileStore::open(dir.join("store.json")).unwrap().snapshot()
}

/// Everything but the sync timestamps.
fn content_of(state: &CurriculumState) -> Vec<String> {
    let mut rows = Vec::new();
    for (id, r) in &state.courses {
        rows.push(format!("course {id} <- {} {:?}", r.parent_id, r.fields));
    }
    for (id, r) in &state.modules {
        rows.push(format!("module {id} <- {} {:?}", r.parent_id, r.fields));
    }
    for (id, r) in &state.lessons {
        rows.push(format!("lesson {id} <- {} {:?}", r.parent_id, r.fields));
    }
    for (id, r) in &state.blocks {
        rows.push(format!("block {id} <- {} {:?} {}", r.parent_id, r.fields, r.created_at));
    }
    rows
}

#[test]
fn local_overlay_disables_course() {
    let dir = setup_workspace();
    let config = load_config(dir.path());

    let enabled: Vec<&str> = config.enabled_courses().map(|c| c.slug.as_str()).collect();
    assert_eq!(enabled, vec!["joinery"]);
    assert_eq!(config.settings().max_block_depth, 2);
}

#[tokio::test]
async fn first_run_mirrors_enabled_courses() {
    let dir = setup_workspace();

    let result = run(dir.path(), SNAPSHOT).await;
    assert!(result.success, "issues: {:?}", result.errors);
    assert_eq!(
        result.created,
        LevelCounts {
            courses: 1,
            modules: 1,
            lessons: 2,
            blocks: 5,
        }
    );

    let state = stored(dir.path());
    assert!(!state.courses.contains_key("page-p"));
    assert_eq!(state.modules["m1"].fields.week_number, 2);
    assert_eq!(state.lessons["l1"].fields.duration_mins, 15);
    assert_eq!(state.lessons["l2"].fields.duration_mins, 20);
}

#[tokio::test]
async fn nested_toggles_stop_at_depth_limit() {
    let dir = setup_workspace();
    run(dir.path(), SNAPSHOT).await;

    let state = stored(dir.path());
    let BlockContent::Toggle { children, .. } = &state.blocks["b2"].fields.content else {
        panic!("b2 should be a toggle: {:?}", state.blocks["b2"].fields.content);
    };
    assert_eq!(children.len(), 2);

    let BlockContent::Toggle { children: deeper, .. } = &children[0].content else {
        panic!("b5 should be a toggle: {:?}", children[0].content);
    };
    assert!(deeper.is_empty());
    assert!(!state.blocks.contains_key("b7"));
}

#[tokio::test]
async fn rerun_from_disk_is_idempotent() {
    let dir = setup_workspace();
    run(dir.path(), SNAPSHOT).await;
    let before = stored(dir.path());

    let result = run(dir.path(), SNAPSHOT).await;
    assert!(result.success, "issues: {:?}", result.errors);
    assert_eq!(result.created.total(), 0);
    assert_eq!(result.deleted.total(), 0);
    assert_eq!(
        result.updated,
        LevelCounts {
            courses: 1,
            modules: 1,
            lessons: 2,
            blocks: 5,
        }
    );

    assert_eq!(content_of(&stored(dir.path())), content_of(&before));
}

#[tokio::test]
async fn dropped_lesson_leaves_the_store_with_its_blocks() {
    let dir = setup_workspace();
    run(dir.path(), SNAPSHOT).await;

    let result = run(dir.path(), SNAPSHOT_WITHOUT_L1).await;
    assert!(result.success, "issues: {:?}", result.errors);
    assert_eq!(result.deleted.lessons, 1);

    let state = stored(dir.path());
    assert!(!state.lessons.contains_key("l1"));
    assert!(state.blocks.values().all(|b| b.parent_id == "l2"));
    assert_eq!(state.blocks.len(), 2);
}
