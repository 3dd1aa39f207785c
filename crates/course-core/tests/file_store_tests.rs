//! Persistence tests for the JSON file store.

use std::sync::Arc;

use course_core::{
    CourseFields, EntityStore, FileStore, ModuleFields, Record, SnapshotSource, SyncCoordinator,
    SyncOptions, SyncOrchestrator, UpsertRequest,
};
use course_test_utils::nodes::{config, stamp};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn module(id: &str, order: usize) -> UpsertRequest<ModuleFields> {
    UpsertRequest {
        external_id: id.into(),
        parent_id: "page-1".into(),
        fields: ModuleFields::new(format!("Week {}", order + 1), order),
        synced_at: stamp(0),
    }
}

#[tokio::test]
async fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = FileStore::open(&path).unwrap();
        store
            .upsert(UpsertRequest {
                external_id: "page-1".into(),
                parent_id: course_core::COURSE_ROOT.into(),
                fields: CourseFields {
                    slug: "joinery".into(),
                    title: "Joinery".into(),
                    url: None,
                },
                synced_at: stamp(0),
            })
            .await
            .unwrap();
        store.upsert(module("m1", 0)).await.unwrap();
        store.upsert(module("m2", 1)).await.unwrap();
        EntityStore::<ModuleFields>::flush(&store).await.unwrap();
    }

    let reopened = FileStore::open(&path).unwrap();
    let modules: Vec<Record<ModuleFields>> = reopened.find_children("page-1").await.unwrap();

    assert_eq!(
        modules.iter().map(|m| m.external_id.as_str()).collect::<Vec<_>>(),
        vec!["m1", "m2"]
    );
    assert_eq!(reopened.snapshot().courses["page-1"].fields.slug, "joinery");
}

#[tokio::test]
async fn delete_is_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let store = FileStore::open(&path).unwrap();
    store.upsert(module("m1", 0)).await.unwrap();
    store.upsert(module("m2", 1)).await.unwrap();

    let deleted = EntityStore::<ModuleFields>::delete_many(&store, &["m1".to_string()])
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    EntityStore::<ModuleFields>::flush(&store).await.unwrap();

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.snapshot().modules.len(), 1);
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn writes_reach_disk_on_flush() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let store = FileStore::open(&path).unwrap();
    store.upsert(module("m1", 0)).await.unwrap();
    store.upsert(module("m2", 1)).await.unwrap();

    assert!(store.is_dirty());
    assert!(!path.exists());

    EntityStore::<ModuleFields>::flush(&store).await.unwrap();
    assert!(!store.is_dirty());
    assert_eq!(FileStore::open(&path).unwrap().snapshot().modules.len(), 2);

    // Nothing pending: no rewrite
    std::fs::remove_file(&path).unwrap();
    EntityStore::<ModuleFields>::flush(&store).await.unwrap();
    assert!(!path.exists());
}

#[test]
fn missing_file_opens_empty() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("nested").join("store.json")).unwrap();

    assert_eq!(store.snapshot().total_records(), 0);
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(FileStore::open(&path).is_err());
}

const SNAPSHOT: &str = r#"{
    "pages": { "page-1": { "id": "page-1", "title": "Joinery" } },
    "structures": {
        "page-1": { "modules": [
            { "id": "m1", "title": "Week 1", "lessons": [ { "id": "l1", "title": "Safety" } ] }
        ] }
    },
    "children": {
        "l1": [
            { "id": "b1", "type": "callout", "rich_text": [{ "plain_text": "Intro 15 minutes" }] },
            { "id": "b2", "type": "to_do", "checked": false, "rich_text": [{ "plain_text": "Goggles" }] },
            { "id": "b3", "type": "to_do", "checked": true, "rich_text": [{ "plain_text": "Apron" }] }
        ]
    }
}"#;

#[tokio::test]
async fn snapshot_sync_into_file_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let source = Arc::new(SnapshotSource::from_json(SNAPSHOT).unwrap().with_page_size(2));
    let store = Arc::new(FileStore::open(&path).unwrap());
    let sync = SyncOrchestrator::new(
        source,
        store,
        config(&[("joinery", "page-1")]),
        Arc::new(SyncCoordinator::new()),
    );

    let result = sync.sync_curriculum(SyncOptions::default()).await;
    assert!(result.success, "issues: {:?}", result.errors);
    assert_eq!(result.created.blocks, 2);

    let state = FileStore::open(&path).unwrap().snapshot();
    assert_eq!(state.lessons["l1"].fields.duration_mins, 15);
    assert_eq!(state.blocks.len(), 2);
    assert!(state.blocks.contains_key("b2"));
}
