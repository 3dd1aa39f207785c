//! Property: after any sequence of runs the store mirrors the last source.

use std::collections::BTreeSet;
use std::sync::Arc;

use course_core::{MemoryStore, SyncCoordinator, SyncOptions, SyncOrchestrator};
use course_test_utils::ScriptedSource;
use course_test_utils::nodes::{callout, config, lesson, module, paragraph, structure};
use proptest::prelude::*;

const MODULES: usize = 3;
const LESSONS: usize = 6;

/// One source version: which modules exist, and per lesson the module it
/// sits in (`MODULES` or more means the lesson is absent).
#[derive(Debug, Clone)]
struct Version {
    modules: [bool; MODULES],
    placement: [usize; LESSONS],
}

impl Version {
    fn module_of(&self, lesson: usize) -> Option<usize> {
        let m = self.placement[lesson];
        (m < MODULES && self.modules[m]).then_some(m)
    }

    fn expected_lessons(&self) -> BTreeSet<(String, String)> {
        (0..LESSONS)
            .filter_map(|l| self.module_of(l).map(|m| (format!("l{l}"), format!("m{m}"))))
            .collect()
    }

    fn expected_blocks(&self) -> BTreeSet<String> {
        (0..LESSONS)
            .filter(|&l| self.module_of(l).is_some())
            .flat_map(|l| [format!("l{l}-p"), format!("l{l}-c")])
            .collect()
    }

    fn apply(&self, source: &ScriptedSource) {
        let modules = (0..MODULES)
            .filter(|&m| self.modules[m])
            .map(|m| {
                let lessons = (0..LESSONS)
                    .filter(|&l| self.placement[l] == m)
                    .map(|l| lesson(&format!("l{l}"), &format!("Lesson {l}")))
                    .collect();
                module(&format!("m{m}"), &format!("Week {}", m + 1), lessons)
            })
            .collect();
        source.set_structure("page-1", structure(modules));
    }
}

fn version() -> impl Strategy<Value = Version> {
    (
        prop::array::uniform3(any::<bool>()),
        prop::array::uniform6(0..MODULES + 1),
    )
        .prop_map(|(modules, placement)| Version { modules, placement })
}

fn scripted_source() -> ScriptedSource {
    let source = ScriptedSource::new();
    source.add_course("page-1", "Ceramics", structure(Vec::new()));
    for l in 0..LESSONS {
        source.set_lesson(
            &format!("l{l}"),
            vec![
                paragraph(&format!("l{l}-p"), "Read the brief."),
                callout(&format!("l{l}-c"), "Task 5 minutes", None),
            ],
        );
    }
    source
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn store_mirrors_latest_source(versions in prop::collection::vec(version(), 1..5)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let source = Arc::new(scripted_source());
        let store = Arc::new(MemoryStore::new());
        let sync = SyncOrchestrator::new(
            source.clone(),
            store.clone(),
            config(&[("ceramics", "page-1")]),
            Arc::new(SyncCoordinator::new()),
        );

        for version in &versions {
            version.apply(&source);
            let result = runtime.block_on(sync.sync_curriculum(SyncOptions::default()));
            prop_assert!(result.success, "issues: {:?}", result.errors);

            let state = store.snapshot();
            let modules: BTreeSet<String> = state.modules.keys().cloned().collect();
            let expected_modules: BTreeSet<String> = (0..MODULES)
                .filter(|&m| version.modules[m])
                .map(|m| format!("m{m}"))
                .collect();
            prop_assert_eq!(modules, expected_modules);

            let lessons: BTreeSet<(String, String)> = state
                .lessons
                .values()
                .map(|r| (r.external_id.clone(), r.parent_id.clone()))
                .collect();
            prop_assert_eq!(lessons, version.expected_lessons());

            let blocks: BTreeSet<String> = state.blocks.keys().cloned().collect();
            prop_assert_eq!(blocks, version.expected_blocks());

            for record in state.lessons.values() {
                prop_assert_eq!(record.fields.duration_mins, 5);
            }
        }
    }
}
