//! In-process store

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EntityStore, StoreResult, UpsertRequest};
use crate::model::{
    BlockFields, CourseFields, EntityFields, LessonFields, Level, ModuleFields, Record,
};

/// All persisted records, one table per level keyed by external id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumState {
    #[serde(default)]
    pub courses: BTreeMap<String, Record<CourseFields>>,
    #[serde(default)]
    pub modules: BTreeMap<String, Record<ModuleFields>>,
    #[serde(default)]
    pub lessons: BTreeMap<String, Record<LessonFields>>,
    #[serde(default)]
    pub blocks: BTreeMap<String, Record<BlockFields>>,
}

/// Access to the table holding records with fields `F`
pub trait Table<F: EntityFields> {
    fn table(&self) -> &BTreeMap<String, Record<F>>;
    fn table_mut(&mut self) -> &mut BTreeMap<String, Record<F>>;
}

macro_rules! impl_table {
    ($fields:ty, $field:ident) => {
        impl Table<$fields> for CurriculumState {
            fn table(&self) -> &BTreeMap<String, Record<$fields>> {
                &self.$field
            }

            fn table_mut(&mut self) -> &mut BTreeMap<String, Record<$fields>> {
                &mut self.$field
            }
        }
    };
}

impl_table!(CourseFields, courses);
impl_table!(ModuleFields, modules);
impl_table!(LessonFields, lessons);
impl_table!(BlockFields, blocks);

fn child_ids<F: EntityFields>(table: &BTreeMap<String, Record<F>>, parent_id: &str) -> Vec<String> {
    table
        .values()
        .filter(|r| r.parent_id == parent_id)
        .map(|r| r.external_id.clone())
        .collect()
}

impl CurriculumState {
    /// Remove one record and its descendants. Returns whether it existed.
    pub fn remove_cascade(&mut self, level: Level, id: &str) -> bool {
        let mut root_existed = None;
        let mut pending = vec![(level, id.to_string())];

        while let Some((level, id)) = pending.pop() {
            let (existed, below) = match level {
                Level::Course => (
                    self.courses.remove(&id).is_some(),
                    child_ids(&self.modules, &id)
                        .into_iter()
                        .map(|c| (Level::Module, c))
                        .collect::<Vec<_>>(),
                ),
                Level::Module => (
                    self.modules.remove(&id).is_some(),
                    child_ids(&self.lessons, &id)
                        .into_iter()
                        .map(|c| (Level::Lesson, c))
                        .collect(),
                ),
                Level::Lesson => (
                    self.lessons.remove(&id).is_some(),
                    child_ids(&self.blocks, &id)
                        .into_iter()
                        .map(|c| (Level::Block, c))
                        .collect(),
                ),
                Level::Block => (self.blocks.remove(&id).is_some(), Vec::new()),
            };

            root_existed.get_or_insert(existed);
            pending.extend(below);
        }

        root_existed.unwrap_or(false)
    }

    pub fn total_records(&self) -> usize {
        self.courses.len() + self.modules.len() + self.lessons.len() + self.blocks.len()
    }
}

/// Store holding every record in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<CurriculumState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: CurriculumState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> CurriculumState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl<F> EntityStore<F> for MemoryStore
where
    F: EntityFields,
    CurriculumState: Table<F>,
{
    async fn find_children(&self, parent_id: &str) -> StoreResult<Vec<Record<F>>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut children: Vec<Record<F>> = Table::<F>::table(&*state)
            .values()
            .filter(|r| r.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by_key(|r| r.fields.sort_order());
        Ok(children)
    }

    async fn upsert(&self, request: UpsertRequest<F>) -> StoreResult<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let table = Table::<F>::table_mut(&mut *state);

        match table.get_mut(&request.external_id) {
            Some(existing) => {
                existing.parent_id = request.parent_id;
                existing.fields = request.fields;
                existing.synced_at = request.synced_at;
            }
            None => {
                table.insert(
                    request.external_id.clone(),
                    Record {
                        external_id: request.external_id,
                        parent_id: request.parent_id,
                        fields: request.fields,
                        created_at: request.synced_at,
                        synced_at: request.synced_at,
                    },
                );
            }
        }
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> StoreResult<usize> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        Ok(ids
            .iter()
            .filter(|id| state.remove_cascade(F::LEVEL, id))
            .count())
    }
}
