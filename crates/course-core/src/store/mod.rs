//! Persistent store seam
//!
//! Each level of the hierarchy is reached through [`EntityStore`],
//! parameterised by the level's [`EntityFields`] type. A [`CurriculumStore`]
//! is anything that stores all four levels.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::{CurriculumState, MemoryStore, Table};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{BlockFields, CourseFields, EntityFields, LessonFields, ModuleFields, Record};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Create-or-update of one record
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertRequest<F> {
    pub external_id: String,
    pub parent_id: String,
    pub fields: F,
    pub synced_at: DateTime<Utc>,
}

#[async_trait]
pub trait EntityStore<F: EntityFields>: Send + Sync {
    /// Records whose parent is `parent_id`, in sort order.
    async fn find_children(&self, parent_id: &str) -> StoreResult<Vec<Record<F>>>;

    /// Insert the record, or replace the fields of an existing one with the
    /// same external id. `created_at` is kept on update.
    async fn upsert(&self, request: UpsertRequest<F>) -> StoreResult<()>;

    /// Delete records and everything beneath them. Returns how many of `ids`
    /// were present.
    async fn delete_many(&self, ids: &[String]) -> StoreResult<usize>;

    /// Make earlier writes durable. Stores that write through need not
    /// override this.
    async fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

pub trait CurriculumStore:
    EntityStore<CourseFields>
    + EntityStore<ModuleFields>
    + EntityStore<LessonFields>
    + EntityStore<BlockFields>
{
}

impl<T> CurriculumStore for T where
    T: EntityStore<CourseFields>
        + EntityStore<ModuleFields>
        + EntityStore<LessonFields>
        + EntityStore<BlockFields>
{
}
