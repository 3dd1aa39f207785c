//! Content source seam
//!
//! A [`ContentSource`] answers three questions for the orchestrator: what a
//! course page is, which modules and lessons a course has, and what raw block
//! tree a lesson holds. Transport concerns (auth, rate limits, retries,
//! timeouts) belong to implementations.

mod paged;
mod snapshot;

pub use paged::{BlockPage, BlockPager, drain_block_tree, drain_children};
pub use snapshot::SnapshotSource;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_blocks::ExternalNode;
use serde::{Deserialize, Serialize};

use crate::config::CourseConfig;

/// Result type for content source operations
pub type SourceResult<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Source item not found: {id}")]
    NotFound { id: String },

    #[error("Failed to fetch {id}: {message}")]
    Fetch { id: String, message: String },

    #[error("No module/lesson structure found for course {course}")]
    StructureMissing { course: String },
}

impl SourceError {
    pub fn fetch(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// Metadata of a course root page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub last_edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseStructure {
    #[serde(default)]
    pub modules: Vec<ModuleOutline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutline {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<LessonOutline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonOutline {
    pub id: String,
    pub title: String,
    /// Last-edited stamp of the lesson page, when the source reports one
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_page(&self, page_id: &str) -> SourceResult<PageMetadata>;

    /// Raw block tree under `block_id`, at most `max_depth` levels deep
    /// (top-level children are depth 1). Nodes at the limit are returned
    /// without children.
    async fn fetch_block_children(
        &self,
        block_id: &str,
        max_depth: usize,
    ) -> SourceResult<Vec<ExternalNode>>;

    async fn fetch_course_structure(&self, course: &CourseConfig) -> SourceResult<CourseStructure>;
}
