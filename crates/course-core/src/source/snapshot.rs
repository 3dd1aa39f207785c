//! JSON export served as a paginated content source
//!
//! The export holds three maps:
//!
//! ```json
//! {
//!   "pages": { "page-1": { "id": "page-1", "title": "Joinery" } },
//!   "structures": { "page-1": { "modules": [ { "id": "m1", "title": "Week 1", "lessons": [] } ] } },
//!   "children": { "l1": [ { "id": "b1", "type": "paragraph", "rich_text": [] } ] }
//! }
//! ```
//!
//! `children` lists the direct children of any block or lesson; nested
//! nodes are looked up by their own id when flagged `has_children`.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use course_blocks::ExternalNode;
use serde::Deserialize;
use serde_json::Value;

use super::paged::{BlockPage, BlockPager, drain_block_tree};
use super::{ContentSource, CourseStructure, PageMetadata, SourceError, SourceResult};
use crate::config::{CourseConfig, DEFAULT_PAGE_SIZE};
use crate::Result;

#[derive(Debug, Default, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    pages: HashMap<String, PageMetadata>,
    #[serde(default)]
    structures: HashMap<String, CourseStructure>,
    #[serde(default)]
    children: HashMap<String, Vec<Value>>,
}

#[derive(Debug, Clone)]
pub struct SnapshotSource {
    pages: HashMap<String, PageMetadata>,
    structures: HashMap<String, CourseStructure>,
    children: HashMap<String, Vec<ExternalNode>>,
    page_size: usize,
}

impl SnapshotSource {
    pub fn from_json(content: &str) -> Result<Self> {
        let file: SnapshotFile = serde_json::from_str(content)?;

        let mut dropped = 0usize;
        let children = file
            .children
            .into_iter()
            .map(|(parent, values)| {
                let total = values.len();
                let nodes: Vec<ExternalNode> =
                    values.into_iter().filter_map(ExternalNode::from_value).collect();
                dropped += total - nodes.len();
                (parent, nodes)
            })
            .collect();

        if dropped > 0 {
            tracing::warn!(dropped, "Snapshot contained malformed block nodes");
        }

        Ok(Self {
            pages: file.pages,
            structures: file.structures,
            children,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let source = Self::from_json(&content)?;
        tracing::debug!(
            ?path,
            pages = source.pages.len(),
            structures = source.structures.len(),
            "Loaded content snapshot"
        );
        Ok(source)
    }

    /// Serve children in pages of `page_size` (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[async_trait]
impl BlockPager for SnapshotSource {
    async fn fetch_children_page(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> SourceResult<BlockPage> {
        let all = self
            .children
            .get(block_id)
            .ok_or_else(|| SourceError::NotFound {
                id: block_id.to_string(),
            })?;

        let start = match cursor {
            None => 0,
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| SourceError::fetch(block_id, format!("invalid cursor '{}'", c)))?,
        };
        if start > all.len() {
            return Err(SourceError::fetch(
                block_id,
                format!("cursor {} past end of {} children", start, all.len()),
            ));
        }

        let end = start.saturating_add(self.page_size).min(all.len());
        Ok(BlockPage {
            nodes: all[start..end].to_vec(),
            next_cursor: (end < all.len()).then(|| end.to_string()),
        })
    }
}

#[async_trait]
impl ContentSource for SnapshotSource {
    async fn fetch_page(&self, page_id: &str) -> SourceResult<PageMetadata> {
        self.pages
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
        drain_block_tree(self, block_id, max_depth).await
    }

    async fn fetch_course_structure(&self, course: &CourseConfig) -> SourceResult<CourseStructure> {
        self.structures
            .get(course.structure_key())
            .cloned()
            .ok_or_else(|| SourceError::StructureMissing {
                course: course.slug.clone(),
            })
    }
}
